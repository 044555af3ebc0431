//! LINE Messaging API: webhook event payloads, outbound message objects, and the HTTP client.
//!
//! The client is reached through the [`MessagingApi`] trait so the dispatcher can be driven
//! against an in-memory fake.

mod client;
mod event;
mod message;

pub use client::{LineClient, LineError, MessagingApi, Profile, DEFAULT_API_BASE};
pub use event::{
    EventMessage, EventSource, EventType, MessageType, Postback, WebhookBody, WebhookEvent,
};
pub use message::{Action, Message, QuickReply, QuickReplyItem};
