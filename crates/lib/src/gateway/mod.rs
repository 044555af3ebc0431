//! Gateway: HTTP front door for the LINE webhook.
//!
//! Single port serves the webhook, the weather push trigger, and health probes.

mod server;

pub use server::{router, run_gateway, GatewayState};
