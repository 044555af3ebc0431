//! Event dispatch: route an inbound webhook event to an intent, compose the reply, send it.
//!
//! [`route`] and the composer are pure; [`Dispatcher`] owns the upstream clients and performs
//! the lookups plus exactly one reply (or push) call per matched event.

mod compose;
mod dispatch;
mod router;

pub use compose::{
    choice_reply, echo_reply, food_menu, no_answer_reply, profile_card, weather_prompt,
    weather_report, FOODS, NO_ANSWER,
};
pub use dispatch::{DispatchError, Dispatcher, Outcome};
pub use router::{route, Intent, Routed};
