//! Text completion client (OpenAI-compatible chat completions).

mod completion;

pub use completion::{CompletionApi, CompletionClient, CompletionError, DEFAULT_BASE_URL};
