//! linebot core library: LINE webhook routing, reply composition, upstream clients,
//! and the HTTP gateway used by the CLI.

pub mod bot;
pub mod config;
pub mod gateway;
pub mod init;
pub mod line;
pub mod llm;
pub mod weather;
