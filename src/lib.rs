pub mod backends;
pub mod cli;
pub mod core;
pub mod eventsource;

pub use crate::core::{ChatMessage, Config, Miner, MinerError, PromptConfig, PromptFormatter};
