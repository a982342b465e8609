mod config;
pub mod error;
pub mod message;
pub mod miner;
pub mod prompt;

pub use config::{Config, MinerSettings, ModelFamily};
pub use error::MinerError;
pub use message::{ChatMessage, Role};
pub use miner::{Miner, PromptingMiner};
pub use prompt::{Dialect, PromptConfig, PromptFormatter};
