pub mod generator;
pub mod tgi;
pub mod types;

pub use generator::{BoxStream, TextGenerator};
pub use tgi::TgiClient;
pub use types::{FinishReason, GenerationChunk, GenerationParams};
