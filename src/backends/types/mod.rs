pub mod generation_chunk;
pub mod params;

pub use generation_chunk::{FinishReason, GenerationChunk};
pub use params::GenerationParams;
