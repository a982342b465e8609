/// A piece of a streaming generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationChunk {
    /// One decoded token
    Token {
        text: String,
        /// Control tokens such as end-of-sequence markers
        special: bool,
    },
    /// Stream end marker with the reason the backend stopped
    End(FinishReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// The model emitted an end-of-sequence token or a stop sequence
    Stop,
    /// `max_new_tokens` was reached
    Length,
    /// The backend failed mid-generation
    Error(String),
}

impl GenerationChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Token {
            text: text.into(),
            special: false,
        }
    }

    pub fn special(text: impl Into<String>) -> Self {
        Self::Token {
            text: text.into(),
            special: true,
        }
    }

    pub const fn stop() -> Self {
        Self::End(FinishReason::Stop)
    }

    pub const fn error(error: String) -> Self {
        Self::End(FinishReason::Error(error))
    }
}
