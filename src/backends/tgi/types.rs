use serde::{Deserialize, Serialize};

use crate::backends::{FinishReason as ChunkFinishReason, GenerationChunk, GenerationParams};

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub inputs: &'a str,
    pub parameters: Parameters<'a>,
}

#[derive(Debug, Serialize)]
pub struct Parameters<'a> {
    pub max_new_tokens: u32,
    /// Only meaningful when sampling; the server rejects it for greedy runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub do_sample: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub stop: &'a [String],
    pub return_full_text: bool,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(inputs: &'a str, params: &'a GenerationParams) -> Self {
        Self {
            inputs,
            parameters: Parameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.do_sample.then_some(params.temperature),
                do_sample: params.do_sample,
                stop: &params.stop,
                return_full_text: false,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub generated_text: String,
}

#[derive(Debug, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(default)]
    pub special: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Length,
    EosToken,
    StopSequence,
}

#[derive(Debug, Deserialize)]
pub struct StreamDetails {
    pub finish_reason: FinishReason,
}

/// Payload of one `/generate_stream` event.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StreamResponse {
    Error {
        error: String,
    },
    Token {
        token: Token,
        /// Set on the last event only
        generated_text: Option<String>,
        details: Option<StreamDetails>,
    },
}

impl StreamResponse {
    /// Converts the payload into the chunks it stands for: the token itself
    /// and, on the final event, the end marker.
    pub fn into_chunks(self) -> Vec<GenerationChunk> {
        match self {
            Self::Error { error } => vec![GenerationChunk::error(error)],
            Self::Token {
                token,
                generated_text,
                details,
            } => {
                let mut chunks = vec![GenerationChunk::Token {
                    text: token.text,
                    special: token.special,
                }];
                if generated_text.is_some() {
                    let reason = match details.map(|d| d.finish_reason) {
                        Some(FinishReason::Length) => ChunkFinishReason::Length,
                        _ => ChunkFinishReason::Stop,
                    };
                    chunks.push(GenerationChunk::End(reason));
                }
                chunks
            }
        }
    }
}
