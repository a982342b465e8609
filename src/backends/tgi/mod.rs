//! Client for a text-generation-inference style HTTP server.

pub mod types;

use crate::backends::generator::{BoxStream, TextGenerator};
use crate::backends::{GenerationChunk, GenerationParams};
use crate::core::MinerError;
use crate::eventsource::{Event, EventSourceExt};
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use log::debug;
use reqwest::{Client, Response, StatusCode};

use types::{GenerateRequest, GenerateResponse, StreamResponse};

const GENERATE_PATH: &str = "/generate";
const GENERATE_STREAM_PATH: &str = "/generate_stream";

/// Talks to a generation server that hosts the miner's model.
///
/// The server owns model weights, device placement and tokenization; this
/// client only ships prompts and sampling parameters.
pub struct TgiClient {
    base_url: String,
    api_token: Option<String>,
    client: Client,
}

impl TgiClient {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
            client: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{base}{path}", base = self.base_url)
    }

    /// Posts a generation request and maps non-success statuses to errors.
    async fn post<'a>(
        &self,
        path: &str,
        request: &GenerateRequest<'a>,
    ) -> Result<Response, MinerError> {
        let mut builder = self.client.post(self.endpoint(path)).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(MinerError::from)?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MinerError::Authentication(
                "Generation backend rejected the API token".to_string(),
            )),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(MinerError::ApiError(format!(
                    "Generation request failed with status {status}: {error_text}"
                )))
            }
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for TgiClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, MinerError> {
        let request = GenerateRequest::new(prompt, params);
        let response = self.post(GENERATE_PATH, &request).await?;

        let response_text = response
            .text()
            .await
            .map_err(|e| MinerError::ResponseFormat(format!("Failed to get response text: {e}")))?;
        let generation = parse_generate_response(&response_text)?;
        Ok(generation.generated_text)
    }

    async fn generate_streaming(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BoxStream, MinerError> {
        let request = GenerateRequest::new(prompt, params);
        let response = self.post(GENERATE_STREAM_PATH, &request).await?;

        Ok(events_to_chunks(response.events()).boxed())
    }
}

/// `/generate` answers with either an object or a one-element array.
fn parse_generate_response(body: &str) -> Result<GenerateResponse, MinerError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| MinerError::ResponseFormat(format!("Invalid JSON: {e}")))?;
    let value = match value {
        serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    };
    serde_json::from_value(value)
        .map_err(|e| MinerError::ResponseFormat(format!("Failed to parse generation: {e}")))
}

fn events_to_chunks(
    mut events: impl Stream<Item = Result<Event, reqwest::Error>> + Send + Unpin + 'static,
) -> impl Stream<Item = Result<GenerationChunk, MinerError>> + Send + 'static {
    try_stream! {
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| MinerError::StreamError(e.to_string()))?;
            let payload = StreamResponse::try_from(event)?;
            for chunk in payload.into_chunks() {
                yield chunk;
            }
        }
        debug!("[TGI] event stream closed");
    }
}

impl TryFrom<Event> for StreamResponse {
    type Error = MinerError;

    fn try_from(event: Event) -> Result<Self, MinerError> {
        serde_json::from_str(&event.data)
            .map_err(|e| MinerError::ResponseFormat(format!("Invalid stream payload: {e}")))
    }
}
