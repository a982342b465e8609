use std::io::Write;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info};

use crate::backends::{FinishReason, GenerationChunk, GenerationParams, TextGenerator};
use crate::core::message::ChatMessage;
use crate::core::prompt::PromptFormatter;
use crate::core::{MinerError, MinerSettings, ModelFamily};

/// Capability a serving framework calls to answer a prompting request.
#[async_trait]
pub trait PromptingMiner: Send + Sync {
    /// Produces the model's reply to `history`.
    async fn forward(&self, history: &[ChatMessage]) -> Result<String, MinerError>;
}

/// Serves one model family: formats the history in the family's dialect,
/// hands the prompt to a [`TextGenerator`] and cleans up the decoded text.
pub struct Miner {
    family: ModelFamily,
    formatter: PromptFormatter,
    params: GenerationParams,
    generator: Box<dyn TextGenerator>,
}

impl Miner {
    /// Creates a miner for `family` with the given settings and generation backend.
    pub fn new(
        family: ModelFamily,
        settings: &MinerSettings,
        generator: Box<dyn TextGenerator>,
    ) -> Self {
        let formatter = PromptFormatter::new(family.prompt_config(settings));
        info!(
            "Serving {} as {family:?} with {:?} prompts",
            settings.model_name,
            family.dialect()
        );

        Self {
            family,
            formatter,
            params: GenerationParams::for_family(family, settings),
            generator,
        }
    }

    pub const fn family(&self) -> ModelFamily {
        self.family
    }

    pub const fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// The prompt this miner would send for `history`.
    pub fn prompt(&self, history: &[ChatMessage]) -> String {
        self.formatter.format(history)
    }

    /// Like [`PromptingMiner::forward`], but writes the reply to `writer` as
    /// tokens arrive. Returns the same cleaned-up text `forward` would.
    pub async fn forward_streaming<W: Write + Send>(
        &self,
        history: &[ChatMessage],
        writer: &mut W,
    ) -> Result<String, MinerError> {
        let prompt = self.prompt(history);
        let mut stream = self
            .generator
            .generate_streaming(&prompt, &self.params)
            .await?;

        let markers = self.family.end_of_text_markers();
        let mut generation = String::new();
        let mut written = 0;

        while let Some(chunk) = stream.next().await {
            match chunk? {
                GenerationChunk::Token { text, special } => {
                    if special && self.family.skips_special_tokens() {
                        continue;
                    }
                    generation.push_str(&text);

                    if find_marker(&generation, markers).is_some() {
                        debug!("[Miner] end-of-text marker reached");
                        break;
                    }

                    let span = self.reply_span(&generation, false);
                    written = write_span(writer, &generation, written, span)?;
                }
                GenerationChunk::End(FinishReason::Stop | FinishReason::Length) => break,
                GenerationChunk::End(FinishReason::Error(error)) => {
                    return Err(MinerError::StreamError(error));
                }
            }
        }

        write_span(writer, &generation, written, self.reply_span(&generation, true))?;
        writer.flush()?;

        let generation = self.clean_up(&generation);
        log_exchange(history, &prompt, &generation);
        Ok(generation)
    }

    /// Byte range of `generation` that makes up the reply.
    ///
    /// The reply ends at the first end-of-text marker. Until the generation is
    /// `finished`, a suffix that could still grow into a marker is held back.
    /// Output decoded with special tokens kept is stripped after the cut.
    fn reply_span(&self, generation: &str, finished: bool) -> (usize, usize) {
        let markers = self.family.end_of_text_markers();
        let end = find_marker(generation, markers).unwrap_or_else(|| {
            if finished {
                generation.len()
            } else {
                generation.len() - pending_marker_prefix(generation, markers)
            }
        });
        if self.family.skips_special_tokens() {
            return (0, end);
        }

        let reply = &generation[..end];
        let start = reply.len() - reply.trim_start().len();
        (start, start + reply[start..].trim_end().len())
    }

    fn clean_up(&self, generation: &str) -> String {
        let (start, end) = self.reply_span(generation, true);
        generation[start..end].to_string()
    }
}

#[async_trait]
impl PromptingMiner for Miner {
    async fn forward(&self, history: &[ChatMessage]) -> Result<String, MinerError> {
        let prompt = self.prompt(history);
        let raw = self.generator.generate(&prompt, &self.params).await?;

        let generation = self.clean_up(&raw);
        log_exchange(history, &prompt, &generation);
        Ok(generation)
    }
}

/// Writes the part of `generation[start..end]` not yet written and returns
/// the new written offset.
fn write_span<W: Write>(
    writer: &mut W,
    generation: &str,
    written: usize,
    (start, end): (usize, usize),
) -> Result<usize, MinerError> {
    let from = written.max(start);
    if from < end {
        writer.write_all(generation[from..end].as_bytes())?;
        writer.flush()?;
    }
    Ok(written.max(end))
}

fn log_exchange(history: &[ChatMessage], prompt: &str, generation: &str) {
    debug!("Message: {history:?}");
    debug!("Prompt: {prompt}");
    // Keep angle brackets out of log lines.
    debug!("Generation: {}", generation.replace('<', "-"));
}

/// Byte offset of the earliest end-of-text marker in `text`.
fn find_marker(text: &str, markers: &[&str]) -> Option<usize> {
    markers.iter().filter_map(|marker| text.find(marker)).min()
}

/// Length of the longest suffix of `text` that could still grow into a marker.
fn pending_marker_prefix(text: &str, markers: &[&str]) -> usize {
    markers
        .iter()
        .copied()
        .flat_map(|marker: &str| {
            marker
                .char_indices()
                .skip(1)
                .map(move |(at, _)| &marker[..at])
        })
        .filter(|prefix| text.ends_with(*prefix))
        .map(str::len)
        .max()
        .unwrap_or(0)
}
