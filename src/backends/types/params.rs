use crate::core::{MinerSettings, ModelFamily};

/// Sampling parameters forwarded to the generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub do_sample: bool,
    /// Sequences at which the backend may stop early.
    pub stop: Vec<String>,
}

impl GenerationParams {
    pub fn for_family(family: ModelFamily, settings: &MinerSettings) -> Self {
        Self {
            max_new_tokens: settings.max_new_tokens,
            temperature: settings.temperature,
            do_sample: settings.do_sample,
            stop: family
                .end_of_text_markers()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}
