use std::path::PathBuf;

use clap::Parser;

use crate::core::{MinerSettings, ModelFamily};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file holding the chat history (`-` or omitted reads stdin)
    #[arg()]
    pub history: Option<PathBuf>,

    /// Model family to serve
    #[arg(short, long, value_enum)]
    pub family: Option<ModelFamily>,

    /// Base URL of the text-generation server
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Max tokens for model output
    #[arg(long)]
    pub max_new_tokens: Option<u32>,

    /// Sampling temperature of model
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Whether to use sampling or not (if not, uses greedy decoding)
    #[arg(long)]
    pub do_sample: Option<bool>,

    /// Whether to use a custom "system" prompt instead of the one sent in the history
    #[arg(long)]
    pub prompt_injection: Option<bool>,

    /// What prompt to replace the system prompt with
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Print the formatted prompt instead of generating
    #[arg(long)]
    pub prompt_only: bool,

    /// Disable streaming mode
    #[arg(long)]
    pub no_stream: bool,

    /// Enable debug output
    #[arg(short, long, default_value = "false")]
    pub debug: bool,
}

impl Args {
    /// Applies command-line overrides on top of the configured settings.
    pub fn apply_to(&self, settings: &mut MinerSettings) {
        if let Some(max_new_tokens) = self.max_new_tokens {
            settings.max_new_tokens = max_new_tokens;
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(do_sample) = self.do_sample {
            settings.do_sample = do_sample;
        }
        if let Some(prompt_injection) = self.prompt_injection {
            settings.do_prompt_injection = prompt_injection;
        }
        if let Some(system_prompt) = &self.system_prompt {
            settings.system_prompt.clone_from(system_prompt);
        }
    }
}
