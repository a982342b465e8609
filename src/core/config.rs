use crate::core::prompt::{Dialect, PromptConfig};
use crate::core::MinerError;
use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::Path;

include!(concat!(env!("OUT_DIR"), "/miner_defaults.rs"));

const END_OF_TEXT: &str = "<|endoftext|>";
const LLAMA_END_OF_SEQUENCE: &str = "</s>";

/// Generation settings of one model family.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MinerSettings {
    pub model_name: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub do_sample: bool,
    pub do_prompt_injection: bool,
    pub system_prompt: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub family: ModelFamily,
    pub backend_url: String,
    pub mpt_chat: MinerSettings,
    pub nous_hermes: MinerSettings,
    pub vicuna: MinerSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    #[value(name = "mpt_chat")]
    MptChat,
    #[value(name = "nous_hermes")]
    NousHermes,
    #[value(name = "vicuna")]
    Vicuna,
}

impl ModelFamily {
    pub const fn dialect(self) -> Dialect {
        match self {
            Self::MptChat => Dialect::ChatMarkup,
            Self::NousHermes | Self::Vicuna => Dialect::InstructionResponse,
        }
    }

    /// Markers after which nothing the model produces belongs to the answer.
    pub const fn end_of_text_markers(self) -> &'static [&'static str] {
        match self {
            Self::MptChat => &[END_OF_TEXT],
            Self::NousHermes | Self::Vicuna => &[LLAMA_END_OF_SEQUENCE],
        }
    }

    /// MPT-Chat decodes with special tokens kept and cuts them off by hand.
    pub const fn skips_special_tokens(self) -> bool {
        !matches!(self, Self::MptChat)
    }

    pub fn prompt_config(self, settings: &MinerSettings) -> PromptConfig {
        PromptConfig {
            dialect: self.dialect(),
            inject_system_prompt: settings.do_prompt_injection,
            system_prompt_text: settings.system_prompt.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("Invalid embedded config.toml")
    }
}

impl Config {
    /// Reads `config.toml` from the working directory, falling back to the
    /// defaults compiled into the binary.
    pub fn load() -> Result<Self, MinerError> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<Self, MinerError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|e| {
                MinerError::ConfigError(format!("Failed to read config file: {e}"))
            })?;

            toml::from_str(&contents)
                .map_err(|e| MinerError::ConfigError(format!("Failed to parse config file: {e}")))
        } else {
            Ok(Self::default())
        }
    }

    pub fn update_family(&mut self, new_family: ModelFamily) {
        self.family = new_family;
    }

    pub const fn settings(&self) -> &MinerSettings {
        match self.family {
            ModelFamily::MptChat => &self.mpt_chat,
            ModelFamily::NousHermes => &self.nous_hermes,
            ModelFamily::Vicuna => &self.vicuna,
        }
    }

    pub fn settings_mut(&mut self) -> &mut MinerSettings {
        match self.family {
            ModelFamily::MptChat => &mut self.mpt_chat,
            ModelFamily::NousHermes => &mut self.nous_hermes,
            ModelFamily::Vicuna => &mut self.vicuna,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::default();
        assert_eq!(config.family, ModelFamily::MptChat);
        assert_eq!(config.mpt_chat.model_name, "mosaicml/mpt-7b-chat");
        assert_eq!(config.mpt_chat.max_new_tokens, 256);
        assert!(!config.vicuna.do_sample);
        assert!(config
            .vicuna
            .system_prompt
            .starts_with("A chat between a curious user"));
        assert!(config.vicuna.system_prompt.ends_with("questions. "));
    }

    #[test]
    fn test_settings_follow_family() {
        let mut config = Config::default();
        config.update_family(ModelFamily::Vicuna);
        assert_eq!(
            config.settings().model_name,
            "TheBloke/Wizard-Vicuna-7B-Uncensored-HF"
        );
        config.settings_mut().max_new_tokens = 64;
        assert_eq!(config.vicuna.max_new_tokens, 64);
        assert_eq!(config.mpt_chat.max_new_tokens, 256);
    }

    #[test]
    fn test_family_dialects() {
        assert_eq!(ModelFamily::MptChat.dialect(), Dialect::ChatMarkup);
        assert_eq!(ModelFamily::NousHermes.dialect(), Dialect::InstructionResponse);
        assert_eq!(ModelFamily::Vicuna.dialect(), Dialect::InstructionResponse);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let contents = DEFAULT_CONFIG.replace("family = \"mpt_chat\"", "family = \"nous_hermes\"");
        write!(file, "{contents}").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.family, ModelFamily::NousHermes);
    }

    #[test]
    fn test_load_from_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "family = 3").unwrap();

        assert!(matches!(
            Config::load_from(file.path()),
            Err(MinerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.backend_url, "http://127.0.0.1:8080");
    }
}
