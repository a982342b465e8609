use log::debug;

use super::args::Args;
use crate::{
    backends::{TextGenerator, TgiClient},
    core::{ChatMessage, Config, Miner, MinerError, PromptingMiner},
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

const API_TOKEN_VAR: &str = "TGI_API_TOKEN";

/// Bearer token for the backend, from `.env` or the process environment.
fn api_token() -> Option<String> {
    dotenv::var(API_TOKEN_VAR).ok()
}

/// Creates the generation backend the miner forwards prompts to
fn create_generator(config: &Config) -> Box<dyn TextGenerator> {
    let api_token = api_token();
    debug!(
        "[SETTINGS] backend: {}, authenticated: {}",
        config.backend_url,
        api_token.is_some()
    );
    Box::new(TgiClient::new(config.backend_url.clone(), api_token))
}

/// Parses a chat history document: a JSON array of `{role, content}` objects.
pub fn parse_history(document: &str) -> Result<Vec<ChatMessage>, MinerError> {
    if document.trim().is_empty() {
        return Err(MinerError::InvalidHistory(
            "expected a JSON array of messages, got nothing".to_string(),
        ));
    }
    serde_json::from_str(document).map_err(|e| MinerError::InvalidHistory(e.to_string()))
}

fn read_history(path: Option<&Path>) -> Result<Vec<ChatMessage>, MinerError> {
    let document = match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)?,
        _ => {
            let mut document = String::new();
            io::stdin().read_to_string(&mut document)?;
            document
        }
    };
    parse_history(&document)
}

pub async fn run(args: Args) -> Result<(), MinerError> {
    let _ = dotenv::dotenv();

    let mut config = Config::load()?;
    if let Some(family) = args.family {
        config.update_family(family);
    }
    if let Some(backend_url) = &args.backend_url {
        config.backend_url.clone_from(backend_url);
    }
    args.apply_to(config.settings_mut());

    debug!(
        "[SETTINGS] family: {:?}, settings: {:?}",
        config.family,
        config.settings()
    );

    let history = read_history(args.history.as_deref())?;
    let miner = Miner::new(config.family, config.settings(), create_generator(&config));
    let mut stdout = io::stdout();

    if args.prompt_only {
        write!(&mut stdout, "{}", miner.prompt(&history))?;
    } else if args.no_stream {
        let generation = miner.forward(&history).await?;
        write!(&mut stdout, "{generation}")?;
    } else {
        miner.forward_streaming(&history, &mut stdout).await?;
    }

    // Ensure final newline
    writeln!(&mut stdout)?;
    Ok(())
}
