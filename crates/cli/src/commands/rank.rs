use std::fs;
use std::path::{Path, PathBuf};

use bunamo_agent::runtime::PairingRuntime;
use bunamo_core::config::ConfigOverrides;
use bunamo_core::domain::menu::{AnchorItem, CandidateItem};
use bunamo_core::errors::ApplicationError;
use serde::de::DeserializeOwned;

use crate::commands::{load_config, CommandResult, EXIT_CONFIG, EXIT_INPUT, EXIT_TABLES};

const COMMAND: &str = "rank";

#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    pub config_path: Option<PathBuf>,
    pub anchor_path: PathBuf,
    pub candidates_path: PathBuf,
    pub top_k: Option<usize>,
    /// Skip the language model and use template narratives.
    pub offline: bool,
}

pub fn run(options: RankOptions) -> CommandResult {
    let overrides = ConfigOverrides {
        top_k: options.top_k,
        narrative_enabled: options.offline.then_some(false),
        ..ConfigOverrides::default()
    };
    let config = match load_config(options.config_path.as_deref(), overrides) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let anchor: AnchorItem = match read_json(&options.anchor_path, "anchor") {
        Ok(anchor) => anchor,
        Err(message) => return CommandResult::failure(COMMAND, "input", message, EXIT_INPUT),
    };
    let candidates: Vec<CandidateItem> = match read_json(&options.candidates_path, "candidates") {
        Ok(candidates) => candidates,
        Err(message) => return CommandResult::failure(COMMAND, "input", message, EXIT_INPUT),
    };

    let pairing_runtime = match PairingRuntime::from_config(&config) {
        Ok(runtime) => runtime,
        Err(error) => {
            let exit_code = match error {
                ApplicationError::Integration(_) => EXIT_CONFIG,
                _ => EXIT_TABLES,
            };
            let error_class = error.error_class();
            return CommandResult::failure(COMMAND, error_class, error.to_string(), exit_code);
        }
    };

    let async_runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let report = async_runtime.block_on(pairing_runtime.run(&anchor, &candidates, None));

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult::output(output),
        Err(error) => CommandResult::failure(
            COMMAND,
            "serialization",
            format!("failed to serialize pairing report: {error}"),
            EXIT_INPUT,
        ),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read {label} file `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse {label} file `{}`: {error}", path.display()))
}
