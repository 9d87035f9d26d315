use std::path::Path;

use bunamo_core::config::ConfigOverrides;
use bunamo_core::errors::ApplicationError;
use bunamo_core::pairing::PairingTables;

use crate::commands::{load_config, CommandResult, EXIT_CONFIG, EXIT_TABLES};

/// Prints the effective pairing tables as a TOML data file.
pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config(config_path, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "tables",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let rendered = PairingTables::load_or_default(config.pairing.tables_path.as_deref())
        .and_then(|tables| tables.to_toml_string());

    match rendered {
        Ok(output) => CommandResult::output(output),
        Err(error) => {
            let message = error.to_string();
            let error_class = ApplicationError::from(error).error_class();
            CommandResult::failure("tables", error_class, message, EXIT_TABLES)
        }
    }
}
