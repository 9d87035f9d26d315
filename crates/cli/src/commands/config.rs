use std::env;
use std::fs;
use std::path::Path;

use bunamo_core::config::{AppConfig, ConfigOverrides};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{detect_config_path, load_config, CommandResult, EXIT_CONFIG};

struct FieldSources<'a> {
    doc: Option<Value>,
    path: Option<&'a Path>,
}

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config(config_path, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let detected_path = detect_config_path(config_path);
    let sources = FieldSources {
        doc: load_config_file_doc(detected_path.as_deref()),
        path: detected_path.as_deref(),
    };

    CommandResult::output(render(&config, &sources))
}

fn render(config: &AppConfig, sources: &FieldSources<'_>) -> String {
    let mut lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
    ];

    lines.push(render_line(
        "llm.provider",
        config.llm.provider.as_str(),
        sources.field_source("llm.provider", "BUNAMO_LLM_PROVIDER"),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        sources.field_source("llm.model", "BUNAMO_LLM_MODEL"),
    ));

    let base_url = match (&config.llm.base_url, config.llm.effective_base_url()) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => format!("{url} (provider default)"),
        (None, None) => "<unset>".to_string(),
    };
    lines.push(render_line(
        "llm.base_url",
        &base_url,
        sources.field_source("llm.base_url", "BUNAMO_LLM_BASE_URL"),
    ));

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "llm.api_key",
        &api_key,
        sources.field_source("llm.api_key", "BUNAMO_LLM_API_KEY"),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        sources.field_source("llm.timeout_secs", "BUNAMO_LLM_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "pairing.top_k",
        &config.pairing.top_k.to_string(),
        sources.field_source("pairing.top_k", "BUNAMO_PAIRING_TOP_K"),
    ));
    let tables_path = config
        .pairing
        .tables_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<built-in>".to_string());
    lines.push(render_line(
        "pairing.tables_path",
        &tables_path,
        sources.field_source("pairing.tables_path", "BUNAMO_PAIRING_TABLES_PATH"),
    ));
    lines.push(render_line(
        "pairing.narrative_enabled",
        &config.pairing.narrative_enabled.to_string(),
        sources.field_source("pairing.narrative_enabled", "BUNAMO_PAIRING_NARRATIVE_ENABLED"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        sources.field_source("logging.level", "BUNAMO_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        sources.field_source("logging.format", "BUNAMO_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

impl FieldSources<'_> {
    fn field_source(&self, key_path: &str, env_key: &str) -> String {
        if env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn redaction_keeps_only_the_key_prefix() {
        assert_eq!(redact_token("sk-live-abcdef"), "sk-***");
        assert_eq!(redact_token("plainsecret"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_file_doc() {
        let doc: toml::Value = "[pairing]\ntop_k = 5\n".parse().expect("toml should parse");
        assert!(contains_path(&doc, "pairing.top_k"));
        assert!(!contains_path(&doc, "pairing.tables_path"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}
