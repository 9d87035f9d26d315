use std::path::Path;

use bunamo_agent::llm::build_client;
use bunamo_core::config::{AppConfig, ConfigOverrides, LlmProvider};
use bunamo_core::pairing::PairingTables;
use serde::Serialize;

use crate::commands::{load_config, CommandResult, EXIT_CONFIG, EXIT_TABLES};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn exit_code(&self) -> u8 {
        let failed = |name: &str| {
            self.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
        };

        if failed("config_validation") || failed("llm_endpoint") {
            EXIT_CONFIG
        } else if failed("pairing_tables") {
            EXIT_TABLES
        } else {
            0
        }
    }
}

pub fn run(config_path: Option<&Path>, json_output: bool) -> CommandResult {
    let report = build_report(config_path);
    let exit_code = report.exit_code();

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(config_path: Option<&Path>) -> DoctorReport {
    let mut checks = Vec::new();

    match load_config(config_path, ConfigOverrides::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_pairing_tables(&config));
            checks.push(check_llm_endpoint(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["pairing_tables", "llm_endpoint"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_pairing_tables(config: &AppConfig) -> DoctorCheck {
    let source = config
        .pairing
        .tables_path
        .as_ref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "built-in tables".to_string());

    match PairingTables::load_or_default(config.pairing.tables_path.as_deref()) {
        Ok(tables) => DoctorCheck {
            name: "pairing_tables",
            status: CheckStatus::Pass,
            details: format!(
                "loaded {source}: {} compatibility entries, {} origins, {} seasons",
                tables.compatibility.len(),
                tables.origin_affinity.len(),
                tables.seasonal.iter().count(),
            ),
        },
        Err(error) => DoctorCheck {
            name: "pairing_tables",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_llm_endpoint(config: &AppConfig) -> DoctorCheck {
    if !config.pairing.narrative_enabled {
        return DoctorCheck {
            name: "llm_endpoint",
            status: CheckStatus::Skipped,
            details: "narratives disabled; template narratives will be used".to_string(),
        };
    }
    if config.llm.provider == LlmProvider::Disabled {
        return DoctorCheck {
            name: "llm_endpoint",
            status: CheckStatus::Skipped,
            details: "llm provider disabled; template narratives will be used".to_string(),
        };
    }

    match build_client(&config.llm) {
        Ok(_) => DoctorCheck {
            name: "llm_endpoint",
            status: CheckStatus::Pass,
            details: format!(
                "{} client configured for model `{}` at {}",
                config.llm.provider.as_str(),
                config.llm.model,
                config.llm.effective_base_url().unwrap_or_else(|| "<unset>".to_string()),
            ),
        },
        Err(error) => DoctorCheck {
            name: "llm_endpoint",
            status: CheckStatus::Fail,
            details: format!("{error:#}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
