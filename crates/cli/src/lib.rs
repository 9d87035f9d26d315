pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use bunamo_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "bunamo",
    about = "Bunamo pairing engine operator CLI",
    long_about = "Rank pastry pairings for a coffee, inspect configuration and pairing tables, and run readiness checks.",
    after_help = "Examples:\n  bunamo rank --anchor coffee.json --candidates pastries.json --offline\n  bunamo doctor --json\n  bunamo config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a bunamo.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Score candidates against an anchor and print the pairing report as JSON")]
    Rank {
        #[arg(long, help = "JSON file holding the anchor item")]
        anchor: PathBuf,
        #[arg(long, help = "JSON file holding an array of candidate items")]
        candidates: PathBuf,
        #[arg(long, help = "Number of pairings to return (1-20)")]
        top_k: Option<usize>,
        #[arg(long, help = "Skip the language model and use template narratives")]
        offline: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, pairing tables, and LLM endpoint settings")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the effective pairing tables as a TOML data file")]
    Tables,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.config.as_deref(), cli.log_level.clone());

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Command::Rank { anchor, candidates, top_k, offline } => {
            commands::rank::run(commands::rank::RankOptions {
                config_path: cli.config.clone(),
                anchor_path: anchor,
                candidates_path: candidates,
                top_k,
                offline,
            })
        }
        Command::Config => commands::config::run(config_path),
        Command::Doctor { json } => commands::doctor::run(config_path, json),
        Command::Tables => commands::tables::run(config_path),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays parseable. A config that fails to load
/// falls back to default logging; the command reports the config error itself.
fn init_logging(config_path: Option<&std::path::Path>, log_level: Option<String>) {
    let logging = AppConfig::load(LoadOptions {
        config_path: config_path.map(|path| path.to_path_buf()),
        overrides: ConfigOverrides { log_level, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    })
    .map(|config| config.logging)
    .unwrap_or_else(|_| AppConfig::default().logging);

    install_subscriber(&logging);
}

fn install_subscriber(logging: &LoggingConfig) {
    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // try_init: a second install in the same process is a no-op.
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
