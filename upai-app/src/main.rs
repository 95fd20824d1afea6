//! upai command-line entry point.

mod commands;
mod config;
mod input;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "upai", version, about = "Batch chat completions with uniform results")]
struct Cli {
    /// Config file (default: ~/.upai/config.toml, optional).
    #[arg(long, global = true, env = "UPAI_CONFIG")]
    config: Option<PathBuf>,

    /// Model identifier; overrides config and environment.
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a prompt batch and print one result record per sequence.
    Run {
        /// JSON array of prompt sequences, or JSON Lines with one sequence per line.
        input: PathBuf,
        /// Log the raw provider responses.
        #[arg(long)]
        debug: bool,
    },
    /// Print the request payload for a prompt batch, credentials redacted.
    Payload { input: PathBuf },
    /// Resolve configuration and report the effective model, without network access.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();
    let cfg = config::UpaiConfig::load(cli.config).await?;
    let model = cli.model.as_deref();

    let output = match cli.command {
        Command::Run { input, debug } => commands::run(&cfg, &input, model, debug).await?,
        Command::Payload { input } => commands::payload(&cfg, &input, model).await?,
        Command::Check => commands::check(&cfg, model)?,
    };
    println!("{output}");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(anyhow::anyhow!(
                "unsupported UPAI_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            )),
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("info,upai=debug,upai_app=debug,upai_llm=debug"),
    };
    let log_format = match std::env::var("UPAI_LOG_FORMAT") {
        Ok(v) => v.parse()?,
        Err(_) => LogFormat::Json,
    };

    // stdout carries command output only.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    match log_format {
        LogFormat::Json => builder
            .with_file(true)
            .with_line_number(true)
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init(),
        LogFormat::Pretty => builder
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .init(),
        LogFormat::Compact => builder.compact().init(),
    }

    tracing::debug!(
        log_format = ?log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
