//! deploy-character: deploy a character from a natural-language request
//!
//! Runs the deployment workflow once, printing progress as it arrives and
//! the final result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deploy_character::{AppConfig, DeployCharacterWorkflow, ProgressSink};

#[derive(Debug, Parser)]
#[command(name = "deploy-character", version, about)]
struct Cli {
    /// Config file to use instead of .deploy-character.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy the character described by TEXT
    Run {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Report whether TEXT would trigger a deployment
    Check {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

/// Initialize logging with RUST_LOG environment variable support
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { text } => {
            let text = text.join(" ");
            let accepted = deploy_character::domain::accepts(&text);
            println!("{}", accepted);
            Ok(if accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Run { text } => run(cli.config, text.join(" ")).await,
    }
}

async fn run(config_file: Option<PathBuf>, text: String) -> Result<ExitCode> {
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = AppConfig::load(Some(project_root.as_path()), config_file.as_deref())
        .context("loading configuration")?;

    tracing::info!("Starting deploy-character in {:?}", project_root);

    let workflow = DeployCharacterWorkflow::from_config(&config)?;
    let (sink, mut events) = ProgressSink::channel();
    let cancel = CancellationToken::new();

    // Print progress independently of the workflow task
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", event.text);
        }
    });

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, cancelling deployment");
            ctrl_c.cancel();
        }
    });

    let result = workflow.run(&text, &sink, &cancel).await;

    // Closing the sink ends the printer loop
    drop(sink);
    printer.await.ok();

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
