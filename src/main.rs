//! Buildmend CLI entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use buildmend::adapters::{PollingProcessWatcher, ScriptActionExecutor, SysinfoProcessLister};
use buildmend::application::RecoveryOrchestrator;
use buildmend::domain::models::{Config, EventKind, LifecycleEvent, ProjectContext};
use buildmend::infrastructure::ConfigLoader;
use buildmend::services::{ConsoleSink, ProjectRegistry};

#[derive(Parser)]
#[command(name = "buildmend", about = "Automatic build failure recovery", version)]
struct Cli {
    /// Path to a configuration file (defaults to .buildmend/config.yaml
    /// merged with BUILDMEND_* environment variables).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume lifecycle events as JSON lines on stdin and run recovery.
    Run,
    /// Build one lifecycle event from the tool's hook environment variables
    /// and print it as a JSON line.
    Emit,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run(cli.config).await,
        Commands::Emit => emit(),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    init_tracing(&config);

    let registry = Arc::new(ProjectRegistry::new(config.max_retries));
    let console = Arc::new(ConsoleSink::new());
    let executor = Arc::new(ScriptActionExecutor::new(&config.scripts));
    let process_watcher = Arc::new(
        PollingProcessWatcher::new(SysinfoProcessLister::new(), &config.process_wait)
            .context("Invalid process wait configuration")?,
    );

    let orchestrator = Arc::new(RecoveryOrchestrator::new(
        &config,
        registry,
        Arc::clone(&console),
        executor,
        process_watcher,
    ));

    let (tx, rx) = mpsc::channel::<LifecycleEvent>(64);

    // stdin is the delivery end of the external event channel: one JSON
    // event per line.
    let reader = tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<LifecycleEvent>(&line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(%err, "ignoring malformed event line"),
            }
        }
    });

    let runner = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(orchestrator.run(rx))
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            orchestrator.shutdown();
        }
        _ = reader => {}
    }

    let _ = runner.await;

    for line in console.lines() {
        println!(
            "[{}] {}",
            line.timestamp.format("%H:%M:%S"),
            line.message
        );
    }
    Ok(())
}

/// The original tool delivers events to its hooks through environment
/// variables; turn them into a wire event for `run`'s stdin.
fn emit() -> Result<()> {
    let label = std::env::var("IDEAlertMessage")
        .context("No IDEAlertMessage found in environment")?;
    let kind = EventKind::from_label(&label)
        .with_context(|| format!("Unknown or unused IDEAlertMessage '{label}'"))?;

    let event = LifecycleEvent {
        kind,
        context: ProjectContext {
            project_name: std::env::var("XcodeProject").ok(),
            project_path: std::env::var("XcodeProjectPath").ok(),
            workspace_path: std::env::var("XcodeWorkspacePath").ok(),
            tool_home: std::env::var("XcodeDeveloperDirectory").ok(),
        },
    };

    println!("{}", serde_json::to_string(&event)?);
    Ok(())
}
