use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use dissonance::audit::SystemAuditor;
use dissonance::client::HttpCollaboratorClient;
use dissonance::config::Config;
use dissonance::domain::CycleOutcome;
use dissonance::orchestrator::LoopController;
use dissonance::server::{self, AuditReport, EvaluatorState};

fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };

    // RUST_LOG wins over the configured level
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if let Some(log_file) = &config.log_file {
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }
        let target = Box::new(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .context("Failed to open log file")?,
        );
        builder.target(env_logger::Target::Pipe(target));
        builder.init();
        info!("Logging initialized, writing to: {}", log_file.display());
    } else {
        builder.init();
    }
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn run_application(cli: &Cli, config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Evaluator { start_loop, bind } => run_evaluator(config, *start_loop, bind.clone()).await,
        Commands::Auditor { bind } => run_auditor(config, bind.clone()).await,
        Commands::RunOnce => handle_run_once(&config).await,
        Commands::Audit { json } => handle_audit(&config, *json).await,
    }
}

async fn run_evaluator(config: Config, start_loop: bool, bind: Option<String>) -> Result<()> {
    let client = Arc::new(HttpCollaboratorClient::new()?);
    let controller = Arc::new(LoopController::new(client.clone(), &config));
    if start_loop {
        controller.start();
    }

    let state = Arc::new(EvaluatorState {
        controller: controller.clone(),
        collaborators: config.collaborators.clone(),
    });
    let addr = bind.unwrap_or_else(|| config.server.evaluator_bind.clone());
    let listener = server::bind(&addr).await?;
    println!("{} {}", "Evaluator listening on".green(), addr);

    // Drain the server, then stop the loop, then release the shared client
    server::serve(listener, server::evaluator::router(state), shutdown_signal())
        .await
        .context("Evaluator server failed")?;
    controller.shutdown().await;
    drop(controller);
    drop(client);

    info!("Evaluator stopped");
    Ok(())
}

async fn run_auditor(config: Config, bind: Option<String>) -> Result<()> {
    let client = Arc::new(HttpCollaboratorClient::new()?);
    let auditor = Arc::new(SystemAuditor::new(client, &config));

    let addr = bind.unwrap_or_else(|| config.server.auditor_bind.clone());
    let listener = server::bind(&addr).await?;
    println!("{} {}", "Auditor listening on".green(), addr);

    server::serve(listener, server::auditor::router(auditor), shutdown_signal())
        .await
        .context("Auditor server failed")?;

    info!("Auditor stopped");
    Ok(())
}

async fn handle_run_once(config: &Config) -> Result<()> {
    let client = Arc::new(HttpCollaboratorClient::new()?);
    let controller = LoopController::new(client, config);

    let outcome = controller.run_once().await;
    match &outcome {
        CycleOutcome::Completed { correlation_id } => {
            println!("{} {}", "Completed:".green(), correlation_id);
        }
        CycleOutcome::BlockedBySafety { reason } => {
            println!("{} {}", "Blocked by safety gate:".yellow(), reason);
        }
        CycleOutcome::TimedOut => {
            eyre::bail!("cycle timed out after {}s", config.loop_config.timeout_seconds);
        }
        CycleOutcome::Failed { cause } => {
            eyre::bail!("cycle failed: {}", cause);
        }
    }
    Ok(())
}

async fn handle_audit(config: &Config, json: bool) -> Result<()> {
    let client = Arc::new(HttpCollaboratorClient::new()?);
    let auditor = SystemAuditor::new(client, config);
    let findings = auditor.run_audit().await;

    if json {
        let report = AuditReport::completed(findings);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if findings.is_empty() {
        println!("{}", "No findings".green());
        return Ok(());
    }
    println!("{} {}", findings.len().to_string().red(), "finding(s):".red());
    for finding in &findings {
        println!("  {} {}", finding.id().as_str().yellow(), finding.detail());
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration; logging depends on it
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config, cli.is_verbose()).context("Failed to setup logging")?;
    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
