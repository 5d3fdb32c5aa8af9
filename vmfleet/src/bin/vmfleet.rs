//! `vmfleet` command-line entry point.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vmfleet::{
    AnsibleHandoff, BatchCoordinator, ConfigurationHandoff, FleetConfig, GovcProvider,
    ProvisionOptions, Provisioner,
};

/// Exit code used when provisioning succeeded but configuration did not.
const HANDOFF_FAILED_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(name = "vmfleet", version, about = "Provision and configure a fleet of virtual machines")]
struct Cli {
    /// Fleet configuration file.
    #[arg(long, global = true, default_value = "fleet.yml")]
    config: PathBuf,

    /// Also write logs to a daily-rolling file in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision every configured server.
    Deploy(DeployArgs),
    /// Run configuration management against every configured server.
    Configure,
}

#[derive(Args)]
struct DeployArgs {
    /// Number of servers provisioned concurrently.
    #[arg(long)]
    workers: Option<usize>,

    /// Timeout for each control-plane call, in seconds.
    #[arg(long, value_name = "SECS")]
    call_timeout: Option<u64>,

    /// Write the run report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hand the fleet to configuration management when every server succeeded.
    #[arg(long)]
    configure: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_guard = vmfleet::init_logging(cli.log_dir.as_deref())?;

    let config = FleetConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let code = match cli.command {
        Command::Deploy(args) => deploy(config, args).await?,
        Command::Configure => configure(&config).await,
    };

    // process::exit skips destructors; flush the log file first.
    drop(log_guard);
    std::process::exit(code);
}

async fn deploy(mut config: FleetConfig, args: DeployArgs) -> anyhow::Result<i32> {
    if let Some(workers) = args.workers {
        config.deploy.workers = workers;
    }
    if let Some(secs) = args.call_timeout {
        config.deploy.call_timeout_secs = secs;
    }
    config.validate()?;

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let provider = Arc::new(GovcProvider::new(Arc::new(config.vcenter.clone())));
    let options = ProvisionOptions {
        call_timeout: Duration::from_secs(config.deploy.call_timeout_secs),
    };
    let provisioner = Arc::new(Provisioner::new(provider, options));
    let coordinator = BatchCoordinator::new(provisioner, config.deploy.workers);

    let report = coordinator.run(config.servers.clone(), &cancel).await;

    for line in report.failure_lines() {
        eprintln!("{}", line);
    }
    if let Some(path) = &args.report
        && let Err(e) = report.write_json(path)
    {
        tracing::error!(error = %e, "Failed to write run report");
    }

    let code = report.exit_code();
    if !args.configure {
        return Ok(code);
    }
    if !report.is_success() {
        tracing::warn!("Not every server succeeded, skipping configuration handoff");
        return Ok(code);
    }
    Ok(configure(&config).await)
}

async fn configure(config: &FleetConfig) -> i32 {
    let handoff = AnsibleHandoff::new(config.ansible.clone(), config.vars.clone());
    match handoff.hand_off(&config.servers).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            HANDOFF_FAILED_EXIT_CODE
        }
    }
}

fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });
}
