use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use workerctl::{Agent, Controller, ControllerConfig, LineSource, ScriptSource, Subscribe};

#[derive(Parser, Debug)]
#[command(name = "workerctl")]
#[command(version)]
#[command(about = "Create, stop and drain named background workers")]
#[command(propagate_version = true)]
struct Args {
    /// How long `stop` waits for a worker to exit (milliseconds)
    #[arg(long, global = true, default_value = "5000")]
    stop_grace_ms: u64,

    /// How long stop-all waits for each worker to exit (milliseconds)
    #[arg(long, global = true, default_value = "3000")]
    drain_grace_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Read commands from stdin, one per line, until EOF
    Serve,

    /// Execute the given commands in order
    ///
    /// Example: workerctl run "add:tick:true:500" "create,nap,2" list
    Run {
        /// Commands, e.g. `create,w,5`, `add:t:true:250`, `stop,w`, `list`, `stopall`
        #[arg(required = true)]
        commands: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = ControllerConfig {
        stop_grace: Duration::from_millis(args.stop_grace_ms),
        drain_grace: Duration::from_millis(args.drain_grace_ms),
        ..ControllerConfig::default()
    };

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(workerctl::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let controller = Controller::builder(cfg).with_subscribers(subs).build();
    let agent = Agent::new(Arc::clone(&controller));
    let out = tokio::io::stdout();

    let report = match args.command {
        Commands::Serve => agent
            .serve(LineSource::stdin(), out)
            .await
            .context("serving commands from stdin")?,
        Commands::Run { commands } => agent
            .serve(ScriptSource::new(commands), out)
            .await
            .context("running commands")?,
    };

    match report {
        Some(report) => tracing::info!(target: "workerctl", "exit drain: {report}"),
        None => tracing::info!(target: "workerctl", "drained on signal"),
    }
    controller.close().await;
    Ok(())
}
