use anyhow::Result;
use clap::Parser;
use mrl_wordcount::standalone::engine::{render, run_job};
use mrl_wordcount::standalone::{Args, Job};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let job = Job::from_args(Args::parse())?;
    let format = job.format;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupted, cancelling run");
                on_interrupt.cancel();
            }
            Err(err) => error!("unable to listen for shutdown signal: {err}"),
        }
    });

    // The pipeline blocks on its own worker threads.
    let report = tokio::task::spawn_blocking(move || run_job(&job, cancel)).await??;
    println!("{}", render(&report, format)?);
    Ok(())
}
