use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_agent::build_pollers;
use infrastructure::config::AgentConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Override Agent ID
    #[arg(long)]
    agent_id: Option<String>,

    /// Poll every device once and exit
    #[arg(long)]
    once: bool,
}

async fn run() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,edge_agent=debug,infrastructure=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Edge Agent starting");
    info!("Process ID: {}", std::process::id());
    info!("Config directory: {}", args.config_dir);

    let mut config = AgentConfig::load(&args.config_dir)?;
    if let Some(id) = args.agent_id {
        config.agent_id = id;
    }
    info!(
        agent_id = %config.agent_id,
        devices = config.devices.len(),
        "Loaded configuration"
    );

    let pollers = build_pollers(&config)?;
    if pollers.is_empty() {
        warn!("No enabled devices configured");
        return Ok(());
    }

    let cancel = CancellationToken::new();

    if args.once {
        for poller in pollers {
            poller.poll_once(&cancel).await?;
            poller.driver().dispose().await;
        }
        return Ok(());
    }

    let handles: Vec<_> = pollers
        .into_iter()
        .map(|poller| tokio::spawn(poller.run(cancel.clone())))
        .collect();

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
    }
    cancel.cancel();

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "Poller task failed");
        }
    }

    info!("Good bye!");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}
