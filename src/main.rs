use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;

use selfbot::application::events::{AgentEvent, EventBus};
use selfbot::domain::traits::Store;
use selfbot::infrastructure::adapters::ConsoleAdapter;
use selfbot::infrastructure::config::{production_from_env, Config, ConfigSource};
use selfbot::infrastructure::storage::SqliteStore;
use selfbot::plugins::builtin_catalog;
use selfbot::Agent;

#[derive(Parser)]
#[command(name = "selfbot")]
#[command(about = "A self-operating chat agent with hot-reloadable plugins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent on the console transport
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_agent(&cli.config) {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("selfbot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_agent(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let production = production_from_env();
    let source = ConfigSource::file(config_path).with_production(production);

    let config = source.load_or_default()?;

    tracing::info!(
        "Starting {} ({} mode)",
        config.bot.name,
        if production { "production" } else { "development" }
    );

    let store: Option<Arc<dyn Store>> = match &config.storage.path {
        Some(path) => match SqliteStore::open(path) {
            Ok(store) => {
                tracing::info!("Database initialized at {}", path.display());
                Some(Arc::new(store) as Arc<dyn Store>)
            }
            Err(e) => {
                tracing::error!("Failed to initialize database: {}", e);
                None
            }
        },
        None => {
            tracing::info!("No storage configured; store-backed commands will not load");
            None
        }
    };

    let grace = Duration::from_secs(config.runtime.shutdown_grace_secs);
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let transport = Arc::new(ConsoleAdapter::new(config.bot.name.clone()));
        let agent = Agent::new(transport, builtin_catalog(), source, config, store);
        tokio::spawn(log_events(agent.events().clone(), production));

        tokio::select! {
            result = agent.run() => {
                if let Err(e) = result {
                    tracing::error!("Agent stopped: {}", e);
                }
            }
            _ = shutdown_signal() => {
                tracing::info!("Shutdown signal received");
            }
        }

        match tokio::time::timeout(grace, agent.stop()).await {
            Ok(Ok(())) => tracing::info!("Shutdown complete"),
            Ok(Err(e)) => tracing::warn!("Shutdown finished with error: {}", e),
            Err(_) => tracing::warn!("Shutdown exceeded {:?}, exiting anyway", grace),
        }
    });

    // The console reader may still be parked on stdin.
    rt.shutdown_timeout(grace);
    Ok(())
}

/// Log lifecycle events and everything sent to the error channel
async fn log_events(events: EventBus, production: bool) {
    let mut rx = events.subscribe();
    loop {
        match rx.recv().await {
            Ok(AgentEvent::Connected { user }) => {
                tracing::info!("Agent connected: @{}", user.display_name())
            }
            Ok(AgentEvent::Ready) => tracing::info!("Agent ready"),
            Ok(AgentEvent::Error(e)) if production => tracing::error!("{}", e),
            Ok(AgentEvent::Error(e)) => tracing::error!("{:?}", e),
            Ok(AgentEvent::End) => tracing::info!("Agent session ended"),
            Err(RecvError::Lagged(missed)) => tracing::warn!("Event log skipped {} events", missed),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_config() {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("{}", e),
    }
}
