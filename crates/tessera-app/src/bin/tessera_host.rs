//! Headless host for the Tessera dashboard core
//!
//! Runs the state container against the local store and a real MQTT broker,
//! for scripting and for checking a broker setup without a frontend.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tessera_app::{
    AppConfig, ConnectionConfig, DashboardCore, EnvironmentId, Intent, LocalStore, NoticeStream,
    Stores, ToastLevel,
};
use tessera_bus::MqttBusClient;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera-host")]
#[command(about = "Tessera dashboard core, without a frontend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save broker credentials and check that they connect
    Connect {
        /// Broker host
        #[arg(long)]
        host: String,

        /// Broker port
        #[arg(long, default_value = "1883")]
        port: u16,

        /// MQTT client id
        #[arg(long, default_value = "tessera-host")]
        client_id: String,

        /// User name
        #[arg(short, long, default_value = "")]
        username: String,

        /// Password
        #[arg(short, long, default_value = "")]
        password: String,
    },

    /// Connect with the saved credentials and log state changes until Ctrl-C
    Run,

    /// List saved environments
    Environments,

    /// Export an environment to a layout file
    Export {
        /// Target file
        path: PathBuf,

        /// Environment to export (defaults to the last used one)
        #[arg(short, long)]
        environment: Option<i64>,
    },

    /// Import a layout file as a new environment
    Import {
        /// Source file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| tessera_app::default_storage_path().join("config.toml"));
    let config = AppConfig::load_or_default(&config_path);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = match config.store_path() {
        Some(path) => LocalStore::open(&path)
            .await
            .with_context(|| format!("opening store at {}", path.display()))?,
        None => LocalStore::in_memory(),
    };
    let stores = Stores::local(Arc::new(store));
    let bus = Arc::new(MqttBusClient::new(config.bus.clone()));
    let (core, notices) = DashboardCore::start(&config, stores, bus);

    let result = match cli.command {
        Commands::Connect {
            host,
            port,
            client_id,
            username,
            password,
        } => {
            let connection = ConnectionConfig {
                client_id,
                host,
                port,
                username,
                password,
            };
            connect(&core, connection).await
        }
        Commands::Run => run(&core, notices).await,
        Commands::Environments => list_environments(&core).await,
        Commands::Export { path, environment } => export(&core, path, environment).await,
        Commands::Import { path } => import(&core, path).await,
    };

    core.shutdown().await;
    result
}

async fn import(core: &DashboardCore, path: PathBuf) -> Result<()> {
    let environment = core
        .import_layout(&path)
        .await
        .with_context(|| format!("importing {}", path.display()))?;
    println!(
        "Imported \"{}\" as environment {}",
        environment.name, environment.id
    );
    Ok(())
}

async fn connect(core: &DashboardCore, connection: ConnectionConfig) -> Result<()> {
    let endpoint = connection.endpoint();
    core.execute(Intent::Connect(connection))
        .await
        .with_context(|| format!("connecting to {endpoint}"))?;
    println!("Connected to {endpoint}; credentials saved");
    core.execute(Intent::Disconnect).await?;
    Ok(())
}

async fn run(core: &DashboardCore, mut notices: NoticeStream) -> Result<()> {
    core.dispatch(Intent::LoadEnvironments);
    core.dispatch(Intent::Init);
    match core.load_previous_environment().await? {
        Some(environment) => tracing::info!(name = %environment.name, "Opened environment"),
        None => tracing::info!("No environment yet"),
    }
    core.execute(Intent::ConnectSaved)
        .await
        .context("connecting with saved credentials")?;

    let mut states = core.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            notice = notices.recv() => {
                let Some(notice) = notice else { break };
                match notice.level() {
                    ToastLevel::Info => tracing::info!("{}", notice.message()),
                    ToastLevel::Warning => tracing::warn!("{}", notice.message()),
                    ToastLevel::Error => tracing::error!("{}", notice.message()),
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                for view in &state.widgets {
                    tracing::debug!(widget = %view.widget.label, value = %view.value, "Widget");
                }
                tracing::info!(
                    environment = %state.environment.name,
                    connected = state.connected,
                    widgets = state.widgets.len(),
                    "State changed"
                );
            }
        }
    }

    if let Err(error) = core.execute(Intent::Disconnect).await {
        tracing::warn!(%error, "Disconnect failed");
    }
    Ok(())
}

async fn list_environments(core: &DashboardCore) -> Result<()> {
    let mut states = core.subscribe();
    core.execute(Intent::LoadEnvironments).await?;
    // The list is mirrored into state by a standing subscription.
    let listed = tokio::time::timeout(
        Duration::from_millis(200),
        states.wait_for(|s| !s.environments.is_empty()),
    )
    .await;
    let environments = match listed {
        Ok(Ok(state)) => state.environments.clone(),
        _ => Vec::new(),
    };
    if environments.is_empty() {
        println!("No environments");
    }
    for environment in &environments {
        println!("{:>4}  {}", environment.id.0, environment.name);
    }
    Ok(())
}

async fn export(core: &DashboardCore, path: PathBuf, environment: Option<i64>) -> Result<()> {
    if let Some(id) = environment {
        core.execute(Intent::ChangeEnvironment(EnvironmentId(id)))
            .await
            .with_context(|| format!("opening environment {id}"))?;
    }
    let environment = core.export_layout(&path).await?;
    println!(
        "Exported \"{}\" to {}",
        environment.name,
        path.display()
    );
    Ok(())
}
