use std::path::PathBuf;

use anyhow::Context;
use artframe_core::{AssetService, PrefetchOutcome};
use artframe_model::CacheKind;
use artframe_server::{
    config::{Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions},
    routes,
    state::AppState,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "artframe-server")]
#[command(about = "Artwork catalog cache and prefetch daemon for the new-tab page")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    args: GlobalArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct GlobalArgs {
    /// Path to a TOML configuration file
    #[arg(long, env = "ARTFRAME_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Skip the startup warm-up sweep
    #[arg(long, global = true, default_value_t = false)]
    no_warm_up: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the daemon (default)
    Serve,
    /// Sync the catalog once and exit
    Sync,
    /// Clear persisted state and exit
    ClearCache {
        /// Which partition to clear: all, images or metadata
        #[arg(long, default_value = "all", value_parser = parse_cache_kind)]
        kind: CacheKind,
    },
}

fn parse_cache_kind(raw: &str) -> Result<CacheKind, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.args)?;

    let service = AssetService::open(config.asset.clone(), config.cache_root.clone())
        .context("failed to initialise asset service")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config, service).await,
        Command::Sync => {
            let outcome = service
                .sync()
                .await
                .context("catalog sync failed")?;
            info!(?outcome, "catalog sync finished");
            Ok(())
        }
        Command::ClearCache { kind } => {
            service
                .clear_cache(kind)
                .await
                .with_context(|| format!("failed to clear {kind} cache"))?;
            info!("cleared {} cache under {}", kind, config.cache_root.display());
            Ok(())
        }
    }
}

fn load_runtime_config(args: &GlobalArgs) -> anyhow::Result<Config> {
    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: args.config.clone(),
        env_file: args.env_file.clone(),
    })
    .load()
    .context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }
    if args.no_warm_up {
        config.warm_up = false;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Override via RUST_LOG.
                "info,artframe_core=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    info!(
        catalog.url = %config.asset.catalog_url,
        catalog.expiry = %humantime::format_duration(config.asset.metadata_expiry),
        cache.root = %config.cache_root.display(),
        cache.memory_capacity = config.asset.memory_cache_capacity,
        prefetch.window = config.asset.prefetch_window,
        "asset pipeline configuration in effect"
    );

    Ok(config)
}

async fn run_server(config: Config, service: AssetService) -> anyhow::Result<()> {
    if config.warm_up {
        let warm = service.clone();
        tokio::spawn(async move {
            match warm.warm_up().await {
                PrefetchOutcome::Completed(report) => {
                    info!(?report, "startup warm-up finished")
                }
                other => warn!(outcome = ?other, "startup warm-up incomplete"),
            }
        });
    }

    let app = routes::create_app(AppState::new(service));
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Starting Artframe daemon on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Artframe daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
