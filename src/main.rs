use clap::Parser;
use elastic_dql::{ApiState, Config, RestApi};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Serve field listings, value suggestions and query compilation over HTTP
#[derive(Parser, Debug)]
#[command(name = "elastic-dql")]
#[command(about = "Compile filter expressions into search-engine bool queries", long_about = None)]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// HTTP port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Search-engine URL; repeat for several hosts (overrides the config file)
    #[arg(long = "engine-host")]
    engine_hosts: Vec<String>,

    /// Always query this index and ignore the `index` request parameter
    #[arg(long)]
    default_index: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if !args.engine_hosts.is_empty() {
        config.connection.hosts = args.engine_hosts;
    }
    if let Some(index) = args.default_index {
        config.api.default_index = Some(index);
        config.api.accept_index_param = false;
    }

    info!("Starting elastic-dql v{}", env!("CARGO_PKG_VERSION"));
    info!("Search engine: {}", config.connection.hosts.join(", "));
    match &config.api.default_index {
        Some(index) if !config.api.accept_index_param => info!("Fixed index: {}", index),
        _ => info!("Index taken from the request"),
    }

    let registry = Arc::new(config.build_registry()?);
    let state = ApiState::new(registry, config.api.clone());

    RestApi::start(state, &config.server.host, config.server.port).await?;

    info!("Shutting down...");
    Ok(())
}
