use clap::Parser;
use dcmindex_core::server::{serve, AppState};
use dcmindex_core::{Registry, Result, Settings};
use log::{error, info};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Read-only JSON API over a dcmindex registry
#[derive(Parser, Debug)]
#[command(name = "dcmserve")]
#[command(about = "Serve the dcmindex registry over HTTP")]
#[command(version)]
struct Cli {
    /// Settings file (TOML); a missing file means defaults
    #[arg(long, env = "DCMINDEX_CONFIG", default_value = "dcmindex.toml")]
    config: PathBuf,

    /// Storage root, overriding the settings file
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Listen address, overriding the settings file
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start the runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(&cli.config)?;
    if let Some(root) = cli.root {
        settings.storage.root = root;
    }
    let addr = match cli.bind {
        Some(addr) => addr,
        None => settings.bind_addr()?,
    };

    let registry = Registry::load_or_default(&settings.registry_path())?;
    let counts = registry.counts();
    info!(
        "Loaded {} patients, {} series, {} images from {}",
        counts.patients,
        counts.series,
        counts.images,
        settings.registry_path().display()
    );

    serve(Arc::new(AppState::new(registry, settings)), addr).await
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
