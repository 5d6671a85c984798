use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medstock::config::Config;
use medstock::facility::FacilityType;
use medstock::geo::Coordinates;
use medstock::ledger::InventoryLedger;
use medstock::notifications::NoopBroadcaster;
use medstock::resolver::{NearestFacilityResolver, NearestQuery, DEFAULT_NEAREST_COUNT};
use medstock::server::InventoryServer;

#[derive(Parser)]
#[command(
    name = "medstock",
    version,
    about = "Hospital supply inventory with ventilator tracking and nearest-facility routing",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configuration file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP and WebSocket server
    Serve {
        /// Bind address, overrides configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Rank facilities by distance from a point
    Nearest {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Number of facilities to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_NEAREST_COUNT)]
        count: usize,

        /// Only facilities holding at least this many ventilators
        #[arg(long)]
        min_ventilators: Option<u64>,
    },

    /// List registered facilities
    Facilities {
        /// Filter by region
        #[arg(short, long)]
        region: Option<String>,

        /// Filter by facility type (e.g. "Major Hospital")
        #[arg(short = 't', long = "type")]
        facility_type: Option<String>,
    },

    /// Show ventilator totals per facility
    Ventilators,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("medstock starting");

    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await?,
        Commands::Nearest {
            lat,
            lng,
            count,
            min_ventilators,
        } => nearest(&config, lat, lng, count, min_ventilators).await?,
        Commands::Facilities {
            region,
            facility_type,
        } => facilities(&config, region, facility_type)?,
        Commands::Ventilators => ventilators(&config).await?,
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("medstock=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("medstock={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Ledger without broadcast targets, for one-shot commands
fn offline_ledger(config: &Config) -> Result<InventoryLedger> {
    let registry = Arc::new(config.load_registry().context("Failed to load registry")?);
    let store = config.open_store().context("Failed to open store")?;
    Ok(InventoryLedger::new(
        registry,
        store,
        Arc::new(NoopBroadcaster),
        config.ledger_config(),
    ))
}

async fn serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {bind}"))?;
    }

    if let Err(e) = medstock::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics disabled");
    }

    let server = InventoryServer::from_config(&config).context("Failed to create server")?;

    println!("{}", server.info().display());
    println!();
    println!("Listening on http://{}", config.server.bind_address);
    println!("Press Ctrl+C to stop.\n");

    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "Failed to wait for Ctrl+C"),
            }
        })
        .await?;

    println!("Server stopped.");
    Ok(())
}

async fn nearest(
    config: &Config,
    lat: f64,
    lng: f64,
    count: usize,
    min_ventilators: Option<u64>,
) -> Result<()> {
    let origin = Coordinates::new(lat, lng)?;
    let ledger = offline_ledger(config)?;
    let resolver = NearestFacilityResolver::new(Arc::clone(ledger.registry()));

    let mut query = NearestQuery::count(count);
    query.min_ventilators = min_ventilators;
    let counts = ledger.ventilator_counts().await?;
    let results = resolver.find_nearest_with(origin, &query, Some(&counts))?;

    println!("Nearest facilities to ({lat}, {lng}):");
    println!("{:-<72}", "");
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>2}. {:<36} {:>8.2} km  ventilators: {}",
            rank + 1,
            result.facility.name,
            result.distance,
            result.ventilators.unwrap_or(0)
        );
    }
    if results.is_empty() {
        println!("No facilities matched.");
    }
    Ok(())
}

fn facilities(
    config: &Config,
    region: Option<String>,
    facility_type: Option<String>,
) -> Result<()> {
    let registry = config.load_registry().context("Failed to load registry")?;

    let kind = match facility_type.as_deref() {
        Some(raw) => Some(
            FacilityType::parse(raw).with_context(|| format!("Unknown facility type: {raw}"))?,
        ),
        None => None,
    };

    let selected: Vec<_> = registry
        .all()
        .iter()
        .filter(|f| region.as_deref().map_or(true, |r| f.region == r))
        .filter(|f| kind.map_or(true, |k| f.facility_type == k))
        .collect();

    println!(
        "{:<36} {:<18} {:<10} {:>8} {:>6}",
        "Name", "Type", "Region", "Capacity", "Vents"
    );
    println!("{:-<82}", "");
    for facility in &selected {
        println!(
            "{:<36} {:<18} {:<10} {:>8} {:>6}",
            facility.name,
            facility.facility_type.as_str(),
            facility.region,
            facility.capacity,
            facility.ventilator_capacity
        );
    }
    println!("\n{} facilities", selected.len());
    Ok(())
}

async fn ventilators(config: &Config) -> Result<()> {
    let ledger = offline_ledger(config)?;
    let status = ledger.ventilator_status().await?;

    println!(
        "{:<36} {:>6} {:>9} {:>6} {:>6} {:>6} {:>7}",
        "Facility", "Limit", "Available", "InUse", "Maint", "Down", "Util%"
    );
    println!("{:-<84}", "");
    for row in &status {
        println!(
            "{:<36} {:>6} {:>9} {:>6} {:>6} {:>6} {:>7.1}",
            row.name,
            row.total,
            row.available,
            row.in_use,
            row.maintenance,
            row.out_of_order,
            row.utilization
        );
    }
    Ok(())
}
