//! herdtrack CLI - Debug tool for clustering and path reconstruction
//!
//! Usage:
//!   herdtrack-cli cluster <points.json> [--zoom <level>] [--profile <json>] [--crs <crs>]
//!   herdtrack-cli path <points.json> --animal <id> [--after <rfc3339>] [--before <rfc3339>]
//!
//! Points files are JSON arrays of geolocations:
//! `[{"id": 1, "animal_id": 7, "timestamp": "2019-12-30T04:00:00Z", "position": {"x": 0.0, "y": 0.0}}]`.
//! Results are printed to stdout as JSON; diagnostics go to the log.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use herdtrack::{
    resolve_path, AnimalId, Crs, FarmId, GeoPoint, MemoryStore, PathBuilder, PathRequest,
    SpatialClusterer, ZoomKey, ZoomProfile,
};
use log::{error, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "herdtrack-cli")]
#[command(about = "Debug tool for geolocation clustering and animal paths", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Coordinate reference system of the input positions
    #[arg(long, global = true, value_enum, default_value_t = CrsArg::WebMercator)]
    crs: CrsArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum CrsArg {
    WebMercator,
    Wgs84,
}

impl From<CrsArg> for Crs {
    fn from(arg: CrsArg) -> Self {
        match arg {
            CrsArg::WebMercator => Crs::WebMercator,
            CrsArg::Wgs84 => Crs::Wgs84,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster latest positions at a zoom level
    Cluster {
        /// JSON file with one latest point per animal
        input: PathBuf,

        /// Zoom level; omit for the busiest-area overview
        #[arg(short, long)]
        zoom: Option<u8>,

        /// JSON zoom profile replacing the built-in table
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Reconstruct an animal's path
    Path {
        /// JSON file with geolocations
        input: PathBuf,

        /// Animal to trace
        #[arg(short, long)]
        animal: u64,

        /// Window start (RFC 3339)
        #[arg(long)]
        after: Option<DateTime<Utc>>,

        /// Window end (RFC 3339)
        #[arg(long)]
        before: Option<DateTime<Utc>>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let crs = Crs::from(cli.crs);
    let result = match cli.command {
        Commands::Cluster {
            input,
            zoom,
            profile,
        } => run_cluster(&input, zoom, profile.as_deref(), crs),
        Commands::Path {
            input,
            animal,
            after,
            before,
        } => run_path(&input, AnimalId(animal), after, before, crs),
    };

    match result {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Load a JSON array of geolocations
fn load_points(path: &Path) -> Result<Vec<GeoPoint>, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let points: Vec<GeoPoint> =
        serde_json::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))?;
    info!("Loaded {} points from {}", points.len(), path.display());
    Ok(points)
}

fn run_cluster(
    input: &Path,
    zoom: Option<u8>,
    profile: Option<&Path>,
    crs: Crs,
) -> Result<String, String> {
    let points = load_points(input)?;
    let profile = match profile {
        Some(path) => {
            let json =
                fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            ZoomProfile::from_json(&json).map_err(|e| e.to_string())?
        }
        None => ZoomProfile::default(),
    };

    let key = ZoomKey::from_query(zoom);
    let clusters = SpatialClusterer::new(&profile)
        .with_crs(crs)
        .cluster(&points, key)
        .map_err(|e| e.to_string())?;

    let singletons = clusters.iter().filter(|c| c.is_singleton()).count();
    info!(
        "Zoom {}: {} clusters ({} singletons)",
        key,
        clusters.len(),
        singletons
    );

    serde_json::to_string_pretty(&clusters).map_err(|e| e.to_string())
}

fn run_path(
    input: &Path,
    animal: AnimalId,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    crs: Crs,
) -> Result<String, String> {
    let points = load_points(input)?;

    let mut store = MemoryStore::new();
    store.register_animal(animal, FarmId(0));
    let stored = store.ingest_many(points.into_iter().filter(|p| p.animal_id == animal));
    info!("Animal {} has {} stored points", animal, stored);

    let request = PathRequest {
        animal_id: animal,
        time_after: after,
        time_before: before,
    };
    let resolved =
        resolve_path(&store, &request, &PathBuilder::new(crs)).map_err(|e| e.to_string())?;

    info!(
        "Path: {} points, {:.1} km ({:?})",
        resolved.path.point_count,
        resolved.path.length_m / 1000.0,
        resolved.fallback
    );

    serde_json::to_string_pretty(&resolved).map_err(|e| e.to_string())
}
