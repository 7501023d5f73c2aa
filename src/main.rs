mod config;
mod dashboard;
mod iss;
mod orbit;
mod types;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::config::Config;
use crate::dashboard::{HeadlessMap, HttpApi, Session, SessionSettings};
use crate::orbit::{look_angles, subpoint, Catalog};

#[derive(Parser)]
#[command(name = "sat-watch")]
#[command(about = "Satellite and ISS tracking dashboard")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the position service and web dashboard
    Serve,
    /// Follow the service from the terminal
    Watch {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Print where a satellite is right now
    Locate { id: u32 },
    /// Validate a configuration file
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Watch { lat, lon } => watch(config, lat, lon).await,
        Commands::Locate { id } => locate(config, id).await,
        Commands::CheckConfig => check_config(&config),
    }
}

async fn serve(config: Config) -> ExitCode {
    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn watch(config: Config, lat: Option<f64>, lon: Option<f64>) -> ExitCode {
    let settings_cfg = &config.dashboard;

    let mut settings = match SessionSettings::from_config(settings_cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid dashboard location: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let api = match HttpApi::new(&settings_cfg.server_url, settings_cfg.request_timeout) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            if let Err(e) = settings.override_position(lat, lon) {
                eprintln!("Invalid --lat/--lon: {}", e);
                return ExitCode::FAILURE;
            }
        }
        (None, None) => {}
        _ => {
            eprintln!("--lat and --lon must be given together");
            return ExitCode::FAILURE;
        }
    }

    let session = Session::new(api, HeadlessMap::new(), settings);

    log::info!("Watching {}", settings_cfg.server_url);

    match dashboard::runner::run(session).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Dashboard error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn locate(config: Config, id: u32) -> ExitCode {
    let mut catalog = match Catalog::new(
        config.catalog.source(),
        config.catalog.cache_for,
        config.catalog.timeout,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to set up catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = catalog.ensure_fresh().await {
        log::warn!("Catalog load failed: {}", e);
    }

    let entry = match catalog.fetch_one(id).await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            eprintln!("Satellite {} not found", id);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Lookup of {} failed: {}", id, e);
            return ExitCode::FAILURE;
        }
    };

    let now = chrono::Utc::now();
    let sp = match subpoint(entry, now) {
        Ok(sp) => sp,
        Err(e) => {
            eprintln!("Propagation error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{} ({}) at {}", entry.name, entry.norad_id, now);
    println!("  elements:  {}", entry.source);
    println!("  latitude:  {:.4}", sp.latitude_deg);
    println!("  longitude: {:.4}", sp.longitude_deg);
    println!("  altitude:  {:.1} km", sp.altitude_km);
    println!("  velocity:  {:.3} km/s", sp.velocity_km_s);

    if let Ok(Some(observer)) = config.dashboard.observer() {
        match look_angles(&observer, entry, now) {
            Ok(angles) => println!(
                "  from {:.4}, {:.4}: az {:.1} el {:.1} range {:.0} km",
                observer.latitude_deg,
                observer.longitude_deg,
                angles.azimuth_deg,
                angles.elevation_deg,
                angles.range_km
            ),
            Err(e) => log::warn!("Look angles unavailable: {}", e),
        }
    }

    ExitCode::SUCCESS
}

fn check_config(config: &Config) -> ExitCode {
    // Loading already validated it.
    println!("Config is valid");
    println!("  bind:      {}", config.web.bind);
    match config.catalog.tle_folder.as_ref() {
        Some(folder) => println!("  catalog:   folder {}", folder.display()),
        None => println!(
            "  catalog:   {} group {}",
            config.catalog.celestrak_url, config.catalog.group
        ),
    }
    println!("  iss feed:  {}", config.iss.url);
    println!(
        "  dashboard: {} every {}s, radius {}°",
        config.dashboard.server_url,
        config.dashboard.refresh_secs(),
        config.dashboard.radius
    );
    ExitCode::SUCCESS
}
