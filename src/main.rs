mod catalog;
mod config;
mod geometry;
mod predict;
mod regime;
mod report;
mod tracker;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::catalog::{Catalog, CatalogError, Satellite, SearchCriteria, VisibilityCriteria};
use crate::config::{Config, ConfigError};
use crate::geometry::ObserverLocation;
use crate::predict::{observe_at, predict_passes, PassSummary, PredictError};
use crate::regime::OrbitalRegime;
use crate::tracker::{FollowOptions, TrackEvent};

#[derive(Parser)]
#[command(name = "satwatch")]
#[command(about = "Satellite catalog, position and pass prediction")]
struct Cli {
    /// Config file (default: $HOME/.satwatch/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Observer as "lat, lon", overriding the config file
    #[arg(long, global = true)]
    observer: Option<String>,
    /// Observer altitude in meters, used with --observer
    #[arg(long, global = true, default_value_t = 0.0)]
    altitude: f64,
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalog statistics
    Stats,
    /// Show one satellite by NORAD id or exact name
    Get {
        norad_id: Option<u32>,
        #[arg(short = 'm', long)]
        name: Option<String>,
        #[arg(short, long)]
        tle: bool,
        #[arg(short, long)]
        position: bool,
        #[arg(short, long)]
        data: bool,
        /// TLE, position and metadata
        #[arg(short, long)]
        verbose: bool,
    },
    /// Search the catalog
    Search {
        #[command(flatten)]
        filters: Filters,
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
        /// Print full metadata for each match
        #[arg(short, long)]
        verbose: bool,
    },
    /// Satellites currently above the observer
    Visible {
        #[command(flatten)]
        filters: Filters,
        #[arg(long)]
        min_elevation: Option<f64>,
        #[arg(long)]
        max_elevation: Option<f64>,
        /// Evaluate at this time (RFC3339) instead of now
        #[arg(long, value_parser = parse_datetime)]
        at: Option<DateTime<Utc>>,
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
        /// Print full metadata for each visible satellite
        #[arg(short, long)]
        verbose: bool,
    },
    /// Predict passes of one satellite
    Passes {
        norad_id: u32,
        /// Window start (RFC3339); defaults to now
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        /// Window length, e.g. "24h"
        #[arg(long, value_parser = parse_duration)]
        window: Option<Duration>,
        /// Sampling step, e.g. "30s"
        #[arg(long, value_parser = parse_duration)]
        step: Option<Duration>,
        #[arg(long)]
        min_elevation: Option<f64>,
    },
    /// Print the live position once per tick and report rises and sets
    Follow {
        norad_id: u32,
        #[arg(long, value_parser = parse_interval, default_value = "1s")]
        interval: std::time::Duration,
        /// Stop after this many ticks
        #[arg(long)]
        count: Option<u64>,
        #[arg(long)]
        min_elevation: Option<f64>,
    },
}

#[derive(Args)]
struct Filters {
    /// Partial, case-insensitive name match
    #[arg(short, long)]
    name: Option<String>,
    #[arg(short, long)]
    owner: Option<String>,
    /// Object type, e.g. PAYLOAD, ROCKET BODY, DEBRIS
    #[arg(short = 't', long = "type")]
    object_type: Option<String>,
    /// LEO, MEO, GEO, HEO or UNKNOWN
    #[arg(short, long)]
    regime: Option<OrbitalRegime>,
}

impl From<Filters> for SearchCriteria {
    fn from(f: Filters) -> Self {
        SearchCriteria {
            name: f.name,
            owner: f.owner,
            object_type: f.object_type,
            regime: f.regime,
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Predict(#[from] PredictError),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Runtime(#[from] std::io::Error),
    #[error("observer location not configured; set observer.coordinates in the config file or pass --observer")]
    ObserverNotConfigured,
    #[error("invalid observer coordinates: {0}")]
    InvalidObserver(String),
    #[error("no satellite found matching the criteria")]
    NotFound,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

struct Context {
    config: Config,
    observer_override: Option<ObserverLocation>,
    json: bool,
}

impl Context {
    fn observer(&self) -> Result<ObserverLocation, AppError> {
        if let Some(observer) = self.observer_override {
            return Ok(observer);
        }
        self.config.observer()?.ok_or(AppError::ObserverNotConfigured)
    }

    fn catalog(&self) -> Result<Catalog, AppError> {
        let catalog = &self.config.catalog;
        Ok(Catalog::load(
            &catalog.tle_path,
            catalog.satcat_file.as_deref(),
        )?)
    }

    fn emit<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = Config::load_or_default(&config_path)?;
    let observer_override = cli
        .observer
        .map(|coords| {
            ObserverLocation::from_coordinates(&coords, Some(cli.altitude))
                .ok_or(AppError::InvalidObserver(coords))
        })
        .transpose()?;
    let ctx = Context {
        config,
        observer_override,
        json: cli.json,
    };

    match cli.command.unwrap_or(Commands::Stats) {
        Commands::Stats => stats(&ctx),
        Commands::Get {
            norad_id,
            name,
            tle,
            position,
            data,
            verbose,
        } => {
            let (tle, position, data) = if verbose {
                (true, true, true)
            } else if !tle && !position && !data {
                (true, false, false)
            } else {
                (tle, position, data)
            };
            get(&ctx, norad_id, name.as_deref(), tle, position, data)
        }
        Commands::Search {
            filters,
            limit,
            verbose,
        } => search(&ctx, filters.into(), limit, verbose),
        Commands::Visible {
            filters,
            min_elevation,
            max_elevation,
            at,
            limit,
            verbose,
        } => {
            let defaults = &ctx.config.defaults;
            let criteria = VisibilityCriteria {
                search: filters.into(),
                min_elevation_deg: min_elevation.unwrap_or(defaults.min_elevation_deg),
                max_elevation_deg: max_elevation.unwrap_or(defaults.max_elevation_deg),
            };
            visible(&ctx, &criteria, at.unwrap_or_else(Utc::now), limit, verbose)
        }
        Commands::Passes {
            norad_id,
            start,
            window,
            step,
            min_elevation,
        } => {
            let defaults = &ctx.config.defaults;
            let start = start.unwrap_or_else(Utc::now);
            let window = window.unwrap_or(to_chrono(defaults.window));
            let step = step.unwrap_or(to_chrono(defaults.step));
            let min_el = min_elevation.unwrap_or(defaults.min_elevation_deg);
            let end = start.checked_add_signed(window).ok_or_else(|| {
                PredictError::InvalidWindow(format!(
                    "window of {} runs past the supported date range",
                    window
                ))
            })?;
            passes(&ctx, norad_id, start, end, step, min_el)
        }
        Commands::Follow {
            norad_id,
            interval,
            count,
            min_elevation,
        } => {
            let options = FollowOptions {
                tick: interval,
                min_elevation_deg: min_elevation.unwrap_or(ctx.config.defaults.min_elevation_deg),
                max_ticks: count,
            };
            follow(&ctx, norad_id, options)
        }
    }
}

fn stats(ctx: &Context) -> Result<(), AppError> {
    let catalog = ctx.catalog()?;
    let stats = catalog.stats();
    if ctx.json {
        return ctx.emit(&stats);
    }
    report::print_stats(&stats);
    Ok(())
}

fn get(
    ctx: &Context,
    norad_id: Option<u32>,
    name: Option<&str>,
    show_tle: bool,
    show_position: bool,
    show_data: bool,
) -> Result<(), AppError> {
    let catalog = ctx.catalog()?;
    let matches = catalog::filter(&catalog.satellites, norad_id, name);
    if matches.is_empty() {
        return Err(AppError::NotFound);
    }
    if ctx.json {
        return ctx.emit(&matches);
    }

    let observer = if show_position {
        match ctx.observer() {
            Ok(observer) => Some(observer),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    } else {
        None
    };

    for (i, sat) in matches.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "-".repeat(60));
        }
        if show_tle {
            report::print_tle(sat);
        }
        if let Some(observer) = &observer {
            match observe_at(&sat.tle.propagator, observer, Utc::now()) {
                Ok(angles) => report::print_position(&angles),
                Err(e) => println!("Position unavailable: {}", e),
            }
        }
        if show_data {
            report::print_metadata(sat);
        }
    }
    Ok(())
}

fn search(
    ctx: &Context,
    criteria: SearchCriteria,
    limit: usize,
    verbose: bool,
) -> Result<(), AppError> {
    let catalog = ctx.catalog()?;
    let results = catalog::search(&catalog.satellites, &criteria);
    let shown = apply_limit(&results, limit);
    if ctx.json {
        return ctx.emit(&shown);
    }
    if results.is_empty() {
        println!("No satellites found matching the search criteria.");
        return Ok(());
    }

    println!("Found {} satellites\n", results.len());
    if verbose {
        print_each_metadata(shown.iter().copied());
    } else {
        report::print_search_results(shown);
    }
    if shown.len() < results.len() {
        println!(
            "\n... {} more. Use --limit to show more.",
            results.len() - shown.len()
        );
    }
    Ok(())
}

fn visible(
    ctx: &Context,
    criteria: &VisibilityCriteria,
    at: DateTime<Utc>,
    limit: usize,
    verbose: bool,
) -> Result<(), AppError> {
    let observer = ctx.observer()?;
    let catalog = ctx.catalog()?;
    let visible = catalog::find_visible(&catalog.satellites, &observer, at, criteria);
    let shown = apply_limit(&visible, limit);
    if ctx.json {
        return ctx.emit(&shown);
    }
    if visible.is_empty() {
        println!(
            "No satellites visible (elevation between {:.1}° and {:.1}°).",
            criteria.min_elevation_deg, criteria.max_elevation_deg
        );
        return Ok(());
    }

    println!("Found {} visible satellites", visible.len());
    report::print_visible(shown, &observer, at);
    if verbose {
        println!();
        print_each_metadata(shown.iter().map(|v| v.satellite));
    }
    Ok(())
}

fn passes(
    ctx: &Context,
    norad_id: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    min_elevation_deg: f64,
) -> Result<(), AppError> {
    let observer = ctx.observer()?;
    let catalog = ctx.catalog()?;
    let sat = find_one(&catalog.satellites, norad_id)?;

    let summaries: Vec<PassSummary> = predict_passes(
        &sat.tle.propagator,
        &observer,
        start,
        end,
        step,
        min_elevation_deg,
    )?
    .iter()
    .map(|p| p.summary(&sat.name, sat.norad_id))
    .collect();

    if ctx.json {
        return ctx.emit(&summaries);
    }

    println!(
        "{} (NORAD {}): {} passes above {:.1}° between {} and {}\n",
        sat.name,
        sat.norad_id,
        summaries.len(),
        min_elevation_deg,
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    );
    report::print_passes(&summaries);
    Ok(())
}

fn follow(ctx: &Context, norad_id: u32, options: FollowOptions) -> Result<(), AppError> {
    let observer = ctx.observer()?;
    let catalog = ctx.catalog()?;
    let sat = find_one(&catalog.satellites, norad_id)?;
    let json = ctx.json;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    println!("Following {} (NORAD {}). Press Ctrl+C to stop.", sat.name, sat.norad_id);

    let summary = runtime.block_on(async {
        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = stop_tx.send(());
            }
        });

        tracker::follow(&sat.tle.propagator, observer, options, stop_rx, |event| {
            print_track_event(event, &sat.name, sat.norad_id, json)
        })
        .await
    })?;

    if json {
        ctx.emit(&summary)?;
    } else {
        println!(
            "\nExiting follow mode: {} ticks, {} skipped, {} passes completed.",
            summary.ticks, summary.skipped, summary.completed_passes
        );
    }
    Ok(())
}

fn print_track_event(event: &TrackEvent, name: &str, norad_id: u32, json: bool) {
    match event {
        TrackEvent::Sample { angles, .. } if json => {
            if let Ok(line) = serde_json::to_string(angles) {
                println!("{}", line);
            }
        }
        TrackEvent::Sample { angles, visible } => {
            println!(
                "{}  El {:7.2}°  Az {:7.2}°  Range {:8.0} km  Rate {:6.2} km/s{}",
                angles.timestamp.format("%H:%M:%S"),
                angles.elevation_deg,
                angles.azimuth_deg,
                angles.range_km,
                angles.range_rate_km_s,
                if *visible { "  [visible]" } else { "" }
            );
        }
        TrackEvent::Rise(angles) => {
            log::info!("{} rose above threshold at az {:.1}°", name, angles.azimuth_deg);
        }
        TrackEvent::Set(pass) => {
            let summary = pass.summary(name, norad_id);
            log::info!(
                "{} set after {}s, max elevation {:.1}°",
                name,
                summary.duration_seconds,
                summary.max_elevation_deg
            );
        }
        TrackEvent::Skipped { timestamp, reason } => {
            if !json {
                println!("{}  position unavailable: {}", timestamp.format("%H:%M:%S"), reason);
            }
        }
    }
}

fn print_each_metadata<'a>(satellites: impl Iterator<Item = &'a Satellite>) {
    for (i, sat) in satellites.enumerate() {
        if i > 0 {
            println!("\n{}", "-".repeat(60));
        }
        report::print_metadata(sat);
    }
}

fn find_one(satellites: &[Satellite], norad_id: u32) -> Result<&Satellite, AppError> {
    catalog::filter(satellites, Some(norad_id), None)
        .into_iter()
        .next()
        .ok_or(AppError::NotFound)
}

fn apply_limit<T>(items: &[T], limit: usize) -> &[T] {
    if limit > 0 && items.len() > limit {
        &items[..limit]
    } else {
        items
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

fn parse_interval(s: &str) -> Result<std::time::Duration, String> {
    let interval = humantime::parse_duration(s.trim()).map_err(|e| e.to_string())?;
    if interval.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(interval)
}

fn to_chrono(d: std::time::Duration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::seconds(30))
}
