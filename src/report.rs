use chrono::{DateTime, Utc};

use crate::catalog::{CatalogStats, Satellite, VisibleSatellite};
use crate::geometry::{ObservationAngles, ObserverLocation};
use crate::predict::PassSummary;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn print_stats(stats: &CatalogStats) {
    println!("Catalog Statistics");
    println!("==================");
    println!("Satellites:      {}", stats.satellites);
    println!("With metadata:   {}", stats.with_metadata);
    println!("Loaded:          {}", stats.loaded_at.format(TIME_FORMAT));
    println!();
    for (regime, count) in &stats.by_regime {
        println!("  {:<8} {}", regime.to_string(), count);
    }
}

pub fn print_tle(sat: &Satellite) {
    println!("0 {}", sat.name);
    println!("{}", sat.tle.line1);
    println!("{}", sat.tle.line2);
}

pub fn print_position(angles: &ObservationAngles) {
    println!(
        "Current Position (as of {}):",
        angles.timestamp.format(TIME_FORMAT)
    );
    println!("  Elevation:    {:7.2}°", angles.elevation_deg);
    println!("  Azimuth:      {:7.2}°", angles.azimuth_deg);
    println!("  Range:        {:10.0} km", angles.range_km);
    println!("  Range Rate:   {:8.2} km/s", angles.range_rate_km_s);
}

pub fn print_metadata(sat: &Satellite) {
    println!("Name:           {}", sat.name);
    println!("NORAD ID:       {}", sat.norad_id);
    println!("Orbit Regime:   {}", sat.regime);
    println!("TLE Source:     {}", sat.tle.source);

    let Some(meta) = &sat.metadata else {
        println!("(no catalog metadata)");
        return;
    };

    let optional = [
        ("International:", &meta.intl_id),
        ("Type:", &meta.object_type),
        ("Owner:", &meta.owner),
        ("Launch Date:", &meta.launch_date),
        ("Decay Date:", &meta.decay_date),
        ("Launch Site:", &meta.launch_site),
    ];
    for (label, value) in optional {
        if !value.is_empty() {
            println!("{:<15} {}", label, value);
        }
    }

    println!("\nOrbital Parameters:");
    if meta.period > 0.0 {
        println!("  Period:       {:.2} minutes", meta.period);
    }
    if meta.inclination != 0.0 {
        println!("  Inclination:  {:.2}°", meta.inclination);
    }
    if meta.apogee > 0.0 {
        println!("  Apogee:       {:.0} km", meta.apogee);
    }
    if meta.perigee > 0.0 {
        println!("  Perigee:      {:.0} km", meta.perigee);
    }
    if !meta.rcs_size.is_empty() {
        println!("  RCS Size:     {}", meta.rcs_size);
    }
}

pub fn print_search_results(results: &[&Satellite]) {
    println!(
        "{:<8}  {:<40}  {:<7}  {:<12}  {:<8}",
        "NORAD", "Name", "Regime", "Type", "Owner"
    );
    println!("{}", "-".repeat(84));
    for sat in results {
        println!(
            "{:<8}  {:<40}  {:<7}  {:<12}  {:<8}",
            sat.norad_id,
            truncate(&sat.name, 40),
            sat.regime.to_string(),
            truncate(sat.object_type(), 12),
            sat.owner()
        );
    }
}

pub fn print_visible(visible: &[VisibleSatellite], observer: &ObserverLocation, at: DateTime<Utc>) {
    println!(
        "Observer: {:.4}°N, {:.4}°E, {:.0}m",
        observer.latitude_deg, observer.longitude_deg, observer.altitude_m
    );
    println!("Time: {}\n", at.format(TIME_FORMAT));
    println!(
        "{:<8}  {:<40}  {:>7}  {:>7}  {:>11}",
        "NORAD", "Name", "El (°)", "Az (°)", "Range (km)"
    );
    println!("{}", "-".repeat(80));
    for v in visible {
        println!(
            "{:<8}  {:<40}  {:7.2}  {:7.2}  {:11.0}",
            v.satellite.norad_id,
            truncate(&v.satellite.name, 40),
            v.angles.elevation_deg,
            v.angles.azimuth_deg,
            v.angles.range_km
        );
    }
}

pub fn print_passes(passes: &[PassSummary]) {
    println!(
        "{:<20}  {:<20}  {:>7}  {:>7}  {:>7}  {:>8}",
        "AOS", "LOS", "Max El", "AOS Az", "LOS Az", "Duration"
    );
    println!("{}", "-".repeat(80));
    for p in passes {
        println!(
            "{:<20}  {:<20}  {:7.2}  {:7.2}  {:7.2}  {:>5}:{:02}",
            p.aos.format("%Y-%m-%d %H:%M:%S").to_string(),
            p.los.format("%Y-%m-%d %H:%M:%S").to_string(),
            p.max_elevation_deg,
            p.aos_azimuth_deg,
            p.los_azimuth_deg,
            p.duration_seconds / 60,
            p.duration_seconds % 60
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).chain(['…']).collect()
    }
}
