//! Glucose Insights
//!
//! Imports glucose readings into a local database and analyzes them.
//!
//! Usage:
//!   glucose-insights import <file.json>        - Import readings
//!   glucose-insights analyze [days]            - Print the analysis as JSON
//!   glucose-insights summary [days]            - Print a text summary
//!   glucose-insights export [out.json] [days]  - Write the analysis to a file
//!   glucose-insights list [days]               - List stored readings
//!   glucose-insights note <id> <text>          - Attach a note to a reading
//!   GLUCOSE_INSIGHTS_DBG=1 glucose-insights analyze - Enable debug output

use std::env;
use std::fs;
use std::path::PathBuf;

use chrono::Local;
use log::{info, warn};

use glucose_insights::config::{
    config_file_path, default_database_path, default_export_dir, ensure_data_dir, get_data_dir,
    Config,
};
use glucose_insights::export::{default_report_path, export_to_json, render_summary};
use glucose_insights::storage::{Storage, StoredReading};
use glucose_insights::{AnalysisReport, GlucoseAnalyzer, GlucoseReading, InsightsError};

fn main() -> Result<(), InsightsError> {
    let args: Vec<String> = env::args().collect();

    // Check for debug mode
    let debug_mode = env::var("GLUCOSE_INSIGHTS_DBG").is_ok();

    // Initialize logger
    if debug_mode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    }

    // Ensure data directory exists
    if let Err(e) = ensure_data_dir() {
        eprintln!("Warning: Could not create data directory: {}", e);
    }

    // Create default config if it doesn't exist
    let cfg_path = config_file_path();
    if !cfg_path.exists() {
        if let Err(e) = Config::create_default(&cfg_path) {
            warn!("Could not create default config: {}", e);
        }
    }

    // Try loading config from data directory first, then current directory
    let config = Config::load(config_file_path())
        .or_else(|_| Config::load("config.txt"))
        .unwrap_or_else(|e| {
            warn!("Could not load config: {}. Using defaults.", e);
            Config::default()
        });

    // Use configured path or default OS-specific path
    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(|| default_database_path().to_string_lossy().to_string());

    match args.get(1).map(|s| s.as_str()) {
        Some("import") => {
            let file = args
                .get(2)
                .ok_or_else(|| InsightsError::InvalidArgument("import needs a JSON file".into()))?;
            cmd_import(&db_path, file)?;
        }
        Some("analyze") => {
            let report = cmd_analyze(&config, &db_path, args.get(2))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some("summary") => {
            let report = cmd_analyze(&config, &db_path, args.get(2))?;
            print!("{}", render_summary(&report));
        }
        Some("export") => {
            cmd_export(&config, &db_path, &args[2..])?;
        }
        Some("list") => {
            cmd_list(&config, &db_path, args.get(2))?;
        }
        Some("note") => {
            let id = args
                .get(2)
                .ok_or_else(|| InsightsError::InvalidArgument("note needs a reading id".into()))?;
            cmd_note(&db_path, id, &args[3..].join(" "))?;
        }
        Some("--version") | Some("-V") => {
            println!("glucose-insights {}", env!("CARGO_PKG_VERSION"));
        }
        Some("path") | Some("paths") => {
            cmd_show_paths();
        }
        _ => {
            print_help();
        }
    }

    Ok(())
}

/// Import readings from a JSON array
fn cmd_import(db_path: &str, file: &str) -> Result<(), InsightsError> {
    let contents = fs::read_to_string(file)?;
    let readings: Vec<GlucoseReading> = serde_json::from_str(&contents)?;

    let storage = Storage::new(db_path)?;
    let new_count = storage.import_readings(&readings)?;
    let total_count = storage.count()?;
    let skipped_count = readings.len() - new_count;

    info!("Imported {} new readings ({} in file, {} total in database)",
          new_count, readings.len(), total_count);

    eprintln!("Read {} readings from {}", readings.len(), file);
    eprintln!("  New entries:     {}", new_count);
    eprintln!("  Duplicates:      {} (skipped)", skipped_count);
    eprintln!("  Total in DB:     {}", total_count);
    eprintln!("Saved to: {}", db_path);
    Ok(())
}

fn parse_days(config: &Config, days: Option<&String>) -> Result<u32, InsightsError> {
    match days {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| InsightsError::InvalidArgument(format!("invalid number of days: {}", s))),
        None => Ok(config.days_back),
    }
}

/// Load the requested window from the database and analyze it
fn cmd_analyze(
    config: &Config,
    db_path: &str,
    days: Option<&String>,
) -> Result<AnalysisReport, InsightsError> {
    let days_back = parse_days(config, days)?;

    let storage = Storage::new(db_path)?;
    let readings = storage.readings_since(Local::now().naive_local(), days_back)?;
    info!("Analyzing {} readings from the last {} days", readings.len(), days_back);

    Ok(GlucoseAnalyzer::new(config.thresholds).analyze(&readings, days_back))
}

/// Write the analysis to a JSON file, `export [out.json] [days]`
///
/// Without a path the report goes to the export directory; a lone number is
/// taken as the day count.
fn cmd_export(config: &Config, db_path: &str, args: &[String]) -> Result<(), InsightsError> {
    let (out, days) = match args {
        [] => (None, None),
        [first] if first.parse::<u32>().is_ok() => (None, Some(first)),
        [first, rest @ ..] => (Some(first.clone()), rest.first()),
    };

    let report = cmd_analyze(config, db_path, days)?;
    let out: PathBuf = match out {
        Some(path) => path.into(),
        None => {
            let dir = default_export_dir();
            fs::create_dir_all(&dir)?;
            default_report_path(&dir, Local::now().date_naive())
        }
    };
    export_to_json(&report, &out)?;
    eprintln!("Saved to: {}", out.display());
    Ok(())
}

/// Print stored readings with their ids and notes
fn cmd_list(config: &Config, db_path: &str, days: Option<&String>) -> Result<(), InsightsError> {
    let storage = Storage::new(db_path)?;
    let readings = match days {
        Some(_) => storage.stored_since(Local::now().naive_local(), parse_days(config, days)?)?,
        None => storage.get_all_readings()?,
    };

    if readings.is_empty() {
        eprintln!("No readings stored.");
        return Ok(());
    }
    for stored in &readings {
        println!("{}", format_stored(stored));
    }
    eprintln!("{} readings", readings.len());
    Ok(())
}

fn format_stored(stored: &StoredReading) -> String {
    let reading = &stored.reading;
    let line = format!(
        "{:>5}  {}  {:<11}  {:>6.1} mg/dL",
        stored.id,
        reading.measured_at.format("%Y-%m-%d %H:%M"),
        reading.reading_type.label(),
        reading.value
    );
    match &stored.note {
        Some(note) => format!("{}  {}", line, note),
        None => line,
    }
}

/// Attach a note to a stored reading
fn cmd_note(db_path: &str, id: &str, text: &str) -> Result<(), InsightsError> {
    let id = id
        .parse::<i64>()
        .map_err(|_| InsightsError::InvalidArgument(format!("invalid reading id: {}", id)))?;
    if text.is_empty() {
        return Err(InsightsError::InvalidArgument("note needs some text".into()));
    }

    let storage = Storage::new(db_path)?;
    if storage.update_note(id, text)? == 0 {
        return Err(InsightsError::InvalidArgument(format!("no reading with id {}", id)));
    }
    info!("Note saved for reading {}", id);
    eprintln!("Note saved for reading {}", id);
    Ok(())
}

/// Show data paths
fn cmd_show_paths() {
    println!("Glucose Insights Data Paths:");
    println!("  Data directory:  {}", get_data_dir().display());
    println!("  Database:        {}", default_database_path().display());
    println!("  Config file:     {}", config_file_path().display());
    println!("  Export default:  {}", default_export_dir().display());
}

fn print_help() {
    eprintln!("Glucose Insights v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  glucose-insights import <file.json>        Import readings");
    eprintln!("  glucose-insights analyze [days]            Print the analysis as JSON");
    eprintln!("  glucose-insights summary [days]            Print a text summary");
    eprintln!("  glucose-insights export [out.json] [days]  Write the analysis to a file");
    eprintln!("  glucose-insights list [days]               List stored readings");
    eprintln!("  glucose-insights note <id> <text>          Attach a note to a reading");
    eprintln!("  glucose-insights path                      Show data file locations");
    eprintln!("  glucose-insights help                      Show this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("  GLUCOSE_INSIGHTS_DBG=1                     Enable debug output");
    eprintln!();
    eprintln!("DATA LOCATIONS:");
    eprintln!("  Database:  {}", default_database_path().display());
    eprintln!("  Config:    {}", config_file_path().display());
}
