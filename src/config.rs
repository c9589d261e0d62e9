//! Configuration file parsing and data locations

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::InsightsError;
use crate::units::Thresholds;

const APP_DIR_NAME: &str = "glucose-insights";

/// Default analysis window in days
pub const DEFAULT_DAYS_BACK: u32 = 30;

/// Configuration loaded from config.txt
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Database location, OS data directory when unset
    pub database_path: Option<String>,
    /// Analysis window used when the command line gives none
    pub days_back: u32,
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            days_back: DEFAULT_DAYS_BACK,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InsightsError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut config = Config::default();

        for line in reader.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse "key value" or "key value # comment"
            if let Some((key, rest)) = Self::parse_line(line) {
                let value = rest.split('#').next().unwrap_or("").trim();
                config.apply(key, value)?;
            }
        }

        Ok(config)
    }

    /// Parse a single config line, returning (key, value)
    fn parse_line(line: &str) -> Option<(&str, &str)> {
        let mut parts = line.splitn(2, |c: char| c.is_whitespace());
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();

        if key.is_empty() || value.is_empty() {
            return None;
        }

        Some((key, value))
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), InsightsError> {
        let t = &mut self.thresholds;
        match key {
            "database_path" => self.database_path = Some(value.to_string()),
            "days_back" => {
                self.days_back = value
                    .parse()
                    .map_err(|_| InsightsError::Config(format!("invalid days_back: {}", value)))?
            }
            "target_low" => t.target_low = parse_number(key, value)?,
            "target_high" => t.target_high = parse_number(key, value)?,
            "hypoglycemia_threshold" => t.hypoglycemia = parse_number(key, value)?,
            "fasting_normal_max" => t.fasting_normal_max = parse_number(key, value)?,
            "fasting_prediabetic_max" => t.fasting_prediabetic_max = parse_number(key, value)?,
            "post_meal_spike_threshold" => t.post_meal_spike = parse_number(key, value)?,
            "high_variability_stddev" => t.high_variability_std_dev = parse_number(key, value)?,
            "trend_epsilon" => t.trend_epsilon = parse_number(key, value)?,
            _ => warn!("Ignoring unknown config key: {}", key),
        }
        Ok(())
    }

    /// Write a commented default config file
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<(), InsightsError> {
        let t = Thresholds::default();
        let mut file = File::create(path)?;
        writeln!(file, "# glucose-insights configuration")?;
        writeln!(file, "# Format: key value   (lines starting with # are ignored)")?;
        writeln!(file)?;
        writeln!(file, "# database_path /path/to/readings.db")?;
        writeln!(file, "days_back {}", DEFAULT_DAYS_BACK)?;
        writeln!(file)?;
        writeln!(file, "# Thresholds in mg/dL")?;
        writeln!(file, "target_low {}", t.target_low)?;
        writeln!(file, "target_high {}", t.target_high)?;
        writeln!(file, "hypoglycemia_threshold {}", t.hypoglycemia)?;
        writeln!(file, "fasting_normal_max {}", t.fasting_normal_max)?;
        writeln!(file, "fasting_prediabetic_max {}", t.fasting_prediabetic_max)?;
        writeln!(file, "post_meal_spike_threshold {}", t.post_meal_spike)?;
        writeln!(file, "high_variability_stddev {}", t.high_variability_std_dev)?;
        writeln!(file, "trend_epsilon {}  # mg/dL per day", t.trend_epsilon)?;
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, InsightsError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InsightsError::Config(format!("invalid number for {}: {}", key, value)))
}

/// OS-specific data directory for the application
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Create the data directory if it does not exist
pub fn ensure_data_dir() -> Result<PathBuf, InsightsError> {
    let dir = get_data_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn default_database_path() -> PathBuf {
    get_data_dir().join("readings.db")
}

pub fn config_file_path() -> PathBuf {
    get_data_dir().join("config.txt")
}

/// Default directory for exported reports
pub fn default_export_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_overrides() {
        let file = write_config(
            "# comment\n\
             database_path /tmp/readings.db\n\
             days_back 14   # two weeks\n\
             target_high 180\n\
             post_meal_spike_threshold 200\n\
             trend_epsilon 1.5\n",
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.database_path.as_deref(), Some("/tmp/readings.db"));
        assert_eq!(config.days_back, 14);
        assert_eq!(config.thresholds.target_high, 180.0);
        assert_eq!(config.thresholds.post_meal_spike, 200.0);
        assert_eq!(config.thresholds.trend_epsilon, 1.5);
        assert_eq!(config.thresholds.target_low, Thresholds::TARGET_LOW_MGDL);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let file = write_config("favourite_color blue\nkey_without_value\n");
        assert_eq!(Config::load(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_number() {
        let file = write_config("target_low seventy\n");
        assert!(matches!(Config::load(file.path()), Err(InsightsError::Config(_))));
    }

    #[test]
    fn test_default_file_round_trips() {
        let file = tempfile::NamedTempFile::new().unwrap();
        Config::create_default(file.path()).unwrap();
        assert_eq!(Config::load(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/glucose-insights/config.txt"),
            Err(InsightsError::Io(_))
        ));
    }
}
