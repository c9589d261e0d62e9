//! Glucose units, analysis thresholds and range classification
//!
//! All analysis works in mg/dL. Thresholds are kept together in one
//! `Thresholds` value so they can be tuned from the config file and
//! injected into the analyzer instead of being scattered as literals.

use serde::{Deserialize, Serialize};

/// Glucose value in mg/dL (milligrams per deciliter)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MgDl(pub f64);

impl MgDl {
    /// Format the value with unit suffix
    pub fn format(self) -> String {
        format!("{:.1} mg/dL", self.0)
    }

    /// Get the unit label
    pub fn unit_label() -> &'static str {
        "mg/dL"
    }
}

/// Clinical thresholds used by the statistics engine and the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Lower bound of the target range (inclusive) - default 70
    pub target_low: f64,
    /// Upper bound of the target range (inclusive) - default 140
    pub target_high: f64,
    /// Below this a fasting average is reported as low - default 70
    pub hypoglycemia: f64,
    /// Highest normal fasting average - default 100
    pub fasting_normal_max: f64,
    /// Highest prediabetic fasting average - default 125
    pub fasting_prediabetic_max: f64,
    /// Post-meal readings above this count as a spike - default 180
    pub post_meal_spike: f64,
    /// Standard deviation above this is flagged as high variability - default 50
    pub high_variability_std_dev: f64,
    /// Trend slope (mg/dL per day) that must be exceeded to call a direction - default 0.5
    pub trend_epsilon: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            target_low: Self::TARGET_LOW_MGDL,
            target_high: Self::TARGET_HIGH_MGDL,
            hypoglycemia: Self::HYPOGLYCEMIA_THRESHOLD,
            fasting_normal_max: Self::FASTING_NORMAL_MAX,
            fasting_prediabetic_max: Self::FASTING_PREDIABETIC_MAX,
            post_meal_spike: Self::POST_MEAL_SPIKE_THRESHOLD,
            high_variability_std_dev: Self::HIGH_VARIABILITY_STDDEV,
            trend_epsilon: Self::TREND_EPSILON_PER_DAY,
        }
    }
}

impl Thresholds {
    pub const TARGET_LOW_MGDL: f64 = 70.0;
    pub const TARGET_HIGH_MGDL: f64 = 140.0;
    pub const HYPOGLYCEMIA_THRESHOLD: f64 = 70.0;
    pub const FASTING_NORMAL_MAX: f64 = 100.0;
    pub const FASTING_PREDIABETIC_MAX: f64 = 125.0;
    pub const POST_MEAL_SPIKE_THRESHOLD: f64 = 180.0;
    pub const HIGH_VARIABILITY_STDDEV: f64 = 50.0;
    pub const TREND_EPSILON_PER_DAY: f64 = 0.5;

    /// Classify a reading against the target range
    pub fn classify(&self, mg_dl: f64) -> GlucoseRange {
        if mg_dl < self.target_low {
            GlucoseRange::Below
        } else if mg_dl <= self.target_high {
            GlucoseRange::InRange
        } else {
            GlucoseRange::Above
        }
    }

    /// Target range display string, e.g. "70-140 mg/dL"
    pub fn format_range(&self) -> String {
        format!("{}-{} mg/dL", self.target_low, self.target_high)
    }
}

/// Classification of a glucose value against the target range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseRange {
    Below,
    InRange,
    Above,
}
