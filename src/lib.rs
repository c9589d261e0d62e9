//! Glucose statistics and pattern analysis
//!
//! Turns a set of glucose readings into an `AnalysisReport`: averages,
//! time in range, variability, trend, time-of-day profile, pattern flags,
//! insights, concerns and a goal recommendation.
//!
//! ```no_run
//! use glucose_insights::{GlucoseAnalyzer, GlucoseReading};
//!
//! let readings: Vec<GlucoseReading> = Vec::new();
//! let report = GlucoseAnalyzer::default().analyze(&readings, 30);
//! assert!(!report.has_data);
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod export;
pub mod reading;
pub mod report;
pub mod stats;
pub mod storage;
pub mod units;

pub use analyzer::GlucoseAnalyzer;
pub use error::InsightsError;
pub use reading::{GlucoseReading, ReadingType};
pub use report::{AnalysisReport, GoalKind, RiskLevel, TrendDirection, VariabilityLevel};
pub use units::Thresholds;
