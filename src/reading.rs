//! Glucose reading model

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::InsightsError;

/// Clinical context of a glucose measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingType {
    Fasting,
    BeforeMeal,
    PostMeal,
    Random,
}

impl ReadingType {
    /// All reading types, in display order
    pub const ALL: [ReadingType; 4] = [
        ReadingType::Fasting,
        ReadingType::BeforeMeal,
        ReadingType::PostMeal,
        ReadingType::Random,
    ];

    /// Storage / serialization name
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingType::Fasting => "fasting",
            ReadingType::BeforeMeal => "before_meal",
            ReadingType::PostMeal => "post_meal",
            ReadingType::Random => "random",
        }
    }

    /// Human-readable label used in insights
    pub fn label(self) -> &'static str {
        match self {
            ReadingType::Fasting => "fasting",
            ReadingType::BeforeMeal => "before-meal",
            ReadingType::PostMeal => "post-meal",
            ReadingType::Random => "random",
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingType {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fasting" => Ok(ReadingType::Fasting),
            "before_meal" => Ok(ReadingType::BeforeMeal),
            "post_meal" | "after_meal" => Ok(ReadingType::PostMeal),
            "random" => Ok(ReadingType::Random),
            _ => Err(InsightsError::InvalidReadingType(s.to_string())),
        }
    }
}

/// A blood glucose reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseReading {
    /// Glucose value in mg/dL
    pub value: f64,
    pub reading_type: ReadingType,
    /// Local wall-clock time of the measurement
    pub measured_at: NaiveDateTime,
}

impl GlucoseReading {
    pub fn new(value: f64, reading_type: ReadingType, measured_at: NaiveDateTime) -> Self {
        Self { value, reading_type, measured_at }
    }

    pub fn date(&self) -> NaiveDate {
        self.measured_at.date()
    }

    pub fn hour(&self) -> u32 {
        self.measured_at.hour()
    }
}
