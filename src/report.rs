//! Analysis report types
//!
//! An `AnalysisReport` is built fresh for every analysis call and never
//! mutated afterwards. Metrics that cannot be computed from the available
//! readings are `None` rather than zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reading::ReadingType;

/// Complete result of one glucose analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub has_data: bool,
    pub total_readings: usize,
    /// Inclusive calendar-day span of the data (the requested window when empty)
    pub days_analyzed: u32,
    pub date_range: Option<DateRange>,
    pub averages: Averages,
    pub ranges: Ranges,
    pub time_in_range: TimeInRange,
    pub variability: Variability,
    pub trend: Trend,
    pub time_of_day: TimeOfDay,
    pub reading_types: BTreeMap<ReadingType, ReadingTypeStats>,
    pub patterns: Patterns,
    pub insights: Vec<String>,
    pub concerns: Vec<String>,
    pub glucose_goals: GlucoseGoals,
}

/// ISO dates (YYYY-MM-DD) of the earliest and latest reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    pub fasting: Option<f64>,
    pub before_meal: Option<f64>,
    pub post_meal: Option<f64>,
    pub random: Option<f64>,
    pub overall: Option<f64>,
}

impl Averages {
    pub fn for_type(&self, reading_type: ReadingType) -> Option<f64> {
        match reading_type {
            ReadingType::Fasting => self.fasting,
            ReadingType::BeforeMeal => self.before_meal,
            ReadingType::PostMeal => self.post_meal,
            ReadingType::Random => self.random,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranges {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Time-in-range statistics (standard diabetes metric)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInRange {
    pub percentage: f64,
    pub above_percentage: f64,
    pub below_percentage: f64,
    pub in_range_count: usize,
    pub above_range_count: usize,
    pub below_range_count: usize,
}

impl TimeInRange {
    pub fn total(&self) -> usize {
        self.in_range_count + self.above_range_count + self.below_range_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariabilityLevel {
    Stable,
    Moderate,
    High,
}

impl VariabilityLevel {
    pub fn label(self) -> &'static str {
        match self {
            VariabilityLevel::Stable => "stable",
            VariabilityLevel::Moderate => "moderate",
            VariabilityLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variability {
    pub std_dev: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
    pub classification: Option<VariabilityLevel>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    #[default]
    Stable,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
        }
    }
}

/// Linear glucose trend over the analysis window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// mg/dL per day
    pub slope_per_day: f64,
    /// mg/dL per week
    pub slope_per_week: f64,
    pub direction: TrendDirection,
    pub first_value: Option<f64>,
    pub last_value: Option<f64>,
    /// Number of readings the line was fitted to
    pub data_points: usize,
}

impl Trend {
    /// A slope can only be asserted from at least two readings
    pub fn is_sufficient(&self) -> bool {
        self.data_points >= 2
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub count: usize,
    pub average: Option<f64>,
}

/// Readings bucketed by hour of day
///
/// morning 05-11, afternoon 12-16, evening 17-20, night 21-04
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub morning: PeriodStats,
    pub afternoon: PeriodStats,
    pub evening: PeriodStats,
    pub night: PeriodStats,
}

impl TimeOfDay {
    /// Periods in display order with their names
    pub fn periods(&self) -> [(&'static str, &PeriodStats); 4] {
        [
            ("morning", &self.morning),
            ("afternoon", &self.afternoon),
            ("evening", &self.evening),
            ("night", &self.night),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingTypeStats {
    pub count: usize,
    pub percentage: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patterns {
    pub consistently_high: bool,
    pub consistently_low: bool,
    pub high_variability: bool,
    pub post_meal_spikes: bool,
    pub hypoglycemia_risk: RiskLevel,
    pub hyperglycemia_risk: RiskLevel,
}

/// Which rung of the goal ladder produced the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    RaiseLowReadings,
    IncreaseTimeInRange,
    ReducePostMealSpikes,
    StabilizeVariability,
    ReverseRisingTrend,
    MaintainControl,
    EstablishRoutine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseGoals {
    pub kind: GoalKind,
    pub target: String,
    pub reasoning: String,
}
