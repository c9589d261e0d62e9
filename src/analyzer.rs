//! Glucose pattern analysis
//!
//! `GlucoseAnalyzer` runs the statistics engine once over a set of
//! readings, derives pattern flags and risk tiers, and assembles an
//! `AnalysisReport`. Insights, concerns and the goal recommendation come
//! from ordered rule tables; the table order is the output order.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::reading::{GlucoseReading, ReadingType};
use crate::report::{
    AnalysisReport, Averages, DateRange, GlucoseGoals, GoalKind, Patterns, Ranges,
    ReadingTypeStats, RiskLevel, TimeInRange, TimeOfDay, Trend, TrendDirection, Variability,
    VariabilityLevel,
};
use crate::stats::{self, round1};
use crate::units::{MgDl, Thresholds};

/// Time in range at or above this is "excellent"
pub const TIR_EXCELLENT_PERCENT: f64 = 70.0;
/// Time in range at or above this is "good"; below it raises a concern
pub const TIR_GOOD_PERCENT: f64 = 50.0;
/// Above-range share that marks readings as consistently high
pub const CONSISTENTLY_HIGH_PERCENT: f64 = 50.0;
/// Below-range share that marks readings as consistently low
pub const CONSISTENTLY_LOW_PERCENT: f64 = 10.0;
/// CV below this is stable
pub const CV_STABLE_MAX: f64 = 36.0;
/// CV up to and including this is moderate
pub const CV_MODERATE_MAX: f64 = 50.0;
pub const HYPO_RISK_HIGH_PERCENT: f64 = 10.0;
pub const HYPO_RISK_MODERATE_PERCENT: f64 = 5.0;
pub const HYPER_RISK_HIGH_PERCENT: f64 = 50.0;
pub const HYPER_RISK_MODERATE_PERCENT: f64 = 25.0;
/// Weekly rise (mg/dL) that turns a rising trend into a concern
pub const RISING_CONCERN_PER_WEEK: f64 = 5.0;
/// Weekly rise (mg/dL) that makes reversing the trend the goal
pub const RISING_GOAL_PER_WEEK: f64 = 3.0;

impl VariabilityLevel {
    /// Classify a coefficient of variation
    pub fn from_cv(cv: f64) -> Self {
        if cv < CV_STABLE_MAX {
            VariabilityLevel::Stable
        } else if cv <= CV_MODERATE_MAX {
            VariabilityLevel::Moderate
        } else {
            VariabilityLevel::High
        }
    }
}

impl RiskLevel {
    fn from_percentage(percentage: f64, moderate: f64, high: f64) -> Self {
        if percentage >= high {
            RiskLevel::High
        } else if percentage >= moderate {
            RiskLevel::Moderate
        } else if percentage > 0.0 {
            RiskLevel::Low
        } else {
            RiskLevel::None
        }
    }

    /// Hypoglycemia risk from the share of readings below range
    pub fn hypoglycemia(below_percentage: f64) -> Self {
        Self::from_percentage(below_percentage, HYPO_RISK_MODERATE_PERCENT, HYPO_RISK_HIGH_PERCENT)
    }

    /// Hyperglycemia risk from the share of readings above range
    pub fn hyperglycemia(above_percentage: f64) -> Self {
        Self::from_percentage(
            above_percentage,
            HYPER_RISK_MODERATE_PERCENT,
            HYPER_RISK_HIGH_PERCENT,
        )
    }
}

/// Analyzes glucose readings against a set of thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlucoseAnalyzer {
    thresholds: Thresholds,
}

impl GlucoseAnalyzer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Build a report for `readings`, which cover the last `days_back` days
    pub fn analyze(&self, readings: &[GlucoseReading], days_back: u32) -> AnalysisReport {
        if readings.is_empty() {
            debug!("No readings in the last {} days", days_back);
            return self.empty_report(days_back);
        }

        let metrics = Metrics::compute(readings, &self.thresholds);
        debug!(
            "Analyzing {} readings over {} days (TIR {}%)",
            metrics.total_readings, metrics.days_analyzed, metrics.time_in_range.percentage
        );

        let insights = apply_rules(INSIGHT_RULES, &metrics);
        let concerns = apply_rules(CONCERN_RULES, &metrics);
        let glucose_goals = choose_goal(&metrics);

        let Metrics {
            total_readings,
            days_analyzed,
            date_range,
            averages,
            ranges,
            time_in_range,
            variability,
            trend,
            time_of_day,
            reading_types,
            patterns,
            ..
        } = metrics;

        AnalysisReport {
            has_data: true,
            total_readings,
            days_analyzed,
            date_range: Some(date_range),
            averages,
            ranges,
            time_in_range,
            variability,
            trend,
            time_of_day,
            reading_types,
            patterns,
            insights,
            concerns,
            glucose_goals,
        }
    }

    fn empty_report(&self, days_back: u32) -> AnalysisReport {
        AnalysisReport {
            has_data: false,
            total_readings: 0,
            days_analyzed: days_back,
            date_range: None,
            averages: Averages::default(),
            ranges: Ranges::default(),
            time_in_range: TimeInRange::default(),
            variability: Variability::default(),
            trend: Trend::default(),
            time_of_day: TimeOfDay::default(),
            reading_types: BTreeMap::new(),
            patterns: Patterns::default(),
            insights: vec![format!(
                "No glucose readings were recorded in the last {}.",
                plural(days_back as usize, "day")
            )],
            concerns: Vec::new(),
            glucose_goals: establish_routine_goal(),
        }
    }
}

/// Everything the rule tables look at, computed once per analysis
struct Metrics {
    thresholds: Thresholds,
    total_readings: usize,
    days_analyzed: u32,
    date_range: DateRange,
    averages: Averages,
    ranges: Ranges,
    time_in_range: TimeInRange,
    variability: Variability,
    trend: Trend,
    time_of_day: TimeOfDay,
    reading_types: BTreeMap<ReadingType, ReadingTypeStats>,
    patterns: Patterns,
    post_meal_count: usize,
    post_meal_spike_count: usize,
}

impl Metrics {
    fn compute(readings: &[GlucoseReading], thresholds: &Thresholds) -> Self {
        let basic = stats::basic_stats(readings);
        let time_in_range = stats::time_in_range(readings, thresholds);
        let cv = stats::coefficient_of_variation(readings);
        let trend = stats::trend(readings, thresholds.trend_epsilon);
        let time_of_day = stats::analyze_time_of_day(readings);
        let reading_types = stats::analyze_reading_type_frequency(readings);

        let averages = Averages {
            fasting: stats::average_by_type(readings, ReadingType::Fasting),
            before_meal: stats::average_by_type(readings, ReadingType::BeforeMeal),
            post_meal: stats::average_by_type(readings, ReadingType::PostMeal),
            random: stats::average_by_type(readings, ReadingType::Random),
            overall: basic.mean.map(round1),
        };

        let first_day = readings.iter().map(GlucoseReading::date).min().unwrap_or_default();
        let last_day = readings.iter().map(GlucoseReading::date).max().unwrap_or(first_day);
        let span = last_day.signed_duration_since(first_day).num_days();
        let days_analyzed = u32::try_from(span + 1).unwrap_or(1);

        let variability = Variability {
            std_dev: basic.std_dev.map(round1),
            coefficient_of_variation: cv,
            classification: cv.map(VariabilityLevel::from_cv),
        };

        let post_meal: Vec<f64> = readings
            .iter()
            .filter(|r| r.reading_type == ReadingType::PostMeal)
            .map(|r| r.value)
            .collect();
        let post_meal_spike_count = post_meal
            .iter()
            .filter(|&&v| v > thresholds.post_meal_spike)
            .count();

        let patterns = Patterns {
            consistently_high: time_in_range.above_percentage > CONSISTENTLY_HIGH_PERCENT,
            consistently_low: time_in_range.below_percentage > CONSISTENTLY_LOW_PERCENT,
            high_variability: basic
                .std_dev
                .is_some_and(|sd| sd > thresholds.high_variability_std_dev),
            post_meal_spikes: !post_meal.is_empty() && post_meal_spike_count * 2 > post_meal.len(),
            hypoglycemia_risk: RiskLevel::hypoglycemia(time_in_range.below_percentage),
            hyperglycemia_risk: RiskLevel::hyperglycemia(time_in_range.above_percentage),
        };

        Self {
            thresholds: *thresholds,
            total_readings: readings.len(),
            days_analyzed,
            date_range: DateRange {
                start: first_day.format("%Y-%m-%d").to_string(),
                end: last_day.format("%Y-%m-%d").to_string(),
            },
            averages,
            ranges: Ranges { min: basic.min, max: basic.max },
            time_in_range,
            variability,
            trend,
            time_of_day,
            reading_types,
            patterns,
            post_meal_count: post_meal.len(),
            post_meal_spike_count,
        }
    }

    fn is_rising_faster_than(&self, per_week: f64) -> bool {
        self.trend.direction == TrendDirection::Rising && self.trend.slope_per_week > per_week
    }

    fn fasting_is_elevated(&self) -> bool {
        self.averages
            .fasting
            .is_some_and(|avg| avg > self.thresholds.fasting_normal_max)
    }
}

/// A predicate paired with the text (or value) it produces
struct Rule<T> {
    name: &'static str,
    applies: fn(&Metrics) -> bool,
    render: fn(&Metrics) -> T,
}

fn apply_rules(rules: &[Rule<String>], metrics: &Metrics) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(metrics))
        .map(|rule| {
            trace!("Rule matched: {}", rule.name);
            (rule.render)(metrics)
        })
        .collect()
}

fn choose_goal(metrics: &Metrics) -> GlucoseGoals {
    GOAL_LADDER
        .iter()
        .find(|rule| (rule.applies)(metrics))
        .map(|rule| {
            debug!("Goal selected: {}", rule.name);
            (rule.render)(metrics)
        })
        .unwrap_or_else(establish_routine_goal)
}

// ============= Insights =============

const INSIGHT_RULES: &[Rule<String>] = &[
    Rule {
        name: "overview",
        applies: |_| true,
        render: overview_insight,
    },
    Rule {
        name: "overall_average",
        applies: |m| m.averages.overall.is_some(),
        render: overall_average_insight,
    },
    Rule {
        name: "range",
        applies: |m| m.ranges.min.is_some() && m.ranges.max.is_some(),
        render: range_insight,
    },
    Rule {
        name: "time_in_range",
        applies: |_| true,
        render: time_in_range_insight,
    },
    Rule {
        name: "fasting",
        applies: |m| m.averages.fasting.is_some(),
        render: fasting_insight,
    },
    Rule {
        name: "post_meal",
        applies: |m| m.averages.post_meal.is_some(),
        render: post_meal_insight,
    },
    Rule {
        name: "variability",
        applies: |m| m.variability.classification.is_some(),
        render: variability_insight,
    },
    Rule {
        name: "trend",
        applies: |m| m.trend.is_sufficient(),
        render: trend_insight,
    },
    Rule {
        name: "time_of_day",
        applies: |m| m.time_of_day.periods().iter().any(|(_, p)| p.count > 0),
        render: time_of_day_insight,
    },
    Rule {
        name: "reading_type",
        applies: |m| !m.reading_types.is_empty(),
        render: reading_type_insight,
    },
    Rule {
        name: "post_meal_spikes",
        applies: |m| m.patterns.post_meal_spikes,
        render: post_meal_spike_insight,
    },
    Rule {
        name: "hypoglycemia_risk",
        applies: |m| m.patterns.hypoglycemia_risk != RiskLevel::None,
        render: hypoglycemia_insight,
    },
    Rule {
        name: "hyperglycemia_risk",
        applies: |m| m.patterns.hyperglycemia_risk != RiskLevel::None,
        render: hyperglycemia_insight,
    },
];

fn overview_insight(m: &Metrics) -> String {
    format!(
        "Analyzed {} over {}.",
        plural(m.total_readings, "glucose reading"),
        plural(m.days_analyzed as usize, "day")
    )
}

fn overall_average_insight(m: &Metrics) -> String {
    format!("Overall average glucose is {}.", mgdl(m.averages.overall.unwrap_or_default()))
}

fn range_insight(m: &Metrics) -> String {
    format!(
        "Readings ranged from {} to {}.",
        mgdl(m.ranges.min.unwrap_or_default()),
        mgdl(m.ranges.max.unwrap_or_default())
    )
}

fn time_in_range_insight(m: &Metrics) -> String {
    let percentage = m.time_in_range.percentage;
    let assessment = if percentage >= TIR_EXCELLENT_PERCENT {
        "is excellent"
    } else if percentage >= TIR_GOOD_PERCENT {
        "is good"
    } else {
        "needs improvement"
    };
    format!(
        "Time in range ({}) is {:.1}%, which {}.",
        m.thresholds.format_range(),
        percentage,
        assessment
    )
}

fn fasting_insight(m: &Metrics) -> String {
    let avg = m.averages.fasting.unwrap_or_default();
    let tier = if avg < m.thresholds.hypoglycemia {
        "low"
    } else if avg <= m.thresholds.fasting_normal_max {
        "normal"
    } else if avg <= m.thresholds.fasting_prediabetic_max {
        "elevated"
    } else {
        "high"
    };
    format!("Average fasting glucose is {}, which is {}.", mgdl(avg), tier)
}

fn post_meal_insight(m: &Metrics) -> String {
    let avg = m.averages.post_meal.unwrap_or_default();
    let tier = if avg < m.thresholds.post_meal_spike {
        "normal"
    } else {
        "elevated"
    };
    format!("Average post-meal glucose is {}, which is {}.", mgdl(avg), tier)
}

fn variability_insight(m: &Metrics) -> String {
    let level = m.variability.classification.unwrap_or(VariabilityLevel::Stable);
    format!(
        "Glucose variability is {} (coefficient of variation {:.1}%, standard deviation {}).",
        level.label(),
        m.variability.coefficient_of_variation.unwrap_or_default(),
        mgdl(m.variability.std_dev.unwrap_or_default())
    )
}

fn trend_insight(m: &Metrics) -> String {
    match m.trend.direction {
        TrendDirection::Rising => format!(
            "Glucose levels are rising by about {:.1} mg/dL per week.",
            m.trend.slope_per_week
        ),
        TrendDirection::Falling => format!(
            "Glucose levels are falling by about {:.1} mg/dL per week.",
            m.trend.slope_per_week.abs()
        ),
        TrendDirection::Stable => "Glucose levels have been stable over this period.".to_string(),
    }
}

fn time_of_day_insight(m: &Metrics) -> String {
    let parts: Vec<String> = m
        .time_of_day
        .periods()
        .iter()
        .filter(|(_, period)| period.count > 0)
        .map(|(name, period)| {
            format!(
                "{} {} ({})",
                name,
                mgdl(period.average.unwrap_or_default()),
                plural(period.count, "reading")
            )
        })
        .collect();
    format!("Average by time of day: {}.", parts.join(", "))
}

fn reading_type_insight(m: &Metrics) -> String {
    // first type in display order wins a tie
    let mut most: Option<(&ReadingType, &ReadingTypeStats)> = None;
    for entry in &m.reading_types {
        let better = match most {
            Some((_, best)) => entry.1.count > best.count,
            None => true,
        };
        if better {
            most = Some(entry);
        }
    }
    match most {
        Some((reading_type, stats)) => format!(
            "Most readings are {} readings ({:.1}% of the total).",
            reading_type.label(),
            stats.percentage
        ),
        None => String::new(),
    }
}

fn post_meal_spike_insight(m: &Metrics) -> String {
    format!(
        "{} of {} post-meal readings were above {}.",
        m.post_meal_spike_count,
        m.post_meal_count,
        mgdl0(m.thresholds.post_meal_spike)
    )
}

fn hypoglycemia_insight(m: &Metrics) -> String {
    format!(
        "Hypoglycemia risk is {}: {:.1}% of readings were below {}.",
        m.patterns.hypoglycemia_risk.label(),
        m.time_in_range.below_percentage,
        mgdl0(m.thresholds.target_low)
    )
}

fn hyperglycemia_insight(m: &Metrics) -> String {
    format!(
        "Hyperglycemia risk is {}: {:.1}% of readings were above {}.",
        m.patterns.hyperglycemia_risk.label(),
        m.time_in_range.above_percentage,
        mgdl0(m.thresholds.target_high)
    )
}

// ============= Concerns =============

const CONCERN_RULES: &[Rule<String>] = &[
    Rule {
        name: "low_time_in_range",
        applies: |m| m.time_in_range.percentage < TIR_GOOD_PERCENT,
        render: low_time_in_range_concern,
    },
    Rule {
        name: "consistently_high",
        applies: |m| m.patterns.consistently_high && m.averages.overall.is_some(),
        render: consistently_high_concern,
    },
    Rule {
        name: "post_meal_spikes",
        applies: |m| m.patterns.post_meal_spikes,
        render: post_meal_spike_concern,
    },
    Rule {
        name: "consistently_low",
        applies: |m| m.patterns.consistently_low && m.averages.overall.is_some(),
        render: consistently_low_concern,
    },
    Rule {
        name: "hypoglycemia_risk",
        applies: |m| m.patterns.hypoglycemia_risk >= RiskLevel::Moderate,
        render: hypoglycemia_concern,
    },
    Rule {
        name: "high_variability",
        applies: |m| m.patterns.high_variability,
        render: high_variability_concern,
    },
    Rule {
        name: "elevated_fasting",
        applies: Metrics::fasting_is_elevated,
        render: elevated_fasting_concern,
    },
    Rule {
        name: "rising_trend",
        applies: |m| m.is_rising_faster_than(RISING_CONCERN_PER_WEEK),
        render: rising_trend_concern,
    },
];

fn low_time_in_range_concern(m: &Metrics) -> String {
    format!(
        "Only {:.1}% of readings are within {}; aim for at least {:.0}%.",
        m.time_in_range.percentage,
        m.thresholds.format_range(),
        TIR_EXCELLENT_PERCENT
    )
}

fn consistently_high_concern(m: &Metrics) -> String {
    format!(
        "{:.1}% of readings are above target with an average of {}. Review meals and medication with your care team.",
        m.time_in_range.above_percentage,
        mgdl(m.averages.overall.unwrap_or_default())
    )
}

fn post_meal_spike_concern(m: &Metrics) -> String {
    format!(
        "Post-meal glucose frequently spikes above {}. Smaller portions, fewer refined carbohydrates or a short walk after meals can help.",
        mgdl0(m.thresholds.post_meal_spike)
    )
}

fn consistently_low_concern(m: &Metrics) -> String {
    format!(
        "{:.1}% of readings are below {}. Keep fast-acting glucose on hand and discuss these lows with your doctor.",
        m.time_in_range.below_percentage,
        mgdl0(m.thresholds.target_low)
    )
}

fn hypoglycemia_concern(m: &Metrics) -> String {
    format!(
        "Hypoglycemia risk is {}. Check glucose before driving or exercise and review insulin or medication doses.",
        m.patterns.hypoglycemia_risk.label()
    )
}

fn high_variability_concern(m: &Metrics) -> String {
    format!(
        "Glucose swings widely (standard deviation {}). More consistent meal timing and carbohydrate portions can reduce swings.",
        mgdl(m.variability.std_dev.unwrap_or_default())
    )
}

fn elevated_fasting_concern(m: &Metrics) -> String {
    format!(
        "Fasting glucose averages {}, above the normal maximum of {}. Evening meals and late snacks are worth reviewing.",
        mgdl(m.averages.fasting.unwrap_or_default()),
        mgdl0(m.thresholds.fasting_normal_max)
    )
}

fn rising_trend_concern(m: &Metrics) -> String {
    format!(
        "Glucose is trending upward by {:.1} mg/dL per week. Look for recent changes in diet, activity or medication.",
        m.trend.slope_per_week
    )
}

// ============= Goals =============

const GOAL_LADDER: &[Rule<GlucoseGoals>] = &[
    Rule {
        name: "raise_low_readings",
        applies: |m| m.patterns.consistently_low,
        render: raise_low_readings_goal,
    },
    Rule {
        name: "increase_time_in_range",
        applies: |m| m.time_in_range.percentage < TIR_GOOD_PERCENT,
        render: increase_time_in_range_goal,
    },
    Rule {
        name: "reduce_post_meal_spikes",
        applies: |m| m.patterns.post_meal_spikes,
        render: reduce_post_meal_goal,
    },
    Rule {
        name: "stabilize_variability",
        applies: |m| m.patterns.high_variability,
        render: stabilize_variability_goal,
    },
    Rule {
        name: "reverse_rising_trend",
        applies: |m| m.is_rising_faster_than(RISING_GOAL_PER_WEEK),
        render: reverse_trend_goal,
    },
    Rule {
        name: "maintain_control",
        applies: |m| m.averages.overall.is_some(),
        render: maintain_control_goal,
    },
];

fn raise_low_readings_goal(m: &Metrics) -> GlucoseGoals {
    GlucoseGoals {
        kind: GoalKind::RaiseLowReadings,
        target: format!("Keep all readings above {}", mgdl0(m.thresholds.target_low)),
        reasoning: format!(
            "{:.1}% of readings were below range. Preventing lows comes before tightening overall control.",
            m.time_in_range.below_percentage
        ),
    }
}

fn increase_time_in_range_goal(m: &Metrics) -> GlucoseGoals {
    GlucoseGoals {
        kind: GoalKind::IncreaseTimeInRange,
        target: format!(
            "Raise time in range ({}) from {:.1}% to at least {:.0}%",
            m.thresholds.format_range(),
            m.time_in_range.percentage,
            TIR_GOOD_PERCENT
        ),
        reasoning: "Fewer than half of readings are in the target range.".to_string(),
    }
}

fn reduce_post_meal_goal(m: &Metrics) -> GlucoseGoals {
    GlucoseGoals {
        kind: GoalKind::ReducePostMealSpikes,
        target: format!("Keep post-meal readings below {}", mgdl0(m.thresholds.post_meal_spike)),
        reasoning: format!(
            "{} of {} post-meal readings spiked above the threshold.",
            m.post_meal_spike_count, m.post_meal_count
        ),
    }
}

fn stabilize_variability_goal(m: &Metrics) -> GlucoseGoals {
    GlucoseGoals {
        kind: GoalKind::StabilizeVariability,
        target: format!(
            "Bring the standard deviation below {}",
            mgdl0(m.thresholds.high_variability_std_dev)
        ),
        reasoning: format!(
            "Readings vary by {} around the average. Steadier levels come before lowering the average.",
            mgdl(m.variability.std_dev.unwrap_or_default())
        ),
    }
}

fn reverse_trend_goal(m: &Metrics) -> GlucoseGoals {
    GlucoseGoals {
        kind: GoalKind::ReverseRisingTrend,
        target: "Stop the upward trend and return to earlier levels".to_string(),
        reasoning: format!(
            "Glucose has been rising by {:.1} mg/dL per week.",
            m.trend.slope_per_week
        ),
    }
}

fn maintain_control_goal(m: &Metrics) -> GlucoseGoals {
    GlucoseGoals {
        kind: GoalKind::MaintainControl,
        target: format!(
            "Maintain current control with an average near {}",
            mgdl(m.averages.overall.unwrap_or_default())
        ),
        reasoning: format!(
            "{:.1}% time in range with no major patterns flagged.",
            m.time_in_range.percentage
        ),
    }
}

fn establish_routine_goal() -> GlucoseGoals {
    GlucoseGoals {
        kind: GoalKind::EstablishRoutine,
        target: "Establish a regular glucose monitoring routine".to_string(),
        reasoning: "Log fasting and post-meal readings daily to build a baseline for analysis.".to_string(),
    }
}

// ============= Helper Functions =============

fn mgdl(value: f64) -> String {
    MgDl(value).format()
}

/// Whole-number mg/dL, used for thresholds
fn mgdl0(value: f64) -> String {
    format!("{:.0} {}", value, MgDl::unit_label())
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(value: f64, reading_type: ReadingType, day: u32, hour: u32) -> GlucoseReading {
        GlucoseReading::new(value, reading_type, at(day, hour))
    }

    fn steady_week() -> Vec<GlucoseReading> {
        (1..=7)
            .flat_map(|day| {
                vec![
                    reading(95.0, ReadingType::Fasting, day, 7),
                    reading(130.0, ReadingType::PostMeal, day, 13),
                    reading(110.0, ReadingType::BeforeMeal, day, 18),
                ]
            })
            .collect()
    }

    #[test]
    fn test_empty_report() {
        let report = GlucoseAnalyzer::default().analyze(&[], 14);

        assert!(!report.has_data);
        assert_eq!(report.days_analyzed, 14);
        assert_eq!(report.insights, vec!["No glucose readings were recorded in the last 14 days."]);
        assert!(report.concerns.is_empty());
        assert_eq!(report.glucose_goals.kind, GoalKind::EstablishRoutine);
        assert_eq!(report.date_range, None);
    }

    #[test]
    fn test_steady_week_maintains_control() {
        let report = GlucoseAnalyzer::default().analyze(&steady_week(), 30);

        assert!(report.has_data);
        assert_eq!(report.total_readings, 21);
        assert_eq!(report.days_analyzed, 7);
        assert_eq!(
            report.date_range,
            Some(DateRange { start: "2024-04-01".into(), end: "2024-04-07".into() })
        );
        assert_eq!(report.averages.fasting, Some(95.0));
        assert_eq!(report.averages.post_meal, Some(130.0));
        assert_eq!(report.averages.before_meal, Some(110.0));
        assert_eq!(report.averages.random, None);
        assert_eq!(report.time_in_range.percentage, 100.0);
        assert_eq!(report.variability.classification, Some(VariabilityLevel::Stable));
        assert_eq!(report.trend.direction, TrendDirection::Stable);
        assert_eq!(report.patterns, Patterns::default());
        assert!(report.concerns.is_empty());
        assert_eq!(report.glucose_goals.kind, GoalKind::MaintainControl);
    }

    #[test]
    fn test_insight_order() {
        let report = GlucoseAnalyzer::default().analyze(&steady_week(), 30);
        let expected_prefixes = [
            "Analyzed 21 glucose readings over 7 days.",
            "Overall average glucose is",
            "Readings ranged from 95.0 mg/dL to 130.0 mg/dL.",
            "Time in range (70-140 mg/dL) is 100.0%, which is excellent.",
            "Average fasting glucose is 95.0 mg/dL, which is normal.",
            "Average post-meal glucose is 130.0 mg/dL, which is normal.",
            "Glucose variability is stable",
            "Glucose levels have been stable",
            "Average by time of day: morning 95.0 mg/dL (7 readings), afternoon 130.0 mg/dL (7 readings), evening 110.0 mg/dL (7 readings).",
            "Most readings are fasting readings (33.3% of the total).",
        ];

        assert_eq!(report.insights.len(), expected_prefixes.len());
        for (insight, prefix) in report.insights.iter().zip(expected_prefixes) {
            assert!(insight.starts_with(prefix), "{insight:?} should start with {prefix:?}");
        }
    }

    #[test]
    fn test_post_meal_spikes() {
        let readings = vec![
            reading(100.0, ReadingType::Fasting, 1, 7),
            reading(200.0, ReadingType::PostMeal, 1, 13),
            reading(210.0, ReadingType::PostMeal, 2, 13),
            reading(150.0, ReadingType::PostMeal, 3, 13),
        ];
        let report = GlucoseAnalyzer::default().analyze(&readings, 7);

        assert!(report.patterns.post_meal_spikes);
        assert!(report
            .insights
            .contains(&"2 of 3 post-meal readings were above 180 mg/dL.".to_string()));
        assert!(report.concerns.iter().any(|c| c.starts_with("Post-meal glucose frequently spikes")));
    }

    #[test]
    fn test_half_spiking_is_not_a_pattern() {
        let readings = vec![
            reading(200.0, ReadingType::PostMeal, 1, 13),
            reading(150.0, ReadingType::PostMeal, 2, 13),
        ];
        let report = GlucoseAnalyzer::default().analyze(&readings, 7);
        assert!(!report.patterns.post_meal_spikes);
    }

    #[test]
    fn test_post_meal_average_at_threshold_is_elevated() {
        let readings = vec![
            reading(180.0, ReadingType::PostMeal, 1, 13),
            reading(180.0, ReadingType::PostMeal, 2, 13),
        ];
        let report = GlucoseAnalyzer::default().analyze(&readings, 7);

        assert!(report
            .insights
            .contains(&"Average post-meal glucose is 180.0 mg/dL, which is elevated.".to_string()));
        // a spike has to exceed the threshold
        assert!(!report.patterns.post_meal_spikes);

        let below = vec![reading(179.9, ReadingType::PostMeal, 1, 13)];
        let report = GlucoseAnalyzer::default().analyze(&below, 7);
        assert!(report
            .insights
            .contains(&"Average post-meal glucose is 179.9 mg/dL, which is normal.".to_string()));
    }

    #[test]
    fn test_time_in_range_wording() {
        let random = |values: [f64; 4]| -> Vec<GlucoseReading> {
            (1..=4)
                .zip(values)
                .map(|(day, v)| reading(v, ReadingType::Random, day, 9))
                .collect()
        };

        let report = GlucoseAnalyzer::default().analyze(&random([100.0, 200.0, 200.0, 200.0]), 7);
        assert_eq!(
            report.insights[3],
            "Time in range (70-140 mg/dL) is 25.0%, which needs improvement."
        );

        let report = GlucoseAnalyzer::default().analyze(&random([200.0, 100.0, 100.0, 100.0]), 7);
        assert_eq!(report.insights[3], "Time in range (70-140 mg/dL) is 75.0%, which is excellent.");
    }

    /// Mixed lows, highs and post-meal spikes trending down over a week
    fn volatile_week() -> Vec<GlucoseReading> {
        vec![
            reading(220.0, ReadingType::Fasting, 1, 7),
            reading(250.0, ReadingType::PostMeal, 1, 13),
            reading(200.0, ReadingType::Fasting, 2, 7),
            reading(240.0, ReadingType::PostMeal, 2, 13),
            reading(55.0, ReadingType::Random, 5, 22),
            reading(50.0, ReadingType::Random, 6, 22),
            reading(60.0, ReadingType::BeforeMeal, 7, 19),
        ]
    }

    #[test]
    fn test_full_insight_and_concern_order() {
        let report = GlucoseAnalyzer::default().analyze(&volatile_week(), 7);

        let expected_insights = [
            "Analyzed 7 glucose readings over 7 days.",
            "Overall average glucose is 153.6 mg/dL.",
            "Readings ranged from 50.0 mg/dL to 250.0 mg/dL.",
            "Time in range (70-140 mg/dL) is 0.0%, which needs improvement.",
            "Average fasting glucose is 210.0 mg/dL, which is high.",
            "Average post-meal glucose is 245.0 mg/dL, which is elevated.",
            "Glucose variability is high (coefficient of variation",
            "Glucose levels are falling by about",
            "Average by time of day: morning 210.0 mg/dL (2 readings), afternoon 245.0 mg/dL (2 readings), evening 60.0 mg/dL (1 reading), night 52.5 mg/dL (2 readings).",
            "Most readings are fasting readings (28.6% of the total).",
            "2 of 2 post-meal readings were above 180 mg/dL.",
            "Hypoglycemia risk is high: 42.9% of readings were below 70 mg/dL.",
            "Hyperglycemia risk is high: 57.1% of readings were above 140 mg/dL.",
        ];
        assert_eq!(report.insights.len(), expected_insights.len(), "{:#?}", report.insights);
        for (insight, prefix) in report.insights.iter().zip(expected_insights) {
            assert!(insight.starts_with(prefix), "{insight:?} should start with {prefix:?}");
        }

        let expected_concerns = [
            "Only 0.0% of readings are within 70-140 mg/dL",
            "57.1% of readings are above target with an average of 153.6 mg/dL.",
            "Post-meal glucose frequently spikes above 180 mg/dL.",
            "42.9% of readings are below 70 mg/dL.",
            "Hypoglycemia risk is high.",
            "Glucose swings widely (standard deviation",
            "Fasting glucose averages 210.0 mg/dL, above the normal maximum of 100 mg/dL.",
        ];
        assert_eq!(report.concerns.len(), expected_concerns.len(), "{:#?}", report.concerns);
        for (concern, prefix) in report.concerns.iter().zip(expected_concerns) {
            assert!(concern.starts_with(prefix), "{concern:?} should start with {prefix:?}");
        }

        assert_eq!(report.trend.direction, TrendDirection::Falling);
        assert_eq!(report.glucose_goals.kind, GoalKind::RaiseLowReadings);
    }

    #[test]
    fn test_falling_trend_insight() {
        let readings: Vec<_> = (1..=5)
            .map(|day| reading(140.0 - 2.0 * day as f64, ReadingType::Random, day, 9))
            .collect();
        let report = GlucoseAnalyzer::default().analyze(&readings, 7);

        assert_eq!(report.trend.direction, TrendDirection::Falling);
        assert_eq!(report.trend.slope_per_week, -14.0);
        assert!(report
            .insights
            .contains(&"Glucose levels are falling by about 14.0 mg/dL per week.".to_string()));
        assert!(report.concerns.is_empty());
    }

    #[test]
    fn test_high_variability_alone_stabilizes() {
        // in range two thirds of the time, no lows, no post-meal readings,
        // and the highs come early so the trend is not rising
        let values = [250.0, 90.0, 90.0, 250.0, 90.0, 90.0, 250.0, 90.0, 90.0];
        let readings: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| reading(v, ReadingType::Random, 1 + i as u32, 9))
            .collect();
        let report = GlucoseAnalyzer::default().analyze(&readings, 14);

        assert_eq!(report.time_in_range.percentage, 66.7);
        assert!(!report.patterns.consistently_low);
        assert!(!report.patterns.post_meal_spikes);
        assert!(report.patterns.high_variability);
        assert_ne!(report.trend.direction, TrendDirection::Rising);
        assert_eq!(report.glucose_goals.kind, GoalKind::StabilizeVariability);
        assert_eq!(report.glucose_goals.target, "Bring the standard deviation below 50 mg/dL");
        assert_eq!(
            report.concerns,
            vec!["Glucose swings widely (standard deviation 75.4 mg/dL). More consistent meal timing and carbohydrate portions can reduce swings."]
        );
        assert!(report
            .insights
            .contains(&"Hyperglycemia risk is moderate: 33.3% of readings were above 140 mg/dL.".to_string()));
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(RiskLevel::hypoglycemia(0.0), RiskLevel::None);
        assert_eq!(RiskLevel::hypoglycemia(2.0), RiskLevel::Low);
        assert_eq!(RiskLevel::hypoglycemia(5.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::hypoglycemia(10.0), RiskLevel::High);
        assert_eq!(RiskLevel::hyperglycemia(24.9), RiskLevel::Low);
        assert_eq!(RiskLevel::hyperglycemia(25.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::hyperglycemia(50.0), RiskLevel::High);
    }

    #[test]
    fn test_variability_levels() {
        assert_eq!(VariabilityLevel::from_cv(35.9), VariabilityLevel::Stable);
        assert_eq!(VariabilityLevel::from_cv(36.0), VariabilityLevel::Moderate);
        assert_eq!(VariabilityLevel::from_cv(50.0), VariabilityLevel::Moderate);
        assert_eq!(VariabilityLevel::from_cv(50.1), VariabilityLevel::High);
    }

    #[test]
    fn test_consistently_high_concerns_and_goal() {
        let readings: Vec<_> = (1..=5)
            .map(|day| reading(220.0, ReadingType::Random, day, 10))
            .collect();
        let report = GlucoseAnalyzer::default().analyze(&readings, 7);

        assert!(report.patterns.consistently_high);
        assert_eq!(report.patterns.hyperglycemia_risk, RiskLevel::High);
        assert_eq!(report.concerns.len(), 2);
        assert!(report.concerns[0].starts_with("Only 0.0% of readings"));
        assert!(report.concerns[1].starts_with("100.0% of readings are above target"));
        assert_eq!(report.glucose_goals.kind, GoalKind::IncreaseTimeInRange);
    }

    #[test]
    fn test_elevated_fasting_concern() {
        let readings: Vec<_> = (1..=5)
            .map(|day| reading(118.0, ReadingType::Fasting, day, 6))
            .collect();
        let report = GlucoseAnalyzer::default().analyze(&readings, 7);

        assert!(report
            .insights
            .contains(&"Average fasting glucose is 118.0 mg/dL, which is elevated.".to_string()));
        assert_eq!(
            report.concerns,
            vec!["Fasting glucose averages 118.0 mg/dL, above the normal maximum of 100 mg/dL. Evening meals and late snacks are worth reviewing."]
        );
    }

    #[test]
    fn test_rising_trend_goal() {
        // +1 mg/dL per day in range: 7 per week, above the goal and concern cut-offs
        let readings: Vec<_> = (1..=10)
            .map(|day| reading(100.0 + day as f64, ReadingType::Random, day, 9))
            .collect();
        let report = GlucoseAnalyzer::default().analyze(&readings, 14);

        assert_eq!(report.trend.direction, TrendDirection::Rising);
        assert!(report.concerns.iter().any(|c| c.starts_with("Glucose is trending upward by 7.0")));
        assert_eq!(report.glucose_goals.kind, GoalKind::ReverseRisingTrend);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = Thresholds { target_high: 180.0, ..Thresholds::default() };
        let readings = vec![reading(160.0, ReadingType::Random, 1, 9)];
        let report = GlucoseAnalyzer::new(thresholds).analyze(&readings, 1);

        assert_eq!(report.time_in_range.in_range_count, 1);
        assert!(report.insights[3].starts_with("Time in range (70-180 mg/dL) is 100.0%"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "day"), "1 day");
        assert_eq!(plural(30, "day"), "30 days");
    }
}
