//! Statistics calculations for glucose readings
//!
//! Pure functions over a slice of readings. None of them panic on empty or
//! single-element input; metrics that need more data come back as `None`.
//! Accumulation runs at full precision and rounding (one decimal place)
//! happens once, at the end.

use std::collections::BTreeMap;

use crate::reading::{GlucoseReading, ReadingType};
use crate::report::{PeriodStats, ReadingTypeStats, TimeInRange, TimeOfDay, Trend, TrendDirection};
use crate::units::{GlucoseRange, Thresholds};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Basic statistical measures (unrounded)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicStats {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Population standard deviation, `None` with fewer than 2 readings
    pub std_dev: Option<f64>,
}

/// Hour-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    /// Map an hour (0-23) to its bucket: morning 5-11, afternoon 12-16,
    /// evening 17-20, night 21-4
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPeriod::Morning,
            12..=16 => DayPeriod::Afternoon,
            17..=20 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }
}

/// Calculate min, max, mean and population standard deviation
pub fn basic_stats(readings: &[GlucoseReading]) -> BasicStats {
    let values = values_of(readings);
    let mean = mean(&values);

    BasicStats {
        count: values.len(),
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
        mean,
        std_dev: mean.and_then(|m| population_std_dev(&values, m)),
    }
}

/// Partition readings into below / in / above the target range
pub fn time_in_range(readings: &[GlucoseReading], thresholds: &Thresholds) -> TimeInRange {
    let mut tir = TimeInRange::default();

    for reading in readings {
        match thresholds.classify(reading.value) {
            GlucoseRange::Below => tir.below_range_count += 1,
            GlucoseRange::InRange => tir.in_range_count += 1,
            GlucoseRange::Above => tir.above_range_count += 1,
        }
    }

    let total = readings.len();
    tir.percentage = percent(tir.in_range_count, total);
    tir.above_percentage = percent(tir.above_range_count, total);
    tir.below_percentage = percent(tir.below_range_count, total);
    tir
}

/// Standard deviation as a percentage of the mean
pub fn coefficient_of_variation(readings: &[GlucoseReading]) -> Option<f64> {
    let stats = basic_stats(readings);
    let mean = stats.mean?;
    let std_dev = stats.std_dev?;
    if mean == 0.0 {
        return None;
    }
    Some(round1(std_dev / mean * 100.0))
}

/// Fit a least-squares line of value against elapsed days since the
/// earliest reading
pub fn trend(readings: &[GlucoseReading], epsilon: f64) -> Trend {
    let mut sorted: Vec<&GlucoseReading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.measured_at);

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Trend::default();
    };

    let origin = first.measured_at;
    let points: Vec<(f64, f64)> = sorted
        .iter()
        .map(|r| {
            let elapsed = r.measured_at.signed_duration_since(origin);
            (elapsed.num_seconds() as f64 / SECONDS_PER_DAY, r.value)
        })
        .collect();

    let slope = linear_slope(&points).unwrap_or(0.0);
    let direction = if slope > epsilon {
        TrendDirection::Rising
    } else if slope < -epsilon {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    // the weekly figure is derived from the reported daily one so the two agree
    let slope_per_day = round2(slope);

    Trend {
        slope_per_day,
        slope_per_week: round2(slope_per_day * 7.0),
        direction,
        first_value: Some(first.value),
        last_value: Some(last.value),
        data_points: points.len(),
    }
}

/// Bucket readings by hour of day
pub fn analyze_time_of_day(readings: &[GlucoseReading]) -> TimeOfDay {
    let mut morning = Vec::new();
    let mut afternoon = Vec::new();
    let mut evening = Vec::new();
    let mut night = Vec::new();

    for reading in readings {
        match DayPeriod::from_hour(reading.hour()) {
            DayPeriod::Morning => morning.push(reading.value),
            DayPeriod::Afternoon => afternoon.push(reading.value),
            DayPeriod::Evening => evening.push(reading.value),
            DayPeriod::Night => night.push(reading.value),
        }
    }

    TimeOfDay {
        morning: period_stats(&morning),
        afternoon: period_stats(&afternoon),
        evening: period_stats(&evening),
        night: period_stats(&night),
    }
}

/// Count, share of all readings, and average per reading type
pub fn analyze_reading_type_frequency(
    readings: &[GlucoseReading],
) -> BTreeMap<ReadingType, ReadingTypeStats> {
    let mut groups: BTreeMap<ReadingType, Vec<f64>> = BTreeMap::new();
    for reading in readings {
        groups.entry(reading.reading_type).or_default().push(reading.value);
    }

    let total = readings.len();
    groups
        .into_iter()
        .filter_map(|(reading_type, values)| {
            let average = mean(&values)?;
            Some((
                reading_type,
                ReadingTypeStats {
                    count: values.len(),
                    percentage: percent(values.len(), total),
                    average: round1(average),
                },
            ))
        })
        .collect()
}

/// Rounded average of readings of one type, `None` when there are none
pub fn average_by_type(readings: &[GlucoseReading], reading_type: ReadingType) -> Option<f64> {
    let values: Vec<f64> = readings
        .iter()
        .filter(|r| r.reading_type == reading_type)
        .map(|r| r.value)
        .collect();
    mean(&values).map(round1)
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============= Helper Functions =============

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn values_of(readings: &[GlucoseReading]) -> Vec<f64> {
    readings.iter().map(|r| r.value).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divide by N)
fn population_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

fn period_stats(values: &[f64]) -> PeriodStats {
    PeriodStats {
        count: values.len(),
        average: mean(values).map(round1),
    }
}

/// Least-squares slope of y over x, `None` when x has no spread
fn linear_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), (x, y)| {
        let dx = x - mean_x;
        (num + dx * (y - mean_y), den + dx * dx)
    });

    if den.abs() < f64::EPSILON {
        return None;
    }
    Some(num / den)
}
