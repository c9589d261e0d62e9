//! Report export: JSON files and plain-text summaries

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;

use crate::error::InsightsError;
use crate::report::AnalysisReport;
use crate::units::MgDl;

/// File name used when `export` is given no output path, e.g.
/// `glucose-report-2024-02-03.json` inside `dir`
pub fn default_report_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("glucose-report-{}.json", date.format("%Y-%m-%d")))
}

/// Write the report as pretty-printed JSON
pub fn export_to_json<P: AsRef<Path>>(
    report: &AnalysisReport,
    path: P,
) -> Result<(), InsightsError> {
    let json = serde_json::to_string_pretty(report)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json.as_bytes())?;
    info!("Report written to {}", path.as_ref().display());
    Ok(())
}

/// Render the report as a plain-text summary
///
/// This is the block handed to printable views and prompt builders, so it
/// only contains the report's own values and sentences.
pub fn render_summary(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Glucose Analysis");
    let _ = writeln!(out, "================");

    if !report.has_data {
        for insight in &report.insights {
            let _ = writeln!(out, "{}", insight);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Goal: {}", report.glucose_goals.target);
        return out;
    }

    if let Some(range) = &report.date_range {
        let _ = writeln!(
            out,
            "Period:        {} to {} ({} days)",
            range.start, range.end, report.days_analyzed
        );
    }
    let _ = writeln!(out, "Readings:      {}", report.total_readings);
    let _ = writeln!(out, "Average:       {}", optional_mgdl(report.averages.overall));
    let _ = writeln!(
        out,
        "Range:         {} - {}",
        optional_mgdl(report.ranges.min),
        optional_mgdl(report.ranges.max)
    );
    let tir = &report.time_in_range;
    let _ = writeln!(
        out,
        "Time in range: {:.1}% (above {:.1}%, below {:.1}%)",
        tir.percentage, tir.above_percentage, tir.below_percentage
    );
    let _ = writeln!(
        out,
        "Trend:         {} ({:+.1} mg/dL per week)",
        report.trend.direction.label(),
        report.trend.slope_per_week
    );
    let _ = writeln!(
        out,
        "Risk:          hypoglycemia {}, hyperglycemia {}",
        report.patterns.hypoglycemia_risk.label(),
        report.patterns.hyperglycemia_risk.label()
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Insights:");
    for insight in &report.insights {
        let _ = writeln!(out, "  - {}", insight);
    }

    if !report.concerns.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Concerns:");
        for concern in &report.concerns {
            let _ = writeln!(out, "  ! {}", concern);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Goal: {}", report.glucose_goals.target);
    let _ = writeln!(out, "      {}", report.glucose_goals.reasoning);
    out
}

fn optional_mgdl(value: Option<f64>) -> String {
    value.map(|v| MgDl(v).format()).unwrap_or_else(|| "n/a".to_string())
}
