use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis;
use crate::models::{AnalysisResult, Recommendation, StressRecord};
use crate::recommend::{Catalog, StressBand};

/// Everything the home screen shows for one set of records.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub analysis: AnalysisResult,
    /// Today's highest logged stress, 0 when nothing was logged today.
    pub today_stress_level: i32,
    pub band: StressBand,
    pub recommendations: Vec<Recommendation>,
    pub mindfulness_tips: Vec<String>,
}

impl Dashboard {
    pub fn build(records: &[StressRecord], today: NaiveDate, catalog: &Catalog) -> Self {
        let analysis = analysis::analyze(records, None, today);
        let today_stress_level = analysis::today_peak(records, today).unwrap_or(0);

        Self {
            today,
            analysis,
            today_stress_level,
            band: StressBand::from_level(today_stress_level),
            recommendations: catalog.recommend(today_stress_level).to_vec(),
            mindfulness_tips: catalog.mindfulness_tips().to_vec(),
        }
    }
}

pub fn build_report(dashboard: &Dashboard, records: &[StressRecord]) -> String {
    let analysis = &dashboard.analysis;
    let mut output = String::new();

    let _ = writeln!(output, "# Stress Report");
    let _ = writeln!(
        output,
        "Generated {} covering {} to {}",
        dashboard.today, analysis.date_range.start, analysis.date_range.end
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    if analysis.total_records == 0 {
        let _ = writeln!(output, "No check-ins recorded for this window.");
    } else {
        let _ = writeln!(output, "- Check-ins: {}", analysis.total_records);
        let _ = writeln!(output, "- Average stress: {:.1}", analysis.average_stress);
        match analysis.weekly_average {
            Some(weekly) => {
                let _ = writeln!(output, "- Last 7 days: {weekly:.1}");
            }
            None => {
                let _ = writeln!(output, "- Last 7 days: no check-ins");
            }
        }
        let _ = writeln!(output, "- High-stress days: {}", analysis.high_stress_days);
    }
    let _ = writeln!(output, "- Trend: {}", analysis.trend.label());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stress Peaks");

    if analysis.stress_peaks.is_empty() {
        let _ = writeln!(output, "No peaks to show.");
    } else {
        for peak in &analysis.stress_peaks {
            let marker = if peak.is_high_stress { " (high)" } else { "" };
            let _ = writeln!(output, "- {}: {}/10{}", peak.date, peak.stress_level, marker);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Recommendations ({} stress, today {}/10)",
        dashboard.band.label(),
        dashboard.today_stress_level
    );
    for rec in &dashboard.recommendations {
        let _ = writeln!(
            output,
            "{}. **{}** ({}, {} min): {}",
            rec.priority,
            rec.title,
            rec.category.label(),
            rec.duration_minutes,
            rec.description
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Mindfulness Tips");
    for tip in &dashboard.mindfulness_tips {
        let _ = writeln!(output, "- {tip}");
    }

    let mut noted: Vec<&StressRecord> = records.iter().filter(|r| r.notes.is_some()).collect();
    noted.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Notes");

    if noted.is_empty() {
        let _ = writeln!(output, "No notes recorded for this window.");
    } else {
        for record in noted.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} (stress {}): {}",
                record.date,
                record.stress_level,
                record.notes.as_deref().unwrap_or_default()
            );
        }
    }

    output
}
