use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::models::{AnalysisResult, DateRange, StressPeak, StressRecord, StressTrend};

pub const HIGH_STRESS_THRESHOLD: i32 = 7;
pub const MIN_RECORDS_FOR_TREND: usize = 3;
pub const MAX_PEAKS: usize = 5;
pub const WEEKLY_WINDOW_DAYS: i64 = 7;
const TREND_TOLERANCE: f64 = 0.5;

/// Summarises `records`. Total over its input: an empty slice yields the
/// insufficient-data result rather than an error.
pub fn analyze(
    records: &[StressRecord],
    range: Option<DateRange>,
    today: NaiveDate,
) -> AnalysisResult {
    if records.is_empty() {
        return AnalysisResult {
            average_stress: 0.0,
            weekly_average: None,
            stress_peaks: Vec::new(),
            trend: StressTrend::InsufficientData,
            high_stress_days: 0,
            total_records: 0,
            date_range: range.unwrap_or_else(|| DateRange::single(today)),
        };
    }

    let daily = daily_maxima(records);
    let high_stress_days = daily
        .values()
        .filter(|max| **max >= HIGH_STRESS_THRESHOLD)
        .count();

    AnalysisResult {
        average_stress: mean(records.iter().map(|r| r.stress_level)).unwrap_or(0.0),
        weekly_average: weekly_average(records, today),
        stress_peaks: peaks_from_daily(&daily),
        trend: determine_trend(records),
        high_stress_days,
        total_records: records.len(),
        date_range: range.unwrap_or_else(|| covering_range(records, today)),
    }
}

/// Highest stress level per calendar day, keyed in date order.
pub fn daily_maxima(records: &[StressRecord]) -> BTreeMap<NaiveDate, i32> {
    let mut daily: BTreeMap<NaiveDate, i32> = BTreeMap::new();
    for record in records {
        daily
            .entry(record.date)
            .and_modify(|max| *max = (*max).max(record.stress_level))
            .or_insert(record.stress_level);
    }
    daily
}

// Stable sort over date-ordered days: equal maxima stay earliest date first.
fn peaks_from_daily(daily: &BTreeMap<NaiveDate, i32>) -> Vec<StressPeak> {
    let mut peaks: Vec<StressPeak> = daily
        .iter()
        .map(|(date, max)| StressPeak {
            date: *date,
            stress_level: *max,
            is_high_stress: *max >= HIGH_STRESS_THRESHOLD,
        })
        .collect();

    peaks.sort_by(|a, b| b.stress_level.cmp(&a.stress_level));
    peaks.truncate(MAX_PEAKS);
    peaks
}

/// Mean stress over `today - 6 ..= today`, or `None` when that window is empty.
pub fn weekly_average(records: &[StressRecord], today: NaiveDate) -> Option<f64> {
    let window = window_range(WEEKLY_WINDOW_DAYS, today);
    mean(
        records
            .iter()
            .filter(|r| window.contains(r.date))
            .map(|r| r.stress_level),
    )
}

/// Two-bucket comparison of the older and newer halves of the date-sorted
/// records. A coarse direction signal, not a regression.
pub fn determine_trend(records: &[StressRecord]) -> StressTrend {
    if records.len() < MIN_RECORDS_FOR_TREND {
        return StressTrend::InsufficientData;
    }

    let mut sorted: Vec<&StressRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

    let (first, second) = sorted.split_at(sorted.len() / 2);
    let first_avg = mean(first.iter().map(|r| r.stress_level)).unwrap_or(0.0);
    let second_avg = mean(second.iter().map(|r| r.stress_level)).unwrap_or(0.0);
    let diff = second_avg - first_avg;

    if diff < -TREND_TOLERANCE {
        StressTrend::Improving
    } else if diff > TREND_TOLERANCE {
        StressTrend::Worsening
    } else {
        StressTrend::Stable
    }
}

/// Highest stress logged on `today`, if anything was logged.
pub fn today_peak(records: &[StressRecord], today: NaiveDate) -> Option<i32> {
    records
        .iter()
        .filter(|r| r.date == today)
        .map(|r| r.stress_level)
        .max()
}

/// The last `days` calendar days ending at `today`, inclusive.
pub fn window_range(days: i64, today: NaiveDate) -> DateRange {
    DateRange::new(today - Duration::days(days.max(1) - 1), today)
}

fn covering_range(records: &[StressRecord], today: NaiveDate) -> DateRange {
    let start = records.iter().map(|r| r.date).min();
    let end = records.iter().map(|r| r.date).max();
    match (start, end) {
        (Some(start), Some(end)) => DateRange::new(start, end),
        _ => DateRange::single(today),
    }
}

fn mean(levels: impl Iterator<Item = i32>) -> Option<f64> {
    let (count, total) = levels.fold((0usize, 0i64), |(count, total), level| {
        (count + 1, total + level as i64)
    });
    if count == 0 {
        None
    } else {
        Some(total as f64 / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn record(id: i64, days_ago: i64, stress_level: i32) -> StressRecord {
        StressRecord {
            id,
            date: today() - Duration::days(days_ago),
            stress_level,
            sleep_hours: 7.0,
            mood: 3,
            activity_minutes: 20,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap()
                + Duration::minutes(id),
        }
    }

    #[test]
    fn empty_input_reports_insufficient_data() {
        let result = analyze(&[], None, today());
        assert_eq!(result.trend, StressTrend::InsufficientData);
        assert_eq!(result.average_stress, 0.0);
        assert_eq!(result.weekly_average, None);
        assert!(result.stress_peaks.is_empty());
        assert_eq!(result.high_stress_days, 0);
        assert_eq!(result.total_records, 0);
        assert_eq!(result.date_range, DateRange::single(today()));
    }

    #[test]
    fn empty_input_keeps_supplied_range() {
        let range = window_range(30, today());
        let result = analyze(&[], Some(range), today());
        assert_eq!(result.date_range, range);
    }

    #[test]
    fn average_counts_every_check_in_regardless_of_order() {
        let records = vec![record(1, 0, 2), record(2, 0, 9), record(3, 3, 4), record(4, 5, 5)];
        let mut reversed = records.clone();
        reversed.reverse();

        let forward = analyze(&records, None, today());
        let backward = analyze(&reversed, None, today());
        assert!((forward.average_stress - 5.0).abs() < 1e-9);
        assert_eq!(forward.average_stress, backward.average_stress);
        assert_eq!(forward.total_records, 4);
    }

    #[test]
    fn high_stress_days_use_daily_maximum() {
        let records = vec![
            record(1, 0, 3),
            record(2, 0, 7),
            record(3, 1, 8),
            record(4, 1, 9),
            record(5, 2, 6),
        ];
        let result = analyze(&records, None, today());
        assert_eq!(result.high_stress_days, 2);
        assert!(result.high_stress_days <= daily_maxima(&records).len());
    }

    #[test]
    fn peaks_are_sorted_capped_and_tie_break_on_earliest_date() {
        let records = vec![
            record(1, 0, 6),
            record(2, 1, 9),
            record(3, 2, 6),
            record(4, 3, 2),
            record(5, 4, 9),
            record(6, 5, 4),
            record(7, 6, 3),
        ];
        let peaks = analyze(&records, None, today()).stress_peaks;
        assert_eq!(peaks.len(), MAX_PEAKS);
        assert!(peaks.windows(2).all(|w| w[0].stress_level >= w[1].stress_level));
        assert_eq!(peaks[0].date, today() - Duration::days(4));
        assert_eq!(peaks[1].date, today() - Duration::days(1));
        assert_eq!(peaks[2].date, today() - Duration::days(2));
        assert!(peaks[0].is_high_stress);
        assert!(!peaks[2].is_high_stress);
    }

    #[test]
    fn weekly_average_covers_today_and_previous_six_days() {
        let records = vec![record(1, 0, 4), record(2, 6, 8), record(3, 7, 10)];
        assert_eq!(weekly_average(&records, today()), Some(6.0));
    }

    #[test]
    fn weekly_average_is_absent_without_recent_records() {
        let records = vec![record(1, 10, 4), record(2, 20, 8)];
        assert_eq!(weekly_average(&records, today()), None);
        assert_eq!(analyze(&records, None, today()).weekly_average, None);
    }

    #[test]
    fn weekly_average_excludes_future_records() {
        let records = vec![record(1, 0, 2), record(2, -1, 10)];
        assert_eq!(weekly_average(&records, today()), Some(2.0));
    }

    #[test]
    fn trend_orders_same_day_by_created_at() {
        // Input order reads 9,9,2,2; insertion time reads 2,2,9,9.
        let mut records = vec![record(3, 0, 9), record(4, 0, 9), record(1, 0, 2), record(2, 0, 2)];
        assert_eq!(determine_trend(&records), StressTrend::Worsening);

        records.iter_mut().for_each(|r| r.stress_level = 11 - r.stress_level);
        assert_eq!(determine_trend(&records), StressTrend::Improving);
    }

    #[test]
    fn trend_needs_three_records() {
        let records = vec![record(1, 1, 2), record(2, 0, 9)];
        assert_eq!(determine_trend(&records), StressTrend::InsufficientData);
    }

    #[test]
    fn trend_worsens_when_second_half_is_higher() {
        let records = vec![
            record(1, 0, 9),
            record(2, 1, 9),
            record(3, 2, 9),
            record(4, 3, 2),
            record(5, 4, 2),
            record(6, 5, 2),
        ];
        assert_eq!(determine_trend(&records), StressTrend::Worsening);
    }

    #[test]
    fn trend_improves_when_second_half_is_lower() {
        let records = vec![record(1, 4, 8), record(2, 3, 7), record(3, 1, 3), record(4, 0, 2)];
        assert_eq!(determine_trend(&records), StressTrend::Improving);
    }

    #[test]
    fn trend_is_stable_within_tolerance() {
        // Odd count: first half takes the single oldest record.
        let records = vec![record(1, 2, 5), record(2, 1, 5), record(3, 0, 6)];
        assert_eq!(determine_trend(&records), StressTrend::Stable);
    }

    #[test]
    fn range_defaults_to_covered_dates() {
        let records = vec![record(1, 3, 5), record(2, 9, 4), record(3, 1, 6)];
        let result = analyze(&records, None, today());
        assert_eq!(
            result.date_range,
            DateRange::new(today() - Duration::days(9), today() - Duration::days(1))
        );
    }

    #[test]
    fn today_peak_ignores_other_days() {
        let records = vec![record(1, 0, 3), record(2, 0, 8), record(3, 1, 10)];
        assert_eq!(today_peak(&records, today()), Some(8));
        assert_eq!(today_peak(&records[2..], today()), None);
    }

    #[test]
    fn window_range_is_inclusive_of_today() {
        let range = window_range(7, today());
        assert_eq!(range.end, today());
        assert_eq!(range.start, today() - Duration::days(6));
        assert_eq!(window_range(0, today()), DateRange::single(today()));
    }
}
