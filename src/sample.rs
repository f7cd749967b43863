use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::NewStressRecord;

const SAMPLE_NOTES: [&str; 5] = [
    "Busy day at work",
    "Had a difficult meeting",
    "Slept poorly",
    "Good workout helped",
    "Feeling overwhelmed",
];

pub const MAX_SAMPLE_DAYS: u32 = 3650;

/// One plausible check-in per day for the `days` days ending at `today`,
/// oldest first, capped at `MAX_SAMPLE_DAYS`. Demo and test fixture only.
pub fn generate_sample_records<R: Rng>(
    days: u32,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<NewStressRecord> {
    let mut records: Vec<NewStressRecord> = (0..days.min(MAX_SAMPLE_DAYS))
        .map(|offset| {
            let stress_level = rng.gen_range(2..=8);
            let sleep_hours = (4.5 + rng.gen::<f64>() * 5.0).clamp(4.0, 10.0);
            let mood = rng.gen_range(1..=5);
            let activity_minutes = rng.gen_range(0..90);
            let notes = if rng.gen_bool(0.5) && stress_level >= 6 {
                SAMPLE_NOTES.choose(&mut *rng).map(|note| note.to_string())
            } else {
                None
            };

            NewStressRecord {
                date: today - Duration::days(i64::from(offset)),
                stress_level,
                sleep_hours: (sleep_hours * 10.0).round() / 10.0,
                mood,
                activity_minutes,
                notes,
            }
        })
        .collect();

    records.sort_by_key(|record| record.date);
    records
}
