use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const STRESS_MIN: i32 = 1;
pub const STRESS_MAX: i32 = 10;
pub const MOOD_MIN: i32 = 1;
pub const MOOD_MAX: i32 = 5;
pub const SLEEP_MAX_HOURS: f64 = 24.0;

/// A stored check-in. Immutable once written; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub stress_level: i32,
    pub sleep_hours: f64,
    pub mood: i32,
    pub activity_minutes: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStressRecord {
    pub date: NaiveDate,
    pub stress_level: i32,
    pub sleep_hours: f64,
    pub mood: i32,
    pub activity_minutes: i32,
    pub notes: Option<String>,
}

impl NewStressRecord {
    /// Clamps every field into its documented range. Out-of-range input is
    /// never rejected.
    pub fn normalized(self) -> Self {
        let sleep_hours = if self.sleep_hours.is_finite() {
            self.sleep_hours.clamp(0.0, SLEEP_MAX_HOURS)
        } else {
            0.0
        };

        Self {
            date: self.date,
            stress_level: clamp_stress(self.stress_level),
            sleep_hours,
            mood: self.mood.clamp(MOOD_MIN, MOOD_MAX),
            activity_minutes: self.activity_minutes.max(0),
            notes: self
                .notes
                .map(|note| note.trim().to_string())
                .filter(|note| !note.is_empty()),
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.clone().normalized() == *self
    }

    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> StressRecord {
        StressRecord {
            id,
            date: self.date,
            stress_level: self.stress_level,
            sleep_hours: self.sleep_hours,
            mood: self.mood,
            activity_minutes: self.activity_minutes,
            notes: self.notes,
            created_at,
        }
    }
}

pub fn clamp_stress(level: i32) -> i32 {
    level.clamp(STRESS_MIN, STRESS_MAX)
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressPeak {
    pub date: NaiveDate,
    pub stress_level: i32,
    pub is_high_stress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StressTrend {
    Improving,
    Stable,
    Worsening,
    InsufficientData,
}

impl StressTrend {
    pub fn label(&self) -> &'static str {
        match self {
            StressTrend::Improving => "improving",
            StressTrend::Stable => "stable",
            StressTrend::Worsening => "worsening",
            StressTrend::InsufficientData => "insufficient data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub average_stress: f64,
    pub weekly_average: Option<f64>,
    pub stress_peaks: Vec<StressPeak>,
    pub trend: StressTrend,
    pub high_stress_days: usize,
    pub total_records: usize,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationCategory {
    Breathing,
    Mindfulness,
    Technique,
}

impl RelaxationCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RelaxationCategory::Breathing => "breathing",
            RelaxationCategory::Mindfulness => "mindfulness",
            RelaxationCategory::Technique => "technique",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub category: RelaxationCategory,
    pub duration_minutes: u32,
    pub priority: u32,
}
