use std::path::Path;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

use crate::models::{clamp_stress, Recommendation, RelaxationCategory};

pub const HIGH_BAND_FLOOR: i32 = 8;
pub const MEDIUM_BAND_FLOOR: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StressBand {
    Low,
    Medium,
    High,
}

impl StressBand {
    /// Bands a level after clamping it to the 1-10 scale.
    pub fn from_level(level: i32) -> Self {
        let level = clamp_stress(level);
        if level >= HIGH_BAND_FLOOR {
            StressBand::High
        } else if level >= MEDIUM_BAND_FLOOR {
            StressBand::Medium
        } else {
            StressBand::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StressBand::Low => "low",
            StressBand::Medium => "medium",
            StressBand::High => "high",
        }
    }
}

/// Content table behind the selector: one ordered list per band plus the
/// mindfulness tips. Swappable for a localized JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub high: Vec<Recommendation>,
    pub medium: Vec<Recommendation>,
    pub low: Vec<Recommendation>,
    pub tips: Vec<String>,
}

impl Catalog {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut catalog: Catalog = serde_json::from_str(raw)?;
        for (band, items) in [
            ("high", &mut catalog.high),
            ("medium", &mut catalog.medium),
            ("low", &mut catalog.low),
        ] {
            ensure!(!items.is_empty(), "{band} band has no recommendations");
            items.sort_by_key(|item| item.priority);
        }
        Ok(catalog)
    }

    pub fn band(&self, band: StressBand) -> &[Recommendation] {
        match band {
            StressBand::High => &self.high,
            StressBand::Medium => &self.medium,
            StressBand::Low => &self.low,
        }
    }

    pub fn recommend(&self, level: i32) -> &[Recommendation] {
        self.band(StressBand::from_level(level))
    }

    pub fn mindfulness_tips(&self) -> &[String] {
        &self.tips
    }
}

fn item(
    title: &str,
    description: &str,
    category: RelaxationCategory,
    duration_minutes: u32,
    priority: u32,
) -> Recommendation {
    Recommendation {
        title: title.to_string(),
        description: description.to_string(),
        category,
        duration_minutes,
        priority,
    }
}

impl Default for Catalog {
    fn default() -> Self {
        use RelaxationCategory::{Breathing, Mindfulness, Technique};

        Self {
            high: vec![
                item(
                    "4-7-8 Breathing",
                    "Inhale for 4 seconds, hold for 7, exhale slowly for 8.",
                    Breathing,
                    2,
                    1,
                ),
                item(
                    "5-4-3-2-1 Grounding",
                    "Name 5 things you see, 4 you hear, 3 you can touch, 2 you smell and 1 you taste.",
                    Mindfulness,
                    3,
                    2,
                ),
                item(
                    "Progressive Muscle Relaxation",
                    "Tense each muscle group for a few seconds, then release, working from feet to head.",
                    Technique,
                    10,
                    3,
                ),
                item(
                    "Take a Short Break",
                    "Step away from what you are doing, stretch and drink some water.",
                    Mindfulness,
                    5,
                    4,
                ),
            ],
            medium: vec![
                item(
                    "Box Breathing",
                    "Inhale, hold, exhale and hold again, 4 seconds each.",
                    Breathing,
                    2,
                    1,
                ),
                item(
                    "Mindful Moment",
                    "Sit still and notice your breath and surroundings without judgement.",
                    Mindfulness,
                    3,
                    2,
                ),
                item(
                    "Gentle Stretching",
                    "Loosen your neck, shoulders and back with slow stretches.",
                    Technique,
                    5,
                    3,
                ),
            ],
            low: vec![
                item(
                    "Deep Breathing",
                    "Take a few slow, deep breaths into your belly.",
                    Breathing,
                    1,
                    1,
                ),
                item(
                    "Gratitude Practice",
                    "Write down three things you are grateful for today.",
                    Mindfulness,
                    2,
                    2,
                ),
            ],
            tips: [
                "Focus on one task at a time.",
                "Notice five things around you right now.",
                "Take a slow breath before answering a message.",
                "Step outside for a few minutes of fresh air.",
                "Put your phone away during meals.",
                "Stretch whenever you stand up.",
                "End the day by naming one thing that went well.",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}
