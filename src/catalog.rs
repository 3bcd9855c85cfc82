use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// One of the seven ordinal mood levels, 0 (very unpleasant) through 6
/// (very pleasant).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct FeelingLevel(u8);

impl FeelingLevel {
    pub const MIN: FeelingLevel = FeelingLevel(0);
    pub const MAX: FeelingLevel = FeelingLevel(6);

    pub fn value(self) -> u8 {
        self.0
    }

    /// The catalog record for this level.
    pub fn info(self) -> &'static FeelingStateInfo {
        &FEELING_STATES[usize::from(self.0)]
    }

    pub fn band(self) -> MoodBand {
        MoodBand::of(self)
    }
}

impl TryFrom<i64> for FeelingLevel {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=i64::from(Self::MAX.0)).contains(&value) {
            Ok(FeelingLevel(value as u8))
        } else {
            Err(ValidationError::FeelingStateOutOfRange(value))
        }
    }
}

impl From<FeelingLevel> for u8 {
    fn from(level: FeelingLevel) -> u8 {
        level.0
    }
}

impl From<FeelingLevel> for i16 {
    fn from(level: FeelingLevel) -> i16 {
        i16::from(level.0)
    }
}

/// The five bands used by mood distributions. Levels 2–3 and 4–5
/// share a band; the extremes get one each.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoodBand {
    VeryBad,
    Bad,
    Neutral,
    Good,
    VeryGood,
}

impl MoodBand {
    pub fn of(level: FeelingLevel) -> MoodBand {
        match level.0 {
            0 => MoodBand::VeryBad,
            1 => MoodBand::Bad,
            2 | 3 => MoodBand::Neutral,
            4 | 5 => MoodBand::Good,
            _ => MoodBand::VeryGood,
        }
    }
}

/// Display metadata for a feeling level.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeelingStateInfo {
    pub value: u8,
    pub label: &'static str,
    pub short_label: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

pub static FEELING_STATES: [FeelingStateInfo; 7] = [
    FeelingStateInfo {
        value: 0,
        label: "Very Unpleasant",
        short_label: "Very Bad",
        color: "#dc2626",
        description: "Feeling terrible, overwhelmed, or in distress",
    },
    FeelingStateInfo {
        value: 1,
        label: "Unpleasant",
        short_label: "Bad",
        color: "#ea580c",
        description: "Feeling down, frustrated, or uncomfortable",
    },
    FeelingStateInfo {
        value: 2,
        label: "Slightly Unpleasant",
        short_label: "Meh",
        color: "#d97706",
        description: "Feeling a bit off or mildly bothered",
    },
    FeelingStateInfo {
        value: 3,
        label: "Neutral",
        short_label: "Okay",
        color: "#6b7280",
        description: "Feeling balanced, neither good nor bad",
    },
    FeelingStateInfo {
        value: 4,
        label: "Slightly Pleasant",
        short_label: "Good",
        color: "#16a34a",
        description: "Feeling pretty good, content, or satisfied",
    },
    FeelingStateInfo {
        value: 5,
        label: "Pleasant",
        short_label: "Great",
        color: "#15803d",
        description: "Feeling happy, positive, or energized",
    },
    FeelingStateInfo {
        value: 6,
        label: "Very Pleasant",
        short_label: "Amazing",
        color: "#166534",
        description: "Feeling fantastic, joyful, or euphoric",
    },
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum FactorCategory {
    Personal,
    Social,
    Work,
    External,
}

/// A contextual influence on mood that can be attached to an entry.
#[derive(Debug, Serialize)]
pub struct ImpactFactor {
    pub name: &'static str,
    pub icon: &'static str,
    pub category: FactorCategory,
}

macro_rules! factors {
    ($($name:literal, $icon:literal, $category:ident);+ $(;)?) => {
        [$(ImpactFactor { name: $name, icon: $icon, category: FactorCategory::$category }),+]
    };
}

pub static IMPACT_FACTORS: [ImpactFactor; 18] = factors![
    "Health", "🏥", Personal;
    "Fitness", "💪", Personal;
    "Self-Care", "🧘", Personal;
    "Hobbies", "🎨", Personal;
    "Identity", "🪞", Personal;
    "Spirituality", "🙏", Personal;
    "Community", "🏘️", Social;
    "Family", "👨‍👩‍👧‍👦", Social;
    "Friends", "👥", Social;
    "Partner", "💕", Social;
    "Dating", "💘", Social;
    "Tasks", "✅", Work;
    "Work", "💼", Work;
    "Education", "📚", Work;
    "Travel", "✈️", External;
    "Weather", "🌤️", External;
    "Current Events", "📰", External;
    "Money", "💰", External;
];

/// Looks up a factor by name, ignoring ASCII case.
pub fn impact_factor(name: &str) -> Option<&'static ImpactFactor> {
    IMPACT_FACTORS
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
}

/// Whether an emotion is shown up front or behind "more".
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EmotionGroup {
    Primary,
    More,
}

/// A suggested emotion label. Submissions may use any label; these are
/// what clients offer by default.
#[derive(Debug, Serialize)]
pub struct Emotion {
    pub label: &'static str,
    pub group: EmotionGroup,
}

macro_rules! emotions {
    ($($group:ident: $($label:literal),+);+ $(;)?) => {
        [$($(Emotion { label: $label, group: EmotionGroup::$group }),+),+]
    };
}

/// Primary emotions first, in display order.
pub static EMOTIONS: [Emotion; 23] = emotions![
    Primary:
        "Amazed", "Excited", "Surprised", "Passionate", "Happy", "Joyful",
        "Brave", "Proud", "Confident", "Hopeful", "Amused", "Satisfied",
        "Relieved", "Grateful", "Content", "Calm", "Peaceful";
    More:
        "Energetic", "Optimistic", "Inspired", "Motivated", "Relaxed", "Serene";
];
