use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::EngineError;

/// The five interchangeable winner selection strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FairnessAlgorithm {
    #[default]
    PureRandom,
    WeightedRandom,
    PriorityBased,
    TimeBased,
    Hybrid,
}

impl FairnessAlgorithm {
    pub const ALL: [FairnessAlgorithm; 5] = [
        Self::PureRandom,
        Self::WeightedRandom,
        Self::PriorityBased,
        Self::TimeBased,
        Self::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PureRandom => "PureRandom",
            Self::WeightedRandom => "WeightedRandom",
            Self::PriorityBased => "PriorityBased",
            Self::TimeBased => "TimeBased",
            Self::Hybrid => "Hybrid",
        }
    }

    /// Whether the strategy draws from a random source at all.
    pub fn is_randomized(&self) -> bool {
        !matches!(self, Self::PriorityBased)
    }
}

impl fmt::Display for FairnessAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FairnessAlgorithm {
    type Err = EngineError;

    /// Case-insensitive; `_`, `-` and spaces are ignored, so `pure_random` names `PureRandom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| EngineError::UnknownStrategy(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContestStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
    Cancelled,
}

/// Multipliers for fitness-proportionate (weighted random) selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub engagement_multiplier: f64,
    pub referral_bonus: f64,
    pub priority_factor: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            engagement_multiplier: 1.0,
            referral_bonus: 5.0,
            priority_factor: 1.0,
        }
    }
}

/// Component weights for composite (hybrid) scoring. They are not normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    pub random: f64,
    pub engagement: f64,
    pub priority: f64,
    pub time: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            random: 0.4,
            engagement: 0.3,
            priority: 0.2,
            time: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub participant_id: Uuid,
    pub selected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Contest {
    pub id: Uuid,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub status: ContestStatus,
    #[validate(range(min = 1, message = "number_of_winners must be at least 1"))]
    pub number_of_winners: u32,
    #[serde(default)]
    pub random_seed: Option<String>,
    #[serde(default)]
    pub engagement_weights: EngagementWeights,
    #[serde(default)]
    pub hybrid_weights: HybridWeights,
    #[serde(default = "default_time_windows")]
    #[validate(range(min = 1, message = "time_windows must be at least 1"))]
    pub time_windows: usize,
    #[serde(default)]
    pub fairness_algorithm: FairnessAlgorithm,
    #[serde(default)]
    pub winners: Vec<WinnerRecord>,
    #[serde(default)]
    pub fairness_score: Option<u8>,
}

pub fn default_time_windows() -> usize {
    5
}

impl Contest {
    pub fn new(title: impl Into<String>, number_of_winners: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            status: ContestStatus::Active,
            number_of_winners,
            random_seed: None,
            engagement_weights: EngagementWeights::default(),
            hybrid_weights: HybridWeights::default(),
            time_windows: default_time_windows(),
            fairness_algorithm: FairnessAlgorithm::default(),
            winners: Vec::new(),
            fairness_score: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ContestStatus::Completed
    }
}
