use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scoring::{HIGH_FRAUD_THRESHOLD, TimeDistribution, analyze_time_distribution, calculate_fairness_score};
use crate::models::{Contest, FairnessAlgorithm, Participant, Platform};

/// Auditable summary of one winner selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairnessReport {
    pub algorithm: FairnessAlgorithm,
    pub generated_at: DateTime<Utc>,
    pub total_participants: usize,
    pub total_winners: usize,
    pub fairness_score: u8,
    pub metrics: ReportMetrics,
    pub winners: Vec<WinnerSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub duplicates_detected: usize,
    pub fraud_attempts: usize,
    pub average_engagement: f64,
    pub platform_distribution: BTreeMap<String, usize>,
    pub time_distribution: TimeDistribution,
    pub selection_criteria: String,
}

/// Public-safe projection of a winning participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub engagement_score: u32,
    pub priority: i64,
    pub registration_date: DateTime<Utc>,
    pub platform: Platform,
}

impl From<&Participant> for WinnerSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            name: participant.name.clone(),
            email: participant.email.clone(),
            engagement_score: participant.engagement_score,
            priority: participant.priority,
            registration_date: participant.registration_date,
            platform: participant.platform,
        }
    }
}

impl FairnessReport {
    pub fn generate(
        contest: &Contest,
        participants: &[Participant],
        winners: &[Participant],
        algorithm: FairnessAlgorithm,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let metrics = ReportMetrics {
            duplicates_detected: participants.iter().filter(|p| p.is_duplicate).count(),
            fraud_attempts: participants
                .iter()
                .filter(|p| p.fraud_score > HIGH_FRAUD_THRESHOLD)
                .count(),
            average_engagement: average_engagement(participants),
            platform_distribution: platform_distribution(participants),
            time_distribution: analyze_time_distribution(participants),
            selection_criteria: explain_selection_criteria(algorithm).to_string(),
        };

        Self {
            algorithm,
            generated_at,
            total_participants: participants.len(),
            total_winners: winners.len(),
            fairness_score: calculate_fairness_score(contest, participants, winners),
            metrics,
            winners: winners.iter().map(WinnerSummary::from).collect(),
        }
    }
}

pub fn explain_selection_criteria(algorithm: FairnessAlgorithm) -> &'static str {
    match algorithm {
        FairnessAlgorithm::PureRandom => {
            "Winners selected using cryptographically secure random number generation. Each participant has equal probability of winning."
        }
        FairnessAlgorithm::WeightedRandom => {
            "Winners selected based on engagement scores. Higher engagement increases probability but does not guarantee selection."
        }
        FairnessAlgorithm::PriorityBased => {
            "Winners selected based on priority scores. Transparent criteria including registration time and engagement."
        }
        FairnessAlgorithm::TimeBased => {
            "Winners selected using stratified sampling across registration time windows. Ensures fair representation across time."
        }
        FairnessAlgorithm::Hybrid => {
            "Winners selected using composite scoring combining randomness, engagement, priority, and time factors."
        }
    }
}

fn average_engagement(participants: &[Participant]) -> f64 {
    if participants.is_empty() {
        return 0.0;
    }
    let total: u64 = participants.iter().map(|p| p.engagement_score as u64).sum();
    total as f64 / participants.len() as f64
}

fn platform_distribution(participants: &[Participant]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for participant in participants {
        *distribution.entry(participant.platform.to_string()).or_insert(0) += 1;
    }
    distribution
}
