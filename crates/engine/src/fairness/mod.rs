pub mod report;
pub mod rng;
pub mod scoring;
pub mod strategies;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use report::{FairnessReport, ReportMetrics, WinnerSummary, explain_selection_criteria};
pub use rng::{RandomSource, SecureRandom, SeededRandom};
pub use scoring::{HIGH_FRAUD_THRESHOLD, TimeDistribution, analyze_time_distribution, calculate_fairness_score};
pub use strategies::{
    hybrid_selection, participant_weight, priority_based_selection, pure_random_selection,
    time_based_selection, weighted_random_selection,
};

use crate::models::{Contest, EngagementWeights, FairnessAlgorithm, HybridWeights, Participant};

/// Strategy-specific parameters, taken from the contest.
#[derive(Debug, Clone, Copy)]
pub struct StrategyOptions {
    pub engagement_weights: EngagementWeights,
    pub hybrid_weights: HybridWeights,
    pub time_windows: usize,
    pub now: DateTime<Utc>,
}

impl StrategyOptions {
    pub fn from_contest(contest: &Contest, now: DateTime<Utc>) -> Self {
        Self {
            engagement_weights: contest.engagement_weights,
            hybrid_weights: contest.hybrid_weights,
            time_windows: contest.time_windows,
            now,
        }
    }
}

/// Runs one strategy over an already-eligible pool.
pub fn select(
    algorithm: FairnessAlgorithm,
    participants: &[Participant],
    count: usize,
    options: &StrategyOptions,
    rng: &mut dyn RandomSource,
) -> Vec<Participant> {
    match algorithm {
        FairnessAlgorithm::PureRandom => pure_random_selection(participants, count, rng),
        FairnessAlgorithm::WeightedRandom => {
            weighted_random_selection(participants, count, &options.engagement_weights, rng)
        }
        FairnessAlgorithm::PriorityBased => priority_based_selection(participants, count),
        FairnessAlgorithm::TimeBased => {
            time_based_selection(participants, count, options.time_windows, rng)
        }
        FairnessAlgorithm::Hybrid => {
            hybrid_selection(participants, count, &options.hybrid_weights, options.now, rng)
        }
    }
}

/// Winners of one contest draw together with the audit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub contest_id: Uuid,
    pub seed: Option<String>,
    pub winners: Vec<Participant>,
    pub report: FairnessReport,
}

impl SelectionResult {
    pub fn winner_ids(&self) -> Vec<Uuid> {
        self.winners.iter().map(|w| w.id).collect()
    }

    pub fn fairness_score(&self) -> u8 {
        self.report.fairness_score
    }
}

/// Selects winners and assembles the report in one step.
pub fn run_selection(
    contest: &Contest,
    participants: &[Participant],
    algorithm: FairnessAlgorithm,
    count: usize,
    rng: &mut dyn RandomSource,
    now: DateTime<Utc>,
) -> SelectionResult {
    let options = StrategyOptions::from_contest(contest, now);
    let winners = select(algorithm, participants, count, &options, rng);
    let report = FairnessReport::generate(contest, participants, &winners, algorithm, now);

    SelectionResult {
        contest_id: contest.id,
        seed: contest.random_seed.clone(),
        winners,
        report,
    }
}

/// Replays a published-seed pure random draw and checks it produced `expected`, in order.
pub fn verify_seeded_draw(
    participants: &[Participant],
    count: usize,
    seed: &str,
    expected: &[Uuid],
) -> bool {
    let mut rng = SeededRandom::from_seed(seed);
    let replayed = pure_random_selection(participants, count, &mut rng);
    replayed.len() == expected.len() && replayed.iter().zip(expected).all(|(p, id)| p.id == *id)
}
