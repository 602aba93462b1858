use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Contest, Participant};

/// Fraud scores above this mark a participant as a likely fraud attempt.
pub const HIGH_FRAUD_THRESHOLD: u8 = 70;

const RATIO_TOLERANCE: f64 = 0.01;
const MIN_PLATFORM_COVERAGE: f64 = 0.5;
const MAX_TIME_SKEWNESS: f64 = 0.7;

const RATIO_MISMATCH_PENALTY: i32 = 10;
const DUPLICATE_WINNER_PENALTY: i32 = 30;
const FRAUDULENT_WINNER_PENALTY: i32 = 25;
const PLATFORM_SKEW_PENALTY: i32 = 15;
const TIME_SKEW_PENALTY: i32 = 10;

/// Spread of registration times over a set of participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDistribution {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub spread_ms: i64,
    /// `|mean - median| / range`, or 0 when every time is identical.
    pub skewness: f64,
}

pub fn analyze_time_distribution(participants: &[Participant]) -> TimeDistribution {
    let mut times: Vec<i64> = participants.iter().map(Participant::registered_at_millis).collect();
    if times.is_empty() {
        return TimeDistribution {
            earliest: None,
            latest: None,
            spread_ms: 0,
            skewness: 0.0,
        };
    }
    times.sort_unstable();

    let earliest = times[0];
    let latest = times[times.len() - 1];
    let range = latest - earliest;

    let skewness = if range == 0 {
        0.0
    } else {
        let mean = times.iter().map(|&t| (t - earliest) as f64).sum::<f64>() / times.len() as f64;
        let median = median_offset(&times, earliest);
        (mean - median).abs() / range as f64
    };

    TimeDistribution {
        earliest: DateTime::from_timestamp_millis(earliest),
        latest: DateTime::from_timestamp_millis(latest),
        spread_ms: range,
        skewness,
    }
}

/// Audits a winner set, starting from 100 and deducting for each detectable bias.
pub fn calculate_fairness_score(
    contest: &Contest,
    participants: &[Participant],
    winners: &[Participant],
) -> u8 {
    let mut score: i32 = 100;

    if !participants.is_empty() {
        let pool = participants.len() as f64;
        let expected_ratio = contest.number_of_winners as f64 / pool;
        let actual_ratio = winners.len() as f64 / pool;
        if (expected_ratio - actual_ratio).abs() > RATIO_TOLERANCE {
            score -= RATIO_MISMATCH_PENALTY;
        }
    }

    if winners.iter().any(|w| w.is_duplicate) {
        score -= DUPLICATE_WINNER_PENALTY;
    }

    if winners.iter().any(|w| w.fraud_score > HIGH_FRAUD_THRESHOLD) {
        score -= FRAUDULENT_WINNER_PENALTY;
    }

    let pool_platforms: HashSet<_> = participants.iter().map(|p| p.platform).collect();
    if pool_platforms.len() > 1 {
        let winner_platforms: HashSet<_> = winners.iter().map(|w| w.platform).collect();
        let coverage = winner_platforms.len() as f64 / pool_platforms.len() as f64;
        if coverage < MIN_PLATFORM_COVERAGE {
            score -= PLATFORM_SKEW_PENALTY;
        }
    }

    if analyze_time_distribution(winners).skewness > MAX_TIME_SKEWNESS {
        score -= TIME_SKEW_PENALTY;
    }

    score.clamp(0, 100) as u8
}

/// Upper median: for an even count the later of the two middle values.
fn median_offset(sorted: &[i64], origin: i64) -> f64 {
    (sorted[sorted.len() / 2] - origin) as f64
}
