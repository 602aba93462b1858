use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::rng::RandomSource;
use crate::models::{EngagementWeights, HybridWeights, Participant};

/// Registrations older than this contribute nothing to the hybrid time component.
const HYBRID_TIME_HORIZON_DAYS: i64 = 30;

/// Fisher–Yates shuffle, then the first `count` participants.
///
/// Every participant ends up among the winners with probability `count / n`
/// as long as `rng` is uniform.
pub fn pure_random_selection(
    participants: &[Participant],
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<Participant> {
    let count = count.min(participants.len());
    if count == 0 {
        return Vec::new();
    }

    let mut pool = participants.to_vec();
    shuffle(&mut pool, rng);
    pool.truncate(count);

    debug!("Pure random draw picked {} of {}", count, participants.len());
    pool
}

/// Weight of one participant for roulette-wheel sampling, never below 1.
pub fn participant_weight(participant: &Participant, weights: &EngagementWeights) -> f64 {
    let weight = 1.0
        + participant.engagement_score as f64 * weights.engagement_multiplier
        + participant.referral_count() as f64 * weights.referral_bonus
        + participant.priority as f64 * weights.priority_factor;

    weight.max(1.0)
}

/// Fitness-proportionate sampling without replacement.
pub fn weighted_random_selection(
    participants: &[Participant],
    count: usize,
    weights: &EngagementWeights,
    rng: &mut dyn RandomSource,
) -> Vec<Participant> {
    let count = count.min(participants.len());
    if count == 0 {
        return Vec::new();
    }

    let mut remaining: Vec<(usize, f64)> = participants
        .iter()
        .map(|p| participant_weight(p, weights))
        .enumerate()
        .collect();

    let total: f64 = remaining.iter().map(|(_, weight)| weight).sum();
    if !(total.is_finite() && total > 0.0) {
        warn!(
            "Total selection weight {} is unusable, falling back to pure random draw",
            total
        );
        return pure_random_selection(participants, count, rng);
    }

    let mut winners = Vec::with_capacity(count);
    for _ in 0..count {
        let current_total: f64 = remaining.iter().map(|(_, weight)| weight).sum();
        let draw = rng.next_unit() * current_total;

        // Rounding can leave the accumulator just short of the draw; the last
        // entry then takes it.
        let mut accumulated = 0.0;
        let mut selected = remaining.len() - 1;
        for (position, (_, weight)) in remaining.iter().enumerate() {
            accumulated += weight;
            if accumulated >= draw {
                selected = position;
                break;
            }
        }

        let (index, weight) = remaining.remove(selected);
        debug!(
            "Weighted draw picked participant {} (weight {:.2} of {:.2})",
            participants[index].id, weight, current_total
        );
        winners.push(participants[index].clone());
    }

    winners
}

/// Deterministic top-K: highest priority first, earlier registration breaks ties.
pub fn priority_based_selection(participants: &[Participant], count: usize) -> Vec<Participant> {
    let count = count.min(participants.len());

    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.registration_date.cmp(&b.registration_date))
    });

    sorted.into_iter().take(count).cloned().collect()
}

/// Stratified sampling over chronological registration windows.
///
/// Participants are ordered by registration date and cut into `window_count`
/// contiguous windows of equal size (the last may be smaller). Each window
/// contributes up to `ceil(count / windows)` randomly drawn winners. When the
/// quotas of short windows leave the result below `count`, the shortfall is
/// drawn from the participants the windows did not pick.
pub fn time_based_selection(
    participants: &[Participant],
    count: usize,
    window_count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<Participant> {
    let count = count.min(participants.len());
    if count == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by_key(|p| p.registration_date);

    let window_size = sorted.len().div_ceil(window_count.max(1));
    let windows: Vec<&[&Participant]> = sorted.chunks(window_size).collect();
    let per_window = count.div_ceil(windows.len());

    debug!(
        "Time-based draw over {} windows of up to {} participants, {} per window",
        windows.len(),
        window_size,
        per_window
    );

    let mut winners: Vec<&Participant> = Vec::with_capacity(count);
    let mut leftovers: Vec<&Participant> = Vec::new();
    for window in windows {
        let mut stratum = window.to_vec();
        shuffle(&mut stratum, rng);
        let taken = per_window.min(stratum.len());
        leftovers.extend(stratum.split_off(taken));
        winners.extend(stratum);
    }

    if winners.len() < count {
        shuffle(&mut leftovers, rng);
        let missing = count - winners.len();
        winners.extend(leftovers.into_iter().take(missing));
    }

    winners.truncate(count);
    winners.into_iter().cloned().collect()
}

/// Recency signal: 1 for a registration at `now`, falling linearly to 0 at
/// thirty days. Registrations after `now` score above 1.
pub fn time_component(registration_date: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let horizon = Duration::days(HYBRID_TIME_HORIZON_DAYS).num_milliseconds() as f64;
    let age = (now - registration_date).num_milliseconds() as f64;
    (1.0 - age / horizon).max(0.0)
}

/// Composite score of one participant for hybrid ranking.
pub fn hybrid_score(
    participant: &Participant,
    weights: &HybridWeights,
    now: DateTime<Utc>,
    random_component: f64,
) -> f64 {
    let engagement_component = participant.engagement_score as f64 / 100.0;
    let priority_component = participant.priority as f64 / 100.0;

    random_component * weights.random
        + engagement_component * weights.engagement
        + priority_component * weights.priority
        + time_component(participant.registration_date, now) * weights.time
}

/// Ranks by composite score (random, engagement, priority, recency) and takes the top `count`.
pub fn hybrid_selection(
    participants: &[Participant],
    count: usize,
    weights: &HybridWeights,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> Vec<Participant> {
    let count = count.min(participants.len());
    if count == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &Participant)> = participants
        .iter()
        .map(|p| (hybrid_score(p, weights, now, rng.next_unit()), p))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(count)
        .map(|(_, p)| p.clone())
        .collect()
}

fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}
