use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use engine::fairness::{
    StrategyOptions, calculate_fairness_score, hybrid_selection, priority_based_selection,
    pure_random_selection, select, time_based_selection, weighted_random_selection,
};
use engine::hash::calculate_fraud_score;
use engine::models::{EngagementWeights, HybridWeights};
use engine::{
    Contest, ContestStatus, ContestStore, FairnessAlgorithm, InMemoryStore, Participant, ParticipantStage,
    Platform, PriorityQueue, SeededRandom, SelectionOrchestrator, SelectionRequest,
};
use proptest::prelude::*;
use uuid::Uuid;

fn pool(contest_id: Uuid, engagement: &[u32]) -> Vec<Participant> {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    engagement
        .iter()
        .enumerate()
        .map(|(i, score)| {
            let mut p = Participant::new(
                contest_id,
                format!("P{}", i),
                format!("p{}@example.com", i),
                base + Duration::minutes(i as i64 * 37),
            );
            p.engagement_score = *score;
            p.priority = 40 + (i as i64 % 3) * 10;
            p.platform = if i % 2 == 0 {
                Platform::Instagram
            } else {
                Platform::Twitter
            };
            p.stage = ParticipantStage::Qualified;
            p
        })
        .collect()
}

fn distinct_ids(winners: &[Participant]) -> bool {
    let ids: HashSet<Uuid> = winners.iter().map(|w| w.id).collect();
    ids.len() == winners.len()
}

proptest! {
    #[test]
    fn every_strategy_returns_min_count_distinct_members(
        engagement in prop::collection::vec(0u32..500, 0..40),
        count in 1usize..20,
        seed in "[0-9a-f]{1,16}",
        windows in 1usize..8,
    ) {
        let contest = Contest::new("Properties", count as u32);
        let participants = pool(contest.id, &engagement);
        let pool_ids: HashSet<Uuid> = participants.iter().map(|p| p.id).collect();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

        let mut options = StrategyOptions::from_contest(&contest, now);
        options.time_windows = windows;

        for algorithm in FairnessAlgorithm::ALL {
            let mut rng = SeededRandom::from_seed(&seed);
            let winners = select(algorithm, &participants, count, &options, &mut rng);

            prop_assert_eq!(winners.len(), count.min(participants.len()));
            prop_assert!(distinct_ids(&winners));
            prop_assert!(winners.iter().all(|w| pool_ids.contains(&w.id)));
        }
    }

    #[test]
    fn seeded_strategies_are_reproducible(
        engagement in prop::collection::vec(0u32..500, 1..30),
        count in 1usize..10,
        seed in "[0-9a-z]{1,24}",
    ) {
        let contest = Contest::new("Replay", count as u32);
        let participants = pool(contest.id, &engagement);
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

        let draw = |seed: &str| {
            let mut rng = SeededRandom::from_seed(seed);
            let ids = |w: Vec<Participant>| w.into_iter().map(|p| p.id).collect::<Vec<_>>();
            let pure = ids(pure_random_selection(&participants, count, &mut rng));
            let weighted = ids(weighted_random_selection(&participants, count, &EngagementWeights::default(), &mut rng));
            let timed = ids(time_based_selection(&participants, count, 4, &mut rng));
            let hybrid = ids(hybrid_selection(&participants, count, &HybridWeights::default(), now, &mut rng));
            (pure, weighted, timed, hybrid)
        };

        prop_assert_eq!(draw(seed.as_str()), draw(seed.as_str()));
    }

    #[test]
    fn priority_selection_never_skips_a_better_participant(
        engagement in prop::collection::vec(0u32..500, 1..40),
        count in 1usize..20,
    ) {
        let participants = pool(Uuid::new_v4(), &engagement);
        let winners = priority_based_selection(&participants, count);
        let winner_ids: HashSet<Uuid> = winners.iter().map(|w| w.id).collect();

        let worst_winner = winners.iter().map(|w| w.priority).min().unwrap_or(i64::MIN);
        for loser in participants.iter().filter(|p| !winner_ids.contains(&p.id)) {
            prop_assert!(loser.priority <= worst_winner);
        }
        prop_assert!(winners.windows(2).all(|pair| pair[0].priority >= pair[1].priority));
    }

    #[test]
    fn heap_dequeues_in_order_under_interleaving(
        ops in prop::collection::vec(prop::option::of(-1000i64..1000), 0..200),
    ) {
        let mut queue = PriorityQueue::new(|a: &i64, b: &i64| a.cmp(b));
        let mut reference: Vec<i64> = Vec::new();

        for op in ops {
            match op {
                Some(value) => {
                    queue.enqueue(value);
                    reference.push(value);
                }
                None => {
                    reference.sort_unstable();
                    let expected = if reference.is_empty() { None } else { Some(reference.remove(0)) };
                    prop_assert_eq!(queue.dequeue(), expected);
                }
            }
            prop_assert_eq!(queue.len(), reference.len());
            prop_assert_eq!(queue.peek().copied(), reference.iter().min().copied());
        }
    }

    #[test]
    fn fairness_and_fraud_scores_stay_in_bounds(
        engagement in prop::collection::vec(0u32..100, 0..30),
        winners_wanted in 0usize..30,
        duplicate_every in 1usize..5,
        wanted in 1u32..10,
    ) {
        let contest = Contest::new("Bounds", wanted);
        let mut participants = pool(contest.id, &engagement);
        for (i, p) in participants.iter_mut().enumerate() {
            if i % duplicate_every == 0 {
                p.is_duplicate = true;
                p.email = "shared@example.com".to_string();
                p.ip_address = Some("198.51.100.1".to_string());
                p.device_fingerprint = Some("shared-device".to_string());
            }
        }
        let winners: Vec<Participant> = participants.iter().take(winners_wanted).cloned().collect();

        let score = calculate_fairness_score(&contest, &participants, &winners);
        prop_assert!(score <= 100);
        if winners.iter().any(|w| w.is_duplicate) {
            prop_assert!(score <= 70);
        }
        for p in &participants {
            prop_assert!(calculate_fraud_score(p, &participants) <= 100);
        }
    }
}

#[tokio::test]
async fn eight_participant_contest_end_to_end() {
    let mut contest = Contest::new("Spring Giveaway", 3);
    contest.random_seed = Some("00c0ffee".to_string());
    contest.fairness_algorithm = FairnessAlgorithm::PriorityBased;

    let participants = pool(contest.id, &[50, 60, 70, 80, 90, 40, 55, 65]);
    let store = InMemoryStore::new();
    store.insert_contest(contest.clone()).await;
    for p in &participants {
        let mut p = p.clone();
        p.priority = p.engagement_score as i64;
        store.insert_participant(p).await;
    }

    let orchestrator = SelectionOrchestrator::new(Arc::new(store));
    let result = orchestrator
        .select_winners(contest.id, SelectionRequest::default())
        .await
        .unwrap();

    let scores: Vec<i64> = result.winners.iter().map(|w| w.priority).collect();
    assert_eq!(scores, vec![90, 80, 70]);
    assert_eq!(result.report.total_participants, 8);
    assert_eq!(result.report.total_winners, 3);
    assert_eq!(result.report.metrics.duplicates_detected, 0);
    assert!(result.fairness_score() <= 100);

    let stored = orchestrator.store().contest(contest.id).await.unwrap();
    assert_eq!(stored.status, ContestStatus::Completed);
    assert_eq!(stored.winners.len(), 3);

    let again = orchestrator
        .select_winners(contest.id, SelectionRequest::default())
        .await;
    assert!(again.is_err());
}
