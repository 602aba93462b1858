use std::cmp::Ordering;

use super::SelectionPolicy;
use crate::models::Participant;
use crate::priority_queue::PriorityQueue;

fn qualification_rank(participant: &Participant) -> i64 {
    participant.priority + participant.engagement_score as i64
}

/// Higher `priority + engagement` first, earlier registration on ties.
fn qualification_order(a: &&Participant, b: &&Participant) -> Ordering {
    qualification_rank(b)
        .cmp(&qualification_rank(a))
        .then_with(|| a.registration_date.cmp(&b.registration_date))
}

/// Picks the registered participants to promote to `Qualified`, best first.
///
/// `count` defaults to every eligible participant.
pub fn rank_for_qualification(
    participants: &[Participant],
    count: Option<usize>,
    policy: &SelectionPolicy,
) -> Vec<Participant> {
    let mut queue = PriorityQueue::with_capacity(participants.len(), qualification_order);
    queue.extend(participants.iter().filter(|p| policy.can_be_qualified(p)));

    let take = count.unwrap_or(queue.len()).min(queue.len());
    let mut qualified = Vec::with_capacity(take);
    while qualified.len() < take {
        match queue.dequeue() {
            Some(participant) => qualified.push(participant.clone()),
            None => break,
        }
    }
    qualified
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::models::ParticipantStage;

    fn registered(name: &str, priority: i64, engagement: u32, minutes: i64) -> Participant {
        let base = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
        let mut p = Participant::new(Uuid::nil(), name, "p@example.com", base + Duration::minutes(minutes));
        p.priority = priority;
        p.engagement_score = engagement;
        p
    }

    fn names(participants: &[Participant]) -> Vec<&str> {
        participants.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_ranks_by_priority_plus_engagement() {
        let pool = vec![
            registered("Low", 50, 0, 0),
            registered("High", 50, 40, 1),
            registered("Mid", 60, 10, 2),
        ];

        let qualified = rank_for_qualification(&pool, Some(2), &SelectionPolicy::default());
        assert_eq!(names(&qualified), vec!["High", "Mid"]);
    }

    #[test]
    fn test_ties_go_to_earlier_registration() {
        let pool = vec![
            registered("Second", 50, 10, 5),
            registered("First", 55, 5, 1),
            registered("Third", 60, 0, 9),
        ];

        let qualified = rank_for_qualification(&pool, None, &SelectionPolicy::default());
        assert_eq!(names(&qualified), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_skips_ineligible_participants() {
        let mut duplicate = registered("Duplicate", 90, 90, 0);
        duplicate.is_duplicate = true;
        let mut suspicious = registered("Suspicious", 90, 90, 0);
        suspicious.fraud_score = 80;
        let mut already = registered("Already", 90, 90, 0);
        already.stage = ParticipantStage::Qualified;
        let pool = vec![duplicate, suspicious, already, registered("Clean", 1, 1, 0)];

        let qualified = rank_for_qualification(&pool, Some(10), &SelectionPolicy::default());
        assert_eq!(names(&qualified), vec!["Clean"]);
    }
}
