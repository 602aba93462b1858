use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::fairness::SelectionResult;
use crate::models::{Contest, ContestStatus, Participant, ParticipantStage, WinnerRecord};

/// Persistence seam for the selection workflow.
#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn contest(&self, contest_id: Uuid) -> Result<Contest>;

    async fn participants(&self, contest_id: Uuid) -> Result<Vec<Participant>>;

    async fn participant(&self, participant_id: Uuid) -> Result<Participant>;

    /// Replaces the stored record with the same id.
    async fn save_participant(&self, participant: &Participant) -> Result<()>;

    /// Moves the winners to the `Winner` stage and completes the contest.
    async fn record_selection(&self, result: &SelectionResult) -> Result<()>;

    /// Moves the given participants to `Qualified`, stamping the time and raising their priority.
    async fn record_qualification(
        &self,
        contest_id: Uuid,
        participant_ids: &[Uuid],
        qualified_at: DateTime<Utc>,
        priority_bonus: i64,
    ) -> Result<()>;
}

/// A contest together with its participants, as exchanged in files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub contest: Contest,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    contests: RwLock<HashMap<Uuid, Contest>>,
    participants: RwLock<HashMap<Uuid, Participant>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        let contests = HashMap::from([(dataset.contest.id, dataset.contest)]);
        let participants = dataset
            .participants
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Self {
            contests: RwLock::new(contests),
            participants: RwLock::new(participants),
        }
    }

    pub async fn insert_contest(&self, contest: Contest) {
        self.contests.write().await.insert(contest.id, contest);
    }

    pub async fn insert_participant(&self, participant: Participant) {
        self.participants
            .write()
            .await
            .insert(participant.id, participant);
    }

    /// Current state of one contest, participants ordered by registration.
    pub async fn dataset(&self, contest_id: Uuid) -> Result<Dataset> {
        let contest = self.contest(contest_id).await?;
        let participants = self.participants(contest_id).await?;
        Ok(Dataset {
            contest,
            participants,
        })
    }
}

#[async_trait]
impl ContestStore for InMemoryStore {
    async fn contest(&self, contest_id: Uuid) -> Result<Contest> {
        self.contests
            .read()
            .await
            .get(&contest_id)
            .cloned()
            .ok_or(EngineError::ContestNotFound(contest_id))
    }

    async fn participants(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        let mut participants: Vec<Participant> = self
            .participants
            .read()
            .await
            .values()
            .filter(|p| p.contest_id == contest_id)
            .cloned()
            .collect();
        participants.sort_by(|a, b| {
            a.registration_date
                .cmp(&b.registration_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(participants)
    }

    async fn participant(&self, participant_id: Uuid) -> Result<Participant> {
        self.participants
            .read()
            .await
            .get(&participant_id)
            .cloned()
            .ok_or(EngineError::ParticipantNotFound(participant_id))
    }

    async fn save_participant(&self, participant: &Participant) -> Result<()> {
        match self.participants.write().await.get_mut(&participant.id) {
            Some(stored) => {
                *stored = participant.clone();
                Ok(())
            }
            None => Err(EngineError::ParticipantNotFound(participant.id)),
        }
    }

    async fn record_selection(&self, result: &SelectionResult) -> Result<()> {
        let mut contests = self.contests.write().await;
        let contest = contests
            .get_mut(&result.contest_id)
            .ok_or(EngineError::ContestNotFound(result.contest_id))?;

        if contest.is_completed() {
            return Err(EngineError::ContestAlreadyCompleted(contest.id));
        }

        let selected_at = result.report.generated_at;
        contest.winners = result
            .winners
            .iter()
            .map(|w| WinnerRecord {
                participant_id: w.id,
                selected_at,
            })
            .collect();
        contest.status = ContestStatus::Completed;
        contest.fairness_score = Some(result.fairness_score());

        let mut participants = self.participants.write().await;
        for winner in &result.winners {
            if let Some(participant) = participants.get_mut(&winner.id) {
                participant.stage = ParticipantStage::Winner;
            }
        }

        Ok(())
    }

    async fn record_qualification(
        &self,
        contest_id: Uuid,
        participant_ids: &[Uuid],
        qualified_at: DateTime<Utc>,
        priority_bonus: i64,
    ) -> Result<()> {
        let mut participants = self.participants.write().await;
        for id in participant_ids {
            match participants.get_mut(id) {
                Some(participant) if participant.contest_id == contest_id => {
                    participant.stage = ParticipantStage::Qualified;
                    participant.qualification_timestamp = Some(qualified_at);
                    participant.priority += priority_bonus;
                }
                _ => {
                    tracing::warn!("Skipping qualification of unknown participant {}", id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dataset_roundtrip_keeps_registration_order() {
        let contest = Contest::new("Store", 1);
        let now = Utc::now();
        let late = Participant::new(contest.id, "Late", "late@example.com", now);
        let early = Participant::new(contest.id, "Early", "early@example.com", now - chrono::Duration::hours(1));
        let stranger = Participant::new(Uuid::new_v4(), "Elsewhere", "x@example.com", now);

        let store = InMemoryStore::from_dataset(Dataset {
            contest: contest.clone(),
            participants: vec![late, early, stranger],
        });

        let dataset = store.dataset(contest.id).await.unwrap();
        let names: Vec<&str> = dataset.participants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Early", "Late"]);
    }

    #[tokio::test]
    async fn test_missing_contest() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.contest(id).await, Err(EngineError::ContestNotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_save_participant_requires_existing_record() {
        let store = InMemoryStore::new();
        let mut participant = Participant::new(Uuid::new_v4(), "P", "p@example.com", Utc::now());

        assert!(matches!(
            store.save_participant(&participant).await,
            Err(EngineError::ParticipantNotFound(_))
        ));

        store.insert_participant(participant.clone()).await;
        participant.engagement_score = 12;
        store.save_participant(&participant).await.unwrap();
        assert_eq!(store.participant(participant.id).await.unwrap().engagement_score, 12);
    }

    #[tokio::test]
    async fn test_qualification_updates_only_matching_contest() {
        let contest = Contest::new("Qualify", 1);
        let store = InMemoryStore::new();
        store.insert_contest(contest.clone()).await;

        let member = Participant::new(contest.id, "Member", "m@example.com", Utc::now());
        let outsider = Participant::new(Uuid::new_v4(), "Outsider", "o@example.com", Utc::now());
        let (member_id, outsider_id) = (member.id, outsider.id);
        store.insert_participant(member).await;
        store.insert_participant(outsider).await;

        let at = Utc::now();
        store
            .record_qualification(contest.id, &[member_id, outsider_id], at, 20)
            .await
            .unwrap();

        let participants = store.participants(contest.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].stage, ParticipantStage::Qualified);
        assert_eq!(participants[0].priority, 70);
        assert_eq!(participants[0].qualification_timestamp, Some(at));
    }
}
