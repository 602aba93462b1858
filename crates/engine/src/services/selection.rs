use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::SelectionPolicy;
use super::progression::{apply_engagement, apply_stage_transition};
use super::qualification::rank_for_qualification;
use crate::error::{EngineError, Result};
use crate::fairness::{SecureRandom, SeededRandom, SelectionResult, run_selection};
use crate::models::{Contest, FairnessAlgorithm, Participant, ParticipantStage};
use crate::store::ContestStore;

/// Caller overrides for one draw. Missing fields fall back to the contest's settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Drives winner selection and the roster updates feeding it against a [`ContestStore`].
pub struct SelectionOrchestrator<S> {
    store: Arc<S>,
    policy: SelectionPolicy,
    in_flight: Mutex<HashSet<Uuid>>,
}

/// Marks a contest as busy with a draw or a roster update until dropped.
struct InFlight<'a> {
    contests: &'a Mutex<HashSet<Uuid>>,
    contest_id: Uuid,
}

impl<'a> InFlight<'a> {
    fn claim(contests: &'a Mutex<HashSet<Uuid>>, contest_id: Uuid) -> Result<Self> {
        let mut guard = contests.lock().unwrap_or_else(|e| e.into_inner());
        if !guard.insert(contest_id) {
            return Err(EngineError::SelectionInProgress(contest_id));
        }
        Ok(Self {
            contests,
            contest_id,
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.contests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.contest_id);
    }
}

impl<S: ContestStore> SelectionOrchestrator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, SelectionPolicy::default())
    }

    pub fn with_policy(store: Arc<S>, policy: SelectionPolicy) -> Self {
        Self {
            store,
            policy,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Draws the winners of a contest and records them.
    ///
    /// Only qualified or finalist participants that are neither duplicates nor
    /// over the fraud threshold take part. A draw that yields no winners is
    /// returned but not recorded, so the contest stays open.
    pub async fn select_winners(&self, contest_id: Uuid, request: SelectionRequest) -> Result<SelectionResult> {
        let _in_flight = InFlight::claim(&self.in_flight, contest_id)?;

        let contest = self.store.contest(contest_id).await?;
        if contest.is_completed() {
            return Err(EngineError::ContestAlreadyCompleted(contest_id));
        }
        contest.validate()?;

        let algorithm = match request.algorithm.as_deref() {
            Some(name) => name.parse::<FairnessAlgorithm>()?,
            None => contest.fairness_algorithm,
        };
        let count = match request.count {
            Some(0) => {
                return Err(EngineError::InvalidInput(
                    "winner count must be at least 1".to_string(),
                ));
            }
            Some(count) => count,
            None => contest.number_of_winners,
        } as usize;

        let participants = self.store.participants(contest_id).await?;
        let eligible = self.policy.eligible_for_selection(&participants);
        debug!(
            "Contest {}: {} of {} participants eligible for {} selection",
            contest_id,
            eligible.len(),
            participants.len(),
            algorithm
        );

        let result = draw(&contest, &eligible, algorithm, count)?;

        if result.winners.is_empty() {
            warn!("No eligible participants to select from in contest {}", contest_id);
            return Ok(result);
        }
        if result.winners.len() < count {
            warn!(
                "Contest {} asked for {} winners but only {} could be selected",
                contest_id,
                count,
                result.winners.len()
            );
        }

        self.store.record_selection(&result).await?;

        info!(
            "Selected {} winners for contest {} using {} (fairness score {})",
            result.winners.len(),
            contest_id,
            algorithm,
            result.fairness_score()
        );

        Ok(result)
    }

    /// Promotes the best-ranked registered participants to `Qualified`.
    ///
    /// Returns the promoted ids, best first. `count` defaults to everyone eligible.
    pub async fn bulk_qualify(&self, contest_id: Uuid, count: Option<usize>) -> Result<Vec<Uuid>> {
        let _in_flight = InFlight::claim(&self.in_flight, contest_id)?;

        let contest = self.store.contest(contest_id).await?;
        if contest.is_completed() {
            return Err(EngineError::ContestAlreadyCompleted(contest_id));
        }

        let participants = self.store.participants(contest_id).await?;
        let qualified: Vec<Uuid> = rank_for_qualification(&participants, count, &self.policy)
            .iter()
            .map(|p| p.id)
            .collect();

        if qualified.is_empty() {
            warn!("No participants to qualify in contest {}", contest_id);
            return Ok(qualified);
        }

        self.store
            .record_qualification(contest_id, &qualified, Utc::now(), self.policy.qualification_bonus)
            .await?;

        info!("Qualified {} participants in contest {}", qualified.len(), contest_id);
        Ok(qualified)
    }

    /// Credits an engagement event to one participant.
    pub async fn record_engagement(&self, participant_id: Uuid, value: u32) -> Result<Participant> {
        let mut participant = self.store.participant(participant_id).await?;
        let _in_flight = InFlight::claim(&self.in_flight, participant.contest_id)?;

        apply_engagement(&mut participant, value);
        self.store.save_participant(&participant).await?;

        info!(
            "Recorded engagement {} for participant {} (score {}, priority {})",
            value, participant_id, participant.engagement_score, participant.priority
        );
        Ok(participant)
    }

    /// Moves one participant to another workflow stage, applying the qualification bonus on entry.
    pub async fn transition_stage(&self, participant_id: Uuid, stage: ParticipantStage) -> Result<Participant> {
        let mut participant = self.store.participant(participant_id).await?;
        let _in_flight = InFlight::claim(&self.in_flight, participant.contest_id)?;

        let contest = self.store.contest(participant.contest_id).await?;
        if contest.is_completed() {
            return Err(EngineError::ContestAlreadyCompleted(contest.id));
        }

        apply_stage_transition(&mut participant, stage, Utc::now(), self.policy.qualification_bonus)?;
        self.store.save_participant(&participant).await?;

        info!("Participant {} is now {}", participant_id, stage);
        Ok(participant)
    }
}

/// A published seed makes the draw replayable; otherwise the OS provides the entropy.
fn draw(
    contest: &Contest,
    eligible: &[Participant],
    algorithm: FairnessAlgorithm,
    count: usize,
) -> Result<SelectionResult> {
    let now = Utc::now();
    let result = match contest.random_seed.as_deref() {
        Some(seed) => {
            let mut rng = SeededRandom::from_seed(seed);
            run_selection(contest, eligible, algorithm, count, &mut rng, now)
        }
        None => {
            let mut rng = SecureRandom::new()?;
            run_selection(contest, eligible, algorithm, count, &mut rng, now)
        }
    };
    Ok(result)
}
