pub mod progression;
pub mod qualification;
pub mod registration;
pub mod screening;
pub mod selection;

pub use progression::{apply_engagement, apply_stage_transition};
pub use qualification::rank_for_qualification;
pub use registration::{REFERRAL_ENGAGEMENT_BONUS, RegistrationRequest, register_participant};
pub use screening::{FraudAssessment, rescore_fraud};
pub use selection::{SelectionOrchestrator, SelectionRequest};

use crate::fairness::HIGH_FRAUD_THRESHOLD;
use crate::models::{Participant, ParticipantStage};

/// Priority added to every participant promoted by bulk qualification.
pub const DEFAULT_QUALIFICATION_BONUS: i64 = 20;

/// Eligibility rules applied before a pool reaches the fairness engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Participants scoring at or above this are never qualified or drawn.
    pub fraud_threshold: u8,
    pub qualification_bonus: i64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            fraud_threshold: HIGH_FRAUD_THRESHOLD,
            qualification_bonus: DEFAULT_QUALIFICATION_BONUS,
        }
    }
}

impl SelectionPolicy {
    fn is_clean(&self, participant: &Participant) -> bool {
        !participant.is_duplicate && participant.fraud_score < self.fraud_threshold
    }

    pub fn can_be_drawn(&self, participant: &Participant) -> bool {
        participant.stage.can_win() && self.is_clean(participant)
    }

    pub fn can_be_qualified(&self, participant: &Participant) -> bool {
        participant.stage == ParticipantStage::Registered && self.is_clean(participant)
    }

    pub fn eligible_for_selection(&self, participants: &[Participant]) -> Vec<Participant> {
        participants
            .iter()
            .filter(|p| self.can_be_drawn(p))
            .cloned()
            .collect()
    }
}
