use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::hash::calculate_fraud_score;
use crate::models::Participant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FraudAssessment {
    pub participant_id: Uuid,
    pub previous_score: u8,
    pub fraud_score: u8,
    pub flagged: bool,
}

/// Recomputes every participant's fraud score against the rest of the pool.
///
/// All scores are computed from the pool as it was before the call, so the
/// order of participants does not influence the outcome.
pub fn rescore_fraud(participants: &mut [Participant], threshold: u8) -> Vec<FraudAssessment> {
    let snapshot: &[Participant] = participants;
    let scores: Vec<u8> = snapshot
        .iter()
        .map(|p| calculate_fraud_score(p, snapshot))
        .collect();

    participants
        .iter_mut()
        .zip(scores)
        .map(|(participant, score)| {
            let assessment = FraudAssessment {
                participant_id: participant.id,
                previous_score: participant.fraud_score,
                fraud_score: score,
                flagged: score >= threshold,
            };
            if assessment.flagged {
                warn!(
                    "Participant {} ({}) flagged with fraud score {}",
                    participant.id, participant.email, score
                );
            }
            participant.fraud_score = score;
            assessment
        })
        .collect()
}
