use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{Participant, ParticipantStage};

/// Credits an engagement event. Half of the value, rounded down, is added to the priority.
pub fn apply_engagement(participant: &mut Participant, value: u32) {
    participant.engagement_score = participant.engagement_score.saturating_add(value);
    participant.priority += (value / 2) as i64;

    debug!(
        "Participant {} engagement now {} (priority {})",
        participant.id, participant.engagement_score, participant.priority
    );
}

/// Moves a participant to `stage`.
///
/// Entering `Qualified` from any other stage stamps the qualification time and
/// adds `qualification_bonus` to the priority; staying `Qualified` changes
/// nothing. `Winner` is only ever set by a draw.
pub fn apply_stage_transition(
    participant: &mut Participant,
    stage: ParticipantStage,
    at: DateTime<Utc>,
    qualification_bonus: i64,
) -> Result<()> {
    if stage == ParticipantStage::Winner {
        return Err(EngineError::InvalidInput(
            "winners can only be chosen by a draw".to_string(),
        ));
    }

    let previous = participant.stage;
    participant.stage = stage;

    if stage == ParticipantStage::Qualified && previous != ParticipantStage::Qualified {
        participant.qualification_timestamp = Some(at);
        participant.priority += qualification_bonus;
    }

    debug!("Participant {} moved from {} to {}", participant.id, previous, stage);
    Ok(())
}
