use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{EngineError, Result};
use crate::fairness::HIGH_FRAUD_THRESHOLD;
use crate::hash::{HashIndex, calculate_fraud_score, generate_device_fingerprint, generate_identity_hash};
use crate::models::{Contest, ContestStatus, Participant, Platform};

/// Engagement credited to a referrer for every participant they bring in.
pub const REFERRAL_ENGAGEMENT_BONUS: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referred_by: Option<Uuid>,
}

/// Registers a new participant into `participants`, the contest's current roster.
///
/// The identity hash rejects a second registration of the same person, the
/// fraud score is computed against the existing roster, and a referrer found
/// in the roster is credited.
pub fn register_participant(
    contest: &Contest,
    participants: &mut Vec<Participant>,
    request: RegistrationRequest,
    now: DateTime<Utc>,
) -> Result<Participant> {
    request.validate()?;

    if contest.status != ContestStatus::Active {
        return Err(EngineError::ContestNotActive(contest.id));
    }

    let contest_key = contest.id.to_string();
    let unique_hash = generate_identity_hash(&request.email, request.phone.as_deref(), &contest_key, &[])?;
    if HashIndex::build(participants).contains(&unique_hash) {
        return Err(EngineError::DuplicateRegistration(request.email));
    }

    let device_fingerprint = match request.ip_address.as_deref() {
        Some(ip) => Some(generate_device_fingerprint(
            ip,
            request.user_agent.as_deref().unwrap_or_default(),
            &[],
        )?),
        None => None,
    };

    let mut participant = Participant::new(contest.id, request.name, request.email.trim().to_lowercase(), now);
    participant.phone = request.phone;
    participant.platform = request.platform;
    participant.unique_hash = unique_hash;
    participant.ip_address = request.ip_address;
    participant.device_fingerprint = device_fingerprint;
    participant.referred_by = request.referred_by;
    participant.fraud_score = calculate_fraud_score(&participant, participants);

    if participant.fraud_score > HIGH_FRAUD_THRESHOLD {
        warn!(
            "Registration of {} into contest {} scored {} on fraud checks",
            participant.email, contest.id, participant.fraud_score
        );
    }

    if let Some(referrer_id) = participant.referred_by {
        match participants.iter_mut().find(|p| p.id == referrer_id) {
            Some(referrer) => {
                referrer.referrals.push(participant.id);
                referrer.engagement_score += REFERRAL_ENGAGEMENT_BONUS;
            }
            None => warn!("Referrer {} is not part of contest {}", referrer_id, contest.id),
        }
    }

    info!("Registered participant {} into contest {}", participant.id, contest.id);
    participants.push(participant.clone());

    Ok(participant)
}
