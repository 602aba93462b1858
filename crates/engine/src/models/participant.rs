use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::EngineError;

/// Priority every participant starts with at registration.
pub const BASE_PRIORITY: i64 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    Twitter,
    Facebook,
    LinkedIn,
    TikTok,
    YouTube,
    #[default]
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::Twitter => "Twitter",
            Self::Facebook => "Facebook",
            Self::LinkedIn => "LinkedIn",
            Self::TikTok => "TikTok",
            Self::YouTube => "YouTube",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Self::Instagram),
            "twitter" => Ok(Self::Twitter),
            "facebook" => Ok(Self::Facebook),
            "linkedin" => Ok(Self::LinkedIn),
            "tiktok" => Ok(Self::TikTok),
            "youtube" => Ok(Self::YouTube),
            "other" => Ok(Self::Other),
            _ => Err(EngineError::InvalidInput(format!("unknown platform '{}'", s))),
        }
    }
}

/// Workflow stage of a participant inside one contest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantStage {
    #[default]
    Registered,
    Qualified,
    Finalist,
    Winner,
    Disqualified,
}

impl ParticipantStage {
    /// Stages from which a participant may be drawn as a winner.
    pub fn can_win(&self) -> bool {
        matches!(self, Self::Qualified | Self::Finalist)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "Registered",
            Self::Qualified => "Qualified",
            Self::Finalist => "Finalist",
            Self::Winner => "Winner",
            Self::Disqualified => "Disqualified",
        }
    }
}

impl fmt::Display for ParticipantStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "registered" => Ok(Self::Registered),
            "qualified" => Ok(Self::Qualified),
            "finalist" => Ok(Self::Finalist),
            "winner" => Ok(Self::Winner),
            "disqualified" => Ok(Self::Disqualified),
            _ => Err(EngineError::InvalidInput(format!("unknown stage '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Participant {
    pub id: Uuid,
    pub contest_id: Uuid,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub stage: ParticipantStage,
    #[serde(default)]
    pub unique_hash: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default)]
    #[validate(range(max = 100, message = "fraud_score must be between 0 and 100"))]
    pub fraud_score: u8,
    #[serde(default)]
    pub engagement_score: u32,
    #[serde(default)]
    pub referrals: Vec<Uuid>,
    #[serde(default)]
    pub referred_by: Option<Uuid>,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub qualification_timestamp: Option<DateTime<Utc>>,
    pub registration_date: DateTime<Utc>,
}

fn default_priority() -> i64 {
    BASE_PRIORITY
}

impl Participant {
    /// A freshly registered participant with no engagement and base priority.
    pub fn new(
        contest_id: Uuid,
        name: impl Into<String>,
        email: impl Into<String>,
        registration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contest_id,
            name: name.into(),
            email: email.into(),
            phone: None,
            platform: Platform::default(),
            stage: ParticipantStage::default(),
            unique_hash: String::new(),
            ip_address: None,
            device_fingerprint: None,
            is_duplicate: false,
            fraud_score: 0,
            engagement_score: 0,
            referrals: Vec::new(),
            referred_by: None,
            priority: BASE_PRIORITY,
            qualification_timestamp: None,
            registration_date,
        }
    }

    pub fn referral_count(&self) -> usize {
        self.referrals.len()
    }

    /// Registration time in milliseconds since the Unix epoch.
    pub fn registered_at_millis(&self) -> i64 {
        self.registration_date.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!("tiktok".parse::<Platform>().unwrap(), Platform::TikTok);
        assert_eq!(" YouTube ".parse::<Platform>().unwrap(), Platform::YouTube);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_only_qualified_and_finalists_can_win() {
        assert!(ParticipantStage::Qualified.can_win());
        assert!(ParticipantStage::Finalist.can_win());
        assert!(!ParticipantStage::Registered.can_win());
        assert!(!ParticipantStage::Winner.can_win());
        assert!(!ParticipantStage::Disqualified.can_win());
    }

    #[test]
    fn test_stage_parse() {
        assert_eq!("finalist".parse::<ParticipantStage>().unwrap(), ParticipantStage::Finalist);
        assert_eq!(" Disqualified".parse::<ParticipantStage>().unwrap(), ParticipantStage::Disqualified);
        assert!("champion".parse::<ParticipantStage>().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = r#"{
            "id": "6f1c2b9e-5a0b-4c7e-9a51-0d2f3b4c5d6e",
            "contest_id": "0b8e7c9d-1a2b-4c3d-8e9f-a0b1c2d3e4f5",
            "name": "Alice",
            "email": "alice@example.com",
            "registration_date": "2025-01-01T00:00:00Z"
        }"#;

        let participant: Participant = serde_json::from_str(json).unwrap();
        assert_eq!(participant.priority, BASE_PRIORITY);
        assert_eq!(participant.stage, ParticipantStage::Registered);
        assert_eq!(participant.platform, Platform::Other);
        assert!(!participant.is_duplicate);
        assert_eq!(participant.referral_count(), 0);
    }

    #[test]
    fn test_validation_rejects_bad_records() {
        let mut participant = Participant::new(Uuid::new_v4(), "", "not-an-email", Utc::now());
        participant.fraud_score = 101;

        let errors = participant.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("fraud_score"));
    }
}
