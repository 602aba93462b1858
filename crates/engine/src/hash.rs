use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{EngineError, Result};
use crate::models::Participant;

const IDENTITY_RESERVED_KEYS: [&str; 3] = ["email", "phone", "contestId"];
const DEVICE_RESERVED_KEYS: [&str; 2] = ["ip", "ua"];

const DUPLICATE_EMAIL_PENALTY: u32 = 40;
const SHARED_DEVICE_PENALTY: u32 = 30;
const SHARED_IP_PENALTY: u32 = 20;
const REGISTRATION_BURST_PENALTY: u32 = 10;

const SHARED_DEVICE_LIMIT: usize = 2;
const SHARED_IP_LIMIT: usize = 5;
const REGISTRATION_BURST_LIMIT: usize = 10;
const REGISTRATION_BURST_WINDOW_MS: i64 = 60_000;

const VERIFICATION_TOKEN_BYTES: usize = 32;

/// Fingerprint identifying one person in one contest, used as the uniqueness key
/// for duplicate detection.
///
/// The email is lowercased and trimmed and the phone is reduced to its digits
/// before hashing, so formatting differences do not produce distinct identities.
pub fn generate_identity_hash(
    email: &str,
    phone: Option<&str>,
    contest_id: &str,
    extra: &[(&str, &str)],
) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(EngineError::InvalidInput("email is required".to_string()));
    }
    if contest_id.trim().is_empty() {
        return Err(EngineError::InvalidInput("contest id is required".to_string()));
    }

    let phone: String = phone
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    let mut record = canonical_extra(extra, &IDENTITY_RESERVED_KEYS)?;
    record.insert("email", email);
    record.insert("phone", phone);
    record.insert("contestId", contest_id.to_string());

    sha256_hex_of(&record)
}

/// Fingerprint of the device a registration came from.
pub fn generate_device_fingerprint(
    ip_address: &str,
    user_agent: &str,
    extra: &[(&str, &str)],
) -> Result<String> {
    let mut record = canonical_extra(extra, &DEVICE_RESERVED_KEYS)?;
    record.insert("ip", ip_address.to_string());
    record.insert("ua", user_agent.to_string());

    sha256_hex_of(&record)
}

/// Publishable seed for a reproducible draw.
pub fn generate_random_seed(contest_id: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}-{}", contest_id, timestamp.timestamp_millis());
    hex::encode(Sha256::digest(input.as_bytes()))
}

pub fn generate_verification_token() -> Result<String> {
    let mut bytes = [0u8; VERIFICATION_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Compares two hashes without leaking where they differ.
///
/// Inputs of different length return `false` immediately; only equal-length
/// comparisons are timing-safe.
pub fn compare_hashes_constant_time(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Heuristic suspicion score in `[0, 100]` for `candidate` against the other
/// records of `population`. Records with the candidate's own id are ignored.
pub fn calculate_fraud_score(candidate: &Participant, population: &[Participant]) -> u8 {
    let others: Vec<&Participant> = population.iter().filter(|p| p.id != candidate.id).collect();

    let mut score = 0;

    let email = normalize_email(&candidate.email);
    if others.iter().any(|p| normalize_email(&p.email) == email) {
        score += DUPLICATE_EMAIL_PENALTY;
    }

    if let Some(fingerprint) = candidate.device_fingerprint.as_deref() {
        let shared = others
            .iter()
            .filter(|p| p.device_fingerprint.as_deref() == Some(fingerprint))
            .count();
        if shared > SHARED_DEVICE_LIMIT {
            score += SHARED_DEVICE_PENALTY;
        }
    }

    if let Some(ip) = candidate.ip_address.as_deref() {
        let shared = others
            .iter()
            .filter(|p| p.ip_address.as_deref() == Some(ip))
            .count();
        if shared > SHARED_IP_LIMIT {
            score += SHARED_IP_PENALTY;
        }
    }

    let registered_at = candidate.registered_at_millis();
    let burst = others
        .iter()
        .filter(|p| (p.registered_at_millis() - registered_at).abs() < REGISTRATION_BURST_WINDOW_MS)
        .count();
    if burst > REGISTRATION_BURST_LIMIT {
        score += REGISTRATION_BURST_PENALTY;
    }

    score.min(100) as u8
}

/// Constant-time lookup of participants by their identity hash.
#[derive(Debug, Default)]
pub struct HashIndex<'a> {
    entries: HashMap<&'a str, &'a Participant>,
}

impl<'a> HashIndex<'a> {
    /// Records with an empty `unique_hash` are skipped; on collision the later record wins.
    pub fn build(participants: &'a [Participant]) -> Self {
        let entries = participants
            .iter()
            .filter(|p| !p.unique_hash.is_empty())
            .map(|p| (p.unique_hash.as_str(), p))
            .collect();
        Self { entries }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn get(&self, hash: &str) -> Option<&'a Participant> {
        self.entries.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn canonical_extra<'k>(
    extra: &[(&'k str, &str)],
    reserved: &[&str],
) -> Result<BTreeMap<&'k str, String>> {
    let mut record = BTreeMap::new();
    for (key, value) in extra {
        if reserved.contains(key) {
            return Err(EngineError::InvalidInput(format!(
                "'{}' is a reserved field and cannot be passed as extra data",
                key
            )));
        }
        record.insert(*key, (*value).to_string());
    }
    Ok(record)
}

// BTreeMap keeps keys sorted, which makes the serialized record canonical.
fn sha256_hex_of(record: &BTreeMap<&str, String>) -> Result<String> {
    let serialized = serde_json::to_string(record)?;
    Ok(hex::encode(Sha256::digest(serialized.as_bytes())))
}
