use anyhow::{Context, Result};
use engine::SelectionPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub fraud_threshold: u8,
    pub qualification_bonus: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = SelectionPolicy::default();
        Ok(Self {
            fraud_threshold: match std::env::var("DRAW_FRAUD_THRESHOLD") {
                Ok(value) => value
                    .parse()
                    .context("DRAW_FRAUD_THRESHOLD must be a number between 0 and 255")?,
                Err(_) => defaults.fraud_threshold,
            },
            qualification_bonus: match std::env::var("DRAW_QUALIFICATION_BONUS") {
                Ok(value) => value
                    .parse()
                    .context("DRAW_QUALIFICATION_BONUS must be a number")?,
                Err(_) => defaults.qualification_bonus,
            },
        })
    }

    pub fn policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            fraud_threshold: self.fraud_threshold,
            qualification_bonus: self.qualification_bonus,
        }
    }
}
