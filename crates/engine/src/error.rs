use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown selection strategy: {0}")]
    UnknownStrategy(String),

    #[error("Contest not found: {0}")]
    ContestNotFound(Uuid),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(Uuid),

    #[error("Contest {0} has already completed winner selection")]
    ContestAlreadyCompleted(Uuid),

    #[error("Winner selection for contest {0} is already in progress")]
    SelectionInProgress(Uuid),

    #[error("Contest {0} is not accepting registrations")]
    ContestNotActive(Uuid),

    #[error("Participant already registered: {0}")]
    DuplicateRegistration(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Randomness source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Infrastructure faults are not the caller's doing and must not be retried.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, EngineError::Entropy(_) | EngineError::Serialization(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::ContestAlreadyCompleted(_)
                | EngineError::SelectionInProgress(_)
                | EngineError::DuplicateRegistration(_)
        )
    }
}
