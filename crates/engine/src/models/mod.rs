pub mod contest;
pub mod participant;

pub use contest::{
    Contest, ContestStatus, EngagementWeights, FairnessAlgorithm, HybridWeights, WinnerRecord,
};
pub use participant::{BASE_PRIORITY, Participant, ParticipantStage, Platform};
