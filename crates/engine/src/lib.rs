pub mod error;
pub mod fairness;
pub mod hash;
pub mod models;
pub mod priority_queue;
pub mod services;
pub mod store;

pub use error::{EngineError, Result};
pub use fairness::{FairnessReport, RandomSource, SecureRandom, SeededRandom, SelectionResult};
pub use models::{Contest, ContestStatus, FairnessAlgorithm, Participant, ParticipantStage, Platform};
pub use priority_queue::PriorityQueue;
pub use services::{SelectionOrchestrator, SelectionPolicy, SelectionRequest};
pub use store::{ContestStore, Dataset, InMemoryStore};
