pub mod config;
pub mod domain;
pub mod errors;
pub mod pairing;

pub use config::{AppConfig, ConfigError, LlmProvider, LoadOptions, LogFormat};
pub use domain::menu::{AnchorItem, CandidateItem};
pub use domain::pairing::{CompositeScore, RankedPairing, ScoreBand, ScoreBreakdown};
pub use errors::{ApplicationError, DomainError};
pub use pairing::{
    CompositeScorer, PairingEngine, PairingTables, ScoringWeights, TableError, DEFAULT_TOP_K,
};
