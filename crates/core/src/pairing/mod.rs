//! Pairing Compatibility Engine
//!
//! Scores pastry candidates against an anchor coffee using hand-authored
//! flavor, origin, balance, texture, popularity and seasonal tables, then ranks
//! them. Everything here is deterministic and free of I/O apart from loading a
//! table data file.

mod engine;
pub mod factors;
mod scoring;
pub mod tables;
pub mod vocabulary;

pub use engine::PairingEngine;
pub use scoring::{
    balance_score, complexity_score, generate_explanation, CompositeScorer, ScoringWeights,
};
pub use tables::{PairingTables, TableError};

/// Default scoring weights
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    flavor: 0.45,
    origin: 0.20,
    acidity: 0.20,
    roast_texture: 0.10,
    popularity: 0.05,
};

/// Ranked pairings returned when the caller does not ask for a count
pub const DEFAULT_TOP_K: usize = 3;
