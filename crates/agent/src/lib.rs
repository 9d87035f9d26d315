//! Pairing runtime - narrative enhancement around the deterministic engine
//!
//! The language model only writes copy. Ranking and every number in a
//! `PairingReport` come from `bunamo_core::pairing`; a model failure of any
//! kind degrades that one pairing to a template narrative.
//!
//! - `llm` - `LlmClient` trait and the Ollama/OpenAI/Anthropic HTTP clients
//! - `guardrails` - shape checks for generated narratives
//! - `narrative` - prompt, parsing, fallback template and concurrent enhancement
//! - `runtime` - `PairingRuntime`, which joins ranking and narratives into a report

pub mod guardrails;
pub mod llm;
pub mod narrative;
pub mod runtime;

pub use guardrails::{GuardrailDecision, NarrativeGuardrails};
pub use llm::{build_client, LlmClient};
pub use narrative::{
    EnhancedPairing, Narrative, NarrativeEnhancer, NarrativeFailure, NarrativeSource,
};
pub use runtime::{PairingReport, PairingRuntime, ReportStatus};
