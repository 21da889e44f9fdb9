//! Per-persona fan-out generation with bounded retry and local fallback.

pub mod client;
pub mod orchestrator;
pub mod payload;
pub mod result;
pub mod retry;

pub use client::{GenerationClient, HttpGenerationClient, PersonaRequest};
pub use orchestrator::{run_local, CancellationFlag, FanOutOrchestrator, RoundEvent};
pub use payload::{normalize, PersonaVariants, RemotePayload};
pub use result::{GenerationRound, PersonaResult, ResultSet, VariantSource, FALLBACK_WARNING};
pub use retry::RetryPolicy;
