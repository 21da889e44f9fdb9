//! Fan-Out Orchestrator
//!
//! Drives one remote generation request per persona, strictly in index order.
//! Each persona gets its own attempt budget from the [`RetryPolicy`]; once it
//! is exhausted the local generator fills in that persona only. A round always
//! settles with exactly one result per persona index.

use crate::error::GenerationError;
use crate::generation::client::GenerationClient;
use crate::generation::payload::normalize;
use crate::generation::result::{GenerationRound, PersonaResult, ResultSet, VariantSource};
use crate::generation::retry::RetryPolicy;
use crate::local::generate_for_persona;
use crate::types::{BaseCreative, GeneratedVariant, Persona};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Shared flag that stops a round between personas.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress notifications for consumers that render results as they settle.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    PersonaStarted {
        idx: usize,
    },
    AttemptFailed {
        idx: usize,
        attempt: u32,
        error: String,
    },
    PersonaCompleted {
        idx: usize,
        source: VariantSource,
        variants: Vec<GeneratedVariant>,
    },
}

pub struct FanOutOrchestrator<C> {
    client: C,
    policy: RetryPolicy,
    cancellation: Option<CancellationFlag>,
    progress: Option<UnboundedSender<RoundEvent>>,
}

impl<C: GenerationClient> FanOutOrchestrator<C> {
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            cancellation: None,
            progress: None,
        }
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn with_progress(mut self, sender: UnboundedSender<RoundEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Generate variants for every persona. Never fails: personas whose remote
    /// budget runs out (or that are reached after cancellation) receive local
    /// variants, and the round carries the fallback advisory.
    pub async fn run_generation(&self, personas: &[Persona], base: &BaseCreative) -> GenerationRound {
        let started = Instant::now();
        info!(
            personas = personas.len(),
            channel = %base.channel,
            max_attempts = self.policy.max_attempts,
            "Generation round started"
        );

        let mut results = ResultSet::new();
        for (idx, persona) in personas.iter().enumerate() {
            self.emit(RoundEvent::PersonaStarted { idx });

            let result = if self.is_cancelled() {
                debug!(idx, "Round cancelled; substituting local variants");
                fallback_result(persona, base, 0)
            } else {
                self.generate_remote(idx, persona, base).await
            };

            self.emit(RoundEvent::PersonaCompleted {
                idx,
                source: result.source,
                variants: result.variants.clone(),
            });
            results.settle(idx, result);
        }

        let round = GenerationRound::from_results(results);
        let fallback = round.results.fallback_indices();
        if fallback.is_empty() {
            info!(
                personas = personas.len(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Generation round completed"
            );
        } else {
            warn!(
                personas = personas.len(),
                fallback = ?fallback,
                duration_ms = started.elapsed().as_millis() as u64,
                "Generation round completed with local fallback"
            );
        }
        round
    }

    /// Try the endpoint for one persona within its attempt budget, falling
    /// back to local variants when the budget is spent.
    async fn generate_remote(&self, idx: usize, persona: &Persona, base: &BaseCreative) -> PersonaResult {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(idx, persona, base).await {
                Ok(variants) => {
                    debug!(idx, attempts, "Persona generated remotely");
                    return PersonaResult {
                        source: VariantSource::Remote,
                        attempts,
                        variants,
                    };
                }
                Err(err) => {
                    warn!(idx, attempt = attempts, error = %err, "Generation attempt failed");
                    self.emit(RoundEvent::AttemptFailed {
                        idx,
                        attempt: attempts,
                        error: err.to_string(),
                    });
                    if !self.policy.allows_retry(attempts) {
                        break;
                    }
                    tokio::time::sleep(self.policy.retry_delay()).await;
                }
            }
        }

        warn!(idx, attempts, "Remote budget exhausted; substituting local variants");
        fallback_result(persona, base, attempts)
    }

    async fn attempt(
        &self,
        idx: usize,
        persona: &Persona,
        base: &BaseCreative,
    ) -> Result<Vec<GeneratedVariant>, GenerationError> {
        let body = tokio::time::timeout(
            self.policy.attempt_timeout,
            self.client.request_variants(idx, persona, base),
        )
        .await
        .map_err(|_| GenerationError::Timeout(self.policy.attempt_timeout))??;
        normalize(body, idx)
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }

    fn emit(&self, event: RoundEvent) {
        if let Some(sender) = &self.progress {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(event);
        }
    }
}

fn fallback_result(persona: &Persona, base: &BaseCreative, attempts: u32) -> PersonaResult {
    PersonaResult {
        source: VariantSource::Fallback,
        attempts,
        variants: generate_for_persona(persona, base),
    }
}

/// Demo path: a full round from the local generator, no endpoint involved.
pub fn run_local(personas: &[Persona], base: &BaseCreative) -> GenerationRound {
    let mut results = ResultSet::new();
    for (idx, persona) in personas.iter().enumerate() {
        results.settle(
            idx,
            PersonaResult {
                source: VariantSource::Local,
                attempts: 0,
                variants: generate_for_persona(persona, base),
            },
        );
    }
    GenerationRound {
        results,
        warning: None,
    }
}
