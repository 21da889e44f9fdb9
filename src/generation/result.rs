//! Result set produced by one generation round.

use crate::types::GeneratedVariant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Advisory shown when any persona fell back to local variants.
pub const FALLBACK_WARNING: &str =
    "remote generation incomplete for some personas; local variants substituted";

/// Where a persona's variants came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantSource {
    Remote,
    Fallback,
    /// Local generator by request (demo path), not a failure substitute.
    Local,
}

/// Settled outcome for one persona index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaResult {
    pub source: VariantSource,
    /// Remote attempts spent (zero when the round was cancelled or run locally).
    pub attempts: u32,
    pub variants: Vec<GeneratedVariant>,
}

/// Persona index → settled result. Each index is written at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: BTreeMap<usize, PersonaResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for `idx`. Returns `false` and leaves the existing
    /// entry untouched if the index was already settled.
    pub fn settle(&mut self, idx: usize, result: PersonaResult) -> bool {
        match self.entries.entry(idx) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(result);
                true
            }
        }
    }

    pub fn get(&self, idx: usize) -> Option<&PersonaResult> {
        self.entries.get(&idx)
    }

    pub fn variants(&self, idx: usize) -> Option<&[GeneratedVariant]> {
        self.entries.get(&idx).map(|r| r.variants.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PersonaResult)> {
        self.entries.iter().map(|(idx, result)| (*idx, result))
    }

    /// Indices that received local fallback content, ascending.
    pub fn fallback_indices(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, r)| r.source == VariantSource::Fallback)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Plain index → variants view, as exported.
    pub fn to_variant_map(&self) -> BTreeMap<usize, Vec<GeneratedVariant>> {
        self.iter()
            .map(|(idx, r)| (idx, r.variants.clone()))
            .collect()
    }
}

/// Outcome of one `run_generation` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRound {
    pub results: ResultSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl GenerationRound {
    /// Wrap settled results, deriving the advisory from fallback usage.
    pub fn from_results(results: ResultSet) -> Self {
        let warning = (!results.fallback_indices().is_empty()).then(|| FALLBACK_WARNING.to_string());
        Self { results, warning }
    }

    pub fn used_fallback(&self) -> bool {
        self.warning.is_some()
    }
}
