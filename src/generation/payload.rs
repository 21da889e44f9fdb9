//! Normalization of generation endpoint responses.
//!
//! The endpoint has shipped several response shapes over time. Each one is
//! mapped into a closed [`RemotePayload`] before anything downstream sees it;
//! unknown shapes are an explicit error, never passed through.

use crate::error::GenerationError;
use crate::types::{GeneratedVariant, Tone};
use serde::Deserialize;
use serde_json::Value;

/// Every response shape the endpoint is known to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum RemotePayload {
    /// `{ "variants": [...] }`
    Variants(Vec<GeneratedVariant>),
    /// `{ "raw": "..." }`: the provider answered with free text.
    Raw(String),
    /// `{ "byPersona": [{ "idx": 0, "variants": [...] }, ...] }`
    ByPersona(Vec<PersonaVariants>),
}

/// One entry of a `byPersona` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonaVariants {
    #[serde(default)]
    pub idx: Option<usize>,
    pub variants: Vec<GeneratedVariant>,
}

impl RemotePayload {
    /// Classify a response body. Field precedence: `variants`, `byPersona`, `raw`.
    pub fn from_value(value: Value) -> Result<Self, GenerationError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(GenerationError::UnrecognizedShape(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        if let Some(variants) = fields.remove("variants") {
            return serde_json::from_value(variants)
                .map(RemotePayload::Variants)
                .map_err(|e| GenerationError::MalformedResponse(format!("variants: {}", e)));
        }
        if let Some(by_persona) = fields.remove("byPersona") {
            return serde_json::from_value(by_persona)
                .map(RemotePayload::ByPersona)
                .map_err(|e| GenerationError::MalformedResponse(format!("byPersona: {}", e)));
        }
        if let Some(raw) = fields.remove("raw") {
            return match raw {
                Value::String(text) => Ok(RemotePayload::Raw(text)),
                other => Err(GenerationError::MalformedResponse(format!(
                    "raw must be a string, got {}",
                    json_kind(&other)
                ))),
            };
        }

        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        Err(GenerationError::UnrecognizedShape(format!(
            "no variants, byPersona or raw field (keys: [{}])",
            keys.join(", ")
        )))
    }

    /// Resolve the payload into the variants for persona `idx`.
    ///
    /// Raw text becomes a single formal/professional variant whose only body
    /// is that text, so callers only ever handle one shape.
    pub fn into_variants(self, idx: usize) -> Result<Vec<GeneratedVariant>, GenerationError> {
        let variants = match self {
            RemotePayload::Variants(variants) => variants,
            RemotePayload::Raw(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(GenerationError::MalformedResponse(
                        "raw text is empty".to_string(),
                    ));
                }
                vec![GeneratedVariant {
                    tone: Tone::FormalProfessional,
                    subjects: None,
                    bodies: vec![text.to_string()],
                }]
            }
            RemotePayload::ByPersona(mut entries) => {
                let position = entries
                    .iter()
                    .position(|entry| entry.idx == Some(idx))
                    .or_else(|| {
                        (idx < entries.len() && entries.iter().all(|e| e.idx.is_none()))
                            .then_some(idx)
                    })
                    .ok_or_else(|| {
                        GenerationError::MalformedResponse(format!(
                            "byPersona has no entry for persona {}",
                            idx
                        ))
                    })?;
                entries.swap_remove(position).variants
            }
        };

        if variants.is_empty() {
            return Err(GenerationError::MalformedResponse(
                "variants array is empty".to_string(),
            ));
        }
        if let Some(blank) = variants
            .iter()
            .find(|v| v.bodies.iter().all(|body| body.trim().is_empty()))
        {
            return Err(GenerationError::MalformedResponse(format!(
                "{} variant has no body text",
                blank.tone
            )));
        }
        Ok(variants)
    }
}

/// Normalize a raw response body into variants for persona `idx`.
pub fn normalize(value: Value, idx: usize) -> Result<Vec<GeneratedVariant>, GenerationError> {
    RemotePayload::from_value(value)?.into_variants(idx)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
