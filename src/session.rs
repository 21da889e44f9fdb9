//! Session state: personas, base creative and the last generation round.

use crate::error::{ApiError, SessionError};
use crate::generation::GenerationRound;
use crate::types::{BaseCreative, Channel, Persona, MAX_PERSONAS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// On-disk session input: `{ personas, base }`. Extra fields (such as an
/// export's `generated` and `meta`) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub personas: Vec<Persona>,
    pub base: BaseCreative,
}

#[derive(Debug, Clone)]
pub struct Session {
    personas: Vec<Persona>,
    base: BaseCreative,
    round: Option<GenerationRound>,
}

impl Session {
    /// Build a session, enforcing the persona limit.
    pub fn new(personas: Vec<Persona>, base: BaseCreative) -> Result<Self, SessionError> {
        if personas.len() > MAX_PERSONAS {
            return Err(SessionError::PersonaLimit { max: MAX_PERSONAS });
        }
        Ok(Self {
            personas,
            base,
            round: None,
        })
    }

    /// Built-in demo session.
    pub fn sample() -> Self {
        Self {
            personas: vec![
                Persona::new(
                    "Value-Seeker Vanessa",
                    "Budget-conscious, hunts deals, responds to clear savings and simple steps.",
                ),
                Persona::new(
                    "Premium Peter",
                    "Frequent buyer, prioritizes convenience, status, and best-in-class experiences.",
                ),
            ],
            base: BaseCreative {
                brief: "Announce a new perk that makes onboarding faster and highlights immediate value."
                    .to_string(),
                channel: Channel::Email,
                subject: Some("Welcome perk: faster start, more value".to_string()),
                message: "We've streamlined your first steps so you get to benefits sooner."
                    .to_string(),
            },
            round: None,
        }
    }

    /// Read a `{ personas, base }` JSON file.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let invalid = |message: String| ApiError::InvalidSessionFile {
            path: path.display().to_string(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let file: SessionFile = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        debug!(path = %path.display(), personas = file.personas.len(), "Loaded session file");
        Session::new(file.personas, file.base).map_err(|e| invalid(e.to_string()))
    }

    pub fn to_file(&self) -> SessionFile {
        SessionFile {
            personas: self.personas.clone(),
            base: self.base.clone(),
        }
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn base(&self) -> &BaseCreative {
        &self.base
    }

    pub fn round(&self) -> Option<&GenerationRound> {
        self.round.as_ref()
    }

    pub fn can_add_persona(&self) -> bool {
        self.personas.len() < MAX_PERSONAS
    }

    /// Append a persona. Clears the last round, whose indices no longer line up.
    pub fn add_persona(&mut self, persona: Persona) -> Result<usize, SessionError> {
        if !self.can_add_persona() {
            return Err(SessionError::PersonaLimit { max: MAX_PERSONAS });
        }
        self.personas.push(persona);
        self.round = None;
        Ok(self.personas.len() - 1)
    }

    /// Remove the persona at `idx`. At least one persona always remains.
    pub fn remove_persona(&mut self, idx: usize) -> Result<Persona, SessionError> {
        if idx >= self.personas.len() {
            return Err(SessionError::PersonaOutOfRange(idx));
        }
        if self.personas.len() == 1 {
            return Err(SessionError::LastPersona);
        }
        self.round = None;
        Ok(self.personas.remove(idx))
    }

    /// Edit a persona in place; existing results are kept.
    pub fn update_persona(&mut self, idx: usize, persona: Persona) -> Result<(), SessionError> {
        let slot = self
            .personas
            .get_mut(idx)
            .ok_or(SessionError::PersonaOutOfRange(idx))?;
        *slot = persona;
        Ok(())
    }

    /// Replace the result set wholesale with a new round.
    pub fn apply_round(&mut self, round: GenerationRound) {
        self.round = Some(round);
    }
}
