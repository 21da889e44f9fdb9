//! Core data model: personas, base creative, tones and generated variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of personas a session holds at once.
pub const MAX_PERSONAS: usize = 3;

/// A target audience persona.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Delivery channel for the creative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Email,
    Sms,
    Inapp,
}

impl Channel {
    pub fn is_email(self) -> bool {
        matches!(self, Channel::Email)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Inapp => "inapp",
        }
    }

    /// Human-facing label
    pub fn display_name(self) -> &'static str {
        match self {
            Channel::Email => "Email",
            Channel::Sms => "SMS",
            Channel::Inapp => "In-App",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The creative every persona variant is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCreative {
    #[serde(default)]
    pub brief: String,
    pub channel: Channel,
    /// Only meaningful when `channel` is email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Copy tone. Serialized with the exact labels the generation endpoint uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    #[serde(rename = "fun/energetic")]
    FunEnergetic,
    #[serde(rename = "humorous/cheeky")]
    HumorousCheeky,
    #[serde(rename = "formal/professional")]
    FormalProfessional,
}

/// Fixed tone order for every persona's variants.
pub const TONES: [Tone; 3] = [
    Tone::FunEnergetic,
    Tone::HumorousCheeky,
    Tone::FormalProfessional,
];

impl Tone {
    pub fn label(self) -> &'static str {
        match self {
            Tone::FunEnergetic => "fun/energetic",
            Tone::HumorousCheeky => "humorous/cheeky",
            Tone::FormalProfessional => "formal/professional",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Copy for one tone: three bodies, plus three subjects for email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVariant {
    pub tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    pub bodies: Vec<String>,
}
