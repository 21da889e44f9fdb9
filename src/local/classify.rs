//! Persona classification and class-keyed keyword nudges.

use crate::types::Persona;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Coarse audience class derived from a persona's name and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaClass {
    Value,
    Premium,
    Family,
    Curious,
}

impl PersonaClass {
    /// Match precedence when a persona hits several keyword families.
    pub const PRECEDENCE: [PersonaClass; 4] = [
        PersonaClass::Value,
        PersonaClass::Premium,
        PersonaClass::Family,
        PersonaClass::Curious,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PersonaClass::Value => "value",
            PersonaClass::Premium => "premium",
            PersonaClass::Family => "family",
            PersonaClass::Curious => "curious",
        }
    }

    fn keywords(self) -> &'static Regex {
        static VALUE: OnceLock<Regex> = OnceLock::new();
        static PREMIUM: OnceLock<Regex> = OnceLock::new();
        static FAMILY: OnceLock<Regex> = OnceLock::new();
        static CURIOUS: OnceLock<Regex> = OnceLock::new();
        match self {
            PersonaClass::Value => VALUE.get_or_init(|| {
                Regex::new(r"\b(value|deal|budget|sav(e|ing)|frugal)").expect("valid value pattern")
            }),
            PersonaClass::Premium => PREMIUM.get_or_init(|| {
                Regex::new(r"\b(premium|vip|status|luxury|convenien|frequent)")
                    .expect("valid premium pattern")
            }),
            PersonaClass::Family => FAMILY.get_or_init(|| {
                Regex::new(r"\b(famil|parent|kids|household|busy)").expect("valid family pattern")
            }),
            PersonaClass::Curious => CURIOUS.get_or_init(|| {
                Regex::new(r"\b(tech|power|explor|curious|early[\s-]+adopter|discover)")
                    .expect("valid curious pattern")
            }),
        }
    }
}

impl fmt::Display for PersonaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a persona by keyword family. First match in
/// [`PersonaClass::PRECEDENCE`] wins; no match falls back to `Curious`.
pub fn classify(persona: &Persona) -> PersonaClass {
    let haystack = format!("{} {}", persona.name, persona.description).to_lowercase();
    PersonaClass::PRECEDENCE
        .into_iter()
        .find(|class| class.keywords().is_match(&haystack))
        .unwrap_or(PersonaClass::Curious)
}

/// Apply the class-specific keyword substitution to a candidate string.
pub fn nudge(text: &str, class: PersonaClass) -> String {
    static VALUE_WORDS: OnceLock<Regex> = OnceLock::new();
    static PREMIUM_WORDS: OnceLock<Regex> = OnceLock::new();
    static FAMILY_WORDS: OnceLock<Regex> = OnceLock::new();

    match class {
        PersonaClass::Value => VALUE_WORDS
            .get_or_init(|| Regex::new(r"(?i)\b(save|deal|offer)\b").expect("valid nudge pattern"))
            .replace_all(text, |caps: &Captures| caps[0].to_uppercase())
            .into_owned(),
        PersonaClass::Premium => PREMIUM_WORDS
            .get_or_init(|| {
                Regex::new(r"(?i)\b(rewards|points|benefits)\b").expect("valid nudge pattern")
            })
            .replace_all(text, "exclusive $0")
            .into_owned(),
        PersonaClass::Family => FAMILY_WORDS
            .get_or_init(|| Regex::new(r"(?i)\b(today|now)\b").expect("valid nudge pattern"))
            .replace_all(text, "$0 (fits your schedule)")
            .into_owned(),
        PersonaClass::Curious => text.to_string(),
    }
}
