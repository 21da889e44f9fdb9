//! Deterministic Local Generator
//!
//! Produces persona- and tone-differentiated copy with no network access. Used
//! as the demo path and as the per-persona fallback when remote generation
//! fails. Pure and total: identical inputs always yield identical output.

pub mod classify;
pub mod templates;
pub mod tone;

pub use classify::{classify, nudge, PersonaClass};
pub use tone::{clamp, inject_tone, strip_emoji, SHORT_CHANNEL_MAX_CHARS};

use crate::types::{BaseCreative, GeneratedVariant, Persona, Tone, TONES};
use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of the brief summary interpolated into bodies.
pub const BRIEF_SUMMARY_MAX_CHARS: usize = 140;

pub const DEFAULT_MESSAGE: &str = "Here's what's new.";
pub const DEFAULT_SUBJECT: &str = "Today's update";

/// Generate three variants (one per tone, in [`TONES`] order) for a persona.
pub fn generate_for_persona(persona: &Persona, base: &BaseCreative) -> Vec<GeneratedVariant> {
    let class = classify(persona);
    let message = message_seed(&base.message);
    let summary = summarize_brief(&base.brief);
    let subject = subject_seed(base.subject.as_deref());

    TONES
        .iter()
        .map(|&tone| GeneratedVariant {
            tone,
            subjects: base
                .channel
                .is_email()
                .then(|| subject_lines(&subject, class, tone, base)),
            bodies: body_copy(&message, summary.as_deref(), class, tone, base),
        })
        .collect()
}

fn body_copy(
    message: &str,
    summary: Option<&str>,
    class: PersonaClass,
    tone: Tone,
    base: &BaseCreative,
) -> Vec<String> {
    templates::stances(class)
        .iter()
        .map(|stance| {
            let candidate = stance.render(message, summary);
            inject_tone(&nudge(&candidate, class), tone, base.channel)
        })
        .collect()
}

fn subject_lines(subject: &str, class: PersonaClass, tone: Tone, base: &BaseCreative) -> Vec<String> {
    templates::subjects(class)
        .iter()
        .map(|template| {
            let candidate = template.render(subject);
            inject_tone(&nudge(&candidate, class), tone, base.channel)
        })
        .collect()
}

/// Collapse whitespace and clamp the brief; `None` when the brief is blank.
pub fn summarize_brief(brief: &str) -> Option<String> {
    let collapsed = collapse_whitespace(brief);
    if collapsed.is_empty() {
        None
    } else {
        Some(clamp(&collapsed, BRIEF_SUMMARY_MAX_CHARS))
    }
}

/// The base message as a lead-sentence fragment: trailing terminal
/// punctuation is dropped because the stance supplies its own.
fn message_seed(message: &str) -> String {
    let terminal = &['.', '!', '?'][..];
    let collapsed = collapse_whitespace(message);
    let seed = collapsed.trim_end_matches(terminal).trim_end();
    if seed.is_empty() {
        DEFAULT_MESSAGE.trim_end_matches(terminal).to_string()
    } else {
        seed.to_string()
    }
}

fn subject_seed(subject: Option<&str>) -> String {
    let collapsed = collapse_whitespace(subject.unwrap_or_default());
    if collapsed.is_empty() {
        DEFAULT_SUBJECT.to_string()
    } else {
        collapsed
    }
}

fn collapse_whitespace(text: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    WS.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
        .replace_all(text.trim(), " ")
        .into_owned()
}
