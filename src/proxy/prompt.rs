//! Prompts sent to the chat-completion provider.

use crate::proxy::upstream::ChatMessage;
use crate::types::{BaseCreative, Persona};
use serde_json::Value;

const PERSONA_SYSTEM_PROMPT: &str = r#"You are a marketing copy assistant. Output ONLY JSON with this shape:
{
  "variants": [
    { "tone": "fun/energetic",        "subjects": ["..."], "bodies": ["..."] },
    { "tone": "humorous/cheeky",      "subjects": ["..."], "bodies": ["..."] },
    { "tone": "formal/professional",  "subjects": ["..."], "bodies": ["..."] }
  ]
}
If channel != "email", omit "subjects". Keep strings concise (<= 200 chars)."#;

const BATCH_SYSTEM_PROMPT: &str = r#"You are a marketing copy assistant. Output ONLY JSON with this shape:
{
  "variants": [
    { "tone": "fun/energetic", "subjects": ["...","...","..."], "bodies": ["...","...","..."] },
    { "tone": "humorous/cheeky", "subjects": ["...","...","..."], "bodies": ["...","...","..."] },
    { "tone": "formal/professional", "subjects": ["...","...","..."], "bodies": ["...","...","..."] }
  ]
}
If channel != "email", omit "subjects". Keep each string concise."#;

/// Single-persona prompt: three tones, one short variant each.
pub fn persona_messages(persona: &Persona, base: &BaseCreative) -> Vec<ChatMessage> {
    let mut lines = vec![
        format!("Persona name: {}", persona.name),
        format!("Persona traits: {}", persona.description),
        format!("Channel: {}", base.channel.as_str()),
    ];
    if let Some(subject) = base.subject.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Subject seed: {}", subject));
    }
    lines.push(format!("Message seed: {}", base.message));
    if !base.brief.is_empty() {
        lines.push(format!("Brief: {}", base.brief));
    }
    lines.push("Return exactly 3 tones (above) with ONE short variant each.".to_string());

    vec![
        ChatMessage::system(PERSONA_SYSTEM_PROMPT),
        ChatMessage::user(lines.join("\n")),
    ]
}

/// Batch prompt: the raw personas and base JSON, passed through.
pub fn batch_messages(personas: &Value, base: &Value) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(BATCH_SYSTEM_PROMPT),
        ChatMessage::user(format!("Personas: {}\nBase: {}", personas, base)),
    ]
}
