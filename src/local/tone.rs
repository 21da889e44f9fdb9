//! Tone injection and length clamping.

use crate::types::{Channel, Tone};
use regex::Regex;
use std::sync::OnceLock;

/// Maximum length for SMS and in-app strings.
pub const SHORT_CHANNEL_MAX_CHARS: usize = 220;

const FUN_SPICE: &str = "✨ 🚀";
const CHEEKY_SPICE: &str = "😉 💡";

/// Truncate to at most `max` characters, replacing the tail with an ellipsis.
/// Lengths count `char`s, not bytes.
pub fn clamp(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let head: String = text.chars().take(max - 1).collect();
    let mut out = head.trim_end().to_string();
    out.push('…');
    out
}

/// Remove pictographic emoji plus the joiners and variation selectors that
/// glue them together, then collapse the whitespace they leave behind.
pub fn strip_emoji(text: &str) -> String {
    static EMOJI: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let emoji = EMOJI.get_or_init(|| {
        Regex::new(r"[\p{Emoji_Presentation}\p{Extended_Pictographic}\u{FE0F}\u{200D}]")
            .expect("valid emoji pattern")
    });
    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("valid spaces pattern"));
    let stripped = emoji.replace_all(text, "");
    spaces.replace_all(&stripped, " ").trim().to_string()
}

/// Post-process one candidate string for a tone. Non-email channels are
/// clamped to [`SHORT_CHANNEL_MAX_CHARS`].
pub fn inject_tone(text: &str, tone: Tone, channel: Channel) -> String {
    let toned = match tone {
        Tone::FunEnergetic => format!("{} {}", FUN_SPICE, text),
        Tone::HumorousCheeky => format!("{} {}", CHEEKY_SPICE, text),
        Tone::FormalProfessional => strip_emoji(text),
    };
    if channel.is_email() {
        toned
    } else {
        clamp(&toned, SHORT_CHANNEL_MAX_CHARS)
    }
}
