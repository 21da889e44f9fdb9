//! CLI presentation: text and json formatters for generation rounds.

use crate::error::ApiError;
use crate::generation::{GenerationRound, VariantSource};
use crate::local::classify;
use crate::session::Session;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_round_text(session: &Session, round: &GenerationRound) -> String {
    let mut out = Vec::new();

    if let Some(warning) = &round.warning {
        out.push(format!("{}", format!("! {}", warning).yellow().bold()));
    }
    out.push(format!(
        "Channel: {}",
        session.base().channel.display_name()
    ));

    for (idx, persona) in session.personas().iter().enumerate() {
        let Some(result) = round.results.get(idx) else {
            continue;
        };
        let source = match result.source {
            VariantSource::Remote => "remote".green().to_string(),
            VariantSource::Fallback => "local fallback".yellow().to_string(),
            VariantSource::Local => "local".cyan().to_string(),
        };
        out.push(String::new());
        out.push(format!(
            "{} [{}] ({})",
            format!("Persona {}: {}", idx + 1, persona.name).bold().underline(),
            classify(persona).as_str(),
            source
        ));

        let with_subjects = result.variants.iter().any(|v| v.subjects.is_some());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        if with_subjects {
            table.set_header(vec!["Tone", "Subjects", "Bodies"]);
        } else {
            table.set_header(vec!["Tone", "Bodies"]);
        }
        for variant in &result.variants {
            let bodies = variant.bodies.join("\n\n");
            if with_subjects {
                let subjects = variant
                    .subjects
                    .as_ref()
                    .map(|s| s.join("\n"))
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![variant.tone.label().to_string(), subjects, bodies]);
            } else {
                table.add_row(vec![variant.tone.label().to_string(), bodies]);
            }
        }
        out.push(table.to_string());
    }

    out.join("\n")
}

pub fn format_round_json(session: &Session, round: &GenerationRound) -> Result<String, ApiError> {
    let out = json!({
        "personas": session.personas(),
        "base": session.base(),
        "results": round.results,
        "warning": round.warning,
    });
    Ok(serde_json::to_string_pretty(&out)?)
}
