//! JSON export of a session and its last generation round.

use crate::error::ApiError;
use crate::session::Session;
use crate::types::{BaseCreative, GeneratedVariant, Persona};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXPORT_FILE_PREFIX: &str = "persona-creative-simulator";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMeta {
    /// RFC 3339 timestamp with millisecond precision.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExport {
    pub personas: Vec<Persona>,
    pub base: BaseCreative,
    pub generated: BTreeMap<usize, Vec<GeneratedVariant>>,
    pub meta: ExportMeta,
}

impl SessionExport {
    /// Snapshot `session` at `now`. Fails when no round has been generated.
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Result<Self, ApiError> {
        let round = session
            .round()
            .filter(|round| !round.results.is_empty())
            .ok_or_else(|| ApiError::ExportFailed("no generated results to export".to_string()))?;

        Ok(Self {
            personas: session.personas().to_vec(),
            base: session.base().clone(),
            generated: round.results.to_variant_map(),
            meta: ExportMeta {
                created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, ApiError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `persona-creative-simulator-<unix-millis>.json`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("{}-{}.json", EXPORT_FILE_PREFIX, now.timestamp_millis())
}

/// Write the session export into `dir`, returning the file path.
pub fn write_export(session: &Session, dir: &Path) -> Result<PathBuf, ApiError> {
    let now = Utc::now();
    let export = SessionExport::from_session(session, now)?;
    std::fs::create_dir_all(dir)
        .map_err(|e| ApiError::ExportFailed(format!("cannot create {}: {}", dir.display(), e)))?;

    let path = dir.join(export_file_name(now));
    std::fs::write(&path, export.to_json_pretty()?)
        .map_err(|e| ApiError::ExportFailed(format!("cannot write {}: {}", path.display(), e)))?;

    info!(path = %path.display(), personas = export.personas.len(), "Session exported");
    Ok(path)
}
