//! StatusCatalog - configured status records
//!
//! ## Responsibilities
//!
//! - Load the status list (JSON array file, or the built-in list)
//! - Resolve a status id to its record, with the "unknown" fallback

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One configured status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: i64,
    pub name: String,
    #[serde(rename = "desc", alias = "description")]
    pub description: String,
    pub color: String,
}

impl StatusRecord {
    /// Record returned for a status id outside the catalog
    pub fn unknown(id: i64) -> Self {
        Self {
            id: -1,
            name: "[unknown]".to_string(),
            description: format!("unknown identifier {}, likely a configuration issue", id),
            color: "error".to_string(),
        }
    }
}

/// Ordered status list; ids are positions
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    records: Vec<StatusRecord>,
}

impl StatusCatalog {
    pub fn new(records: Vec<StatusRecord>) -> Self {
        for (index, record) in records.iter().enumerate() {
            if record.id != index as i64 {
                tracing::warn!(
                    position = index,
                    id = record.id,
                    "Status record id does not match its position"
                );
            }
        }
        Self { records }
    }

    /// Built-in catalog used when no status list file is configured
    pub fn builtin() -> Self {
        Self::new(vec![
            StatusRecord {
                id: 0,
                name: "Awake".to_string(),
                description: "Online right now, reachable through any usual contact.".to_string(),
                color: "awake".to_string(),
            },
            StatusRecord {
                id: 1,
                name: "Asleep".to_string(),
                description: "Asleep or otherwise offline. Call for anything urgent.".to_string(),
                color: "sleeping".to_string(),
            },
        ])
    }

    /// Load from a JSON array file, or the built-in list when `path` is None
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read status list {}: {}", path.display(), e))
        })?;
        let records: Vec<StatusRecord> = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("invalid status list {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), count = records.len(), "Status list loaded");
        Ok(Self::new(records))
    }

    /// Record for `id`, if configured
    pub fn get(&self, id: i64) -> Option<&StatusRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get(i))
    }

    /// Record for `id`, falling back to [`StatusRecord::unknown`]
    pub fn resolve(&self, id: i64) -> StatusRecord {
        match self.get(id) {
            Some(record) => record.clone(),
            None => {
                tracing::debug!(status = id, "Status id out of range");
                StatusRecord::unknown(id)
            }
        }
    }

    pub fn records(&self) -> &[StatusRecord] {
        &self.records
    }
}
