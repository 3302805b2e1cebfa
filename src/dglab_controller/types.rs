//! DG-LAB controller type definitions

use serde::{Deserialize, Serialize};

/// Actuation settings stored under the `DGLab` key of the data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DglabSettings {
    /// Controller base URL, e.g. `http://127.0.0.1:8920`
    pub url: String,
    /// Strength applied while running
    pub strength: u32,
    /// Run time in seconds
    pub duration: u64,
    /// `true`: one fire action; `false`: set strength, wait, reset
    pub fire: bool,
}

impl Default for DglabSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8920".to_string(),
            strength: 10,
            duration: 5,
            fire: false,
        }
    }
}

/// Actuation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationMode {
    /// Single timed fire action
    Fire,
    /// Set strength, hold for the duration, reset to zero
    Timed,
}

impl DglabSettings {
    pub fn mode(&self) -> ActuationMode {
        if self.fire {
            ActuationMode::Fire
        } else {
            ActuationMode::Timed
        }
    }
}

/// Result of one button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuationOutcome {
    Succeeded { strength: u32, duration: u64 },
    Failed { reason: String },
}

impl ActuationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// One-word status used in the push notification
    pub fn status_text(&self) -> String {
        match self {
            Self::Succeeded { .. } => "ok".to_string(),
            Self::Failed { reason } => format!("error: {}", reason),
        }
    }

    /// Line returned to the caller and logged
    pub fn report(&self) -> String {
        match self {
            Self::Succeeded { strength, duration } => format!(
                "Actuation complete, strength {}, duration {}s",
                strength, duration
            ),
            Self::Failed { reason } => format!("Actuation failed, error: {}", reason),
        }
    }
}
