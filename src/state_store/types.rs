//! State Store types

use super::metrics::MetricsCounters;
use crate::clock;
use crate::dglab_controller::DglabSettings;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One reporting device, keyed by its id in [`StoredData::device_status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub show_name: String,
    pub using: bool,
    pub app_name: String,
}

impl DeviceEntry {
    /// Build an entry, replacing `app_name` with `not_using_label` when the
    /// device is idle and a label is configured.
    pub fn new(
        show_name: impl Into<String>,
        using: bool,
        app_name: impl Into<String>,
        not_using_label: Option<&str>,
    ) -> Self {
        let app_name = match not_using_label {
            Some(label) if !using && !label.is_empty() => label.to_string(),
            _ => app_name.into(),
        };

        Self {
            show_name: show_name.into(),
            using,
            app_name,
        }
    }
}

/// Persisted document (`data.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredData {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub device_status: BTreeMap<String, DeviceEntry>,
    #[serde(default)]
    pub private_mode: bool,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub metrics: MetricsCounters,
    #[serde(rename = "DGLab", default)]
    pub dglab: DglabSettings,
}

impl StoredData {
    /// Fresh document stamped with the current time in `tz`
    pub fn new(tz: Tz) -> Self {
        Self {
            status: 0,
            device_status: BTreeMap::new(),
            private_mode: false,
            last_updated: clock::format_now(tz),
            metrics: MetricsCounters::default(),
            dglab: DglabSettings::default(),
        }
    }
}

/// Store behaviour switches taken from the app config
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub timezone: Tz,
    pub auto_switch_status: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Shanghai,
            auto_switch_status: false,
        }
    }
}
