//! StatusQuerySnapshot - public read model
//!
//! The same snapshot answers `GET /query` and fills every SSE `update` frame.

use crate::clock;
use crate::state::AppConfig;
use crate::state_store::{DeviceEntry, StateStore};
use crate::status_catalog::{StatusCatalog, StatusRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// `/query` response body
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub time: String,
    pub timezone: String,
    pub success: bool,
    pub status: i64,
    pub info: StatusRecord,
    pub device: BTreeMap<String, DeviceEntry>,
    pub device_status_slice: u32,
    pub last_updated: String,
    pub refresh: u64,
}

/// Build the snapshot from one consistent read of the store.
///
/// Unknown status ids resolve to the fallback record; private mode hides the
/// device map without touching stored devices.
pub async fn build(store: &StateStore, catalog: &StatusCatalog, config: &AppConfig) -> StatusSnapshot {
    let (status, device, last_updated) = store
        .read(|data| {
            let device = if data.private_mode {
                BTreeMap::new()
            } else {
                data.device_status.clone()
            };
            (data.status, device, data.last_updated.clone())
        })
        .await;

    StatusSnapshot {
        time: clock::format_now(config.timezone),
        timezone: config.timezone.name().to_string(),
        success: true,
        status,
        info: catalog.resolve(status),
        device,
        device_status_slice: config.device_slice,
        last_updated,
        refresh: config.refresh_interval,
    }
}
