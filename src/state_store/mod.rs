//! StateStore - shared status document with disk checkpointing
//!
//! ## Responsibilities
//!
//! - Hold current status, devices, private mode, metrics and actuation settings
//! - Serialize every mutation behind one lock and stamp `last_updated`
//! - Load from / save to a JSON file, periodically and on demand
//!
//! Handlers never hold the lock across an await of their own; each accessor
//! takes the lock for the duration of one read or one mutation.

pub mod metrics;
pub mod types;

pub use metrics::{MetricsCounters, MetricsReport};
pub use types::{DeviceEntry, StoreOptions, StoredData};

use crate::clock;
use crate::dglab_controller::DglabSettings;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Status ids flipped by automatic switching
const STATUS_AWAKE: i64 = 0;
const STATUS_ASLEEP: i64 = 1;

/// StateStore instance
pub struct StateStore {
    data: RwLock<StoredData>,
    path: PathBuf,
    options: StoreOptions,
    dirty: AtomicBool,
    /// Bumped on every mutation; finer than the second-resolution `last_updated`
    revision: AtomicU64,
}

impl StateStore {
    /// Create a store around an existing document (not written until saved)
    pub fn with_data(path: impl Into<PathBuf>, options: StoreOptions, data: StoredData) -> Self {
        Self {
            data: RwLock::new(data),
            path: path.into(),
            options,
            dirty: AtomicBool::new(false),
            revision: AtomicU64::new(0),
        }
    }

    /// Load the document at `path`, creating it with defaults when missing
    pub async fn load(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let path = path.into();

        let data = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let data: StoredData = serde_json::from_str(&raw).map_err(|e| {
                    Error::Internal(format!("corrupt data file {}: {}", path.display(), e))
                })?;
                tracing::info!(path = %path.display(), "Data loaded");
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No data file, starting fresh");
                let data = StoredData::new(options.timezone);
                write_document(&path, &data).await?;
                data
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::with_data(path, options, data))
    }

    /// Write the document to disk
    pub async fn save(&self) -> Result<()> {
        let data = self.take_checkpoint().await;
        self.write_checkpoint(&data).await
    }

    /// Copy the document and clear the dirty flag under the same lock, so a
    /// mutation racing the write re-marks the store
    async fn take_checkpoint(&self) -> StoredData {
        let data = self.data.read().await;
        self.dirty.swap(false, Ordering::AcqRel);
        data.clone()
    }

    async fn write_checkpoint(&self, data: &StoredData) -> Result<()> {
        if let Err(e) = write_document(&self.path, data).await {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        tracing::debug!(path = %self.path.display(), "Data saved");
        Ok(())
    }

    /// Save if anything changed since the last save
    pub async fn save_if_dirty(&self) -> Result<bool> {
        if !self.dirty.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    /// Spawn the periodic checkpoint loop
    pub fn start_checkpoint(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tracing::info!(interval_sec = interval.as_secs(), "Checkpoint task started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately; nothing to save yet
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match store.save_if_dirty().await {
                    Ok(true) => tracing::info!("Checkpoint saved"),
                    Ok(false) => {}
                    Err(e) => tracing::error!(error = %e, "Checkpoint save failed"),
                }
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    // ========================================
    // Reads
    // ========================================

    /// Run `f` against a consistent view of the document
    pub async fn read<R>(&self, f: impl FnOnce(&StoredData) -> R) -> R {
        let data = self.data.read().await;
        f(&data)
    }

    /// Full copy of the document
    pub async fn snapshot(&self) -> StoredData {
        self.data.read().await.clone()
    }

    pub async fn status(&self) -> i64 {
        self.data.read().await.status
    }

    /// Mutation counter, compared by change watchers
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub async fn last_updated(&self) -> String {
        self.data.read().await.last_updated.clone()
    }

    pub async fn dglab_settings(&self) -> DglabSettings {
        self.data.read().await.dglab.clone()
    }

    // ========================================
    // Mutations
    // ========================================

    pub async fn set_status(&self, status: i64) {
        let mut data = self.data.write().await;
        data.status = status;
        self.touch(&mut data);
        tracing::info!(status = status, "Status set");
    }

    /// Create or overwrite one device
    pub async fn set_device(&self, id: &str, entry: DeviceEntry) {
        let mut data = self.data.write().await;
        tracing::info!(
            device_id = %id,
            using = entry.using,
            app_name = %entry.app_name,
            "Device set"
        );
        data.device_status.insert(id.to_string(), entry);
        self.apply_auto_switch(&mut data);
        self.touch(&mut data);
    }

    pub async fn remove_device(&self, id: &str) -> Result<()> {
        let mut data = self.data.write().await;
        if data.device_status.remove(id).is_none() {
            return Err(Error::NotFound("cannot find item".to_string()));
        }
        tracing::info!(device_id = %id, "Device removed");
        self.apply_auto_switch(&mut data);
        self.touch(&mut data);
        Ok(())
    }

    pub async fn clear_devices(&self) {
        let mut data = self.data.write().await;
        data.device_status.clear();
        self.apply_auto_switch(&mut data);
        self.touch(&mut data);
        tracing::info!("Devices cleared");
    }

    pub async fn set_private_mode(&self, private: bool) {
        let mut data = self.data.write().await;
        data.private_mode = private;
        self.touch(&mut data);
        tracing::info!(private = private, "Private mode set");
    }

    /// Replace the actuation settings (not a status change; `last_updated` kept)
    pub async fn set_dglab_settings(&self, settings: DglabSettings) {
        let mut data = self.data.write().await;
        data.dglab = settings;
        self.dirty.store(true, Ordering::Release);
    }

    // ========================================
    // Metrics
    // ========================================

    pub async fn record_metrics(&self, path: &str) {
        let now = clock::now_in(self.options.timezone);
        let mut data = self.data.write().await;
        data.metrics.record(path, &now);
        self.dirty.store(true, Ordering::Release);
    }

    pub async fn metrics_report(&self) -> MetricsReport {
        let now = clock::now_in(self.options.timezone);
        let mut data = self.data.write().await;
        data.metrics.roll_over(&now);
        let m = &data.metrics;

        MetricsReport {
            time: now.format(clock::TIME_FORMAT).to_string(),
            timezone: self.options.timezone.name().to_string(),
            today_is: m.today_is.clone(),
            month_is: m.month_is.clone(),
            year_is: m.year_is.clone(),
            today: m.today.clone(),
            month: m.month.clone(),
            year: m.year.clone(),
            total: m.total.clone(),
        }
    }

    fn touch(&self, data: &mut StoredData) {
        data.last_updated = clock::format_now(self.options.timezone);
        self.revision.fetch_add(1, Ordering::AcqRel);
        self.dirty.store(true, Ordering::Release);
    }

    /// Flip awake/asleep to follow device activity; custom statuses are left alone
    fn apply_auto_switch(&self, data: &mut StoredData) {
        if !self.options.auto_switch_status {
            return;
        }

        let any_using = data.device_status.values().any(|d| d.using);
        let next = match (any_using, data.status) {
            (true, STATUS_ASLEEP) => STATUS_AWAKE,
            (false, STATUS_AWAKE) => STATUS_ASLEEP,
            _ => return,
        };

        tracing::info!(from = data.status, to = next, "Status auto-switched");
        data.status = next;
    }
}

async fn write_document(path: &Path, data: &StoredData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_data() -> StoredData {
        StoredData {
            last_updated: "2000-01-01 00:00:00".to_string(),
            ..StoredData::new(chrono_tz::Asia::Shanghai)
        }
    }

    fn store_with(options: StoreOptions) -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::with_data(dir.path().join("data.json"), options, fixed_data());
        (dir, store)
    }

    #[tokio::test]
    async fn test_mutations_refresh_last_updated() {
        let (_dir, store) = store_with(StoreOptions::default());

        store.set_status(1).await;
        assert_ne!(store.last_updated().await, "2000-01-01 00:00:00");
        assert_eq!(store.status().await, 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_device_is_not_found() {
        let (_dir, store) = store_with(StoreOptions::default());

        let result = store.remove_device("ghost").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        // failed removal is not a mutation
        assert_eq!(store.last_updated().await, "2000-01-01 00:00:00");
    }

    #[tokio::test]
    async fn test_device_set_and_remove() {
        let (_dir, store) = store_with(StoreOptions::default());

        store
            .set_device("d1", DeviceEntry::new("Laptop", true, "Editor", None))
            .await;
        assert_eq!(store.read(|d| d.device_status.len()).await, 1);

        store.remove_device("d1").await.unwrap();
        assert!(store.read(|d| d.device_status.is_empty()).await);
    }

    #[tokio::test]
    async fn test_auto_switch_follows_device_activity() {
        let options = StoreOptions {
            auto_switch_status: true,
            ..StoreOptions::default()
        };
        let (_dir, store) = store_with(options);
        store.set_status(1).await;

        store
            .set_device("d1", DeviceEntry::new("Laptop", true, "Editor", None))
            .await;
        assert_eq!(store.status().await, 0);

        store
            .set_device("d1", DeviceEntry::new("Laptop", false, "", None))
            .await;
        assert_eq!(store.status().await, 1);
    }

    #[tokio::test]
    async fn test_auto_switch_leaves_custom_status() {
        let options = StoreOptions {
            auto_switch_status: true,
            ..StoreOptions::default()
        };
        let (_dir, store) = store_with(options);
        store.set_status(5).await;

        store
            .set_device("d1", DeviceEntry::new("Laptop", true, "Editor", None))
            .await;
        assert_eq!(store.status().await, 5);
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let (dir, store) = store_with(StoreOptions::default());
        store
            .set_device("d1", DeviceEntry::new("Phone", true, "Reader", None))
            .await;
        store.set_private_mode(true).await;

        assert!(store.save_if_dirty().await.unwrap());
        assert!(!store.save_if_dirty().await.unwrap());

        let reloaded = StateStore::load(dir.path().join("data.json"), StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(reloaded.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_mutation_during_save_stays_dirty() {
        let (dir, store) = store_with(StoreOptions::default());
        store.set_status(1).await;

        let data = store.take_checkpoint().await;
        store.set_status(0).await;
        store.write_checkpoint(&data).await.unwrap();

        assert!(store.save_if_dirty().await.unwrap());
        let reloaded = StateStore::load(dir.path().join("data.json"), StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(reloaded.status().await, 0);
    }

    #[tokio::test]
    async fn test_failed_write_stays_dirty() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be makes the write fail
        let path = dir.path().join("data.json");
        std::fs::create_dir(&path).unwrap();
        let store = StateStore::with_data(&path, StoreOptions::default(), fixed_data());
        store.set_status(1).await;

        assert!(store.save().await.is_err());
        assert!(store.dirty.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_revision_moves_within_one_second() {
        let (_dir, store) = store_with(StoreOptions::default());
        let before = store.revision();

        store.set_status(1).await;
        let after_first = store.revision();
        store.set_status(0).await;

        assert!(after_first > before);
        assert!(store.revision() > after_first);
        // failed removal is not a mutation
        let _ = store.remove_device("ghost").await;
        assert_eq!(store.revision(), after_first + 1);
    }

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let store = StateStore::load(&path, StoreOptions::default()).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.status().await, 0);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ nope").unwrap();

        let result = StateStore::load(&path, StoreOptions::default()).await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_metrics_report() {
        let (_dir, store) = store_with(StoreOptions::default());
        store.record_metrics("/query").await;
        store.record_metrics("/query").await;
        store.record_metrics("/events").await;

        let report = store.metrics_report().await;
        assert_eq!(report.timezone, "Asia/Shanghai");
        assert_eq!(report.today["/query"], 2);
        assert_eq!(report.total["/events"], 1);
    }
}
