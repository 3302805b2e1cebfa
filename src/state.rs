//! Application state
//!
//! Holds the configuration and all shared components

use crate::dglab_controller::DglabService;
use crate::error::{Error, Result};
use crate::models::parse_bool;
use crate::push_notifier::PushNotifier;
use crate::realtime_hub::RealtimeHub;
use crate::state_store::{StateStore, StoreOptions};
use crate::status_catalog::StatusCatalog;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Debug logging
    pub debug: bool,
    /// Timezone for every formatted time
    pub timezone: Tz,
    /// Checkpoint interval (seconds)
    pub checkdata_interval: u64,
    /// Shared secret for mutating endpoints
    pub secret: String,
    /// Default push key
    pub sendkey: String,
    /// `device_status_slice` hint for the UI
    pub device_slice: u32,
    /// `refresh` hint for the UI (milliseconds)
    pub refresh_interval: u64,
    /// Label stored as `app_name` for idle devices
    pub not_using: Option<String>,
    /// Request counting and `/metrics`
    pub metrics_enabled: bool,
    /// Flip awake/asleep with device activity
    pub auto_switch_status: bool,
    /// State Store file
    pub data_path: PathBuf,
    /// Status list file (built-in list when unset)
    pub status_list_path: Option<PathBuf>,
    /// Guard `/button1` with the shared secret
    pub button_requires_secret: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9010,
            debug: false,
            timezone: chrono_tz::Asia::Shanghai,
            checkdata_interval: 30,
            secret: "change-me".to_string(),
            sendkey: String::new(),
            device_slice: 30,
            refresh_interval: 5000,
            not_using: None,
            metrics_enabled: true,
            auto_switch_status: true,
            data_path: PathBuf::from("data.json"),
            status_list_path: None,
            button_requires_secret: false,
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment; unset keys keep their defaults
    pub fn from_env() -> Result<Self> {
        let d = Self::default();

        Ok(Self {
            host: env_or("sleepy_main_host", d.host),
            port: env_parse("sleepy_main_port", d.port)?,
            debug: env_bool("sleepy_main_debug", d.debug)?,
            timezone: env_parse("sleepy_main_timezone", d.timezone)?,
            checkdata_interval: env_parse("sleepy_main_checkdata_interval", d.checkdata_interval)?,
            secret: env_or("SLEEPY_SECRET", d.secret),
            sendkey: env_or("SLEEPY_SENDKEY", d.sendkey),
            device_slice: env_parse("sleepy_status_device_slice", d.device_slice)?,
            refresh_interval: env_parse("sleepy_status_refresh_interval", d.refresh_interval)?,
            not_using: std::env::var("sleepy_status_not_using")
                .ok()
                .filter(|v| !v.is_empty()),
            metrics_enabled: env_bool("sleepy_util_metrics", d.metrics_enabled)?,
            auto_switch_status: env_bool("sleepy_util_auto_switch_status", d.auto_switch_status)?,
            data_path: std::env::var("sleepy_data_path")
                .map(PathBuf::from)
                .unwrap_or(d.data_path),
            status_list_path: std::env::var("sleepy_status_list_path")
                .ok()
                .map(PathBuf::from),
            button_requires_secret: env_bool(
                "sleepy_util_button_requires_secret",
                d.button_requires_secret,
            )?,
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            timezone: self.timezone,
            auto_switch_status: self.auto_switch_status,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => parse_bool(&raw)
            .ok_or_else(|| Error::Config(format!("{}={:?}: not a boolean", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: Arc<AppConfig>,
    /// StateStore (status document)
    pub store: Arc<StateStore>,
    /// StatusCatalog (configured statuses)
    pub status_catalog: Arc<StatusCatalog>,
    /// RealtimeHub (SSE subscribers)
    pub realtime: Arc<RealtimeHub>,
    /// DglabService (button actuation)
    pub dglab: Arc<DglabService>,
    /// Cancelled on shutdown; ends every SSE loop
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<StateStore>,
        status_catalog: StatusCatalog,
        notifier: PushNotifier,
    ) -> Self {
        let dglab = Arc::new(DglabService::new(store.clone(), Arc::new(notifier)));

        Self {
            config: Arc::new(config),
            store,
            status_catalog: Arc::new(status_catalog),
            realtime: Arc::new(RealtimeHub::new()),
            dglab,
            shutdown: CancellationToken::new(),
        }
    }
}
