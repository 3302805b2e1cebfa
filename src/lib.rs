//! Sleepy Server Library
//!
//! Self-hosted "am I awake" status page backend.
//!
//! ## Architecture
//!
//! 1. StateStore - status document, devices, metrics, disk checkpoints
//! 2. StatusCatalog - configured status records
//! 3. AuthGuard - shared secret check for mutating routes
//! 4. RequestTelemetry - access log and path counters
//! 5. StatusQuery - public snapshot shared by `/query` and SSE
//! 6. RealtimeHub - per-subscriber SSE loops
//! 7. DglabController - button-triggered actuation
//! 8. PushNotifier - ServerChan delivery
//! 9. WebAPI - HTTP routes
//!
//! ## Design Principles
//!
//! - One lock: every component reaches state through the StateStore handle
//! - Request errors become a uniform JSON envelope and never crash the process

pub mod auth;
pub mod clock;
pub mod dglab_controller;
pub mod error;
pub mod models;
pub mod push_notifier;
pub mod realtime_hub;
pub mod request_telemetry;
pub mod state;
pub mod state_store;
pub mod status_catalog;
pub mod status_query;
pub mod web_api;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
