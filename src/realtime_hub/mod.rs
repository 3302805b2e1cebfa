//! RealtimeHub - SSE distribution
//!
//! ## Responsibilities
//!
//! - Per-subscriber poll loop over the State Store's mutation revision
//! - `update` frames carrying the full status snapshot on every change
//! - `heartbeat` frames after 30s without any frame
//! - Subscriber accounting (register on connect, drop guard on disconnect)
//!
//! Each subscriber owns its own loop; nothing is fanned out. The loop ends
//! when the response stream is dropped (client gone) or on shutdown.

use crate::clock;
use crate::state::AppState;
use crate::status_query;
use async_stream::stream;
use axum::response::sse::Event;
use futures::Stream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Duration, Instant};
use uuid::Uuid;

/// Poll interval of every subscriber loop
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Quiet period before a heartbeat is sent
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Frame chosen by [`UpdateWatcher::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Update,
    Heartbeat,
}

/// Change detector for one subscriber
#[derive(Debug)]
pub struct UpdateWatcher {
    last_seen: Option<u64>,
    last_frame: Instant,
}

impl UpdateWatcher {
    pub fn new(now: Instant) -> Self {
        Self {
            last_seen: None,
            last_frame: now,
        }
    }

    /// Feed one sample of the store revision taken at `now`
    pub fn observe(&mut self, revision: u64, now: Instant) -> Option<FrameKind> {
        if self.last_seen != Some(revision) {
            self.last_seen = Some(revision);
            self.last_frame = now;
            return Some(FrameKind::Update);
        }

        if now.duration_since(self.last_frame) >= HEARTBEAT_INTERVAL {
            self.last_frame = now;
            return Some(FrameKind::Heartbeat);
        }

        None
    }
}

/// One SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Snapshot JSON
    Update(String),
    /// Formatted local time
    Heartbeat(String),
}

impl From<StreamFrame> for Event {
    fn from(frame: StreamFrame) -> Self {
        match frame {
            StreamFrame::Update(json) => Event::default().event("update").data(json),
            StreamFrame::Heartbeat(time) => Event::default().event("heartbeat").data(time),
        }
    }
}

/// Live subscriber registration; unregisters on drop
pub struct SubscriberGuard {
    id: Uuid,
    hub: Arc<RealtimeHub>,
}

impl SubscriberGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        let remaining = self.hub.connection_count.fetch_sub(1, Ordering::Relaxed) - 1;
        tracing::info!(connection_id = %self.id, remaining = remaining, "SSE client disconnected");
    }
}

/// RealtimeHub instance
pub struct RealtimeHub {
    connection_count: AtomicU64,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            connection_count: AtomicU64::new(0),
        }
    }

    /// Register a new subscriber
    pub fn register(self: &Arc<Self>) -> SubscriberGuard {
        let id = Uuid::new_v4();
        let count = self.connection_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(connection_id = %id, connections = count, "SSE client connected");

        SubscriberGuard {
            id,
            hub: Arc::clone(self),
        }
    }

    /// Get connection count
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame stream for one subscriber.
///
/// The first poll always yields an `update` with the current snapshot.
pub fn frames(state: AppState) -> impl Stream<Item = StreamFrame> {
    stream! {
        let guard = state.realtime.register();
        let mut watcher = UpdateWatcher::new(Instant::now());
        let mut ticker = interval(POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => {
                    tracing::debug!(connection_id = %guard.id(), "SSE loop stopped by shutdown");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match watcher.observe(state.store.revision(), Instant::now()) {
                Some(FrameKind::Update) => {
                    let snapshot =
                        status_query::build(&state.store, &state.status_catalog, &state.config).await;
                    match serde_json::to_string(&snapshot) {
                        Ok(json) => yield StreamFrame::Update(json),
                        Err(e) => tracing::error!(error = %e, "Failed to serialize snapshot"),
                    }
                }
                Some(FrameKind::Heartbeat) => {
                    yield StreamFrame::Heartbeat(clock::format_now(state.config.timezone));
                }
                None => {}
            }
        }
    }
}
