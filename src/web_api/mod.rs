//! WebAPI - HTTP endpoints
//!
//! ## Responsibilities
//!
//! - Route table and middleware ordering
//! - Request parameter validation
//! - Response envelopes
//!
//! Every route passes through request telemetry first; mutating routes then
//! pass the shared-secret guard before reaching their handler.

mod device_routes;
mod routes;

pub use routes::create_router;
