//! DG-LAB Controller Module
//!
//! Button-triggered device actuation with push notification

pub mod client;
pub mod service;
pub mod types;

pub use client::DglabClient;
pub use service::DglabService;
pub use types::*;
