//! Operator control plane for the exchange venue
//!
//! Exposes market lifecycle control, asset and account inspection, match
//! exports and operator notices over HTTP. All venue state lives in the Core
//! Engine behind [`crate::core::CoreEngine`].

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod params;
pub mod router;
pub mod sim;
pub mod state;

pub use router::create_router;
pub use state::{AppState, Limits};
