//! HTTP handlers, grouped by resource.
//!
//! Every handler validates all of its path and query input before the first
//! engine call.

pub mod account;
pub mod asset;
pub mod market;
pub mod notify;
pub mod system;
