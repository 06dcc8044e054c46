//! Configuration snapshot and notification envelope
//!
//! These are the messages the engine hands out verbatim: the venue
//! configuration served to clients, and the envelope used to push
//! operator notices to connected traders.

use crate::asset::{Asset, AssetId};
use serde::{Deserialize, Serialize};

/// Route carried by operator notices.
pub const NOTIFY_ROUTE: &str = "notify";

/// Per-market configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub name: String,
    pub base: AssetId,
    pub quote: AssetId,
    /// Epoch length in milliseconds.
    pub epochlen: u64,
    pub lotsize: u64,
    pub ratestep: u64,
    pub parcelsize: u32,
}

/// Venue configuration as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub apiver: u16,
    pub cancelmax: f64,
    /// Broadcast timeout in milliseconds.
    pub btimeout: u64,
    pub binsizes: Vec<String>,
    pub assets: Vec<Asset>,
    pub markets: Vec<MarketConfig>,
}

/// Message kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Notification,
}

/// Notification pushed to one or all connected accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub route: String,
    pub payload: serde_json::Value,
}

impl Notification {
    /// Build a notification carrying any serializable payload.
    pub fn new(route: &str, payload: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: MessageType::Notification,
            route: route.to_string(),
            payload: serde_json::to_value(payload)?,
        })
    }
}
