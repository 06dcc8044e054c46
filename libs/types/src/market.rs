//! Market status and epoch scheduling
//!
//! A market trades in fixed-duration epochs. Epoch `i` covers the Unix
//! millisecond range `[i * dur, (i + 1) * dur)`. Suspensions take effect at
//! the end of an epoch and resumptions at the start of one.

use crate::asset::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engine-side snapshot of a market's lifecycle state.
///
/// `suspend_epoch == 0` means no suspension is scheduled and `persist_book`
/// carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub base: AssetId,
    pub quote: AssetId,
    pub running: bool,
    /// Epoch length in milliseconds.
    pub epoch_duration: u64,
    pub active_epoch: i64,
    pub start_epoch: i64,
    pub suspend_epoch: i64,
    pub persist_book: bool,
}

/// When a lifecycle transition should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// At the next possible epoch boundary.
    Asap,
    /// At the first epoch boundary at or after the given time.
    At(DateTime<Utc>),
}

impl Schedule {
    /// Resolve to a concrete time, mapping `Asap` to `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Schedule::Asap => now,
            Schedule::At(t) if *t < now => now,
            Schedule::At(t) => *t,
        }
    }
}

/// Final epoch of a scheduled suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendEpoch {
    pub idx: i64,
    pub end: DateTime<Utc>,
}

/// First epoch of a scheduled resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeSchedule {
    pub epoch: i64,
    pub start: DateTime<Utc>,
}

/// Canonical market name, e.g. `dcr_btc`.
pub fn market_name(base_symbol: &str, quote_symbol: &str) -> String {
    format!("{}_{}", base_symbol, quote_symbol).to_lowercase()
}

/// Index of the epoch containing `t_ms`.
pub fn epoch_index(t_ms: i64, epoch_duration: u64) -> i64 {
    t_ms.div_euclid(epoch_duration.max(1) as i64)
}

/// Wall-clock start of epoch `idx`.
pub fn epoch_start(idx: i64, epoch_duration: u64) -> DateTime<Utc> {
    millis_to_time(idx.saturating_mul(epoch_duration as i64))
}

/// Wall-clock end of epoch `idx`.
pub fn epoch_end(idx: i64, epoch_duration: u64) -> DateTime<Utc> {
    epoch_start(idx.saturating_add(1), epoch_duration)
}

/// Final epoch of a suspension requested for `as_soon_as`.
///
/// The epoch containing `as_soon_as` runs to completion; a time before the
/// active epoch suspends at the end of the active epoch.
pub fn suspend_epoch_for(as_soon_as: DateTime<Utc>, active_epoch: i64, epoch_duration: u64) -> SuspendEpoch {
    let idx = epoch_index(as_soon_as.timestamp_millis(), epoch_duration).max(active_epoch);
    SuspendEpoch {
        idx,
        end: epoch_end(idx, epoch_duration),
    }
}

/// First epoch of a resumption requested for `as_soon_as`.
pub fn resume_epoch_for(as_soon_as: DateTime<Utc>, epoch_duration: u64) -> ResumeSchedule {
    let epoch = epoch_index(as_soon_as.timestamp_millis(), epoch_duration) + 1;
    ResumeSchedule {
        epoch,
        start: epoch_start(epoch, epoch_duration),
    }
}

fn millis_to_time(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
