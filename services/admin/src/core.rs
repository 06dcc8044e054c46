//! Core Engine collaborator contract
//!
//! The control plane never touches order books, epochs or the account ledger
//! directly. Everything goes through [`CoreEngine`], which the venue engine
//! implements and which tests replace with [`crate::sim::SimulatedCore`].

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use types::account::{AccountInfo, Forgiveness};
use types::asset::{Asset, AssetId};
use types::errors::CoreError;
use types::ids::{AccountId, CoinId, MatchId};
use types::market::{MarketStatus, ResumeSchedule, Schedule, SuspendEpoch};
use types::message::{ConfigSnapshot, Notification};
use types::order::Order;
use types::swap::{MatchData, MatchFail, MatchOutcome};

/// Failure to hand a record to the response stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("response stream closed")]
    Closed,

    #[error("failed to encode record: {0}")]
    Encode(String),
}

/// Failure of a streaming export, either on the engine side or in the sink.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Receiver for records pushed by a streaming export.
///
/// An error returned from `emit` must abort the export.
#[async_trait]
pub trait MatchSink: Send {
    async fn emit(&mut self, record: MatchData) -> Result<(), SinkError>;
}

/// Live queries against an asset's chain backend.
#[async_trait]
pub trait AssetBackend: Send + Sync {
    /// Current network fee rate in the asset's atomic units per byte/gas.
    async fn fee_rate(&self) -> Result<u64, CoreError>;

    /// Whether the backend is synced with its network.
    async fn synced(&self) -> Result<bool, CoreError>;
}

/// A supported asset and a handle to its backend.
#[derive(Clone)]
pub struct AssetHandle {
    pub asset: Asset,
    pub backend: Arc<dyn AssetBackend>,
}

/// Everything the control plane needs from the venue engine.
///
/// Implementations must be safe to call concurrently from many requests;
/// the control plane adds no locking of its own.
#[async_trait]
pub trait CoreEngine: Send + Sync {
    async fn config_snapshot(&self) -> ConfigSnapshot;

    async fn asset(&self, id: AssetId) -> Result<AssetHandle, CoreError>;

    /// Apply the asset's fee-rate scale factor. The result is not capped.
    async fn scale_fee_rate(&self, id: AssetId, fee_rate: u64) -> u64;

    async fn set_fee_rate_scale(&self, id: AssetId, scale: f64);

    async fn market_statuses(&self) -> BTreeMap<String, MarketStatus>;

    async fn market_status(&self, name: &str) -> Option<MarketStatus>;

    /// `None` if the market is unknown, otherwise whether it is running.
    async fn market_running(&self, name: &str) -> Option<bool>;

    async fn resume_market(&self, name: &str, when: Schedule) -> Result<ResumeSchedule, CoreError>;

    /// Schedule a suspension. `Ok(None)` is an engine inconsistency.
    async fn suspend_market(
        &self,
        name: &str,
        when: Schedule,
        persist_book: bool,
    ) -> Result<Option<SuspendEpoch>, CoreError>;

    async fn book_orders(&self, base: AssetId, quote: AssetId) -> Result<Vec<Order>, CoreError>;

    async fn epoch_orders(&self, base: AssetId, quote: AssetId) -> Result<Vec<Order>, CoreError>;

    /// Walk the market's match history, pushing each record into `sink`.
    ///
    /// Active matches are always included. Inactive matches are included
    /// only when `include_inactive` is set, capped at `n` when `n > 0`.
    /// Returns the number of records emitted.
    async fn market_matches_streaming(
        &self,
        base: AssetId,
        quote: AssetId,
        include_inactive: bool,
        n: i64,
        sink: &mut dyn MatchSink,
    ) -> Result<usize, ExportError>;

    async fn enable_data_api(&self, yes: bool);

    async fn account_info(&self, id: AccountId) -> Result<AccountInfo, CoreError>;

    /// Pre-generate `n` bonds of the given strength, locked for `lock_secs`.
    async fn create_prepaid_bonds(
        &self,
        n: usize,
        strength: u32,
        lock_secs: i64,
    ) -> Result<Vec<CoinId>, CoreError>;

    async fn forgive_match_fail(&self, id: AccountId, mid: MatchId) -> Result<Forgiveness, CoreError>;

    async fn account_match_outcomes(&self, id: AccountId, n: i64) -> Result<Vec<MatchOutcome>, CoreError>;

    async fn user_match_fails(&self, id: AccountId, n: i64) -> Result<Vec<MatchFail>, CoreError>;

    async fn notify(&self, id: AccountId, msg: Notification);

    async fn notify_all(&self, msg: Notification);
}
