//! In-memory Core Engine
//!
//! [`SimulatedCore`] keeps assets, markets and accounts in process and drives
//! market lifecycle transitions from the wall clock. The binary serves it for
//! local operation; tests use it together with its fault switches to reach
//! engine error paths.

use crate::core::{AssetBackend, AssetHandle, CoreEngine, ExportError, MatchSink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use types::account::{AccountInfo, Bond, Forgiveness};
use types::asset::{bip_id_symbol, Asset, AssetId};
use types::errors::CoreError;
use types::fee::{scale_fee_rate, DEFAULT_FEE_RATE_SCALE};
use types::ids::{AccountId, CoinId, MatchId, OrderId, HASH_SIZE};
use types::market::{
    epoch_index, epoch_start, market_name, resume_epoch_for, suspend_epoch_for, MarketStatus, ResumeSchedule,
    Schedule, SuspendEpoch,
};
use types::message::{ConfigSnapshot, MarketConfig, Notification};
use types::order::{Order, OrderKind, Side, TimeInForce};
use types::swap::{EpochRef, MatchData, MatchFail, MatchOutcome, MatchStatus};

const API_VERSION: u16 = 1;
const CANCEL_MAX: f64 = 0.8;
const BROADCAST_TIMEOUT_MS: u64 = 60_000;
const LOT_SIZE: u64 = 100_000_000;
const RATE_STEP: u64 = 100;
const PARCEL_SIZE: u32 = 1;

/// Chain backend whose answers are set by the operator of the simulation.
pub struct SimBackend {
    fee_rate: AtomicU64,
    synced: AtomicBool,
    fee_rate_fails: AtomicBool,
    sync_fails: AtomicBool,
}

impl SimBackend {
    fn new(fee_rate: u64) -> Self {
        Self {
            fee_rate: AtomicU64::new(fee_rate),
            synced: AtomicBool::new(true),
            fee_rate_fails: AtomicBool::new(false),
            sync_fails: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AssetBackend for SimBackend {
    async fn fee_rate(&self) -> Result<u64, CoreError> {
        if self.fee_rate_fails.load(Ordering::Relaxed) {
            return Err(CoreError::Backend("fee rate estimate unavailable".to_string()));
        }
        Ok(self.fee_rate.load(Ordering::Relaxed))
    }

    async fn synced(&self) -> Result<bool, CoreError> {
        if self.sync_fails.load(Ordering::Relaxed) {
            return Err(CoreError::Backend("node unreachable".to_string()));
        }
        Ok(self.synced.load(Ordering::Relaxed))
    }
}

struct SimAsset {
    asset: Asset,
    backend: Arc<SimBackend>,
    fee_scale: f64,
}

struct SimMarket {
    config: MarketConfig,
    running: bool,
    start_epoch: i64,
    suspend_epoch: i64,
    persist_book: bool,
    resume_epoch: Option<i64>,
    book: Vec<Order>,
    epoch_queue: Vec<Order>,
    matches: Vec<MatchData>,
    fail_matches_after: Option<usize>,
    crash_exports: bool,
    broken: bool,
}

impl SimMarket {
    fn current_epoch(&self, now_ms: i64) -> i64 {
        epoch_index(now_ms, self.config.epochlen)
    }

    /// Apply any scheduled transition whose epoch boundary has passed.
    fn refresh(&mut self, now_ms: i64) {
        let current = self.current_epoch(now_ms);
        if self.running && self.suspend_epoch != 0 && current > self.suspend_epoch {
            self.running = false;
            self.epoch_queue.clear();
            if !self.persist_book {
                self.book.clear();
            }
            info!(market = %self.config.name, epoch = self.suspend_epoch, "market suspended");
        }
        if !self.running {
            if let Some(epoch) = self.resume_epoch.filter(|e| current >= *e) {
                self.running = true;
                self.start_epoch = epoch;
                self.suspend_epoch = 0;
                self.resume_epoch = None;
                info!(market = %self.config.name, epoch, "market resumed");
            }
        }
    }

    fn status(&self, now_ms: i64) -> MarketStatus {
        MarketStatus {
            base: self.config.base,
            quote: self.config.quote,
            running: self.running,
            epoch_duration: self.config.epochlen,
            active_epoch: if self.running {
                self.current_epoch(now_ms)
            } else {
                self.suspend_epoch
            },
            start_epoch: self.start_epoch,
            suspend_epoch: self.suspend_epoch,
            persist_book: self.persist_book,
        }
    }
}

#[derive(Default)]
struct SimAccount {
    pubkey: Vec<u8>,
    created: Option<DateTime<Utc>>,
    bonds: Vec<Bond>,
    outcomes: Vec<MatchOutcome>,
    fails: Vec<MatchFail>,
}

impl SimAccount {
    /// Bonded strength less one tier per unforgiven failure.
    fn tier(&self) -> i64 {
        let strength: i64 = self.bonds.iter().map(|b| b.strength as i64).sum();
        strength - self.fails.len() as i64
    }

    fn info(&self, id: AccountId) -> AccountInfo {
        AccountInfo {
            account_id: id,
            pubkey: hex::encode(&self.pubkey),
            created: self.created.unwrap_or_default(),
            tier: self.tier(),
            bonds: self.bonds.clone(),
            broken_rules: self.fails.len() as u32,
        }
    }
}

/// Most recent first, capped at `n` when `n > 0`.
fn latest<T: Clone>(items: &[T], n: i64) -> Vec<T> {
    let take = if n > 0 { n as usize } else { items.len() };
    items.iter().rev().take(take).cloned().collect()
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn seeded_hash(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// In-memory venue engine.
#[derive(Default)]
pub struct SimulatedCore {
    assets: DashMap<AssetId, SimAsset>,
    markets: DashMap<String, SimMarket>,
    accounts: DashMap<AccountId, SimAccount>,
    notices: DashMap<AccountId, Vec<Notification>>,
    broadcasts: Mutex<Vec<Notification>>,
    data_api: AtomicBool,
    accounts_fail: AtomicBool,
    bond_nonce: AtomicU64,
    calls: AtomicUsize,
    interrupted_exports: AtomicUsize,
}

impl SimulatedCore {
    pub fn new() -> Self {
        Self {
            data_api: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// A small venue for local operation: three markets, one of them
    /// stopped, and a penalized account.
    pub fn demo() -> Self {
        let core = Self::new();
        core.add_asset_defaults(0, "btc", 100);
        core.add_asset_defaults(2, "ltc", 200);
        core.add_asset_defaults(42, "dcr", 100);
        core.add_asset_defaults(60, "eth", 200);
        core.add_market(42, 0, 60_000, true);
        core.add_market(60, 0, 20_000, true);
        core.add_market(2, 0, 60_000, false);

        for i in 0..4u64 {
            let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
            core.add_book_order(42, 0, Self::limit_order(i, 42, 0, side, 1_000_000_000, 110_000 + i * 100));
        }
        core.add_epoch_order(42, 0, Self::limit_order(100, 42, 0, Side::Sell, 500_000_000, 111_000));
        for i in 0..6u64 {
            core.add_match(42, 0, Self::sample_match(i, i >= 4));
        }

        let acct = core.add_account(b"demo account key", 2);
        core.add_match_fail(acct, MatchId::new(seeded_hash(&[b"match", &1u64.to_be_bytes()])), MatchStatus::TakerSwapCast);
        core.add_match_outcome(
            acct,
            MatchOutcome {
                status: MatchStatus::MatchComplete.to_string(),
                mid: MatchId::new(seeded_hash(&[b"match", &0u64.to_be_bytes()])),
                fail: false,
                stamp: now_ms(),
                value: 1_000_000_000,
                base: 42,
                quote: 0,
            },
        );
        core
    }

    pub fn add_asset(&self, asset: Asset, fee_rate: u64) -> Arc<SimBackend> {
        let backend = Arc::new(SimBackend::new(fee_rate));
        self.assets.insert(
            asset.id,
            SimAsset {
                asset,
                backend: backend.clone(),
                fee_scale: DEFAULT_FEE_RATE_SCALE,
            },
        );
        backend
    }

    /// Register an asset with typical parameters and a current fee rate of
    /// half its ceiling.
    pub fn add_asset_defaults(&self, id: AssetId, symbol: &str, max_fee_rate: u64) -> Arc<SimBackend> {
        let asset = Asset {
            id,
            symbol: symbol.to_lowercase(),
            version: 0,
            max_fee_rate,
            swap_size: 225,
            swap_conf: 1,
            unit: "atoms".to_string(),
            conversion_factor: 100_000_000,
        };
        self.add_asset(asset, max_fee_rate / 2)
    }

    fn symbol(&self, id: AssetId) -> String {
        match self.assets.get(&id) {
            Some(a) => a.asset.symbol.clone(),
            None => bip_id_symbol(id).map_or_else(|| id.to_string(), str::to_string),
        }
    }

    fn name_of(&self, base: AssetId, quote: AssetId) -> String {
        market_name(&self.symbol(base), &self.symbol(quote))
    }

    /// Add a market. A stopped market looks as if it was suspended, with its
    /// book kept, at the end of the previous epoch.
    pub fn add_market(&self, base: AssetId, quote: AssetId, epoch_duration: u64, running: bool) -> String {
        let name = self.name_of(base, quote);
        let current = epoch_index(now_ms(), epoch_duration);
        let market = SimMarket {
            config: MarketConfig {
                name: name.clone(),
                base,
                quote,
                epochlen: epoch_duration,
                lotsize: LOT_SIZE,
                ratestep: RATE_STEP,
                parcelsize: PARCEL_SIZE,
            },
            running,
            start_epoch: current - 1_000,
            suspend_epoch: if running { 0 } else { current - 1 },
            persist_book: true,
            resume_epoch: None,
            book: Vec::new(),
            epoch_queue: Vec::new(),
            matches: Vec::new(),
            fail_matches_after: None,
            crash_exports: false,
            broken: false,
        };
        self.markets.insert(name.clone(), market);
        name
    }

    fn with_market<R>(&self, base: AssetId, quote: AssetId, f: impl FnOnce(&mut SimMarket) -> R) -> Option<R> {
        let name = self.name_of(base, quote);
        self.markets.get_mut(&name).map(|mut m| f(&mut m))
    }

    pub fn add_book_order(&self, base: AssetId, quote: AssetId, order: Order) {
        self.with_market(base, quote, |m| m.book.push(order));
    }

    pub fn add_epoch_order(&self, base: AssetId, quote: AssetId, order: Order) {
        self.with_market(base, quote, |m| m.epoch_queue.push(order));
    }

    pub fn add_match(&self, base: AssetId, quote: AssetId, data: MatchData) {
        self.with_market(base, quote, |m| m.matches.push(data));
    }

    /// Register an account with one bond per unit of `strength`.
    pub fn add_account(&self, pubkey: &[u8], strength: u32) -> AccountId {
        let id = AccountId::from_pubkey(pubkey);
        let bonds = (0..strength)
            .map(|i| Bond {
                coin_id: CoinId::new(seeded_hash(&[id.as_bytes(), &i.to_be_bytes()]).to_vec()),
                asset_id: 42,
                amount: 1_000_000_000,
                strength: 1,
                lock_time: Utc::now().timestamp() + 30 * 86_400,
            })
            .collect();
        self.accounts.insert(
            id,
            SimAccount {
                pubkey: pubkey.to_vec(),
                created: Some(Utc::now()),
                bonds,
                ..Default::default()
            },
        );
        id
    }

    pub fn add_match_fail(&self, id: AccountId, mid: MatchId, status: MatchStatus) {
        if let Some(mut acct) = self.accounts.get_mut(&id) {
            acct.fails.push(MatchFail { id: mid, status });
        }
    }

    pub fn add_match_outcome(&self, id: AccountId, outcome: MatchOutcome) {
        if let Some(mut acct) = self.accounts.get_mut(&id) {
            acct.outcomes.push(outcome);
        }
    }

    /// Make the asset's fee rate estimate fail.
    pub fn fail_fee_rate(&self, id: AssetId) {
        if let Some(a) = self.assets.get(&id) {
            a.backend.fee_rate_fails.store(true, Ordering::Relaxed);
        }
    }

    /// Make the asset's sync status query fail.
    pub fn fail_sync(&self, id: AssetId) {
        if let Some(a) = self.assets.get(&id) {
            a.backend.sync_fails.store(true, Ordering::Relaxed);
        }
    }

    /// Make every account lookup fail with a storage error.
    pub fn fail_account_queries(&self) {
        self.accounts_fail.store(true, Ordering::SeqCst);
    }

    /// Abort match exports of the market once `n` records were emitted.
    pub fn fail_matches_after(&self, base: AssetId, quote: AssetId, n: usize) {
        self.with_market(base, quote, |m| m.fail_matches_after = Some(n));
    }

    /// Make match exports of the market panic before emitting anything.
    pub fn crash_match_exports(&self, base: AssetId, quote: AssetId) {
        self.with_market(base, quote, |m| m.crash_exports = true);
    }

    /// Exports that stopped because the sink refused a record.
    pub fn interrupted_exports(&self) -> usize {
        self.interrupted_exports.load(Ordering::SeqCst)
    }

    /// Make lifecycle commands on the market report success with no usable
    /// result: suspend yields no final epoch and resume yields epoch 0.
    pub fn break_lifecycle(&self, name: &str) {
        if let Some(mut m) = self.markets.get_mut(name) {
            m.broken = true;
        }
    }

    /// Market status without counting as an engine call.
    pub fn market_status_now(&self, name: &str) -> Option<MarketStatus> {
        let now = now_ms();
        self.markets.get_mut(name).map(|mut m| {
            m.refresh(now);
            m.status(now)
        })
    }

    /// Number of engine trait calls served so far.
    pub fn engine_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn notices(&self, id: &AccountId) -> Vec<Notification> {
        self.notices.get(id).map(|n| n.value().clone()).unwrap_or_default()
    }

    pub fn broadcasts(&self) -> Vec<Notification> {
        self.broadcasts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn data_api_enabled(&self) -> bool {
        self.data_api.load(Ordering::SeqCst)
    }

    pub fn fee_rate_scale(&self, id: AssetId) -> Option<f64> {
        self.assets.get(&id).map(|a| a.fee_scale)
    }

    /// Deterministic standing limit order.
    pub fn limit_order(seed: u64, base: AssetId, quote: AssetId, side: Side, quantity: u64, rate: u64) -> Order {
        let seed = seed.to_be_bytes();
        Order {
            id: OrderId::new(seeded_hash(&[b"order", &seed])),
            account: AccountId::new(seeded_hash(&[b"account", &seed])),
            base,
            quote,
            side,
            quantity,
            filled: 0,
            kind: OrderKind::Limit {
                rate,
                force: TimeInForce::Standing,
            },
            server_time: Utc::now(),
        }
    }

    /// Deterministic match record.
    pub fn sample_match(seed: u64, active: bool) -> MatchData {
        let s = seed.to_be_bytes();
        MatchData {
            id: MatchId::new(seeded_hash(&[b"match", &s])),
            taker_sell: seed % 2 == 0,
            maker: OrderId::new(seeded_hash(&[b"maker", &s])),
            maker_acct: AccountId::new(seeded_hash(&[b"maker acct", &s])),
            maker_swap: hex::encode(seeded_hash(&[b"maker swap", &s])),
            maker_redeem: if active {
                String::new()
            } else {
                hex::encode(seeded_hash(&[b"maker redeem", &s]))
            },
            maker_addr: format!("Dsmaker{seed}"),
            taker: OrderId::new(seeded_hash(&[b"taker", &s])),
            taker_acct: AccountId::new(seeded_hash(&[b"taker acct", &s])),
            taker_swap: hex::encode(seeded_hash(&[b"taker swap", &s])),
            taker_redeem: if active {
                String::new()
            } else {
                hex::encode(seeded_hash(&[b"taker redeem", &s]))
            },
            taker_addr: format!("bc1taker{seed}"),
            epoch: EpochRef {
                idx: 28_000_000 + seed,
                dur: 60_000,
            },
            quantity: 100_000_000,
            rate: 110_000,
            base_rate: 10,
            quote_rate: 20,
            active,
            status: if active {
                MatchStatus::MakerSwapCast
            } else {
                MatchStatus::MatchComplete
            },
        }
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn account_store(&self) -> Result<(), CoreError> {
        if self.accounts_fail.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("account table unavailable".to_string()));
        }
        Ok(())
    }

    fn unknown_pair(&self, base: AssetId, quote: AssetId) -> CoreError {
        CoreError::UnknownMarket {
            market: self.name_of(base, quote),
        }
    }
}

#[async_trait]
impl CoreEngine for SimulatedCore {
    async fn config_snapshot(&self) -> ConfigSnapshot {
        self.touch();
        let assets: BTreeMap<AssetId, Asset> = self.assets.iter().map(|a| (*a.key(), a.asset.clone())).collect();
        let markets: BTreeMap<String, MarketConfig> =
            self.markets.iter().map(|m| (m.key().clone(), m.config.clone())).collect();
        ConfigSnapshot {
            apiver: API_VERSION,
            cancelmax: CANCEL_MAX,
            btimeout: BROADCAST_TIMEOUT_MS,
            binsizes: vec!["24h".to_string(), "1h".to_string(), "5m".to_string()],
            assets: assets.into_values().collect(),
            markets: markets.into_values().collect(),
        }
    }

    async fn asset(&self, id: AssetId) -> Result<AssetHandle, CoreError> {
        self.touch();
        let a = self.assets.get(&id).ok_or(CoreError::UnsupportedAsset { asset_id: id })?;
        Ok(AssetHandle {
            asset: a.asset.clone(),
            backend: a.backend.clone(),
        })
    }

    async fn scale_fee_rate(&self, id: AssetId, fee_rate: u64) -> u64 {
        self.touch();
        let scale = self.assets.get(&id).map_or(DEFAULT_FEE_RATE_SCALE, |a| a.fee_scale);
        scale_fee_rate(fee_rate, scale)
    }

    async fn set_fee_rate_scale(&self, id: AssetId, scale: f64) {
        self.touch();
        match self.assets.get_mut(&id) {
            Some(mut a) => {
                a.fee_scale = scale;
                info!(asset = %a.asset.symbol, scale, "fee rate scale set");
            }
            None => debug!(asset_id = id, "fee rate scale for unsupported asset ignored"),
        }
    }

    async fn market_statuses(&self) -> BTreeMap<String, MarketStatus> {
        self.touch();
        let now = now_ms();
        self.markets
            .iter_mut()
            .map(|mut m| {
                m.refresh(now);
                (m.key().clone(), m.status(now))
            })
            .collect()
    }

    async fn market_status(&self, name: &str) -> Option<MarketStatus> {
        self.touch();
        self.market_status_now(name)
    }

    async fn market_running(&self, name: &str) -> Option<bool> {
        self.touch();
        self.market_status_now(name).map(|s| s.running)
    }

    async fn resume_market(&self, name: &str, when: Schedule) -> Result<ResumeSchedule, CoreError> {
        self.touch();
        let now = Utc::now();
        let mut m = self.markets.get_mut(name).ok_or_else(|| CoreError::UnknownMarket {
            market: name.to_string(),
        })?;
        m.refresh(now.timestamp_millis());
        if m.running {
            return Err(CoreError::MarketState {
                market: name.to_string(),
                reason: "already running".to_string(),
            });
        }
        if m.broken {
            return Ok(ResumeSchedule {
                epoch: 0,
                start: epoch_start(0, m.config.epochlen),
            });
        }
        let resume = resume_epoch_for(when.resolve(now), m.config.epochlen);
        m.resume_epoch = Some(resume.epoch);
        Ok(resume)
    }

    async fn suspend_market(
        &self,
        name: &str,
        when: Schedule,
        persist_book: bool,
    ) -> Result<Option<SuspendEpoch>, CoreError> {
        self.touch();
        let now = Utc::now();
        let mut m = self.markets.get_mut(name).ok_or_else(|| CoreError::UnknownMarket {
            market: name.to_string(),
        })?;
        m.refresh(now.timestamp_millis());
        if !m.running {
            return Err(CoreError::MarketState {
                market: name.to_string(),
                reason: "not running".to_string(),
            });
        }
        if m.broken {
            return Ok(None);
        }
        let active = m.current_epoch(now.timestamp_millis());
        let final_epoch = suspend_epoch_for(when.resolve(now), active, m.config.epochlen);
        m.suspend_epoch = final_epoch.idx;
        m.persist_book = persist_book;
        Ok(Some(final_epoch))
    }

    async fn book_orders(&self, base: AssetId, quote: AssetId) -> Result<Vec<Order>, CoreError> {
        self.touch();
        let now = now_ms();
        self.with_market(base, quote, |m| {
            m.refresh(now);
            m.book.clone()
        })
        .ok_or_else(|| self.unknown_pair(base, quote))
    }

    async fn epoch_orders(&self, base: AssetId, quote: AssetId) -> Result<Vec<Order>, CoreError> {
        self.touch();
        let now = now_ms();
        self.with_market(base, quote, |m| {
            m.refresh(now);
            m.epoch_queue.clone()
        })
        .ok_or_else(|| self.unknown_pair(base, quote))
    }

    async fn market_matches_streaming(
        &self,
        base: AssetId,
        quote: AssetId,
        include_inactive: bool,
        n: i64,
        sink: &mut dyn MatchSink,
    ) -> Result<usize, ExportError> {
        self.touch();
        let (records, fail_after, crash) = self
            .with_market(base, quote, |m| {
                let cap = if n > 0 { n as usize } else { usize::MAX };
                let active = m.matches.iter().filter(|d| d.active).cloned();
                let inactive = m
                    .matches
                    .iter()
                    .filter(|d| include_inactive && !d.active)
                    .take(cap)
                    .cloned();
                (
                    active.chain(inactive).collect::<Vec<_>>(),
                    m.fail_matches_after,
                    m.crash_exports,
                )
            })
            .ok_or_else(|| self.unknown_pair(base, quote))?;
        if crash {
            panic!("match store crashed");
        }

        let induced = || CoreError::Storage("match query interrupted".to_string());
        let mut emitted = 0;
        for record in records {
            if fail_after.is_some_and(|limit| emitted >= limit) {
                return Err(induced().into());
            }
            if let Err(err) = sink.emit(record).await {
                self.interrupted_exports.fetch_add(1, Ordering::SeqCst);
                return Err(err.into());
            }
            emitted += 1;
        }
        if fail_after.is_some_and(|limit| emitted >= limit) {
            return Err(induced().into());
        }
        Ok(emitted)
    }

    async fn enable_data_api(&self, yes: bool) {
        self.touch();
        self.data_api.store(yes, Ordering::SeqCst);
    }

    async fn account_info(&self, id: AccountId) -> Result<AccountInfo, CoreError> {
        self.touch();
        self.account_store()?;
        self.accounts
            .get(&id)
            .map(|a| a.info(id))
            .ok_or_else(|| CoreError::AccountNotFound {
                account_id: id.to_string(),
            })
    }

    async fn create_prepaid_bonds(
        &self,
        n: usize,
        strength: u32,
        lock_secs: i64,
    ) -> Result<Vec<CoinId>, CoreError> {
        self.touch();
        let nonce = self.bond_nonce.fetch_add(1, Ordering::SeqCst);
        let coins = (0..n as u64)
            .map(|i| {
                CoinId::new(
                    seeded_hash(&[
                        &nonce.to_be_bytes(),
                        &strength.to_be_bytes(),
                        &lock_secs.to_be_bytes(),
                        &i.to_be_bytes(),
                    ])
                    .to_vec(),
                )
            })
            .collect::<Vec<_>>();
        debug!(count = coins.len(), strength, lock_secs, "prepaid bonds generated");
        Ok(coins)
    }

    async fn forgive_match_fail(&self, id: AccountId, mid: MatchId) -> Result<Forgiveness, CoreError> {
        self.touch();
        self.account_store()?;
        let mut acct = self.accounts.get_mut(&id).ok_or_else(|| CoreError::AccountNotFound {
            account_id: id.to_string(),
        })?;
        let tier_before = acct.tier();
        let Some(pos) = acct.fails.iter().position(|f| f.id == mid) else {
            return Ok(Forgiveness {
                forgiven: false,
                unbanned: false,
            });
        };
        acct.fails.remove(pos);
        Ok(Forgiveness {
            forgiven: true,
            unbanned: tier_before < 1 && acct.tier() >= 1,
        })
    }

    async fn account_match_outcomes(&self, id: AccountId, n: i64) -> Result<Vec<MatchOutcome>, CoreError> {
        self.touch();
        self.account_store()?;
        self.accounts
            .get(&id)
            .map(|a| latest(&a.outcomes, n))
            .ok_or_else(|| CoreError::AccountNotFound {
                account_id: id.to_string(),
            })
    }

    async fn user_match_fails(&self, id: AccountId, n: i64) -> Result<Vec<MatchFail>, CoreError> {
        self.touch();
        self.account_store()?;
        self.accounts
            .get(&id)
            .map(|a| latest(&a.fails, n))
            .ok_or_else(|| CoreError::AccountNotFound {
                account_id: id.to_string(),
            })
    }

    async fn notify(&self, id: AccountId, msg: Notification) {
        self.touch();
        self.notices.entry(id).or_default().push(msg);
    }

    async fn notify_all(&self, msg: Notification) {
        self.touch();
        self.broadcasts.lock().unwrap_or_else(PoisonError::into_inner).push(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUR: u64 = 60_000;

    struct VecSink(Vec<MatchData>);

    #[async_trait]
    impl MatchSink for VecSink {
        async fn emit(&mut self, record: MatchData) -> Result<(), crate::core::SinkError> {
            self.0.push(record);
            Ok(())
        }
    }

    fn core() -> SimulatedCore {
        let core = SimulatedCore::new();
        core.add_asset_defaults(42, "dcr", 100);
        core.add_asset_defaults(0, "btc", 100);
        core.add_market(42, 0, DUR, true);
        core
    }

    #[test]
    fn test_stops_after_final_epoch_and_purges_book() {
        let core = core();
        let now = now_ms();
        core.add_book_order(42, 0, SimulatedCore::limit_order(1, 42, 0, Side::Buy, 10, 100));
        {
            let mut m = core.markets.get_mut("dcr_btc").unwrap();
            m.suspend_epoch = m.current_epoch(now) - 1;
            m.persist_book = false;
        }
        let status = core.market_status_now("dcr_btc").unwrap();
        assert!(!status.running);
        assert_eq!(status.active_epoch, status.suspend_epoch);
        assert!(core.markets.get("dcr_btc").unwrap().book.is_empty());
    }

    #[test]
    fn test_resumes_at_scheduled_epoch() {
        let core = core();
        core.add_market(2, 0, DUR, false);
        let current = epoch_index(now_ms(), DUR);
        core.markets.get_mut("ltc_btc").unwrap().resume_epoch = Some(current);
        let status = core.market_status_now("ltc_btc").unwrap();
        assert!(status.running);
        assert_eq!(status.start_epoch, current);
        assert_eq!(status.suspend_epoch, 0);
    }

    #[tokio::test]
    async fn test_matches_cap_applies_to_inactive_only() {
        let core = core();
        for i in 0..3 {
            core.add_match(42, 0, SimulatedCore::sample_match(i, true));
        }
        for i in 3..8 {
            core.add_match(42, 0, SimulatedCore::sample_match(i, false));
        }
        let mut sink = VecSink(Vec::new());
        let n = core.market_matches_streaming(42, 0, true, 2, &mut sink).await.unwrap();
        assert_eq!(n, 5);
        assert_eq!(sink.0.iter().filter(|m| !m.active).count(), 2);
    }

    #[tokio::test]
    async fn test_forgiveness_unbans() {
        let core = core();
        let acct = core.add_account(b"key", 1);
        let mid = MatchId::new([9; HASH_SIZE]);
        core.add_match_fail(acct, mid, MatchStatus::NewlyMatched);
        assert_eq!(core.account_info(acct).await.unwrap().tier, 0);

        let res = core.forgive_match_fail(acct, mid).await.unwrap();
        assert_eq!(
            res,
            Forgiveness {
                forgiven: true,
                unbanned: true
            }
        );
        let again = core.forgive_match_fail(acct, mid).await.unwrap();
        assert!(!again.forgiven);
    }

    #[tokio::test]
    async fn test_prepaid_bonds_are_unique() {
        let core = core();
        let a = core.create_prepaid_bonds(3, 1, 86_400).await.unwrap();
        let b = core.create_prepaid_bonds(3, 1, 86_400).await.unwrap();
        assert_eq!(a.len(), 3);
        assert!(a.iter().all(|c| !b.contains(c)));
    }

    #[tokio::test]
    async fn test_history_most_recent_first() {
        let core = core();
        let acct = core.add_account(b"key", 1);
        for i in 0..5u8 {
            core.add_match_fail(acct, MatchId::new([i; HASH_SIZE]), MatchStatus::MakerSwapCast);
        }
        let fails = core.user_match_fails(acct, 2).await.unwrap();
        assert_eq!(fails.len(), 2);
        assert_eq!(fails[0].id, MatchId::new([4; HASH_SIZE]));
        assert_eq!(core.user_match_fails(acct, 0).await.unwrap().len(), 5);
    }
}
