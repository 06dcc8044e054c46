//! Match and settlement types
//!
//! A match pairs a maker and a taker order from the same epoch and then walks
//! through the atomic swap steps until both sides have redeemed.

use crate::asset::AssetId;
use crate::ids::{AccountId, MatchId, OrderId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Swap progress of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    NewlyMatched,
    MakerSwapCast,
    TakerSwapCast,
    MakerRedeemed,
    MatchComplete,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::NewlyMatched => "NewlyMatched",
            MatchStatus::MakerSwapCast => "MakerSwapCast",
            MatchStatus::TakerSwapCast => "TakerSwapCast",
            MatchStatus::MakerRedeemed => "MakerRedeemed",
            MatchStatus::MatchComplete => "MatchComplete",
        };
        f.write_str(s)
    }
}

/// Epoch in which a match was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRef {
    pub idx: u64,
    /// Epoch length in milliseconds.
    pub dur: u64,
}

/// Full lifecycle snapshot of one match, as stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchData {
    pub id: MatchId,
    pub taker_sell: bool,

    // Maker side
    pub maker: OrderId,
    pub maker_acct: AccountId,
    pub maker_swap: String,
    pub maker_redeem: String,
    pub maker_addr: String,

    // Taker side
    pub taker: OrderId,
    pub taker_acct: AccountId,
    pub taker_swap: String,
    pub taker_redeem: String,
    pub taker_addr: String,

    pub epoch: EpochRef,
    pub quantity: u64,
    pub rate: u64,
    pub base_rate: u64,
    pub quote_rate: u64,
    pub active: bool,
    pub status: MatchStatus,
}

/// Final outcome of a match from one account's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub status: String,
    pub mid: MatchId,
    pub fail: bool,
    /// Unix milliseconds of the outcome.
    pub stamp: i64,
    pub value: u64,
    pub base: AssetId,
    pub quote: AssetId,
}

/// A match the account failed to complete, and the step at which it stalled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFail {
    pub id: MatchId,
    pub status: MatchStatus,
}
