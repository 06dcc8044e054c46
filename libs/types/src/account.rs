//! Account summaries and bonds

use crate::asset::AssetId;
use crate::ids::{AccountId, CoinId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fidelity bond posted by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bond {
    pub coin_id: CoinId,
    pub asset_id: AssetId,
    pub amount: u64,
    pub strength: u32,
    /// Unix seconds after which the bond can be refunded.
    pub lock_time: i64,
}

/// Operator view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub account_id: AccountId,
    /// Hex-encoded public key.
    pub pubkey: String,
    pub created: DateTime<Utc>,
    /// Effective tier: bond strength less penalties.
    pub tier: i64,
    pub bonds: Vec<Bond>,
    pub broken_rules: u32,
}

/// Outcome of forgiving one failed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forgiveness {
    pub forgiven: bool,
    pub unbanned: bool,
}
