use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use types::asset::Asset;
use types::market::MarketStatus;
use types::order::BookOrderNote;
use types::swap::MatchData;

/// Timestamp rendered as RFC 3339 with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTime(pub DateTime<Utc>);

impl Serialize for ApiTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Operator view of a market's lifecycle state.
///
/// `persistbook` is present exactly when a suspension is scheduled or has
/// happened, i.e. when `suspendepoch` is nonzero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStatusView {
    #[serde(rename = "market", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub running: bool,
    pub epochlen: u64,
    pub activeepoch: i64,
    pub startepoch: i64,
    pub suspendepoch: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistbook: Option<bool>,
}

impl MarketStatusView {
    pub fn new(name: Option<String>, status: &MarketStatus) -> Self {
        Self {
            name,
            running: status.running,
            epochlen: status.epoch_duration,
            activeepoch: status.active_epoch,
            startepoch: status.start_epoch,
            suspendepoch: status.suspend_epoch,
            persistbook: (status.suspend_epoch != 0).then_some(status.persist_book),
        }
    }
}

/// Asset descriptor plus live fee-rate and sync information.
///
/// Each live field comes from an independent query; a failed query leaves
/// its field at zero and adds a message to `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    #[serde(flatten)]
    pub asset: Asset,
    pub current_fee_rate: u64,
    pub scaled_fee_rate: u64,
    pub synced: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Order book or epoch queue of one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBookView {
    pub marketid: String,
    pub epoch: u64,
    pub orders: Vec<BookOrderNote>,
}

/// One exported match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub taker_sell: bool,
    pub id: String,
    pub maker: String,
    pub maker_acct: String,
    pub maker_swap: String,
    pub maker_redeem: String,
    pub maker_addr: String,
    pub taker: String,
    pub taker_acct: String,
    pub taker_swap: String,
    pub taker_redeem: String,
    pub taker_addr: String,
    pub epoch_idx: u64,
    pub epoch_dur: u64,
    pub quantity: u64,
    pub rate: u64,
    pub base_rate: u64,
    pub quote_rate: u64,
    pub active: bool,
    pub status: String,
}

impl From<MatchData> for MatchRecord {
    fn from(m: MatchData) -> Self {
        Self {
            taker_sell: m.taker_sell,
            id: m.id.to_string(),
            maker: m.maker.to_string(),
            maker_acct: m.maker_acct.to_string(),
            maker_swap: m.maker_swap,
            maker_redeem: m.maker_redeem,
            maker_addr: m.maker_addr,
            taker: m.taker.to_string(),
            taker_acct: m.taker_acct.to_string(),
            taker_swap: m.taker_swap,
            taker_redeem: m.taker_redeem,
            taker_addr: m.taker_addr,
            epoch_idx: m.epoch.idx,
            epoch_dur: m.epoch.dur,
            quantity: m.quantity,
            rate: m.rate,
            base_rate: m.base_rate,
            quote_rate: m.quote_rate,
            active: m.active,
            status: m.status.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeResult {
    pub market: String,
    pub startepoch: i64,
    pub starttime: ApiTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspendResult {
    pub market: String,
    pub finalepoch: i64,
    pub suspendtime: ApiTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForgiveResult {
    pub accountid: String,
    pub forgiven: bool,
    pub unbanned: bool,
    pub forgivetime: ApiTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(suspend_epoch: i64, persist_book: bool) -> MarketStatus {
        MarketStatus {
            base: 42,
            quote: 0,
            running: true,
            epoch_duration: 60_000,
            active_epoch: 28_000_000,
            start_epoch: 27_999_000,
            suspend_epoch,
            persist_book,
        }
    }

    #[test]
    fn test_persist_book_hidden_without_suspend() {
        let view = MarketStatusView::new(None, &status(0, true));
        assert_eq!(view.persistbook, None);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("persistbook").is_none());
        assert!(json.get("market").is_none());
    }

    #[test]
    fn test_persist_book_shown_with_suspend() {
        let view = MarketStatusView::new(Some("dcr_btc".to_string()), &status(28_000_005, false));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["persistbook"], false);
        assert_eq!(json["market"], "dcr_btc");
    }

    #[test]
    fn test_api_time_millisecond_rfc3339() {
        let t = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let json = serde_json::to_string(&ApiTime(t)).unwrap();
        assert_eq!(json, "\"2023-11-14T22:13:20.123Z\"");
    }
}
