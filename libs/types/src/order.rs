//! Order types and their public book-entry rendering

use crate::asset::AssetId;
use crate::errors::OrderError;
use crate::ids::{AccountId, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire code used in book notes: 1 = buy, 2 = sell.
    pub fn code(&self) -> u8 {
        match self {
            Side::Buy => 1,
            Side::Sell => 2,
        }
    }
}

/// Time-in-force for limit orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Matched in its epoch, then canceled if unfilled.
    Immediate,
    /// Rests on the book until filled or canceled.
    Standing,
}

impl TimeInForce {
    /// Wire code used in book notes: 0 = immediate, 1 = standing.
    pub fn code(&self) -> u8 {
        match self {
            TimeInForce::Immediate => 0,
            TimeInForce::Standing => 1,
        }
    }
}

/// Order kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderKind {
    Limit { rate: u64, force: TimeInForce },
    Market,
    Cancel { target: OrderId },
}

impl OrderKind {
    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Limit { .. } => "limit",
            OrderKind::Market => "market",
            OrderKind::Cancel { .. } => "cancel",
        }
    }
}

/// An order as held by the engine, either resting on the book or queued in
/// the active epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account: AccountId,
    pub base: AssetId,
    pub quote: AssetId,
    pub side: Side,
    pub quantity: u64,
    pub filled: u64,
    pub kind: OrderKind,
    pub server_time: DateTime<Utc>,
}

impl Order {
    pub fn remaining(&self) -> u64 {
        self.quantity.saturating_sub(self.filled)
    }
}

/// Public order-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOrderNote {
    pub marketid: String,
    pub oid: OrderId,
    pub side: u8,
    pub qty: u64,
    pub rate: u64,
    pub tif: u8,
    /// Server receive time in Unix milliseconds.
    pub time: i64,
}

impl BookOrderNote {
    /// Render an order as a book entry. Only limit orders have a rate and can
    /// appear on a book.
    pub fn from_order(order: &Order, market: &str) -> Result<Self, OrderError> {
        let (rate, force) = match order.kind {
            OrderKind::Limit { rate, force } => (rate, force),
            other => {
                return Err(OrderError::NotBookable {
                    order_id: order.id.to_string(),
                    kind: other.label().to_string(),
                })
            }
        };
        Ok(Self {
            marketid: market.to_string(),
            oid: order.id,
            side: order.side.code(),
            qty: order.remaining(),
            rate,
            tif: force.code(),
            time: order.server_time.timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::HASH_SIZE;

    fn order(kind: OrderKind) -> Order {
        Order {
            id: OrderId::new([7; HASH_SIZE]),
            account: AccountId::new([1; HASH_SIZE]),
            base: 42,
            quote: 0,
            side: Side::Sell,
            quantity: 10_000,
            filled: 2_500,
            kind,
            server_time: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        }
    }

    #[test]
    fn test_limit_order_to_book_note() {
        let o = order(OrderKind::Limit {
            rate: 350_000,
            force: TimeInForce::Standing,
        });
        let note = BookOrderNote::from_order(&o, "dcr_btc").unwrap();
        assert_eq!(note.marketid, "dcr_btc");
        assert_eq!(note.side, 2);
        assert_eq!(note.qty, 7_500);
        assert_eq!(note.rate, 350_000);
        assert_eq!(note.tif, 1);
        assert_eq!(note.time, 1_700_000_000_000);
    }

    #[test]
    fn test_market_order_not_bookable() {
        let o = order(OrderKind::Market);
        let err = BookOrderNote::from_order(&o, "dcr_btc").unwrap_err();
        assert!(err.to_string().contains("market"));
    }

    #[test]
    fn test_remaining_saturates() {
        let mut o = order(OrderKind::Market);
        o.filled = o.quantity + 1;
        assert_eq!(o.remaining(), 0);
    }
}
