//! Types library for the trading venue
//!
//! Shared definitions used by the venue engine and by the operator-facing
//! admin control plane. Everything here is plain data plus the small amount
//! of logic both sides must agree on bit-for-bit (fee-rate capping, epoch
//! arithmetic, book-entry rendering).
//!
//! # Modules
//! - `ids`: 32-byte hash identifiers (AccountId, MatchId, OrderId) and coin IDs
//! - `asset`: Asset descriptors and the BIP-44 symbol registry
//! - `fee`: Fee-rate scaling and the max-fee-rate cap
//! - `market`: Market status snapshots and epoch scheduling
//! - `order`: Orders and their public book-entry rendering
//! - `swap`: Match records, match outcomes and failures
//! - `account`: Account summaries and bonds
//! - `message`: Configuration snapshot and notification envelope
//! - `errors`: Error taxonomy

pub mod ids;
pub mod asset;
pub mod fee;
pub mod market;
pub mod order;
pub mod swap;
pub mod account;
pub mod message;
pub mod errors;
