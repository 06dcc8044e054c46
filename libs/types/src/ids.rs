//! Unique identifier types for venue entities
//!
//! Accounts, orders and matches are all identified by 32-byte hashes that
//! travel as lowercase hex strings. Coin IDs are asset-specific byte strings
//! of arbitrary length, also rendered as hex.

use crate::errors::IdError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Byte length of every hash identifier.
pub const HASH_SIZE: usize = 32;

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; HASH_SIZE]);

        impl $name {
            /// Wrap raw hash bytes.
            pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
                Self(bytes)
            }

            /// Copy from a slice, which must be exactly `HASH_SIZE` bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
                let arr: [u8; HASH_SIZE] =
                    bytes.try_into().map_err(|_| IdError::BadLength {
                        expected: HASH_SIZE,
                        actual: bytes.len(),
                    })?;
                Ok(Self(arr))
            }

            /// Decode from a hex string of exactly `2 * HASH_SIZE` characters.
            pub fn from_hex(s: &str) -> Result<Self, IdError> {
                let bytes = hex::decode(s).map_err(|e| IdError::BadHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }

            pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hash_id!(
    /// Unique identifier for an account: the SHA-256 digest of its public key.
    AccountId
);

hash_id!(
    /// Unique identifier for an order.
    OrderId
);

hash_id!(
    /// Unique identifier for a match between a maker and a taker order.
    MatchId
);

impl AccountId {
    /// Derive the account ID for a public key.
    pub fn from_pubkey(pubkey: &[u8]) -> Self {
        Self(Sha256::digest(pubkey).into())
    }
}

/// Asset-specific coin identifier, e.g. a transaction outpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CoinId(Vec<u8>);

impl CoinId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Serialize for CoinId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for CoinId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Self).map_err(serde::de::Error::custom)
    }
}
