//! Asset descriptors and the symbol registry
//!
//! Assets are identified by their BIP-44 coin type. Token assets use the
//! `token.network` symbol form with IDs derived from the parent chain.

use serde::{Deserialize, Serialize};

/// BIP-44 coin type of an asset.
pub type AssetId = u32;

/// Static description of a supported asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub symbol: String,
    pub version: u32,
    /// Ceiling applied to scaled fee rates during live order processing.
    pub max_fee_rate: u64,
    pub swap_size: u64,
    pub swap_conf: u32,
    pub unit: String,
    pub conversion_factor: u64,
}

const BIP_SYMBOLS: &[(&str, AssetId)] = &[
    ("btc", 0),
    ("ltc", 2),
    ("doge", 3),
    ("dash", 5),
    ("dgb", 20),
    ("dcr", 42),
    ("eth", 60),
    ("etc", 61),
    ("zec", 133),
    ("firo", 136),
    ("bch", 145),
    ("polygon", 966),
    ("usdc.eth", 60001),
    ("usdt.eth", 60002),
    ("usdc.polygon", 966001),
    ("weth.polygon", 966002),
    ("wbtc.polygon", 966003),
    ("usdt.polygon", 966004),
];

/// Look up the asset ID for a symbol. Matching is case-insensitive.
pub fn bip_symbol_id(symbol: &str) -> Option<AssetId> {
    let symbol = symbol.to_lowercase();
    BIP_SYMBOLS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, id)| *id)
}

/// Look up the lowercase symbol registered for an asset ID.
pub fn bip_id_symbol(id: AssetId) -> Option<&'static str> {
    BIP_SYMBOLS
        .iter()
        .find(|(_, bip)| *bip == id)
        .map(|(s, _)| *s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup_is_case_insensitive() {
        assert_eq!(bip_symbol_id("dcr"), Some(42));
        assert_eq!(bip_symbol_id("DCR"), Some(42));
        assert_eq!(bip_symbol_id("UsDc.EtH"), Some(60001));
    }

    #[test]
    fn test_unknown_symbol() {
        assert_eq!(bip_symbol_id("xyz"), None);
        assert_eq!(bip_symbol_id(""), None);
    }

    #[test]
    fn test_id_to_symbol() {
        assert_eq!(bip_id_symbol(0), Some("btc"));
        assert_eq!(bip_id_symbol(966001), Some("usdc.polygon"));
        assert_eq!(bip_id_symbol(999_999), None);
    }

    #[test]
    fn test_asset_serialization_uses_camel_case() {
        let asset = Asset {
            id: 42,
            symbol: "dcr".to_string(),
            version: 0,
            max_fee_rate: 100,
            swap_size: 251,
            swap_conf: 1,
            unit: "atoms".to_string(),
            conversion_factor: 100_000_000,
        };
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["maxFeeRate"], 100);
        assert_eq!(json["swapConf"], 1);
    }
}
