//! Request parameter validation
//!
//! Turns raw path segments, query values and bodies into typed values or an
//! [`AdminError::InvalidInput`]. Nothing in here talks to the engine, so every
//! rejection happens before a request can reach it.

use crate::error::AdminError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use types::asset::{bip_symbol_id, AssetId};
use types::ids::{AccountId, MatchId, HASH_SIZE};
use types::market::Schedule;

pub const INCLUDE_INACTIVE_KEY: &str = "includeinactive";
pub const N_KEY: &str = "n";
pub const DAYS_KEY: &str = "days";
pub const STRENGTH_KEY: &str = "strength";
pub const PERSIST_KEY: &str = "persist";
pub const TIME_KEY: &str = "t";

/// Largest notice payload: the message envelope stores its length in 16 bits.
pub const MAX_NOTE_BYTES: usize = u16::MAX as usize;

/// Default number of entries returned by account history queries.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Upper bound on bonds pre-generated by one request.
pub const MAX_PREPAID_BONDS: u16 = 100;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Query string values. Empty values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new(raw: HashMap<String, String>) -> Self {
        Self(raw)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// Parse a boolean the way operators type them: `1 t T TRUE true True` and
/// `0 f F FALSE false False`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Normalize a market name from the path.
pub fn market_name(raw: &str) -> String {
    raw.to_lowercase()
}

/// Resolve an asset symbol, case-insensitively.
pub fn asset_id(symbol: &str) -> Result<(String, AssetId), AdminError> {
    let symbol = symbol.to_lowercase();
    match bip_symbol_id(&symbol) {
        Some(id) => Ok((symbol, id)),
        None => Err(AdminError::invalid(format!("unknown asset {symbol:?}"))),
    }
}

pub fn fee_rate_scale(raw: &str) -> Result<f64, AdminError> {
    raw.parse::<f64>()
        .map_err(|_| AdminError::invalid(format!("invalid fee rate scale {raw:?}")))
}

/// Decode an account ID by decoding the hex first and checking the byte
/// length afterwards.
pub fn account_id_from_path(raw: &str) -> Result<AccountId, AdminError> {
    let bytes = hex::decode(raw)
        .map_err(|e| AdminError::invalid(format!("could not decode account id: {e}")))?;
    AccountId::from_slice(&bytes).map_err(|_| AdminError::invalid("account id has incorrect length"))
}

/// Decode an account ID, rejecting any string that is not exactly
/// `2 * HASH_SIZE` characters before looking at the hex.
pub fn decode_account_id(raw: &str) -> Result<AccountId, AdminError> {
    if raw.len() != HASH_SIZE * 2 {
        return Err(AdminError::invalid("account id has incorrect length"));
    }
    let mut bytes = [0u8; HASH_SIZE];
    hex::decode_to_slice(raw, &mut bytes)
        .map_err(|e| AdminError::invalid(format!("could not decode account id: {e}")))?;
    Ok(AccountId::new(bytes))
}

pub fn match_id(raw: &str) -> Result<MatchId, AdminError> {
    MatchId::from_hex(raw).map_err(|e| AdminError::invalid(format!("invalid match id {raw:?}: {e}")))
}

fn optional_bool(q: &QueryParams, key: &str, what: &str, default: bool) -> Result<bool, AdminError> {
    match q.get(key) {
        None => Ok(default),
        Some(raw) => {
            parse_bool(raw).ok_or_else(|| AdminError::invalid(format!("invalid {what} boolean {raw:?}")))
        }
    }
}

/// `includeinactive`, default false.
pub fn include_inactive(q: &QueryParams) -> Result<bool, AdminError> {
    optional_bool(q, INCLUDE_INACTIVE_KEY, "include inactive", false)
}

/// `persist`, default true: keep the book across a suspension.
pub fn persist_book(q: &QueryParams) -> Result<bool, AdminError> {
    optional_bool(q, PERSIST_KEY, "persist book", true)
}

/// Required boolean path segment.
pub fn required_bool(raw: &str) -> Result<bool, AdminError> {
    parse_bool(raw).ok_or_else(|| AdminError::invalid(format!("unable to parse selection {raw:?}")))
}

/// Match export cap. Non-positive means no limit.
pub fn match_limit(q: &QueryParams) -> Result<i64, AdminError> {
    match q.get(N_KEY) {
        None => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|e| AdminError::invalid(format!("invalid n int {raw:?}: {e}"))),
    }
}

/// Account history cap, default 100.
pub fn history_limit(q: &QueryParams) -> Result<i64, AdminError> {
    match q.get(N_KEY) {
        None => Ok(DEFAULT_HISTORY_LIMIT),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|e| AdminError::invalid(format!("invalid n int {raw:?}: {e}"))),
    }
}

/// Validated `/prepaybonds` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepayRequest {
    pub n: u16,
    pub days: u64,
    pub strength: u32,
    pub lock_secs: i64,
}

pub fn prepay_request(q: &QueryParams) -> Result<PrepayRequest, AdminError> {
    let n = match q.get(N_KEY) {
        None => 1,
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|e| AdminError::invalid(format!("error parsing n: {e}")))?,
    };
    if n > MAX_PREPAID_BONDS {
        return Err(AdminError::invalid(format!(
            "requested too many prepaid bonds. max {MAX_PREPAID_BONDS}"
        )));
    }

    let raw_days = q
        .get(DAYS_KEY)
        .ok_or_else(|| AdminError::invalid("no days duration specified"))?;
    let days = raw_days
        .parse::<u64>()
        .map_err(|e| AdminError::invalid(format!("error parsing days: {e}")))?;
    if days == 0 {
        return Err(AdminError::invalid("days parsed to zero"));
    }
    let lock_secs = days
        .checked_mul(SECONDS_PER_DAY)
        .and_then(|s| i64::try_from(s).ok())
        .ok_or_else(|| AdminError::invalid(format!("days value {days} too large")))?;

    let strength = match q.get(STRENGTH_KEY) {
        None => 1,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|e| AdminError::invalid(format!("error parsing strength: {e}")))?,
    };

    Ok(PrepayRequest {
        n,
        days,
        strength,
        lock_secs,
    })
}

/// Parse the optional `t` (Unix milliseconds) of a lifecycle command.
///
/// Absent means as soon as possible. A time strictly before `now` is
/// rejected. `action` names the transition in error messages.
pub fn schedule(q: &QueryParams, action: &str, now: DateTime<Utc>) -> Result<Schedule, AdminError> {
    let Some(raw) = q.get(TIME_KEY) else {
        return Ok(Schedule::Asap);
    };
    let ms = raw
        .parse::<i64>()
        .map_err(|e| AdminError::invalid(format!("invalid {action} time {raw:?}: {e}")))?;
    let at = DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AdminError::invalid(format!("invalid {action} time {raw:?}: out of range")))?;
    if at < now {
        return Err(AdminError::invalid(format!(
            "specified market {action} time is in the past: {}",
            at.to_rfc3339()
        )));
    }
    Ok(Schedule::At(at))
}

/// Validate an operator notice body.
///
/// One trailing newline is dropped, since uploading from a file with curl
/// adds one. Invalid UTF-8 sequences are replaced, not rejected.
pub fn notice_text(body: &[u8]) -> Result<String, AdminError> {
    let body = body.strip_suffix(b"\n").unwrap_or(body);
    if body.is_empty() {
        return Err(AdminError::invalid("no message to broadcast"));
    }
    if body.len() > MAX_NOTE_BYTES {
        return Err(AdminError::invalid(format!(
            "cannot send messages larger than {MAX_NOTE_BYTES} bytes"
        )));
    }
    Ok(String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    const ACCT: &str = "0a9912205b2cbab0c25c2de30bda9074de0ae23b065489a99199bad763f102cc";

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_parse_bool_forms() {
        for s in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(s), Some(true), "{s}");
        }
        for s in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(s), Some(false), "{s}");
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("tRUE"), None);
    }

    #[test]
    fn test_empty_query_value_is_absent() {
        let q = query(&[("persist", "")]);
        assert_eq!(q.get("persist"), None);
        assert!(persist_book(&q).unwrap());
    }

    #[test]
    fn test_boolean_defaults() {
        let q = query(&[]);
        assert!(!include_inactive(&q).unwrap());
        assert!(persist_book(&q).unwrap());
        assert!(required_bool("").is_err());
    }

    #[test]
    fn test_bad_boolean_rejected() {
        let q = query(&[("includeinactive", "maybe")]);
        let err = include_inactive(&q).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_asset_symbol_case_insensitive() {
        assert_eq!(asset_id("DCR").unwrap(), ("dcr".to_string(), 42));
        let err = asset_id("Nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown asset \"nope\"");
    }

    #[test]
    fn test_account_id_both_paths_accept_valid() {
        let a = account_id_from_path(ACCT).unwrap();
        let b = decode_account_id(ACCT).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), ACCT);
    }

    #[test]
    fn test_account_id_length_errors() {
        let short = &ACCT[..62];
        assert_eq!(
            account_id_from_path(short).unwrap_err().to_string(),
            "account id has incorrect length"
        );
        assert_eq!(
            decode_account_id(short).unwrap_err().to_string(),
            "account id has incorrect length"
        );
    }

    #[test]
    fn test_account_id_hex_errors() {
        let bad = format!("zz{}", &ACCT[2..]);
        assert!(account_id_from_path(&bad)
            .unwrap_err()
            .to_string()
            .starts_with("could not decode account id"));
        assert!(decode_account_id(&bad)
            .unwrap_err()
            .to_string()
            .starts_with("could not decode account id"));
    }

    #[test]
    fn test_match_limit() {
        assert_eq!(match_limit(&query(&[])).unwrap(), 0);
        assert_eq!(match_limit(&query(&[("n", "-5")])).unwrap(), -5);
        assert!(match_limit(&query(&[("n", "ten")])).is_err());
    }

    #[test]
    fn test_history_limit_default() {
        assert_eq!(history_limit(&query(&[])).unwrap(), 100);
        assert_eq!(history_limit(&query(&[("n", "7")])).unwrap(), 7);
    }

    #[test]
    fn test_prepay_defaults() {
        let req = prepay_request(&query(&[("days", "5")])).unwrap();
        assert_eq!(req.n, 1);
        assert_eq!(req.strength, 1);
        assert_eq!(req.lock_secs, 5 * 86_400);
    }

    #[test]
    fn test_prepay_zero_n_allowed() {
        let req = prepay_request(&query(&[("n", "0"), ("days", "5")])).unwrap();
        assert_eq!(req.n, 0);
    }

    #[test]
    fn test_prepay_limits() {
        let err = prepay_request(&query(&[("n", "101"), ("days", "5")])).unwrap_err();
        assert!(err.to_string().contains("max 100"));

        // n is a 16-bit field
        assert!(prepay_request(&query(&[("n", "70000"), ("days", "5")])).is_err());
        assert!(prepay_request(&query(&[("n", "-1"), ("days", "5")])).is_err());

        let err = prepay_request(&query(&[])).unwrap_err();
        assert_eq!(err.to_string(), "no days duration specified");

        let err = prepay_request(&query(&[("days", "0")])).unwrap_err();
        assert_eq!(err.to_string(), "days parsed to zero");

        let huge = u64::MAX.to_string();
        assert!(prepay_request(&query(&[("days", huge.as_str())])).is_err());

        // strength is a 32-bit field
        assert!(prepay_request(&query(&[("days", "1"), ("strength", "4294967296")])).is_err());
    }

    #[test]
    fn test_schedule_absent_is_asap() {
        assert_eq!(schedule(&query(&[]), "suspend", Utc::now()).unwrap(), Schedule::Asap);
    }

    #[test]
    fn test_schedule_past_rejected() {
        let now = Utc::now();
        let past = (now - Duration::seconds(1)).timestamp_millis().to_string();
        let err = schedule(&query(&[("t", past.as_str())]), "resume", now).unwrap_err();
        assert!(err.to_string().contains("resume time is in the past"));
    }

    #[test]
    fn test_schedule_garbage_rejected() {
        let err = schedule(&query(&[("t", "soon")]), "suspend", Utc::now()).unwrap_err();
        assert!(err.to_string().starts_with("invalid suspend time"));
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(notice_text(b"hello\n").unwrap(), "hello");
        assert_eq!(notice_text(b"hello\n\n").unwrap(), "hello\n");
        assert_eq!(
            notice_text(b"").unwrap_err().to_string(),
            "no message to broadcast"
        );
        assert!(notice_text(b"\n").is_err());
    }

    #[test]
    fn test_notice_invalid_utf8_replaced() {
        assert_eq!(notice_text(b"hi\xff\n").unwrap(), "hi\u{fffd}");
    }

    #[test]
    fn test_notice_size_limit() {
        let max = vec![b'a'; MAX_NOTE_BYTES];
        assert!(notice_text(&max).is_ok());

        let mut with_newline = max.clone();
        with_newline.push(b'\n');
        assert!(notice_text(&with_newline).is_ok());

        let too_big = vec![b'a'; MAX_NOTE_BYTES + 1];
        assert!(notice_text(&too_big)
            .unwrap_err()
            .to_string()
            .contains("65535"));
    }

    proptest! {
        #[test]
        fn prop_wrong_length_account_ids_rejected(s in "[0-9a-f]{0,80}") {
            prop_assume!(s.len() != HASH_SIZE * 2);
            prop_assert!(account_id_from_path(&s).is_err());
            prop_assert!(decode_account_id(&s).is_err());
        }

        #[test]
        fn prop_non_hex_account_ids_rejected(
            prefix in "[0-9a-f]{0,63}",
            bad in "[g-zG-Z]",
        ) {
            let mut s = prefix.clone();
            s.push_str(&bad);
            while s.len() < HASH_SIZE * 2 {
                s.push('0');
            }
            prop_assert!(account_id_from_path(&s).is_err());
            prop_assert!(decode_account_id(&s).is_err());
        }

        #[test]
        fn prop_future_times_accepted(offset_ms in 1i64..10_000_000_000) {
            let now = Utc::now();
            let t = (now.timestamp_millis() + offset_ms).to_string();
            let q = query(&[("t", t.as_str())]);
            prop_assert!(matches!(schedule(&q, "suspend", now), Ok(Schedule::At(_))));
        }

        #[test]
        fn prop_past_times_rejected(offset_ms in 1i64..10_000_000_000) {
            let now = Utc::now();
            let t = (now.timestamp_millis() - offset_ms).to_string();
            let q = query(&[("t", t.as_str())]);
            prop_assert!(schedule(&q, "suspend", now).is_err());
        }
    }
}
