//! Fee-rate scaling
//!
//! Operators may scale the fee rate reported by an asset backend before it is
//! handed to traders. The scaled rate is always capped at the asset's
//! configured maximum; both the engine and the admin view call the same
//! function so their numbers never drift apart.

/// Default scale factor: fee rates pass through unchanged.
pub const DEFAULT_FEE_RATE_SCALE: f64 = 1.0;

/// Apply a scale factor to a backend fee rate.
///
/// Non-finite or non-positive factors leave the rate untouched. The product
/// is rounded to the nearest integer, saturating at `u64::MAX`.
pub fn scale_fee_rate(fee_rate: u64, scale: f64) -> u64 {
    if !scale.is_finite() || scale <= 0.0 {
        return fee_rate;
    }
    (fee_rate as f64 * scale).round() as u64
}

/// Limit a scaled fee rate to the asset's maximum.
pub fn cap_fee_rate(scaled_fee_rate: u64, max_fee_rate: u64) -> u64 {
    if scaled_fee_rate > max_fee_rate {
        return max_fee_rate;
    }
    scaled_fee_rate
}
