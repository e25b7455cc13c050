//! Signed RAY (1e27) fixed-point arithmetic for rate and revenue calculations.
//!
//! Every monetary amount and rate handled by the engine is an `I256` scaled by
//! 10^27. Values are signed because derivatives and revenue can be negative.
//! Products are computed at full 256-bit width and then divided, division
//! truncates toward zero, and overflow is reported instead of wrapping, so
//! repeated evaluation of the same input is bit-identical.

use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::{I256, U256};
use anyhow::{Context, Result};

use crate::error::EngineError;

/// A signed fixed-point value scaled by [`RAY`].
pub type Ray = I256;

/// RAY constant as unsigned: 1e27
pub const RAY_U256: U256 = U256::from_limbs([11_515_845_246_265_065_472, 54_210_108, 0, 0]);

/// RAY constant: 1e27 for 27-decimal fixed-point arithmetic
pub const RAY: Ray = I256::from_raw(RAY_U256);

/// Number of decimals of the RAY scale
pub const RAY_DECIMALS: u8 = 27;

/// Basis points denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Seconds in a 365-day year, used to annualize per-second emissions
pub const SECONDS_PER_YEAR: u64 = 60 * 60 * 24 * 365;

pub(crate) const TWO: Ray = I256::from_raw(U256::from_limbs([2, 0, 0, 0]));

/// Pre-computed powers of 10 for fast decimal conversion
const POW10: [u128; 39] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
    100_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000_000,
];

/// Fast power of 10 lookup (up to 10^38)
#[inline(always)]
pub fn pow10(exp: u8) -> U256 {
    if exp < 39 {
        U256::from(POW10[exp as usize])
    } else {
        U256::from(10u64).pow(U256::from(exp))
    }
}

/// Lift a small unsigned integer into a `Ray`-typed integer (no scaling).
#[inline(always)]
pub fn int(value: u64) -> Ray {
    I256::from_raw(U256::from(value))
}

/// Whole token units expressed in RAY, e.g. `ray(100_000)` = 100000e27.
#[inline(always)]
pub fn ray(units: u64) -> Ray {
    int(units) * RAY
}

/// Full-width `a * b / c`, truncating toward zero.
///
/// `context` names the quantity being computed and is carried in the error.
#[inline]
pub fn mul_div(a: Ray, b: Ray, c: Ray, context: &'static str) -> Result<Ray, EngineError> {
    if c.is_zero() {
        return Err(EngineError::Overflow { context });
    }
    a.checked_mul(b)
        .and_then(|product| product.checked_div(c))
        .ok_or(EngineError::Overflow { context })
}

/// Multiply two RAY values: (a * b) / RAY
#[inline]
pub fn ray_mul(a: Ray, b: Ray, context: &'static str) -> Result<Ray, EngineError> {
    mul_div(a, b, RAY, context)
}

/// Divide two RAY values: (a * RAY) / b
#[inline]
pub fn ray_div(a: Ray, b: Ray, context: &'static str) -> Result<Ray, EngineError> {
    mul_div(a, RAY, b, context)
}

/// Yearly value of a per-second reward emission.
///
/// `emission * price * discount * SECONDS_PER_YEAR`, with the discount in
/// basis points (10000 = full price).
pub fn annualize_emission(
    emission_per_second: Ray,
    price: Ray,
    discount_bps: u64,
) -> Result<Ray, EngineError> {
    let per_second = ray_mul(emission_per_second, price, "reward value")?;
    let per_year = per_second
        .checked_mul(int(SECONDS_PER_YEAR))
        .ok_or(EngineError::Overflow { context: "reward value" })?;
    mul_div(per_year, int(discount_bps), int(BPS_DENOMINATOR), "reward discount")
}

/// Rescale a raw token amount with `decimals` decimals to RAY.
///
/// Example: 1000 USDC (`1000_000000`, 6 decimals) becomes 1000e27.
pub fn normalize_to_ray(amount: U256, decimals: u8) -> Result<Ray, EngineError> {
    const CONTEXT: &str = "token amount normalization";
    let scaled = if decimals <= RAY_DECIMALS {
        amount
            .checked_mul(pow10(RAY_DECIMALS - decimals))
            .ok_or(EngineError::Overflow { context: CONTEXT })?
    } else {
        amount / pow10(decimals - RAY_DECIMALS)
    };
    I256::try_from(scaled).map_err(|_| EngineError::Overflow { context: CONTEXT })
}

/// Convert a RAY amount back to raw token units, truncating.
/// Negative values map to zero.
pub fn ray_to_token_units(value: Ray, decimals: u8) -> U256 {
    if value.is_negative() {
        return U256::ZERO;
    }
    let raw = value.into_raw();
    if decimals <= RAY_DECIMALS {
        raw / pow10(RAY_DECIMALS - decimals)
    } else {
        raw.saturating_mul(pow10(decimals - RAY_DECIMALS))
    }
}

/// Parse a human-readable decimal string (e.g. `"0.04"`, `"-12.5"`) into RAY.
pub fn parse_ray(value: &str) -> Result<Ray> {
    let parsed = parse_units(value.trim(), RAY_DECIMALS)
        .with_context(|| format!("Invalid decimal amount '{}'", value))?;
    match parsed {
        ParseUnits::I256(signed) => Ok(signed),
        ParseUnits::U256(unsigned) => I256::try_from(unsigned)
            .map_err(|_| anyhow::anyhow!("Amount '{}' does not fit in a signed RAY", value)),
    }
}

/// Convert RAY to f64.
/// Use only for display/logging, not for computation.
pub fn ray_to_f64(value: Ray) -> f64 {
    let magnitude = value.unsigned_abs();
    let limbs = magnitude.as_limbs();
    let base = u64::MAX as f64 + 1.0;
    let raw = limbs
        .iter()
        .rev()
        .fold(0.0f64, |acc, limb| acc * base + *limb as f64);
    let scaled = raw / 1e27;
    if value.is_negative() {
        -scaled
    } else {
        scaled
    }
}
