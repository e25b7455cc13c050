//! Shared pool snapshots and assertions for unit tests.

use alloy::primitives::I256;

use crate::params::PoolParameters;
use crate::ray_math::{int, ray, ray_to_f64, Ray, RAY, SECONDS_PER_YEAR};

/// Per-second emission to yearly value multiplier used by the reference pool
/// (130 reward-token price units times one year, truncated).
const REWARD_ANNUALIZER: u64 = 130 * SECONDS_PER_YEAR;

/// Amount with 6 decimals lifted to RAY.
fn from_micro(units: u64) -> Ray {
    int(units) * RAY / int(1_000_000)
}

/// Ratio `num / den` in RAY.
pub fn fraction(num: u64, den: u64) -> Ray {
    RAY * int(num) / int(den)
}

/// Mainnet-sized pool with the reference reward rates and strategy assets
/// (in whole tokens).
pub fn reference_pool_with(reward_deposit: u64, reward_borrow: u64, assets: u64) -> PoolParameters {
    let stable = 11_958_029_754_937u64;
    let variable = 1_425_711_403_399_322u64;
    let liquidity = 812_664_505_140_562u64;
    let annualize = |emission: u64| int(emission) * int(REWARD_ANNUALIZER) * int(1_000_000_000);

    PoolParameters {
        reserve_factor: fraction(1, 10),
        total_stable_debt: from_micro(stable),
        total_variable_debt: from_micro(variable),
        total_deposits: from_micro(liquidity + stable + variable),
        stable_borrow_rate: I256::from_dec_str("108870068051917638359824820").unwrap(),
        reward_deposit: annualize(reward_deposit),
        reward_borrow: annualize(reward_borrow),
        strategy_assets: ray(assets),
        current_borrow: I256::ZERO,
        slope1: fraction(4, 100),
        slope2: fraction(6, 10),
        r0: I256::ZERO,
        u_optimal: fraction(9, 10),
    }
}

pub fn reference_pool() -> PoolParameters {
    reference_pool_with(1_903_258_773_510_960, 3_806_517_547_021_920, 1_000_000)
}

/// Small pool sitting just below the kink: 1000 deposits, 895 variable debt,
/// kink reached after borrowing 50, idle liquidity 105.
pub fn simple_pool() -> PoolParameters {
    PoolParameters {
        reserve_factor: fraction(1, 10),
        total_stable_debt: I256::ZERO,
        total_variable_debt: ray(895),
        total_deposits: ray(1000),
        stable_borrow_rate: I256::ZERO,
        reward_deposit: ray(5),
        reward_borrow: ray(5),
        strategy_assets: ray(10),
        current_borrow: I256::ZERO,
        slope1: fraction(4, 100),
        slope2: fraction(6, 10),
        r0: I256::ZERO,
        u_optimal: fraction(9, 10),
    }
}

/// Flat 5% rate, all interest to the strategy's counterparty, borrow
/// rewards of 20 shared with 100 variable debt. Revenue is
/// `20 b / (b + 100) - 0.05 b`, maximized at `b = 100`.
pub fn flat_rate_pool() -> PoolParameters {
    PoolParameters {
        reserve_factor: RAY,
        total_stable_debt: I256::ZERO,
        total_variable_debt: ray(100),
        total_deposits: ray(10_000),
        stable_borrow_rate: I256::ZERO,
        reward_deposit: I256::ZERO,
        reward_borrow: ray(20),
        strategy_assets: I256::ZERO,
        current_borrow: I256::ZERO,
        slope1: I256::ZERO,
        slope2: I256::ZERO,
        r0: fraction(5, 100),
        u_optimal: fraction(9, 10),
    }
}

/// Assert a raw RAY integer matches `want` within a relative 1e-6.
#[track_caller]
pub fn assert_close(got: Ray, want: f64) {
    assert_close_rel(got, want, 1e-6);
}

#[track_caller]
pub fn assert_close_rel(got: Ray, want: f64, rel: f64) {
    let got_raw = ray_to_f64(got) * 1e27;
    assert!(
        (got_raw - want).abs() <= want.abs() * rel,
        "got {got_raw:e}, want {want:e} (relative tolerance {rel:e})"
    );
}

/// Assert a raw RAY integer is within `tolerance` units of `want`.
#[track_caller]
pub fn assert_within(got: Ray, want: i64, tolerance: u64) {
    let want = I256::try_from(want).unwrap();
    let diff = (got - want).unsigned_abs();
    assert!(
        diff <= alloy::primitives::U256::from(tolerance),
        "got {got}, want {want} (absolute tolerance {tolerance})"
    );
}

/// Arbitrary valid pool: up to 1e9 tokens of deposits, ratios in basis points.
pub fn arb_pool() -> impl proptest::strategy::Strategy<Value = PoolParameters> {
    use proptest::prelude::*;

    let bps = |max: u64| 0u64..=max;
    (
        1u64..=1_000_000_000,
        bps(10_000),
        bps(10_000),
        bps(10_000),
        bps(2_000),
        bps(2_000),
        bps(30_000),
        1u64..10_000,
        0u64..=1_000_000,
        0u64..=1_000_000,
        bps(10_000),
        bps(5_000),
    )
        .prop_map(
            |(
                deposits,
                debt_bps,
                stable_bps,
                reserve_bps,
                r0_bps,
                slope1_bps,
                slope2_bps,
                optimal_bps,
                reward_deposit,
                reward_borrow,
                assets_bps,
                stable_rate_bps,
            )| {
                let bps = |value: u64| fraction(value, 10_000);
                let total_deposits = ray(deposits);
                let debt = total_deposits * int(debt_bps) / int(10_000);
                let stable = debt * int(stable_bps) / int(10_000);
                PoolParameters {
                    reserve_factor: bps(reserve_bps),
                    total_stable_debt: stable,
                    total_variable_debt: debt - stable,
                    total_deposits,
                    stable_borrow_rate: bps(stable_rate_bps),
                    reward_deposit: ray(reward_deposit),
                    reward_borrow: ray(reward_borrow),
                    strategy_assets: total_deposits * int(assets_bps) / int(10_000),
                    current_borrow: I256::ZERO,
                    slope1: bps(slope1_bps),
                    slope2: bps(slope2_bps),
                    r0: bps(r0_bps),
                    u_optimal: bps(optimal_bps),
                }
            },
        )
}

/// `share` basis points of the pool's idle liquidity.
pub fn borrow_share(params: &PoolParameters, share_bps: u64) -> Ray {
    params.max_feasible_borrow() * int(share_bps) / int(10_000)
}
