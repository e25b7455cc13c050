//! Pool snapshot files.
//!
//! A snapshot records the raw figures a keeper reads from the lending pool
//! and the strategy, as decimal strings in token units. Example:
//!
//! ```toml
//! [pool]
//! name = "usdc-main"
//! decimals = 6
//! reserve_factor = "0.1"
//! available_liquidity = "812664505.140562"
//! total_stable_debt = "11958029.754937"
//! total_variable_debt = "1425711403.399322"
//! stable_borrow_rate = "0.10887006805191763835982482"
//! base_rate = "0"
//! slope1 = "0.04"
//! slope2 = "0.6"
//! optimal_utilization = "0.9"
//!
//! [rewards]
//! deposit_emission_per_second = "0.00190325877351096"
//! borrow_emission_per_second = "0.00380651754702192"
//! reward_price = "130"
//!
//! [strategy]
//! deposits = "1000000"
//! borrows = "0"
//! ```

use std::path::Path;

use alloy::primitives::{I256, U256};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use super::ray_string;
use crate::error::EngineError;
use crate::params::PoolParameters;
use crate::ray_math::{
    annualize_emission, normalize_to_ray, ray_to_token_units, Ray, BPS_DENOMINATOR,
};

/// Lending pool state. Debt and liquidity include the strategy's own position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSection {
    pub name: String,
    /// Decimals of the borrowed token; recommendations are truncated to them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(with = "ray_string")]
    pub reserve_factor: Ray,
    /// Idle liquidity held by the pool
    #[serde(with = "ray_string")]
    pub available_liquidity: Ray,
    #[serde(with = "ray_string")]
    pub total_stable_debt: Ray,
    #[serde(with = "ray_string")]
    pub total_variable_debt: Ray,
    #[serde(with = "ray_string")]
    pub stable_borrow_rate: Ray,
    #[serde(with = "ray_string")]
    pub base_rate: Ray,
    #[serde(with = "ray_string")]
    pub slope1: Ray,
    #[serde(with = "ray_string")]
    pub slope2: Ray,
    #[serde(with = "ray_string")]
    pub optimal_utilization: Ray,
}

/// Reward emissions, valued in the borrowed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsSection {
    /// Reward tokens per second emitted to depositors
    #[serde(with = "ray_string")]
    pub deposit_emission_per_second: Ray,
    /// Reward tokens per second emitted to variable borrowers
    #[serde(with = "ray_string")]
    pub borrow_emission_per_second: Ray,
    /// Price of one reward token in borrowed-token units
    #[serde(with = "ray_string")]
    pub reward_price: Ray,
    /// Haircut applied to the reward price when selling (10000 = none)
    #[serde(default = "default_discount_bps")]
    pub discount_bps: u64,
}

fn default_discount_bps() -> u64 {
    BPS_DENOMINATOR
}

/// Strategy position in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySection {
    /// Total supplied to the pool, including redeposited borrows
    #[serde(with = "ray_string")]
    pub deposits: Ray,
    /// Outstanding variable borrow
    #[serde(with = "ray_string")]
    pub borrows: Ray,
    /// Funds held by the strategy and not yet deposited
    #[serde(default = "zero", with = "ray_string")]
    pub undeployed: Ray,
    /// Collateral ratio cap applied to the recommendation
    #[serde(
        default,
        with = "ray_string::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_collat_ratio: Option<Ray>,
}

fn zero() -> Ray {
    I256::ZERO
}

/// One pool snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool: PoolSection,
    pub rewards: RewardsSection,
    pub strategy: StrategySection,
}

impl PoolSnapshot {
    /// Load a snapshot from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))
    }

    pub fn name(&self) -> &str {
        &self.pool.name
    }

    /// Raw token units of `value`, when the token's decimals are known.
    pub fn token_units(&self, value: Ray) -> Option<U256> {
        self.pool
            .decimals
            .map(|decimals| ray_to_token_units(value, decimals))
    }

    /// Truncate `value` to an amount the token can represent.
    /// Unchanged when decimals are not set.
    pub fn round_to_token(&self, value: Ray) -> Result<Ray, EngineError> {
        match self.pool.decimals {
            Some(decimals) => normalize_to_ray(ray_to_token_units(value, decimals), decimals),
            None => Ok(value),
        }
    }

    /// Derive optimizer parameters.
    ///
    /// The strategy's borrow is taken out of the pool's variable debt and
    /// deposits, so the candidate borrow replaces it. Undeployed funds count as
    /// both strategy assets and pool deposits.
    pub fn into_parameters(&self) -> Result<PoolParameters> {
        let pool = &self.pool;
        let strategy = &self.strategy;
        ensure!(
            strategy.borrows <= pool.total_variable_debt,
            "{}: strategy borrows exceed pool variable debt",
            pool.name
        );
        ensure!(
            strategy.borrows <= strategy.deposits,
            "{}: strategy borrows exceed strategy deposits",
            pool.name
        );
        ensure!(
            self.rewards.discount_bps <= BPS_DENOMINATOR,
            "{}: discount_bps above {}",
            pool.name,
            BPS_DENOMINATOR
        );

        let variable_debt = pool.total_variable_debt - strategy.borrows;
        let deposits = pool.available_liquidity + pool.total_stable_debt + variable_debt
            + strategy.undeployed;
        let strategy_assets = strategy.deposits - strategy.borrows + strategy.undeployed;

        let params = PoolParameters {
            reserve_factor: pool.reserve_factor,
            total_stable_debt: pool.total_stable_debt,
            total_variable_debt: variable_debt,
            total_deposits: deposits,
            stable_borrow_rate: pool.stable_borrow_rate,
            reward_deposit: annualize_emission(
                self.rewards.deposit_emission_per_second,
                self.rewards.reward_price,
                self.rewards.discount_bps,
            )?,
            reward_borrow: annualize_emission(
                self.rewards.borrow_emission_per_second,
                self.rewards.reward_price,
                self.rewards.discount_bps,
            )?,
            strategy_assets,
            current_borrow: strategy.borrows,
            slope1: pool.slope1,
            slope2: pool.slope2,
            r0: pool.base_rate,
            u_optimal: pool.optimal_utilization,
        };
        params
            .validate()
            .with_context(|| format!("{}: invalid pool parameters", pool.name))?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{fraction, reference_pool};
    use crate::ray_math::{ray, RAY};

    const REFERENCE: &str = r#"
        [pool]
        name = "usdc-main"
        reserve_factor = "0.1"
        available_liquidity = "812664505.140562"
        total_stable_debt = "11958029.754937"
        total_variable_debt = "1425711403.399322"
        stable_borrow_rate = "0.10887006805191763835982482"
        base_rate = "0"
        slope1 = "0.04"
        slope2 = "0.6"
        optimal_utilization = "0.9"

        [rewards]
        deposit_emission_per_second = "0.00190325877351096"
        borrow_emission_per_second = "0.00380651754702192"
        reward_price = "130"

        [strategy]
        deposits = "1000000"
        borrows = "0"
    "#;

    #[test]
    fn test_reference_snapshot_parameters() {
        let snapshot: PoolSnapshot = toml::from_str(REFERENCE).unwrap();
        assert_eq!(snapshot.name(), "usdc-main");
        assert_eq!(snapshot.rewards.discount_bps, 10_000);
        assert_eq!(snapshot.strategy.max_collat_ratio, None);
        assert_eq!(snapshot.into_parameters().unwrap(), reference_pool());
    }

    #[test]
    fn test_strategy_borrow_is_removed_from_pool() {
        let mut snapshot: PoolSnapshot = toml::from_str(REFERENCE).unwrap();
        snapshot.strategy.deposits = ray(3_000_000);
        snapshot.strategy.borrows = ray(2_000_000);
        snapshot.strategy.undeployed = ray(500);
        let params = snapshot.into_parameters().unwrap();
        let reference = reference_pool();

        assert_eq!(params.current_borrow, ray(2_000_000));
        assert_eq!(
            params.total_variable_debt,
            reference.total_variable_debt - ray(2_000_000)
        );
        assert_eq!(
            params.total_deposits,
            reference.total_deposits - ray(2_000_000) + ray(500)
        );
        assert_eq!(params.strategy_assets, ray(1_000_500));
    }

    #[test]
    fn test_round_to_token() {
        let mut snapshot: PoolSnapshot = toml::from_str(REFERENCE).unwrap();
        let amount = ray(1234) + RAY / crate::ray_math::int(3); // 1234.333...
        assert_eq!(snapshot.round_to_token(amount).unwrap(), amount);
        assert_eq!(snapshot.token_units(amount), None);

        snapshot.pool.decimals = Some(6);
        assert_eq!(
            snapshot.round_to_token(amount).unwrap(),
            crate::ray_math::parse_ray("1234.333333").unwrap()
        );
        assert_eq!(snapshot.token_units(amount), Some(U256::from(1_234_333_333u64)));
    }

    #[test]
    fn test_decimals_from_toml() {
        let with_decimals = REFERENCE.replace(
            "name = \"usdc-main\"",
            "name = \"usdc-main\"\n        decimals = 6",
        );
        let snapshot: PoolSnapshot = toml::from_str(&with_decimals).unwrap();
        assert_eq!(snapshot.pool.decimals, Some(6));
        assert_eq!(snapshot.token_units(ray(2)), Some(U256::from(2_000_000u64)));
    }

    #[test]
    fn test_rejects_inconsistent_strategy() {
        let mut snapshot: PoolSnapshot = toml::from_str(REFERENCE).unwrap();
        snapshot.strategy.borrows = ray(2_000_000);
        assert!(snapshot.into_parameters().is_err());
    }

    #[test]
    fn test_rejects_invalid_pool() {
        let mut snapshot: PoolSnapshot = toml::from_str(REFERENCE).unwrap();
        snapshot.pool.optimal_utilization = ray(1);
        let err = snapshot.into_parameters().unwrap_err();
        assert!(format!("{err:#}").contains("u_optimal"));
    }

    #[test]
    fn test_rejects_bad_decimal() {
        let broken = REFERENCE.replace("\"0.04\"", "\"four percent\"");
        assert!(toml::from_str::<PoolSnapshot>(&broken).is_err());
    }

    #[test]
    fn test_optional_fields_round_trip() {
        let mut snapshot: PoolSnapshot = toml::from_str(REFERENCE).unwrap();
        snapshot.strategy.max_collat_ratio = Some(fraction(3, 4));
        snapshot.rewards.discount_bps = 9_500;
        let toml_str = toml::to_string_pretty(&snapshot).unwrap();
        assert!(toml_str.contains("max_collat_ratio"));

        let parsed: PoolSnapshot = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
