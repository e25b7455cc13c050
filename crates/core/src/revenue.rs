//! Net annual strategy revenue and its derivatives with respect to the borrow.
//!
//! With `b` the borrow, `Dn = D + b` and `B = V + b`:
//!
//! ```text
//! f1  = (b + A) (1 - rf) / Dn            strategy share of supplier income
//! f2  = S * stable_rate + (b + V) * r    pool borrower interest per year
//! rev = f1 * f2
//!     + b * reward_borrow / B            borrow rewards (variable debt only)
//!     + (b + A) * reward_deposit / Dn    deposit rewards
//!     - b * r                            interest paid on the borrow
//! ```

use alloy::primitives::I256;

use crate::error::EngineError;
use crate::params::PoolParameters;
use crate::rate_model::{self, InterestPrimes, RateBranch};
use crate::ray_math::{mul_div, Ray, RAY, TWO};

/// Net revenue and its first two derivatives at a candidate borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenuePrimes {
    pub revenue: Ray,
    pub revenue_prime: Ray,
    pub revenue_prime_2nd: Ray,
}

/// Revenue and derivatives after borrowing `to_borrow`.
pub fn compute_revenue_primes(
    to_borrow: Ray,
    params: &PoolParameters,
) -> Result<RevenuePrimes, EngineError> {
    params.validate()?;
    evaluate(None, to_borrow, params)
}

/// Same as [`compute_revenue_primes`] with the rate curve held on `branch`.
pub fn revenue_primes_on(
    branch: RateBranch,
    to_borrow: Ray,
    params: &PoolParameters,
) -> Result<RevenuePrimes, EngineError> {
    params.validate()?;
    evaluate(Some(branch), to_borrow, params)
}

/// Revenue value only.
pub fn compute_revenue(to_borrow: Ray, params: &PoolParameters) -> Result<Ray, EngineError> {
    params.validate()?;
    revenue_value(to_borrow, params)
}

pub(crate) fn revenue_value(to_borrow: Ray, params: &PoolParameters) -> Result<Ray, EngineError> {
    let rate = rate_model::evaluate(None, to_borrow, params)?;
    let terms = Terms::new(to_borrow, params, &rate)?;
    terms.value()
}

pub(crate) fn evaluate(
    branch: Option<RateBranch>,
    to_borrow: Ray,
    params: &PoolParameters,
) -> Result<RevenuePrimes, EngineError> {
    let rate = rate_model::evaluate(branch, to_borrow, params)?;
    let terms = Terms::new(to_borrow, params, &rate)?;
    let revenue = terms.value()?;
    let (revenue_prime, revenue_prime_2nd) = terms.derivatives()?;
    Ok(RevenuePrimes {
        revenue,
        revenue_prime,
        revenue_prime_2nd,
    })
}

/// Intermediate quantities shared by the value and its derivatives.
struct Terms<'a> {
    params: &'a PoolParameters,
    rate: &'a InterestPrimes,
    to_borrow: Ray,
    /// `D + b`
    deposits: Ray,
    /// `V + b`
    variable_debt: Ray,
    /// `1 - rf`
    supplier_share: Ray,
    f1: Ray,
    f2: Ray,
}

impl<'a> Terms<'a> {
    fn new(
        to_borrow: Ray,
        params: &'a PoolParameters,
        rate: &'a InterestPrimes,
    ) -> Result<Self, EngineError> {
        let deposits = params.total_deposits + to_borrow;
        let variable_debt = params.total_variable_debt + to_borrow;
        let supplier_share = RAY - params.reserve_factor;

        let f1 = mul_div(
            to_borrow + params.strategy_assets,
            supplier_share,
            deposits,
            "supplier share",
        )?;
        let f2 = mul_div(
            params.total_stable_debt,
            params.stable_borrow_rate,
            RAY,
            "stable interest",
        )? + mul_div(variable_debt, rate.interest, RAY, "variable interest")?;

        Ok(Self {
            params,
            rate,
            to_borrow,
            deposits,
            variable_debt,
            supplier_share,
            f1,
            f2,
        })
    }

    fn value(&self) -> Result<Ray, EngineError> {
        let p = self.params;
        let b = self.to_borrow;

        let supply_income = mul_div(self.f1, self.f2, RAY, "supply income")?;
        let borrow_rewards = if self.variable_debt.is_zero() {
            I256::ZERO
        } else {
            mul_div(b, p.reward_borrow, self.variable_debt, "borrow rewards")?
        };
        let deposit_rewards = mul_div(
            b + p.strategy_assets,
            p.reward_deposit,
            self.deposits,
            "deposit rewards",
        )?;
        let borrow_cost = mul_div(b, self.rate.interest, RAY, "borrow cost")?;

        Ok(supply_income + borrow_rewards + deposit_rewards - borrow_cost)
    }

    fn derivatives(&self) -> Result<(Ray, Ray), EngineError> {
        let p = self.params;
        let b = self.to_borrow;
        let r = self.rate.interest;
        let r1 = self.rate.interest_prime;
        let r2 = self.rate.interest_prime_2nd;
        let idle_assets = p.total_deposits - p.strategy_assets;

        // First derivatives of each factor
        let f1p = mul_div(idle_assets, self.supplier_share, self.deposits, "supplier share'")?;
        let f1p = mul_div(f1p, RAY, self.deposits, "supplier share'")?;
        let f2p = r + mul_div(self.variable_debt, r1, RAY, "variable interest'")?;
        let f3p = r + mul_div(b, r1, RAY, "borrow cost'")?;
        let borrow_rewards_p = if self.variable_debt.is_zero() {
            I256::ZERO
        } else {
            let share = mul_div(
                p.reward_borrow,
                p.total_variable_debt,
                self.variable_debt,
                "borrow rewards'",
            )?;
            mul_div(share, RAY, self.variable_debt, "borrow rewards'")?
        };
        let deposit_rewards_p = mul_div(p.reward_deposit, idle_assets, self.deposits, "deposit rewards'")?;
        let deposit_rewards_p = mul_div(deposit_rewards_p, RAY, self.deposits, "deposit rewards'")?;

        let revenue_prime = mul_div(f1p, self.f2, RAY, "revenue'")?
            + mul_div(self.f1, f2p, RAY, "revenue'")?
            - f3p
            + borrow_rewards_p
            + deposit_rewards_p;

        // Second derivatives
        let f1p2 = mul_div(-TWO * f1p, RAY, self.deposits, "supplier share''")?;
        let f2p2 = TWO * r1 + mul_div(self.variable_debt, r2, RAY, "variable interest''")?;
        let f3p2 = TWO * r1 + mul_div(b, r2, RAY, "borrow cost''")?;
        let borrow_rewards_p2 = if self.variable_debt.is_zero() {
            I256::ZERO
        } else {
            mul_div(-TWO * borrow_rewards_p, RAY, self.variable_debt, "borrow rewards''")?
        };
        let deposit_rewards_p2 =
            mul_div(-TWO * deposit_rewards_p, RAY, self.deposits, "deposit rewards''")?;

        let revenue_prime_2nd = mul_div(f1p2, self.f2, RAY, "revenue''")?
            + TWO * mul_div(f1p, f2p, RAY, "revenue''")?
            + mul_div(self.f1, f2p2, RAY, "revenue''")?
            - f3p2
            + borrow_rewards_p2
            + deposit_rewards_p2;

        Ok((revenue_prime, revenue_prime_2nd))
    }
}
