//! Kinked utilization rate curve and its derivatives with respect to the
//! strategy's borrow.
//!
//! The folding strategy redeposits what it borrows, so a borrow `b` raises
//! both debt and deposits:
//!
//! ```text
//! u(b)   = (S + V + b) / (D + b)
//! u'(b)  = (D - S - V) / (D + b)^2
//! u''(b) = -2 u'(b) / (D + b)
//! ```
//!
//! Below the kink the rate is `r0 + slope1 * u / u_opt`; above it is
//! `r0 + slope1 + slope2 * (u - u_opt) / (1 - u_opt)`.

use crate::error::EngineError;
use crate::params::PoolParameters;
use crate::ray_math::{mul_div, Ray, RAY, TWO};

/// Segment of the rate curve an evaluation used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateBranch {
    /// `u <= u_optimal`
    BelowKink,
    /// `u > u_optimal`
    AboveKink,
}

impl RateBranch {
    #[inline]
    pub fn for_utilization(utilization: Ray, u_optimal: Ray) -> Self {
        if utilization <= u_optimal {
            Self::BelowKink
        } else {
            Self::AboveKink
        }
    }
}

/// Borrow rate and its first two derivatives at a candidate borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestPrimes {
    /// Annual borrow rate `r(u)`
    pub interest: Ray,
    pub interest_prime: Ray,
    pub interest_prime_2nd: Ray,
    pub branch: RateBranch,
}

/// Post-fold utilization and its derivatives.
#[derive(Debug, Clone, Copy)]
struct UtilizationPrimes {
    utilization: Ray,
    prime: Ray,
    prime_2nd: Ray,
}

impl UtilizationPrimes {
    fn at(to_borrow: Ray, params: &PoolParameters) -> Result<Self, EngineError> {
        let deposits = params.total_deposits + to_borrow;
        let utilization = mul_div(params.total_debt() + to_borrow, RAY, deposits, "utilization")?;
        let prime = mul_div(RAY, params.max_feasible_borrow(), deposits, "utilization'")?;
        let prime = mul_div(prime, RAY, deposits, "utilization'")?;
        let prime_2nd = mul_div(-TWO * prime, RAY, deposits, "utilization''")?;
        Ok(Self {
            utilization,
            prime,
            prime_2nd,
        })
    }

    fn rate_on(&self, branch: RateBranch, params: &PoolParameters) -> Result<InterestPrimes, EngineError> {
        let (interest, interest_prime, interest_prime_2nd) = match branch {
            RateBranch::BelowKink => {
                let slope = params.slope1;
                let span = params.u_optimal;
                (
                    params.r0 + mul_div(slope, self.utilization, span, "rate")?,
                    mul_div(slope, self.prime, span, "rate'")?,
                    mul_div(slope, self.prime_2nd, span, "rate''")?,
                )
            }
            RateBranch::AboveKink => {
                let slope = params.slope2;
                let span = RAY - params.u_optimal;
                let excess = self.utilization - params.u_optimal;
                (
                    params.r0 + params.slope1 + mul_div(slope, excess, span, "rate")?,
                    mul_div(slope, self.prime, span, "rate'")?,
                    mul_div(slope, self.prime_2nd, span, "rate''")?,
                )
            }
        };
        Ok(InterestPrimes {
            interest,
            interest_prime,
            interest_prime_2nd,
            branch,
        })
    }
}

/// Borrow rate and derivatives after borrowing `to_borrow`.
///
/// The branch follows the post-fold utilization; value and derivatives
/// always come from the same branch.
pub fn compute_interest_primes(
    to_borrow: Ray,
    params: &PoolParameters,
) -> Result<InterestPrimes, EngineError> {
    params.validate()?;
    evaluate(None, to_borrow, params)
}

/// Same as [`compute_interest_primes`] but evaluated on a fixed branch.
///
/// Used for one-sided derivatives at the kink.
pub fn interest_primes_on(
    branch: RateBranch,
    to_borrow: Ray,
    params: &PoolParameters,
) -> Result<InterestPrimes, EngineError> {
    params.validate()?;
    evaluate(Some(branch), to_borrow, params)
}

/// Evaluate on an already validated snapshot.
pub(crate) fn evaluate(
    branch: Option<RateBranch>,
    to_borrow: Ray,
    params: &PoolParameters,
) -> Result<InterestPrimes, EngineError> {
    params.check_borrow(to_borrow)?;
    let curve = UtilizationPrimes::at(to_borrow, params)?;
    let branch = branch
        .unwrap_or_else(|| RateBranch::for_utilization(curve.utilization, params.u_optimal));
    curve.rate_on(branch, params)
}
