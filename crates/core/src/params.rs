//! Pool snapshot consumed by the rate, revenue and optimizer models.

use alloy::primitives::{I256, U256};

use crate::error::EngineError;
use crate::ray_math::{mul_div, Ray, RAY};

/// Largest accepted amount: 1e11 tokens in RAY (1e38).
/// Keeps every amount-by-amount product inside 256 bits.
pub const MAX_RAY_AMOUNT: Ray = I256::from_raw(U256::from_limbs([
    687_399_551_400_673_280,
    5_421_010_862_427_522_170,
    0,
    0,
]));

/// Largest accepted annual rate: 1000x (100000%) in RAY (1e30).
pub const MAX_RAY_RATE: Ray = I256::from_raw(U256::from_limbs([
    5_076_944_270_305_263_616,
    54_210_108_624,
    0,
    0,
]));

/// Snapshot of a money-market pool and the strategy's position in it.
///
/// All fields are RAY-scaled. Amounts are in token units, rates are annual
/// fractions, and rewards are annual values expressed in the borrowed token.
/// `total_variable_debt` and `total_deposits` exclude the strategy's own borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParameters {
    /// Share of borrower interest retained by the protocol
    pub reserve_factor: Ray,
    pub total_stable_debt: Ray,
    pub total_variable_debt: Ray,
    pub total_deposits: Ray,
    /// Average rate paid by stable borrowers
    pub stable_borrow_rate: Ray,
    /// Annual reward emission to depositors
    pub reward_deposit: Ray,
    /// Annual reward emission to variable borrowers
    pub reward_borrow: Ray,
    /// Strategy funds deposited in the pool, net of its borrow
    pub strategy_assets: Ray,
    /// Strategy borrow currently outstanding
    pub current_borrow: Ray,
    /// Rate increase from zero utilization up to the kink
    pub slope1: Ray,
    /// Rate increase from the kink up to full utilization
    pub slope2: Ray,
    /// Base rate at zero utilization
    pub r0: Ray,
    /// Utilization at which the curve switches slope
    pub u_optimal: Ray,
}

impl PoolParameters {
    /// Check the snapshot is internally consistent and within representable bounds.
    pub fn validate(&self) -> Result<(), EngineError> {
        let amounts = [
            ("total_stable_debt", self.total_stable_debt),
            ("total_variable_debt", self.total_variable_debt),
            ("total_deposits", self.total_deposits),
            ("reward_deposit", self.reward_deposit),
            ("reward_borrow", self.reward_borrow),
            ("strategy_assets", self.strategy_assets),
            ("current_borrow", self.current_borrow),
        ];
        for (field, value) in amounts {
            check_range(field, value, MAX_RAY_AMOUNT, "exceeds maximum amount")?;
        }

        let rates = [
            ("reserve_factor", self.reserve_factor),
            ("stable_borrow_rate", self.stable_borrow_rate),
            ("slope1", self.slope1),
            ("slope2", self.slope2),
            ("r0", self.r0),
            ("u_optimal", self.u_optimal),
        ];
        for (field, value) in rates {
            check_range(field, value, MAX_RAY_RATE, "exceeds maximum rate")?;
        }

        if self.reserve_factor > RAY {
            return Err(EngineError::InvalidParameter {
                field: "reserve_factor",
                reason: "must not exceed 1",
            });
        }
        if self.u_optimal.is_zero() || self.u_optimal >= RAY {
            return Err(EngineError::InvalidParameter {
                field: "u_optimal",
                reason: "must be strictly between 0 and 1",
            });
        }
        if self.total_debt() > self.total_deposits {
            return Err(EngineError::InvalidParameter {
                field: "total_deposits",
                reason: "outstanding debt exceeds deposits",
            });
        }
        if self.strategy_assets > self.total_deposits {
            return Err(EngineError::InvalidParameter {
                field: "strategy_assets",
                reason: "strategy assets exceed pool deposits",
            });
        }
        Ok(())
    }

    /// Stable plus variable debt, excluding the strategy's borrow.
    #[inline]
    pub fn total_debt(&self) -> Ray {
        self.total_stable_debt + self.total_variable_debt
    }

    /// Idle liquidity, the largest borrow the pool can serve.
    #[inline]
    pub fn max_feasible_borrow(&self) -> Ray {
        self.total_deposits - self.total_debt()
    }

    /// Reject a candidate borrow outside `[0, max_feasible_borrow]`.
    pub fn check_borrow(&self, to_borrow: Ray) -> Result<(), EngineError> {
        if self.total_deposits.is_zero() {
            return Err(EngineError::ZeroDeposits);
        }
        if to_borrow.is_negative() {
            return Err(EngineError::NegativeBorrow { to_borrow });
        }
        let available = self.max_feasible_borrow();
        if to_borrow > available {
            return Err(EngineError::ExceedsLiquidity {
                to_borrow,
                available,
            });
        }
        Ok(())
    }

    /// Borrow at which post-fold utilization reaches `u_optimal`.
    ///
    /// `None` when the pool already sits at or above the kink with no borrow.
    pub fn kink_borrow(&self) -> Result<Option<Ray>, EngineError> {
        let debt_at_kink = mul_div(self.u_optimal, self.total_deposits, RAY, "kink debt")?;
        let headroom = debt_at_kink - self.total_debt();
        if headroom <= I256::ZERO {
            return Ok(None);
        }
        mul_div(headroom, RAY, RAY - self.u_optimal, "kink borrow").map(Some)
    }
}

fn check_range(
    field: &'static str,
    value: Ray,
    max: Ray,
    too_large: &'static str,
) -> Result<(), EngineError> {
    if value.is_negative() {
        return Err(EngineError::InvalidParameter {
            field,
            reason: "must not be negative",
        });
    }
    if value > max {
        return Err(EngineError::InvalidParameter {
            field,
            reason: too_large,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures::{reference_pool, simple_pool};
    use crate::ray_math::{int, ray};

    #[test]
    fn test_reference_pool_is_valid() {
        assert!(reference_pool().validate().is_ok());
        assert!(simple_pool().validate().is_ok());
    }

    #[test]
    fn test_max_bounds() {
        assert_eq!(MAX_RAY_AMOUNT, ray(100_000_000_000));
        assert_eq!(MAX_RAY_RATE, ray(1000));
    }

    #[test]
    fn test_validate_rejects_bad_u_optimal() {
        let mut params = simple_pool();
        params.u_optimal = RAY;
        let err = params.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameters);
        assert!(matches!(
            err,
            EngineError::InvalidParameter { field: "u_optimal", .. }
        ));

        params.u_optimal = I256::ZERO;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_and_oversized_values() {
        let mut params = simple_pool();
        params.reward_borrow = -int(1);
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameter { field: "reward_borrow", reason: "must not be negative" })
        ));

        let mut params = simple_pool();
        params.slope2 = MAX_RAY_RATE + int(1);
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameter { field: "slope2", .. })
        ));

        let mut params = simple_pool();
        params.reserve_factor = RAY + int(1);
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameter { field: "reserve_factor", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inconsistent_balances() {
        let mut params = simple_pool();
        params.total_variable_debt = params.total_deposits + int(1);
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameter { field: "total_deposits", .. })
        ));

        let mut params = simple_pool();
        params.strategy_assets = params.total_deposits + int(1);
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameter { field: "strategy_assets", .. })
        ));
    }

    #[test]
    fn test_check_borrow_domain() {
        let params = simple_pool();
        assert_eq!(params.max_feasible_borrow(), ray(105));
        assert!(params.check_borrow(I256::ZERO).is_ok());
        assert!(params.check_borrow(ray(105)).is_ok());
        assert_eq!(
            params.check_borrow(-int(1)),
            Err(EngineError::NegativeBorrow { to_borrow: -int(1) })
        );
        assert_eq!(
            params.check_borrow(ray(105) + int(1)),
            Err(EngineError::ExceedsLiquidity {
                to_borrow: ray(105) + int(1),
                available: ray(105),
            })
        );

        let mut empty = params;
        empty.total_deposits = I256::ZERO;
        empty.total_variable_debt = I256::ZERO;
        empty.strategy_assets = I256::ZERO;
        assert_eq!(empty.check_borrow(I256::ZERO), Err(EngineError::ZeroDeposits));
    }

    #[test]
    fn test_kink_borrow() {
        // 1000 deposits, 895 debt, kink at 0.9: (900 - 895) / 0.1 = 50
        assert_eq!(simple_pool().kink_borrow().unwrap(), Some(ray(50)));

        let mut above = simple_pool();
        above.total_variable_debt = ray(950);
        assert_eq!(above.kink_borrow().unwrap(), None);
    }
}
