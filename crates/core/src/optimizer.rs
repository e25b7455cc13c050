//! Revenue-maximizing borrow search.
//!
//! The rate curve has a kink, so revenue is smooth only piecewise. The
//! feasible interval is split at the kink borrow and each piece is searched
//! on a fixed branch with a safeguarded Newton iteration on `revenue'`. The
//! answer is the best of the bounds, the kink and every segment optimum.

use alloy::primitives::I256;
use smallvec::SmallVec;
use tracing::{debug, instrument, trace, warn};

use crate::config::OptimizerConfig;
use crate::error::EngineError;
use crate::params::PoolParameters;
use crate::rate_model::RateBranch;
use crate::ray_math::{mul_div, ray_to_f64, Ray, RAY, TWO};
use crate::revenue;

/// Closed interval of borrow amounts to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowBounds {
    pub lower: Ray,
    pub upper: Ray,
}

impl BorrowBounds {
    pub fn new(lower: Ray, upper: Ray) -> Self {
        Self { lower, upper }
    }

    /// `[0, idle liquidity]`
    pub fn feasible(params: &PoolParameters) -> Self {
        Self {
            lower: I256::ZERO,
            upper: params.max_feasible_borrow(),
        }
    }

    fn check(&self, params: &PoolParameters) -> Result<(), EngineError> {
        let max_feasible = params.max_feasible_borrow();
        if self.lower.is_negative() || self.lower > self.upper || self.upper > max_feasible {
            return Err(EngineError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
                max_feasible,
            });
        }
        Ok(())
    }
}

/// Outcome of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowRecommendation {
    /// Strategy borrow maximizing revenue
    pub to_borrow: Ray,
    pub revenue_at_optimum: Ray,
    /// Borrow outstanding in the snapshot
    pub current_borrow: Ray,
    /// False when the iteration budget ran out before a segment settled
    pub converged: bool,
    pub iterations: u32,
}

impl BorrowRecommendation {
    /// Signed change to apply: positive to borrow more, negative to repay.
    pub fn delta(&self) -> Ray {
        self.to_borrow - self.current_borrow
    }
}

/// Piece of the search interval on which the rate stays on one branch.
#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: Ray,
    upper: Ray,
    branch: RateBranch,
}

#[derive(Debug, Clone, Copy)]
enum SegmentOutcome {
    /// Revenue is monotone on the segment, the maximum is an endpoint
    NoInterior,
    Converged(Ray),
    Exhausted(Ray),
}

/// Find the borrow in `bounds` that maximizes net revenue.
///
/// Running out of iterations is not an error: the best candidate seen is
/// returned with `converged = false`.
#[instrument(skip_all, fields(lower = ray_to_f64(bounds.lower), upper = ray_to_f64(bounds.upper)))]
pub fn find_optimal_borrow(
    params: &PoolParameters,
    bounds: BorrowBounds,
    config: &OptimizerConfig,
) -> Result<BorrowRecommendation, EngineError> {
    params.validate()?;
    bounds.check(params)?;

    if bounds.lower == bounds.upper {
        return Ok(BorrowRecommendation {
            to_borrow: bounds.lower,
            revenue_at_optimum: revenue::revenue_value(bounds.lower, params)?,
            current_borrow: params.current_borrow,
            converged: true,
            iterations: 0,
        });
    }

    let mut candidates: SmallVec<[Ray; 5]> = SmallVec::new();
    candidates.push(bounds.lower);
    candidates.push(bounds.upper);

    let mut segments: SmallVec<[Segment; 2]> = SmallVec::new();
    match params.kink_borrow()? {
        Some(kink) if kink > bounds.lower && kink < bounds.upper => {
            debug!(kink = ray_to_f64(kink), "Splitting search at rate kink");
            candidates.push(kink);
            segments.push(Segment {
                lower: bounds.lower,
                upper: kink,
                branch: RateBranch::BelowKink,
            });
            segments.push(Segment {
                lower: kink,
                upper: bounds.upper,
                branch: RateBranch::AboveKink,
            });
        }
        Some(kink) if kink >= bounds.upper => segments.push(Segment {
            lower: bounds.lower,
            upper: bounds.upper,
            branch: RateBranch::BelowKink,
        }),
        _ => segments.push(Segment {
            lower: bounds.lower,
            upper: bounds.upper,
            branch: RateBranch::AboveKink,
        }),
    }

    let mut iterations = 0u32;
    let mut converged = true;
    for segment in &segments {
        match search_segment(params, segment, config, &mut iterations)? {
            SegmentOutcome::NoInterior => {
                debug!(branch = ?segment.branch, "No interior maximum on segment");
            }
            SegmentOutcome::Converged(borrow) => {
                debug!(branch = ?segment.branch, borrow = ray_to_f64(borrow), "Segment converged");
                candidates.push(borrow);
            }
            SegmentOutcome::Exhausted(borrow) => {
                converged = false;
                candidates.push(borrow);
            }
        }
    }

    // Ties keep the smaller borrow
    let mut best: Option<(Ray, Ray)> = None;
    for &candidate in &candidates {
        let value = revenue::revenue_value(candidate, params)?;
        best = match best {
            Some((borrow, best_value))
                if best_value > value || (best_value == value && borrow <= candidate) =>
            {
                Some((borrow, best_value))
            }
            _ => Some((candidate, value)),
        };
    }
    // Bounds are always candidates
    let (to_borrow, revenue_at_optimum) = best.unwrap_or((bounds.lower, I256::ZERO));

    if !converged {
        warn!(
            iterations,
            max_iterations = config.max_iterations,
            borrow = ray_to_f64(to_borrow),
            "Borrow search exhausted iteration budget"
        );
    }
    debug!(
        borrow = ray_to_f64(to_borrow),
        revenue = ray_to_f64(revenue_at_optimum),
        iterations,
        "Optimal borrow found"
    );

    Ok(BorrowRecommendation {
        to_borrow,
        revenue_at_optimum,
        current_borrow: params.current_borrow,
        converged,
        iterations,
    })
}

/// Locate the root of `revenue'` inside one segment.
///
/// The bracket `[low, high]` always satisfies `revenue'(low) > 0 > revenue'(high)`.
fn search_segment(
    params: &PoolParameters,
    segment: &Segment,
    config: &OptimizerConfig,
    iterations: &mut u32,
) -> Result<SegmentOutcome, EngineError> {
    let branch = Some(segment.branch);
    let slope_at_lower = revenue::evaluate(branch, segment.lower, params)?.revenue_prime;
    let slope_at_upper = revenue::evaluate(branch, segment.upper, params)?.revenue_prime;
    if slope_at_lower <= I256::ZERO || slope_at_upper >= I256::ZERO {
        return Ok(SegmentOutcome::NoInterior);
    }

    let (mut low, mut high) = (segment.lower, segment.upper);
    let mut x = (low + high) / TWO;

    while *iterations < config.max_iterations {
        *iterations += 1;
        let primes = revenue::evaluate(branch, x, params)?;
        let slope = primes.revenue_prime;
        let curvature = primes.revenue_prime_2nd;
        if slope.is_zero() {
            return Ok(SegmentOutcome::Converged(x));
        }
        if slope.is_positive() {
            low = x;
        } else {
            high = x;
        }

        let mut next = None;
        if curvature.is_negative() {
            let mut step = mul_div(slope, RAY, curvature, "newton step")?;
            for _ in 0..=config.damping_steps {
                let candidate = x - step;
                if candidate > low && candidate < high {
                    next = Some(candidate);
                    break;
                }
                step /= TWO;
            }
        }
        let next = next.unwrap_or((low + high) / TWO);

        trace!(
            iteration = *iterations,
            x = ray_to_f64(x),
            slope = ray_to_f64(slope),
            next = ray_to_f64(next),
            "Newton iteration"
        );

        let moved = (next - x).unsigned_abs();
        x = next;
        if moved <= config.tolerance.unsigned_abs() || high - low <= config.tolerance {
            return Ok(SegmentOutcome::Converged(x));
        }
    }
    Ok(SegmentOutcome::Exhausted(x))
}

/// Cap a borrow at what a fold of `strategy_assets` can carry at collateral
/// ratio `max_collat_ratio`: `assets * cr / (1 - cr)`.
pub fn constrained_borrow(
    optimal: Ray,
    strategy_assets: Ray,
    max_collat_ratio: Ray,
) -> Result<Ray, EngineError> {
    if max_collat_ratio.is_negative() || max_collat_ratio >= RAY {
        return Err(EngineError::InvalidParameter {
            field: "max_collat_ratio",
            reason: "must be in [0, 1)",
        });
    }
    let cap = mul_div(strategy_assets, max_collat_ratio, RAY - max_collat_ratio, "collateral cap")?;
    Ok(optimal.min(cap))
}
