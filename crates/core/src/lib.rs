//! Leveraged-borrow optimization core.
//!
//! This crate provides the pure evaluation engine for a folding lending strategy:
//! - Signed RAY (1e27) fixed-point arithmetic
//! - Kinked utilization rate curve with first/second derivatives
//! - Net strategy revenue (supply income, reward emissions, borrow cost) and derivatives
//! - Branch-aware Newton search for the revenue-maximizing borrow
//! - Pool snapshot and optimizer configuration loading
//!
//! Every evaluation is a pure function of a [`PoolParameters`] snapshot.

pub mod config;
mod error;
#[cfg(test)]
mod fixtures;
mod optimizer;
mod params;
mod rate_model;
pub mod ray_math;
mod revenue;

pub use config::{OptimizerConfig, PoolSnapshot, SnapshotRegistry};
pub use error::{EngineError, ErrorKind};
pub use optimizer::{constrained_borrow, find_optimal_borrow, BorrowBounds, BorrowRecommendation};
pub use params::{PoolParameters, MAX_RAY_AMOUNT, MAX_RAY_RATE};
pub use rate_model::{compute_interest_primes, interest_primes_on, InterestPrimes, RateBranch};
pub use ray_math::{Ray, RAY};
pub use revenue::{compute_revenue, compute_revenue_primes, revenue_primes_on, RevenuePrimes};
