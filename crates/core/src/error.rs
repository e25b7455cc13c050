//! Error types for the borrow-optimization engine.

use thiserror::Error;

use crate::ray_math::Ray;

/// Broad classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The evaluation point or search bounds lie outside the feasible domain.
    Domain,
    /// The pool snapshot itself is malformed.
    InvalidParameters,
}

/// Errors that can occur while evaluating or optimizing a pool snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Pool has no deposits, utilization is undefined
    #[error("Pool has zero total deposits")]
    ZeroDeposits,

    /// Candidate borrow is negative
    #[error("Negative borrow amount {to_borrow}")]
    NegativeBorrow { to_borrow: Ray },

    /// Candidate borrow exceeds the pool's idle liquidity
    #[error("Borrow {to_borrow} exceeds available liquidity {available}")]
    ExceedsLiquidity { to_borrow: Ray, available: Ray },

    /// Search bounds are inverted or outside the feasible domain
    #[error("Invalid borrow bounds [{lower}, {upper}] (feasible maximum {max_feasible})")]
    InvalidBounds {
        lower: Ray,
        upper: Ray,
        max_feasible: Ray,
    },

    /// Intermediate product or quotient does not fit in 256 bits
    #[error("Arithmetic overflow computing {context}")]
    Overflow { context: &'static str },

    /// Snapshot field fails validation
    #[error("Invalid pool parameter {field}: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: &'static str,
    },
}

impl EngineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameters,
            Self::ZeroDeposits
            | Self::NegativeBorrow { .. }
            | Self::ExceedsLiquidity { .. }
            | Self::InvalidBounds { .. }
            | Self::Overflow { .. } => ErrorKind::Domain,
        }
    }
}
