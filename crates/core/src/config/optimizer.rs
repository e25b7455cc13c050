//! Optimizer tuning with profile support.
//!
//! Profiles trade precision for speed (default, precise, fast). A profile
//! can also be loaded from a TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::ray_string;
use crate::ray_math::{int, ray_to_f64, Ray};

/// Search tolerances and budget for [`crate::find_optimal_borrow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Profile name (for logging/identification)
    #[serde(default = "default_profile_name")]
    pub profile: String,

    /// Newton/bisection iterations shared by all curve segments
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop once the step or bracket width falls below this (token units)
    #[serde(default = "default_tolerance", with = "ray_string")]
    pub tolerance: Ray,

    /// Times a Newton step is halved before falling back to bisection
    #[serde(default = "default_damping_steps")]
    pub damping_steps: u32,
}

fn default_profile_name() -> String {
    "default".to_string()
}
fn default_max_iterations() -> u32 {
    128
}
/// 1e-9 token
fn default_tolerance() -> Ray {
    int(1_000_000_000_000_000_000)
}
fn default_damping_steps() -> u32 {
    4
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            profile: default_profile_name(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            damping_steps: default_damping_steps(),
        }
    }
}

impl OptimizerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read optimizer config {}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse optimizer config {}", path))?;
        Ok(config)
    }

    /// Tight tolerance and a larger budget, for offline analysis.
    pub fn precise() -> Self {
        Self {
            profile: "precise".to_string(),
            max_iterations: 512,
            tolerance: int(1_000_000_000_000), // 1e-15 token
            damping_steps: 8,
        }
    }

    /// Coarse tolerance for quick keeper checks.
    pub fn fast() -> Self {
        Self {
            profile: "fast".to_string(),
            max_iterations: 32,
            tolerance: int(1_000_000_000_000_000_000) * int(1_000_000), // 1e-3 token
            damping_steps: 2,
        }
    }

    /// Get profile from environment variable OPTIMIZER_PROFILE, or default.
    /// Supported values: default, precise, fast, or a path to a TOML file.
    pub fn from_env() -> Result<Self> {
        let profile = std::env::var("OPTIMIZER_PROFILE").unwrap_or_else(|_| "default".to_string());
        Self::from_profile(&profile)
    }

    /// Resolve a profile name, or load the file when given a `.toml` path.
    pub fn from_profile(profile: &str) -> Result<Self> {
        if profile.ends_with(".toml") {
            return Self::from_file(profile);
        }
        Ok(match profile.to_lowercase().as_str() {
            "precise" => Self::precise(),
            "fast" => Self::fast(),
            _ => Self::default(),
        })
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        tracing::info!(
            profile = %self.profile,
            max_iterations = self.max_iterations,
            tolerance = ray_to_f64(self.tolerance),
            damping_steps = self.damping_steps,
            "Optimizer configuration loaded"
        );
    }
}
