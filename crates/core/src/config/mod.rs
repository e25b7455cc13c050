//! Configuration for the borrow optimizer.
//!
//! This module provides:
//! - Optimizer tuning (profiles, tolerance, iteration budget)
//! - Pool snapshot files (pool state, reward emissions, strategy position)
//! - Snapshot registry for loading every pool in a directory

mod optimizer;
mod registry;
mod snapshot;

pub use optimizer::OptimizerConfig;
pub use registry::SnapshotRegistry;
pub use snapshot::{PoolSection, PoolSnapshot, RewardsSection, StrategySection};

/// Serde adapter storing a [`Ray`](crate::Ray) as a decimal string in token units.
pub(crate) mod ray_string {
    use alloy::primitives::utils::format_units;
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};

    use crate::ray_math::{parse_ray, Ray, RAY_DECIMALS};

    pub fn serialize<S: Serializer>(value: &Ray, serializer: S) -> Result<S::Ok, S::Error> {
        let text = format_units(*value, RAY_DECIMALS).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Ray, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_ray(&text).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(value: &Option<Ray>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Ray>, D::Error> {
            let text: Option<String> = Option::deserialize(deserializer)?;
            text.map(|text| parse_ray(&text).map_err(D::Error::custom))
                .transpose()
        }
    }
}
