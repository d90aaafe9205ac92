//! The river descriptor — one per river, stored at `river_node_key(name)`
//! (spec §3.1).

use crate::error::{RiverError, RiverResult};
use crate::transform::KeyTransform;
use serde::{Deserialize, Serialize};

/// Default `IND` preset (spec §6).
pub const DEFAULT_IND: [i64; 4] = [10_000_000, 1_000_000, 100_000, 10_000];

/// CRC-optimized `IND` preset, sized for `stringcrc`'s ~32-bit output range
/// (spec §6).
pub const CRC_OPTIMIZED_IND: [i64; 4] = [430_000_000, 4_300_000, 43_000, 430];

/// Creation-time configuration for a river (spec §6). `IND`, `key_transform`
/// are immutable once the river is created; `unique` is as well.
#[derive(Debug, Clone)]
pub struct RiverConfig {
    pub ind: Vec<i64>,
    pub key_transform: Option<KeyTransform>,
    pub unique: bool,
}

impl Default for RiverConfig {
    fn default() -> Self {
        RiverConfig {
            ind: DEFAULT_IND.to_vec(),
            key_transform: None,
            unique: false,
        }
    }
}

impl RiverConfig {
    /// The CRC-optimized preset, appropriate when `key_transform` is
    /// `Stringcrc` (spec §6).
    pub fn crc_optimized() -> Self {
        RiverConfig {
            ind: CRC_OPTIMIZED_IND.to_vec(),
            ..RiverConfig::default()
        }
    }

    pub fn with_key_transform(mut self, transform: KeyTransform) -> Self {
        self.key_transform = Some(transform);
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Validates that `IND` is a strictly decreasing sequence of positive
    /// integers (spec §4.3.1 step 1).
    pub fn validate(&self) -> RiverResult<()> {
        if self.ind.is_empty() {
            return Err(RiverError::InvalidConfiguration(
                "IND must have at least one level".to_string(),
            ));
        }
        if self.ind.iter().any(|g| *g <= 0) {
            return Err(RiverError::InvalidConfiguration(
                "IND levels must be positive".to_string(),
            ));
        }
        if !self.ind.windows(2).all(|w| w[0] > w[1]) {
            return Err(RiverError::InvalidConfiguration(
                "IND must be strictly decreasing".to_string(),
            ));
        }
        Ok(())
    }
}

/// The persisted descriptor for a river.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiverDescriptor {
    pub ind: Vec<i64>,
    pub fin: Option<i64>,
    pub lin: Option<i64>,
    pub ktr: Option<String>,
    pub unq: bool,
}

impl RiverDescriptor {
    pub fn new(config: &RiverConfig) -> RiverDescriptor {
        RiverDescriptor {
            ind: config.ind.clone(),
            fin: None,
            lin: None,
            ktr: config.key_transform.map(|t| t.tag().to_string()),
            unq: config.unique,
        }
    }

    /// Resolves the persisted transform tag back to a [`KeyTransform`].
    ///
    /// Fails `KeyTransformIncompatible` if the tag is set but unrecognized
    /// by this build (spec §4.3.2).
    pub fn resolve_transform(&self, river_name: &str) -> RiverResult<Option<KeyTransform>> {
        match &self.ktr {
            None => Ok(None),
            Some(tag) => KeyTransform::resolve(tag).map(Some).ok_or_else(|| {
                RiverError::KeyTransformIncompatible {
                    river: river_name.to_string(),
                    transform: tag.clone(),
                }
            }),
        }
    }

    /// The finest (last) granularity in `IND`.
    pub fn leaf_granularity(&self) -> i64 {
        *self.ind.last().expect("IND is validated non-empty at creation")
    }

    /// All granularities except the last, in the order they must be
    /// widened during insert (spec §4.3.3 step 4).
    pub fn interior_granularities(&self) -> &[i64] {
        &self.ind[..self.ind.len() - 1]
    }

    /// Whether widening `[fin, lin]` to include `k` changes anything.
    pub fn envelope_after(&self, k: i64) -> (i64, i64) {
        let fin = self.fin.map_or(k, |f| f.min(k));
        let lin = self.lin.map_or(k, |l| l.max(k));
        (fin, lin)
    }
}
