//! Key transforms — total functions from a user key to an integer sort key.
//!
//! The source resolves a transform by looking up its function name via
//! reflection at river-open time. Here the set of transforms is a small,
//! closed enumeration persisted by symbolic tag and resolved through this
//! module instead — no dynamic dispatch to user code.

use crate::error::{RiverError, RiverResult};
use serde::{Deserialize, Serialize};

/// A pluggable mapping from a user-supplied key to the integer sort key
/// used throughout the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyTransform {
    /// `crc32(key) & 0xffff_ffff` of the UTF-8 bytes of a string key.
    Stringcrc,
    /// Maps every key to `0`. Only useful combined with `UNQ = false`, or
    /// with `UNQ = true` where collisions are resolved by `_KEY` equality.
    Allzero,
    /// Parses the user key as a decimal integer.
    Cast,
}

impl KeyTransform {
    /// The symbolic tag persisted in the river descriptor.
    pub fn tag(&self) -> &'static str {
        match self {
            KeyTransform::Stringcrc => "stringcrc",
            KeyTransform::Allzero => "allzero",
            KeyTransform::Cast => "cast",
        }
    }

    /// Resolves a persisted symbolic tag back to a transform.
    ///
    /// Returns `None` for tags this build does not recognize, e.g. because
    /// the river was created by a newer version of the library.
    pub fn resolve(tag: &str) -> Option<KeyTransform> {
        match tag {
            "stringcrc" => Some(KeyTransform::Stringcrc),
            "allzero" => Some(KeyTransform::Allzero),
            "cast" => Some(KeyTransform::Cast),
            _ => None,
        }
    }

    /// Applies the transform to a user key, producing the sort key used
    /// for indexing.
    pub fn apply(&self, user_key: &serde_json::Value) -> RiverResult<i64> {
        match self {
            KeyTransform::Stringcrc => {
                let s = user_key.as_str().ok_or_else(|| {
                    RiverError::InvalidConfiguration(
                        "stringcrc transform requires a string user key".to_string(),
                    )
                })?;
                Ok(crc32fast::hash(s.as_bytes()) as i64)
            }
            KeyTransform::Allzero => Ok(0),
            KeyTransform::Cast => {
                if let Some(i) = user_key.as_i64() {
                    return Ok(i);
                }
                if let Some(s) = user_key.as_str() {
                    return s.trim().parse::<i64>().map_err(|_| {
                        RiverError::InvalidConfiguration(format!(
                            "cast transform could not parse '{s}' as an integer"
                        ))
                    });
                }
                Err(RiverError::InvalidConfiguration(
                    "cast transform requires an integer or string user key".to_string(),
                ))
            }
        }
    }
}
