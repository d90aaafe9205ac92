//! The river handle — a lightweight, non-shareable descriptor over an
//! adapter and a cached, immutable snapshot of the river's creation-time
//! configuration (spec §3.4).

use crate::adapter::KvAdapter;
use crate::error::{RiverError, RiverResult};
use crate::river::options::IterOptions;
use crate::transform::KeyTransform;
use serde_json::Value;
use std::sync::Arc;

/// A handle to an open river.
///
/// Holds the adapter reference, the river name, a cached snapshot of
/// `IND`/`KTR`/`UNQ` (immutable for the handle's lifetime — reindexing is
/// unsupported, spec §9), and per-handle iteration options. All
/// authoritative state lives in the KV store; the handle itself holds no
/// data a concurrent caller needs to see.
///
/// A handle is **not** reentrant (spec §5): it caches no CAS tokens
/// itself, but the "one in-flight operation per handle" contract still
/// applies to the options-builder methods (`lowerbound`/`upperbound`/
/// `reverse`), which each produce a new handle rather than mutate in
/// place, so a handle's options can safely be read while another
/// operation against a *sibling* handle for the same river is in flight.
pub struct River<A: KvAdapter> {
    pub(crate) adapter: Arc<A>,
    pub(crate) name: String,
    pub(crate) ind: Vec<i64>,
    pub(crate) key_transform: Option<KeyTransform>,
    pub(crate) unique: bool,
    pub(crate) options: IterOptions,
}

// Manually implemented rather than derived: `Arc<A>` is `Clone` regardless
// of whether `A` is, and a derive would wrongly add an `A: Clone` bound.
impl<A: KvAdapter> Clone for River<A> {
    fn clone(&self) -> Self {
        River {
            adapter: Arc::clone(&self.adapter),
            name: self.name.clone(),
            ind: self.ind.clone(),
            key_transform: self.key_transform,
            unique: self.unique,
            options: self.options.clone(),
        }
    }
}

impl<A: KvAdapter> River<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ind(&self) -> &[i64] {
        &self.ind
    }

    pub fn key_transform(&self) -> Option<KeyTransform> {
        self.key_transform
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn leaf_granularity(&self) -> i64 {
        *self.ind.last().expect("IND is validated non-empty at creation")
    }

    pub fn interior_granularities(&self) -> &[i64] {
        &self.ind[..self.ind.len() - 1]
    }

    /// Resolves a caller-supplied bound key to a sort-key (spec §4.3.5):
    /// by default (`key_transformed = false`) the key is run through this
    /// river's configured `KeyTransform`, exactly as `add`/`get` do for
    /// the `KEY` field; if `key_transformed` is set, `key` is taken as an
    /// already-transformed sort-key and used verbatim.
    fn resolve_bound(&self, key: Value, key_transformed: bool) -> RiverResult<i64> {
        if key_transformed {
            return key.as_i64().ok_or_else(|| {
                RiverError::InvalidConfiguration(
                    "key_transformed bound must be an integer sort-key".to_string(),
                )
            });
        }
        match self.key_transform {
            Some(t) => t.apply(&key),
            None => key.as_i64().ok_or_else(|| {
                RiverError::InvalidConfiguration(
                    "bound key must be an integer when no key transform is configured"
                        .to_string(),
                )
            }),
        }
    }

    /// Returns a new handle with `lowerbound(key)` applied (inclusive).
    ///
    /// `key` is the raw user key by default; it is run through this
    /// river's `KeyTransform`, if any, before being used as the sort-key
    /// bound. Set `key_transformed` to pass an already-transformed
    /// sort-key directly, bypassing the transform (spec §4.3.5).
    pub fn lowerbound(&self, key: Value, key_transformed: bool) -> RiverResult<River<A>> {
        let k = self.resolve_bound(key, key_transformed)?;
        Ok(River {
            options: self.options.with_lowerbound(k)?,
            ..self.clone()
        })
    }

    /// Returns a new handle with `upperbound(key)` applied (inclusive).
    ///
    /// See [`River::lowerbound`] for the meaning of `key_transformed`.
    pub fn upperbound(&self, key: Value, key_transformed: bool) -> RiverResult<River<A>> {
        let k = self.resolve_bound(key, key_transformed)?;
        Ok(River {
            options: self.options.with_upperbound(k)?,
            ..self.clone()
        })
    }

    /// Returns a new handle with reverse traversal direction.
    pub fn reverse(&self) -> RiverResult<River<A>> {
        Ok(River {
            options: self.options.with_reverse()?,
            ..self.clone()
        })
    }

    pub fn options(&self) -> &IterOptions {
        &self.options
    }
}
