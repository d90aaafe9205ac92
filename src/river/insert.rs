//! The insert protocol (spec §4.3.3).
//!
//! Widens interior nodes top-down across every level but the last, then
//! inserts into the leaf, then widens the river node's envelope last. This
//! order is deliberate (spec §4.3.3 rationale): a record must never become
//! visible through a leaf before every interior level above it can guide a
//! descending scan to that bucket, and the river node's `[FIN,LIN]` must
//! never underestimate the leaf's actual coverage during iteration.

use crate::adapter::{AddOutcome, CasOutcome, KvAdapter};
use crate::codec;
use crate::error::{RiverError, RiverResult};
use crate::river::handle::River;
use crate::river::keys::{index_node_key, river_node_key};
use crate::river::node::{bucket_of, IndexNode};
use crate::river::record::{self, RecordMap, HIDDEN_KEY_FIELD};
use tracing::{debug, instrument, warn};

impl<A: KvAdapter> River<A> {
    /// Inserts a fish into the river.
    ///
    /// See spec §4.3.3 for the full step-by-step protocol and §7 for the
    /// error taxonomy. A `ContentionFailure` means no leaf write happened
    /// (the record is not visible), but some interior nodes may have been
    /// widened already; this is harmless and the insert can be retried.
    #[instrument(skip(self, record))]
    pub fn add(&self, record: &RecordMap) -> RiverResult<()> {
        let (k, stored) = record::prepare_for_insert(record, self.key_transform)?;

        // Step 3: the river must still exist.
        let river_key = river_node_key(&self.name);
        self.adapter
            .gets(&river_key)?
            .ok_or_else(|| RiverError::RiverDeleted(self.name.clone()))?;

        // Step 4: widen every interior level, coarsest first.
        for &granularity in self.interior_granularities() {
            self.interior_insert(k, granularity)?;
        }

        // Step 5: insert into the leaf.
        self.leaf_insert(k, self.leaf_granularity(), &stored)?;

        // Step 6: widen the river node's envelope last.
        self.widen_river_envelope(k)?;

        Ok(())
    }

    #[instrument(skip(self))]
    fn interior_insert(&self, k: i64, granularity: i64) -> RiverResult<()> {
        let bucket = bucket_of(k, granularity);
        let key = index_node_key(&self.name, granularity, bucket);

        match self.adapter.gets(&key)? {
            None => {
                let bytes = codec::pack_node(&IndexNode::new_interior(k))?;
                match self.adapter.add(&key, &bytes)? {
                    AddOutcome::Ok => Ok(()),
                    AddOutcome::Exists => {
                        warn!(granularity, bucket, "lost the race creating interior node");
                        Err(RiverError::ContentionFailure {
                            river: self.name.clone(),
                            granularity: Some(granularity),
                            bucket,
                        })
                    }
                }
            }
            Some((bytes, token)) => {
                let node = codec::unpack_node(&bytes)?;
                let (fin, lin) = node
                    .widened_interior(k)
                    .expect("interior node key never holds a leaf value");
                let (old_fin, old_lin) = node.as_interior().unwrap();
                if (fin, lin) == (old_fin, old_lin) {
                    debug!(granularity, bucket, "interior envelope unchanged");
                    return Ok(());
                }
                let bytes = codec::pack_node(&IndexNode::Interior { fin, lin })?;
                match self.adapter.cas(&key, &bytes, &token)? {
                    CasOutcome::Ok => Ok(()),
                    CasOutcome::Stale => {
                        warn!(granularity, bucket, "lost CAS widening interior node");
                        Err(RiverError::ContentionFailure {
                            river: self.name.clone(),
                            granularity: Some(granularity),
                            bucket,
                        })
                    }
                }
            }
        }
    }

    #[instrument(skip(self, record))]
    fn leaf_insert(&self, k: i64, granularity: i64, record: &RecordMap) -> RiverResult<()> {
        let bucket = bucket_of(k, granularity);
        let key = index_node_key(&self.name, granularity, bucket);

        match self.adapter.gets(&key)? {
            None => {
                let bytes = codec::pack_node(&IndexNode::new_leaf(k, record.clone()))?;
                match self.adapter.add(&key, &bytes)? {
                    AddOutcome::Ok => Ok(()),
                    AddOutcome::Exists => Err(RiverError::ContentionFailure {
                        river: self.name.clone(),
                        granularity: None,
                        bucket,
                    }),
                }
            }
            Some((bytes, token)) => {
                let mut leaf = match codec::unpack_node(&bytes)? {
                    IndexNode::Leaf(map) => map,
                    IndexNode::Interior { .. } => {
                        unreachable!("leaf-level key never holds an interior value")
                    }
                };
                let existing = leaf.entry(k).or_default();

                if self.unique {
                    let collides = if self.key_transform.is_some() {
                        let incoming_user_key = record.get(HIDDEN_KEY_FIELD);
                        existing
                            .iter()
                            .any(|e| e.get(HIDDEN_KEY_FIELD) == incoming_user_key)
                    } else {
                        !existing.is_empty()
                    };
                    if collides {
                        return Err(RiverError::RiverKeyAlreadyExists(self.name.clone()));
                    }
                }

                if existing.contains(record) {
                    debug!(k, "idempotent re-drive, record already present");
                    return Ok(());
                }

                existing.push(record.clone());
                // Every record in `existing` shares sort-key `k` by construction
                // (the leaf maps exact sort-key to the list of records whose
                // transformed key equals it), so this is a stable no-op sort
                // that preserves insertion order among ties (spec §3.2, §4.3.3).
                existing.sort_by_key(|r| r.get(record::KEY_FIELD).and_then(|v| v.as_i64()));

                let bytes = codec::pack_node(&IndexNode::Leaf(leaf))?;
                match self.adapter.cas(&key, &bytes, &token)? {
                    CasOutcome::Ok => Ok(()),
                    CasOutcome::Stale => Err(RiverError::ContentionFailure {
                        river: self.name.clone(),
                        granularity: None,
                        bucket,
                    }),
                }
            }
        }
    }

    #[instrument(skip(self))]
    fn widen_river_envelope(&self, k: i64) -> RiverResult<()> {
        let river_key = river_node_key(&self.name);
        let (bytes, token) = self
            .adapter
            .gets(&river_key)?
            .ok_or_else(|| RiverError::RiverDeleted(self.name.clone()))?;
        let mut descriptor = codec::unpack_descriptor(&bytes)?;

        let (fin, lin) = descriptor.envelope_after(k);
        if (Some(fin), Some(lin)) == (descriptor.fin, descriptor.lin) {
            return Ok(());
        }
        descriptor.fin = Some(fin);
        descriptor.lin = Some(lin);

        let bytes = codec::pack_descriptor(&descriptor)?;
        match self.adapter.cas(&river_key, &bytes, &token)? {
            CasOutcome::Ok => Ok(()),
            CasOutcome::Stale => Err(RiverError::ContentionFailure {
                river: self.name.clone(),
                granularity: None,
                bucket: k,
            }),
        }
    }
}
