//! The stack-driven, bounded, possibly-reversed range iterator (spec §4.4).
//!
//! A depth-first, explicit-stack traversal over the sharded index. Memory
//! stays bounded to O(fan-out × depth): each node is read, processed, and
//! discarded, never re-read. Pushing the reverse of the desired visit
//! order onto the LIFO stack is what lets the same code drive both
//! forward and reverse traversal.

use crate::adapter::KvAdapter;
use crate::codec;
use crate::error::RiverResult;
use crate::river::handle::River;
use crate::river::keys::{index_node_key, river_node_key};
use crate::river::node::bucket_of;
use crate::river::record::{self, RecordMap};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// One entry of the explicit traversal stack.
#[derive(Debug, Clone, Copy)]
enum IterTask {
    River,
    Interior { base: i64, level_idx: usize },
    Leaf { base: i64, level_idx: usize },
}

/// A lazy, one-shot, non-restartable sequence of `(user_key, record)`
/// pairs over a river, honoring the handle's bounds and direction.
///
/// Implements [`Iterator`] with a fallible item: each `next()` call may
/// issue adapter reads, any of which can fail.
pub struct RiverIter<A: KvAdapter> {
    adapter: Arc<A>,
    name: String,
    ind: Vec<i64>,
    key_transform: Option<crate::transform::KeyTransform>,
    lower: Option<i64>,
    upper: Option<i64>,
    reverse: bool,
    stack: Vec<IterTask>,
    buffer: VecDeque<(Value, RecordMap)>,
    done: bool,
}

impl<A: KvAdapter> River<A> {
    /// Begins a lazy traversal honoring this handle's bounds and direction
    /// (spec §4.3.5, §4.4).
    pub fn iter(&self) -> RiverIter<A> {
        RiverIter {
            adapter: Arc::clone(&self.adapter),
            name: self.name.clone(),
            ind: self.ind.clone(),
            key_transform: self.key_transform,
            lower: self.options.lower(),
            upper: self.options.upper(),
            reverse: self.options.is_reverse(),
            stack: vec![IterTask::River],
            buffer: VecDeque::new(),
            done: false,
        }
    }
}

impl<A: KvAdapter> RiverIter<A> {
    fn is_leaf_level(&self, level_idx: usize) -> bool {
        level_idx == self.ind.len() - 1
    }

    /// Bucket bases at `granularity` covering `[lo, hi]` inclusive, in
    /// ascending order.
    fn bucket_bases(lo: i64, hi: i64, granularity: i64) -> Vec<i64> {
        let mut bases = Vec::new();
        let mut b = bucket_of(lo, granularity) * granularity;
        let hi_base = bucket_of(hi, granularity) * granularity;
        while b <= hi_base {
            bases.push(b);
            b += granularity;
        }
        bases
    }

    /// Pushes tasks for the given ascending bucket bases at `level_idx`,
    /// ordered so the stack pops them in the handle's traversal direction.
    fn push_level(&mut self, level_idx: usize, ascending_bases: Vec<i64>) {
        let make_task = |base: i64| {
            if self.is_leaf_level(level_idx) {
                IterTask::Leaf { base, level_idx }
            } else {
                IterTask::Interior { base, level_idx }
            }
        };
        if self.reverse {
            for base in ascending_bases {
                self.stack.push(make_task(base));
            }
        } else {
            for base in ascending_bases.into_iter().rev() {
                self.stack.push(make_task(base));
            }
        }
    }

    fn lower_or(&self, default: i64) -> i64 {
        self.lower.unwrap_or(default)
    }

    fn upper_or(&self, default: i64) -> i64 {
        self.upper.unwrap_or(default)
    }

    fn process_river(&mut self) -> RiverResult<()> {
        let Some(bytes) = self.adapter.get(&river_node_key(&self.name))? else {
            self.done = true;
            return Ok(());
        };
        let descriptor = codec::unpack_descriptor(&bytes)?;
        let (Some(fin), Some(lin)) = (descriptor.fin, descriptor.lin) else {
            self.done = true;
            return Ok(());
        };

        let fin_eff = self.lower_or(i64::MIN).max(fin);
        let lin_eff = self.upper_or(i64::MAX).min(lin);
        if fin_eff > lin_eff {
            self.done = true;
            return Ok(());
        }

        let g0 = self.ind[0];
        let bases = Self::bucket_bases(fin_eff, lin_eff, g0);
        self.push_level(0, bases);
        Ok(())
    }

    fn process_interior(&mut self, base: i64, level_idx: usize) -> RiverResult<()> {
        let granularity = self.ind[level_idx];
        let bucket = bucket_of(base, granularity);
        let key = index_node_key(&self.name, granularity, bucket);

        let Some(bytes) = self.adapter.get(&key)? else {
            return Ok(()); // normal: widened-but-never-leaf-written clutter, or never populated
        };
        let node = codec::unpack_node(&bytes)?;
        let (fin, lin) = node
            .as_interior()
            .expect("interior-level key never holds a leaf value");

        let clamped_fin = self.lower_or(i64::MIN).max(fin);
        let clamped_lin = self.upper_or(i64::MAX).min(lin);
        if clamped_fin > clamped_lin {
            return Ok(());
        }

        let next_level = level_idx + 1;
        let next_granularity = self.ind[next_level];
        let bases = Self::bucket_bases(clamped_fin, clamped_lin, next_granularity);
        self.push_level(next_level, bases);
        Ok(())
    }

    fn process_leaf(&mut self, base: i64, level_idx: usize) -> RiverResult<()> {
        let granularity = self.ind[level_idx];
        let bucket = bucket_of(base, granularity);
        let key = index_node_key(&self.name, granularity, bucket);

        let Some(bytes) = self.adapter.get(&key)? else {
            return Ok(());
        };
        let node = codec::unpack_node(&bytes)?;
        let leaf = node
            .as_leaf()
            .expect("leaf-level key never holds an interior value");

        let sort_keys: Vec<i64> = if self.reverse {
            leaf.keys().rev().copied().collect()
        } else {
            leaf.keys().copied().collect()
        };

        for ks in sort_keys {
            if ks < self.lower_or(i64::MIN) || ks > self.upper_or(i64::MAX) {
                continue;
            }
            let records = &leaf[&ks];
            let ordered: Vec<&RecordMap> = if self.reverse {
                records.iter().rev().collect()
            } else {
                records.iter().collect()
            };
            for stored in ordered {
                let record_out = record::restore_user_view(stored, self.key_transform);
                let emit_key = if self.key_transform.is_some() {
                    record_out
                        .get(record::KEY_FIELD)
                        .cloned()
                        .unwrap_or(Value::Null)
                } else {
                    Value::from(ks)
                };
                self.buffer.push_back((emit_key, record_out));
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> RiverResult<()> {
        match self.stack.pop() {
            None => {
                self.done = true;
                Ok(())
            }
            Some(IterTask::River) => self.process_river(),
            Some(IterTask::Interior { base, level_idx }) => self.process_interior(base, level_idx),
            Some(IterTask::Leaf { base, level_idx }) => self.process_leaf(base, level_idx),
        }
    }
}

impl<A: KvAdapter> Iterator for RiverIter<A> {
    type Item = RiverResult<(Value, RecordMap)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done || self.stack.is_empty() {
                return None;
            }
            if let Err(e) = self.advance() {
                self.stack.clear();
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
