//! Sharded index node shapes (spec §3.2).

use crate::river::record::RecordMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in the sharded index. Interior and leaf nodes occupy the same
/// key namespace; which shape is stored at `(g, q)` is determined by
/// whether `g` is the last granularity in `IND`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum IndexNode {
    /// Every level but the last: the min/max sort-key actually present in
    /// this bucket. Widens monotonically, never shrinks.
    Interior { fin: i64, lin: i64 },
    /// Only the last level: exact sort-key to the ordered list of records
    /// whose transformed key equals it.
    Leaf(BTreeMap<i64, Vec<RecordMap>>),
}

impl IndexNode {
    pub fn new_interior(k: i64) -> IndexNode {
        IndexNode::Interior { fin: k, lin: k }
    }

    pub fn new_leaf(k: i64, record: RecordMap) -> IndexNode {
        let mut map = BTreeMap::new();
        map.insert(k, vec![record]);
        IndexNode::Leaf(map)
    }

    /// Widens an interior node's envelope to include `k`, returning the
    /// new envelope. Returns `None` if `self` is not an interior node.
    pub fn widened_interior(&self, k: i64) -> Option<(i64, i64)> {
        match self {
            IndexNode::Interior { fin, lin } => Some((k.min(*fin), k.max(*lin))),
            IndexNode::Leaf(_) => None,
        }
    }

    pub fn as_interior(&self) -> Option<(i64, i64)> {
        match self {
            IndexNode::Interior { fin, lin } => Some((*fin, *lin)),
            IndexNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&BTreeMap<i64, Vec<RecordMap>>> {
        match self {
            IndexNode::Leaf(map) => Some(map),
            IndexNode::Interior { .. } => None,
        }
    }
}

/// The bucket id `q = k div g` that selects which node at granularity `g`
/// covers sort-key `k`.
pub fn bucket_of(k: i64, granularity: i64) -> i64 {
    k.div_euclid(granularity)
}

/// The base sort-key `b = q * g` of the bucket containing `k` at granularity `g`.
pub fn bucket_base(k: i64, granularity: i64) -> i64 {
    bucket_of(k, granularity) * granularity
}
