//! Point lookup (spec §4.3.4).

use crate::adapter::KvAdapter;
use crate::codec;
use crate::error::{RiverError, RiverResult};
use crate::river::handle::River;
use crate::river::keys::{index_node_key, river_node_key};
use crate::river::node::bucket_of;
use crate::river::record::{self, RecordMap, HIDDEN_KEY_FIELD};
use serde_json::Value;
use tracing::instrument;

impl<A: KvAdapter> River<A> {
    /// Looks up records by user key.
    ///
    /// With a key transform, records whose transformed key collides with
    /// `user_key`'s transform but whose original user key differs are
    /// filtered out (spec §4.3.4 step 4, §8 property 7). With `UNQ`, at
    /// most one record can survive; more than one is
    /// [`RiverError::ResultsNotUnique`], an invariant violation rather
    /// than a normal outcome.
    #[instrument(skip(self))]
    pub fn get(&self, user_key: &Value) -> RiverResult<Vec<RecordMap>> {
        let k = match self.key_transform {
            Some(t) => t.apply(user_key)?,
            None => user_key.as_i64().ok_or_else(|| {
                RiverError::InvalidConfiguration(
                    "user key must be an integer when no key transform is configured".to_string(),
                )
            })?,
        };

        // River must still exist.
        self.adapter
            .get(&river_node_key(&self.name))?
            .ok_or_else(|| RiverError::RiverDeleted(self.name.clone()))?;

        let leaf_key = index_node_key(&self.name, self.leaf_granularity(), bucket_of(k, self.leaf_granularity()));
        let matches = match self.adapter.get(&leaf_key)? {
            None => Vec::new(),
            Some(bytes) => {
                let node = codec::unpack_node(&bytes)?;
                node.as_leaf()
                    .and_then(|map| map.get(&k))
                    .cloned()
                    .unwrap_or_default()
            }
        };

        let surviving: Vec<RecordMap> = if self.key_transform.is_some() {
            matches
                .into_iter()
                .filter(|stored| stored.get(HIDDEN_KEY_FIELD) == Some(user_key))
                .map(|stored| record::restore_user_view(&stored, self.key_transform))
                .collect()
        } else {
            matches
        };

        if self.unique && surviving.len() > 1 {
            return Err(RiverError::ResultsNotUnique(k, self.name.clone()));
        }

        Ok(surviving)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::memory::MemoryAdapter;
    use crate::river::descriptor::RiverConfig;
    use crate::transform::KeyTransform;
    use serde_json::json;
    use std::sync::Arc;

    fn rec(key: Value, field: &str, value: &str) -> RecordMap {
        let mut m = RecordMap::new();
        m.insert("KEY".to_string(), key);
        m.insert(field.to_string(), json!(value));
        m
    }

    #[test]
    fn get_returns_inserted_record() {
        let adapter = Arc::new(MemoryAdapter::new());
        let river = River::create(adapter, "r", RiverConfig::default()).unwrap();
        river.add(&rec(json!(450), "hi", "there")).unwrap();

        let found = river.get(&json!(450)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("hi").unwrap(), &json!("there"));
    }

    #[test]
    fn get_missing_key_is_empty() {
        let adapter = Arc::new(MemoryAdapter::new());
        let river = River::create(adapter, "r", RiverConfig::default()).unwrap();
        assert!(river.get(&json!(1)).unwrap().is_empty());
    }

    #[test]
    fn collision_filtering_with_transform() {
        let adapter = Arc::new(MemoryAdapter::new());
        let cfg = RiverConfig::default().with_key_transform(KeyTransform::Allzero);
        let river = River::create(adapter, "r", cfg).unwrap();

        river.add(&rec(json!("a"), "n", "alice")).unwrap();
        river.add(&rec(json!("b"), "n", "bob")).unwrap();

        let found = river.get(&json!("a")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("n").unwrap(), &json!("alice"));
    }

    #[test]
    fn add_enforces_uniqueness_per_user_key() {
        let adapter = Arc::new(MemoryAdapter::new());
        let cfg = RiverConfig::default()
            .with_key_transform(KeyTransform::Allzero)
            .with_unique(true);
        let river = River::create(adapter, "r", cfg).unwrap();
        river.add(&rec(json!("a"), "n", "alice")).unwrap();
        assert!(matches!(
            river.add(&rec(json!("a"), "n", "alice-again")),
            Err(RiverError::RiverKeyAlreadyExists(_))
        ));
    }

    #[test]
    fn get_detects_unique_invariant_violation() {
        // `add`'s own uniqueness check prevents this from happening
        // through the public API; construct the violating state directly
        // through the adapter to exercise `get`'s defensive check.
        use crate::codec;
        use crate::river::keys::index_node_key;
        use crate::river::node::{bucket_of, IndexNode};
        use std::collections::BTreeMap;

        let adapter = Arc::new(MemoryAdapter::new());
        let cfg = RiverConfig::default()
            .with_key_transform(KeyTransform::Allzero)
            .with_unique(true);
        let river = River::create(adapter.clone(), "r", cfg).unwrap();

        let leaf_g = river.leaf_granularity();
        let key = index_node_key("r", leaf_g, bucket_of(0, leaf_g));
        let a = {
            let mut m = rec(json!(0), "n", "alice");
            m.insert(HIDDEN_KEY_FIELD.to_string(), json!("a"));
            m
        };
        let b = {
            let mut m = rec(json!(0), "n", "bob");
            m.insert(HIDDEN_KEY_FIELD.to_string(), json!("a"));
            m
        };
        let mut leaf = BTreeMap::new();
        leaf.insert(0, vec![a, b]);
        let bytes = codec::pack_node(&IndexNode::Leaf(leaf)).unwrap();
        adapter.add(&key, &bytes).unwrap();

        assert!(matches!(
            river.get(&json!("a")),
            Err(RiverError::ResultsNotUnique(0, _))
        ));
    }
}
