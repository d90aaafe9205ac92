//! The key/value adapter boundary.
//!
//! `KvAdapter` is the entire contract the core requires from the flat,
//! distributed store underneath a river: `get`, `gets`, `add`, `cas` over
//! opaque bytes and textual keys. Sharding, connection pooling,
//! reconnection, and serialization of values to bytes belong to a real
//! adapter implementation and are out of scope here (spec §1, §4.2) — only
//! the trait and a reference in-memory implementation for tests live in
//! this crate.

use crate::error::RiverResult;

/// An opaque token bound to the value last observed by `gets`, consumed by
/// a later `cas` to detect concurrent modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(pub(crate) u64);

/// Outcome of `add`: stored iff the key was previously absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Ok,
    Exists,
}

/// Outcome of `cas`: stored iff the token is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Ok,
    Stale,
}

/// Contract over the external key/value store.
///
/// # Contract
/// - `get`: returns `None` for an absent key, never errors on absence.
/// - `gets`: like `get`, but also returns a [`Token`] usable by a later `cas`.
/// - `add`: stores the value iff the key is currently absent.
/// - `cas`: stores the value iff the key's value has not changed since the
///   `gets` call that produced `token`.
///
/// Implementations must be `Send + Sync`: the core makes no assumption
/// about which thread or async task issues a given call, only that at most
/// one call per handle is in flight at a time (spec §5).
pub trait KvAdapter: Send + Sync {
    /// Reads the current value at `key`, if any.
    fn get(&self, key: &str) -> RiverResult<Option<Vec<u8>>>;

    /// Reads the current value at `key` along with a token for a later `cas`.
    fn gets(&self, key: &str) -> RiverResult<Option<(Vec<u8>, Token)>>;

    /// Stores `value` at `key` iff `key` is currently absent.
    fn add(&self, key: &str, value: &[u8]) -> RiverResult<AddOutcome>;

    /// Stores `value` at `key` iff the value has not changed since `token`
    /// was produced by `gets`.
    fn cas(&self, key: &str, value: &[u8], token: &Token) -> RiverResult<CasOutcome>;
}

/// A reference, in-process [`KvAdapter`] backed by a concurrent hash map.
///
/// This is a test double, not a store implementation: it exists so the
/// property and scenario tests in this crate can exercise the insertion
/// protocol and iterator without a real distributed store. Shipping a
/// production adapter (sharding, reconnection, wire serialization) is
/// explicitly out of scope (spec §1).
#[cfg(any(test, feature = "test-util"))]
pub mod memory {
    use super::{AddOutcome, CasOutcome, KvAdapter, Token};
    use crate::error::RiverResult;
    use dashmap::DashMap;
    use parking_lot::Mutex;

    struct Slot {
        value: Vec<u8>,
        generation: u64,
    }

    /// In-memory [`KvAdapter`] for tests. Every write bumps a per-key
    /// generation counter; the counter doubles as the [`Token`] contents.
    #[derive(Default)]
    pub struct MemoryAdapter {
        store: DashMap<String, Mutex<Slot>>,
    }

    impl MemoryAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Removes a key outright, modeling external deletion of a river
        /// out from under a live handle. Only meaningful in tests: this
        /// adapter never exposes a delete operation on its own (spec's
        /// non-goals exclude deletes from the core entirely).
        #[cfg(test)]
        pub fn clear_for_test(&self, key: &str) {
            self.store.remove(key);
        }
    }

    impl KvAdapter for MemoryAdapter {
        fn get(&self, key: &str) -> RiverResult<Option<Vec<u8>>> {
            Ok(self.store.get(key).map(|slot| slot.lock().value.clone()))
        }

        fn gets(&self, key: &str) -> RiverResult<Option<(Vec<u8>, Token)>> {
            Ok(self.store.get(key).map(|slot| {
                let slot = slot.lock();
                (slot.value.clone(), Token(slot.generation))
            }))
        }

        fn add(&self, key: &str, value: &[u8]) -> RiverResult<AddOutcome> {
            use dashmap::mapref::entry::Entry;
            match self.store.entry(key.to_string()) {
                Entry::Occupied(_) => Ok(AddOutcome::Exists),
                Entry::Vacant(slot) => {
                    slot.insert(Mutex::new(Slot {
                        value: value.to_vec(),
                        generation: 0,
                    }));
                    Ok(AddOutcome::Ok)
                }
            }
        }

        fn cas(&self, key: &str, value: &[u8], token: &Token) -> RiverResult<CasOutcome> {
            let Some(entry) = self.store.get(key) else {
                return Ok(CasOutcome::Stale);
            };
            let mut slot = entry.lock();
            if slot.generation != token.0 {
                return Ok(CasOutcome::Stale);
            }
            slot.value = value.to_vec();
            slot.generation += 1;
            Ok(CasOutcome::Ok)
        }
    }

}
