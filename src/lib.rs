//! # Riverfish — an ordered index over a CAS-only flat key/value store
//!
//! Riverfish layers an ordered, sharded, multi-level index ("a river") on
//! top of a flat, distributed key/value store that supports only three
//! primitives: `get`, `add` (insert-if-absent), and `cas`
//! (compare-and-swap bound to the last read). Each river stores records
//! ("fish"): arbitrary key/value maps tagged with an integer sort key.
//!
//! Rivers support point lookup by key, in-order and reverse iteration,
//! bounded iteration, multi-values-per-key, uniqueness constraints, and
//! pluggable key transforms that map user-supplied keys (e.g. strings) to
//! the integer sort key.
//!
//! ## Quick Start
//!
//! ```rust
//! use riverfish::adapter::memory::MemoryAdapter;
//! use riverfish::river::{River, RiverConfig, RecordMap};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> riverfish::RiverResult<()> {
//! let adapter = Arc::new(MemoryAdapter::new());
//! let river = River::create(adapter, "orders", RiverConfig::default())?;
//!
//! let mut fish = RecordMap::new();
//! fish.insert("KEY".to_string(), json!(450));
//! fish.insert("note".to_string(), json!("first order"));
//! river.add(&fish)?;
//!
//! let found = river.get(&json!(450))?;
//! assert_eq!(found.len(), 1);
//!
//! for item in river.iter() {
//!     let (key, record) = item?;
//!     println!("{key}: {record:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//! - [`adapter`] — the `KvAdapter` contract and an in-memory reference adapter
//! - [`codec`] — pack/unpack of records, nodes, and descriptors
//! - [`transform`] — pluggable key transforms (`stringcrc`, `allzero`, `cast`)
//! - [`river`] — river descriptor, handle, creation, insert, lookup, options
//! - [`iter`] — the stack-driven range iterator
//! - [`error`] — the unified error taxonomy
//! - [`logging`] — tracing initialization helpers

pub mod adapter;
pub mod codec;
pub mod error;
pub mod iter;
pub mod logging;
pub mod river;
pub mod transform;

pub use error::{RiverError, RiverResult};
pub use iter::RiverIter;
pub use river::{IndexNode, IterOptions, RecordMap, River, RiverConfig, RiverDescriptor};
pub use transform::KeyTransform;
