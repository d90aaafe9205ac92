//! Pack/unpack of record maps, index nodes, and river descriptors to bytes.
//!
//! The wire format is internal: the core never requires byte-for-byte
//! equality of encoded values (comparisons happen on decoded structures).
//! Only the distinction between "adapter returned absent" and "adapter
//! returned a decodable value" matters outside this module, and that
//! distinction is carried by `Option<Vec<u8>>` at the adapter boundary,
//! not by anything in here.

use crate::error::RiverResult;
use crate::river::descriptor::RiverDescriptor;
use crate::river::node::IndexNode;
use crate::river::record::RecordMap;

fn pack<T: serde::Serialize>(value: &T) -> RiverResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn unpack<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> RiverResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn pack_descriptor(descriptor: &RiverDescriptor) -> RiverResult<Vec<u8>> {
    pack(descriptor)
}

pub fn unpack_descriptor(bytes: &[u8]) -> RiverResult<RiverDescriptor> {
    unpack(bytes)
}

pub fn pack_node(node: &IndexNode) -> RiverResult<Vec<u8>> {
    pack(node)
}

pub fn unpack_node(bytes: &[u8]) -> RiverResult<IndexNode> {
    unpack(bytes)
}

pub fn pack_record(record: &RecordMap) -> RiverResult<Vec<u8>> {
    pack(record)
}

pub fn unpack_record(bytes: &[u8]) -> RiverResult<RecordMap> {
    unpack(bytes)
}
