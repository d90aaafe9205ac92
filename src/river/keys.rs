//! KV key schema (spec §6). Bit-exact formatting is required to
//! interoperate with existing stores, so these are the only functions
//! that may ever format a river's keys.

/// The deterministic key of a river's descriptor node.
pub fn river_node_key(name: &str) -> String {
    format!("t:{name}:rn")
}

/// The deterministic key of the index/leaf node at level granularity `g`
/// covering bucket `q`.
pub fn index_node_key(name: &str, granularity: i64, bucket: i64) -> String {
    format!("t:{name}:in:{granularity}:{bucket}")
}

/// Permitted characters in a river name: this is deliberately conservative
/// since the name is embedded directly in every key this river produces.
pub fn is_valid_river_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(':')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}
