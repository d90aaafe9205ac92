//! Records ("fish") — the maps of user fields stored in a river.

use crate::error::{RiverError, RiverResult};
use crate::transform::KeyTransform;
use serde_json::Value;
use std::collections::BTreeMap;

/// A record: a map of user-supplied fields. `BTreeMap` keeps field order
/// stable, which keeps the codec's byte output deterministic for a given
/// record — useful for the idempotent-re-drive byte-equality check (spec
/// §4.3.3 step 5).
pub type RecordMap = BTreeMap<String, Value>;

/// The field holding the user's (possibly untransformed) key.
pub const KEY_FIELD: &str = "KEY";

/// The field a key transform stashes the original user key under.
pub const HIDDEN_KEY_FIELD: &str = "_KEY";

/// Rejects records with any field name beginning with the reserved `_`
/// prefix (spec §4.3.3 step 1).
pub fn reject_metadata_fields(record: &RecordMap) -> RiverResult<()> {
    if let Some(field) = record.keys().find(|k| k.starts_with('_')) {
        return Err(RiverError::DisallowedMetadataKey(field.clone()));
    }
    Ok(())
}

/// Extracts the raw `KEY` field, required on every record.
pub fn user_key(record: &RecordMap) -> RiverResult<&Value> {
    record.get(KEY_FIELD).ok_or_else(|| {
        RiverError::InvalidConfiguration(format!("record is missing required field '{KEY_FIELD}'"))
    })
}

/// Rewrites a record for storage and computes its sort key.
///
/// Without a transform, `KEY` must already be an integer and becomes the
/// sort key directly. With a transform, the record is rewritten to
/// `{ KEY: transform(KEY), _KEY: KEY, ...rest }` and the sort key is the
/// transformed value (spec §4.3.3 step 2, §3.3).
pub fn prepare_for_insert(
    record: &RecordMap,
    transform: Option<KeyTransform>,
) -> RiverResult<(i64, RecordMap)> {
    reject_metadata_fields(record)?;
    let raw_key = user_key(record)?.clone();

    match transform {
        None => {
            let k = raw_key.as_i64().ok_or_else(|| {
                RiverError::InvalidConfiguration(
                    "KEY must be an integer when no key transform is configured".to_string(),
                )
            })?;
            Ok((k, record.clone()))
        }
        Some(ktr) => {
            let k = ktr.apply(&raw_key)?;
            let mut stored = record.clone();
            stored.insert(HIDDEN_KEY_FIELD.to_string(), raw_key);
            stored.insert(KEY_FIELD.to_string(), Value::from(k));
            Ok((k, stored))
        }
    }
}

/// Restores a record to its user-facing shape: with a transform, `KEY` is
/// replaced by the stashed `_KEY` and `_KEY` is dropped (spec §3.3, §4.3.4
/// step 4).
pub fn restore_user_view(stored: &RecordMap, transform: Option<KeyTransform>) -> RecordMap {
    if transform.is_none() {
        return stored.clone();
    }
    let mut out = stored.clone();
    if let Some(original) = out.remove(HIDDEN_KEY_FIELD) {
        out.insert(KEY_FIELD.to_string(), original);
    }
    out
}
