//! River creation and opening (spec §4.3.1, §4.3.2).

use crate::adapter::{AddOutcome, KvAdapter};
use crate::codec;
use crate::error::{RiverError, RiverResult};
use crate::river::descriptor::{RiverConfig, RiverDescriptor};
use crate::river::handle::River;
use crate::river::keys::{is_valid_river_name, river_node_key};
use crate::river::options::IterOptions;
use std::sync::Arc;
use tracing::{info, instrument};

impl<A: KvAdapter> River<A> {
    /// Creates a new river and returns a handle to it.
    ///
    /// Fails `RiverAlreadyExists` (safely-failed, noop) if a descriptor is
    /// already stored under this name.
    #[instrument(skip(adapter, config))]
    pub fn create(adapter: Arc<A>, name: &str, config: RiverConfig) -> RiverResult<River<A>> {
        if !is_valid_river_name(name) {
            return Err(RiverError::InvalidConfiguration(format!(
                "'{name}' is not a permitted river name"
            )));
        }
        config.validate()?;

        let descriptor = RiverDescriptor::new(&config);
        let bytes = codec::pack_descriptor(&descriptor)?;

        info!(river = name, "creating river");
        match adapter.add(&river_node_key(name), &bytes)? {
            AddOutcome::Ok => Ok(River {
                adapter,
                name: name.to_string(),
                ind: descriptor.ind,
                key_transform: config.key_transform,
                unique: config.unique,
                options: IterOptions::default(),
            }),
            AddOutcome::Exists => Err(RiverError::RiverAlreadyExists(name.to_string())),
        }
    }

    /// Opens a handle to an existing river, caching its `IND`/`KTR`/`UNQ`.
    ///
    /// Fails `RiverDoesNotExist` if no descriptor is stored under this
    /// name, or `KeyTransformIncompatible` if the descriptor names a key
    /// transform this build cannot resolve.
    #[instrument(skip(adapter))]
    pub fn open(adapter: Arc<A>, name: &str) -> RiverResult<River<A>> {
        let bytes = adapter
            .get(&river_node_key(name))?
            .ok_or_else(|| RiverError::RiverDoesNotExist(name.to_string()))?;
        let descriptor = codec::unpack_descriptor(&bytes)?;
        let key_transform = descriptor.resolve_transform(name)?;

        info!(river = name, "opened river");
        Ok(River {
            adapter,
            name: name.to_string(),
            ind: descriptor.ind,
            key_transform,
            unique: descriptor.unq,
            options: IterOptions::default(),
        })
    }
}
