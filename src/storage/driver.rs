//! Filesystem driver
//!
//! A [`Driver`] is the per-session handle through which a protocol layer
//! reaches the virtual tree. Drivers share one store and one configuration;
//! the only per-session state is the current root path.

use std::sync::Arc;

use log::info;

use crate::config::KvfsConfig;
use crate::store::KvStore;

#[derive(Clone)]
pub struct Driver {
    pub(crate) store: Arc<dyn KvStore>,
    pub(crate) config: Arc<KvfsConfig>,
    root_path: String,
}

impl Driver {
    pub fn new(store: Arc<dyn KvStore>, config: Arc<KvfsConfig>) -> Self {
        let root_path = config.root_path.clone();
        Self {
            store,
            config,
            root_path,
        }
    }

    /// Current root path of this session.
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub(crate) fn set_root_path(&mut self, path: String) {
        self.root_path = path;
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Whether multi-step mutations should go through atomic batches.
    pub(crate) fn use_batches(&self) -> bool {
        self.config.atomic_rename && self.store.capabilities().atomic_batch
    }
}

/// Hands out one [`Driver`] per session over a shared store.
#[derive(Clone)]
pub struct DriverFactory {
    store: Arc<dyn KvStore>,
    config: Arc<KvfsConfig>,
}

impl DriverFactory {
    pub fn new(store: Arc<dyn KvStore>, config: KvfsConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn new_driver(&self) -> Driver {
        info!(
            "Opening driver at root {} (atomic batches: {})",
            self.config.root_path,
            self.store.capabilities().atomic_batch
        );
        Driver::new(Arc::clone(&self.store), Arc::clone(&self.config))
    }
}
