//! Endpoint configuration with change notification

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::error::YieldResult;
use crate::settings::{SettingsStore, PROVIDER_URL_KEY};

/// Endpoint used when none has been chosen
pub const DEFAULT_PROVIDER_URL: &str = "https://ethereum-rpc.publicnode.com";

/// Receives every endpoint change
pub trait EndpointListener: Send + Sync {
    fn endpoint_changed(&self, url: &str);
}

/// The data-source URL shared by every calculator of the session
///
/// The URL is not validated; a malformed value only fails on the next call
/// to the data source.
pub struct EndpointConfig {
    store: Arc<dyn SettingsStore>,
    url: RwLock<String>,
    listeners: RwLock<Vec<Arc<dyn EndpointListener>>>,
}

impl EndpointConfig {
    /// Restore the persisted endpoint, or the default
    pub fn load(store: Arc<dyn SettingsStore>) -> Self {
        let url = store.get(PROVIDER_URL_KEY, DEFAULT_PROVIDER_URL);
        Self {
            store,
            url: RwLock::new(url),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn get(&self) -> String {
        self.url.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Persist `url`, then push it to every listener
    pub fn set(&self, url: &str) -> YieldResult<()> {
        self.store.set(PROVIDER_URL_KEY, url)?;
        *self.url.write().unwrap_or_else(|e| e.into_inner()) = url.to_string();

        info!("Endpoint changed to {}", url);

        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            listener.endpoint_changed(url);
        }
        Ok(())
    }

    pub fn reset_to_default(&self) -> YieldResult<()> {
        self.set(DEFAULT_PROVIDER_URL)
    }

    pub fn is_default(&self) -> bool {
        self.get() == DEFAULT_PROVIDER_URL
    }

    /// Register a listener for later changes
    pub fn subscribe(&self, listener: Arc<dyn EndpointListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }
}
