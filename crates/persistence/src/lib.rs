//! Record store implementations for the revpulse backend
//!
//! - [`RestRecordStore`] reads tenant data from the hosted relational store
//!   through its REST query API
//! - [`InMemoryRecordStore`] keeps records in process, optionally seeded from
//!   a JSON fixture
//!
//! Both are read-only from the service layer's point of view.

pub mod client;
pub mod error;
pub mod memory;
pub mod rest;

pub use client::{Filter, RestClient, RestConfig};
pub use error::PersistenceError;
pub use memory::{InMemoryRecordStore, SeedData};
pub use rest::RestRecordStore;

use revpulse_config::{StoreBackend, StoreConfig};
use revpulse_core::RecordStore;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured record store
pub fn init(config: &StoreConfig) -> Result<Arc<dyn RecordStore>, PersistenceError> {
    match config.backend {
        StoreBackend::Memory => {
            let store = match &config.seed_file {
                Some(path) => InMemoryRecordStore::from_seed_file(path)?,
                None => {
                    tracing::warn!("In-memory store started without seed data");
                    InMemoryRecordStore::new()
                }
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Rest => {
            let url = config.url.as_deref().ok_or_else(|| {
                PersistenceError::Configuration("store.url is required for the rest backend".into())
            })?;

            let mut rest = RestConfig::new(url).with_timeout(Duration::from_secs(config.timeout_secs));
            if let Some(key) = &config.service_key {
                rest = rest.with_service_key(key.clone());
            }

            Ok(Arc::new(RestRecordStore::new(RestClient::new(rest)?)))
        }
    }
}
