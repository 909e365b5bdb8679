//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use revpulse_config::Settings;
use revpulse_core::{Clock, RecordStore, SystemClock, TextGenerator};
use revpulse_services::{CustomerHealthService, RevOpsService};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
    pub revops: Arc<RevOpsService>,
    pub customers: Arc<CustomerHealthService>,
    /// Model used for narrative insights, if any
    pub generator_model: Option<String>,
    /// Prometheus render handle, `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State on the wall clock without a text generator
    pub fn new(settings: Settings, store: Arc<dyn RecordStore>) -> Self {
        Self::with_clock(settings, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: Settings,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let revops = RevOpsService::new(store.clone(), clock.clone(), settings.dashboard.clone());
        let customers =
            CustomerHealthService::new(store.clone(), clock.clone(), settings.dashboard.clone());

        Self {
            settings: Arc::new(settings),
            store,
            clock,
            revops: Arc::new(revops),
            customers: Arc::new(customers),
            generator_model: None,
            metrics: None,
        }
    }

    /// Route analysis narratives through `generator`
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator_model = Some(generator.model_name().to_string());
        let revops = RevOpsService::new(
            self.store.clone(),
            self.clock.clone(),
            self.settings.dashboard.clone(),
        )
        .with_generator(generator);
        self.revops = Arc::new(revops);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
