//! Tenant-scoped aggregation services
//!
//! Services fetch records through [`RecordStore`], read the [`Clock`] once
//! per call, score every record against that instant and assemble the views
//! the HTTP layer serializes. Narrative insights come from an optional
//! [`TextGenerator`]; without one, or when it fails, rule-based text is used.
//!
//! [`RecordStore`]: revpulse_core::RecordStore
//! [`Clock`]: revpulse_core::Clock
//! [`TextGenerator`]: revpulse_core::TextGenerator

pub mod analysis;
pub mod customers;
pub mod revops;

pub use analysis::{CampaignAnalysis, LeadAnalysis};
pub use customers::{
    CustomerAlert, CustomerDashboard, CustomerFilter, CustomerHealthService, CustomerView,
};
pub use revops::{
    CampaignView, LeadDetail, LeadSort, RevOpsDashboard, RevOpsService, ScoredLead,
};

use thiserror::Error;

/// Service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Store error: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<revpulse_core::Error> for ServiceError {
    fn from(err: revpulse_core::Error) -> Self {
        match err {
            revpulse_core::Error::NotFound { kind, id } => ServiceError::NotFound { kind, id },
            other => ServiceError::Store(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
