//! Core records and traits for the revpulse backend
//!
//! This crate provides foundational types used across all other crates:
//! - Domain records (leads, campaigns, customers, API keys)
//! - Closed enumerations for every string-keyed field the store returns
//! - Seam traits for injected collaborators (record store, text generation, clock)
//! - Error types
//!
//! Nothing in here performs I/O. Implementations of the seam traits live in
//! `revpulse-persistence` and `revpulse-llm`.

pub mod api_key;
pub mod campaign;
pub mod customer;
pub mod error;
pub mod lead;
pub mod traits;

pub use api_key::{ApiKeyRecord, ApiScope, KeyContext};
pub use campaign::Campaign;
pub use customer::{Customer, CustomerMetadata};
pub use error::{Error, Result};
pub use lead::{EngagementLevel, Lead, LeadSource, LeadStatus};

pub use traits::{
    days_since, Clock, FixedClock, GenerationRequest, RecordStore, SystemClock, TextGenerator,
};

/// Money is always an exact decimal.
pub type Money = rust_decimal::Decimal;

/// Organization (tenant) identifier
pub type OrgId = uuid::Uuid;
