//! Seam traits for injected collaborators
//!
//! ```text
//! RecordStore   - tenant-scoped reads of leads, campaigns, customers, API keys
//! TextGenerator - free-text generation for narrative insights
//! Clock         - the "now" a single request is evaluated against
//! ```
//!
//! Services hold these behind `Arc<dyn ...>` so the HTTP layer, tests and
//! offline tooling can swap implementations.

mod clock;
mod llm;
mod store;

pub use clock::{days_since, Clock, FixedClock, SystemClock};
pub use llm::{GenerationRequest, TextGenerator};
pub use store::RecordStore;
