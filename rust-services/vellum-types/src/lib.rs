//! Vellum Types
//!
//! Shared data model for the Vellum record store: stored records, backup
//! entries, the payloads handed to callers, and the store error taxonomy.

pub mod record;
pub mod schemas;
pub mod error;

pub use record::*;
pub use schemas::*;
pub use error::*;
