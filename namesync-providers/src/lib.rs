//! # namesync-providers
//!
//! Provider boundary for the sync engine: the [`TaskSource`] and
//! [`ProfileSink`] traits plus HTTP adapters implementing them against
//! bearer-token REST APIs.
//!
//! Error classification (auth / transient / protocol) is colocated with the
//! adapters' HTTP calls — orchestration code only ever sees the closed
//! [`ProviderError`] taxonomy, never raw status codes.

pub mod error;
pub mod profile;
pub mod tasks;

pub use error::ProviderError;
pub use profile::{HttpProfileSink, ProfileSink};
pub use tasks::{HttpTaskSource, TaskSource};
