//! Namesync core library — domain types, rule store persistence, config.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`error`] — [`StoreError`], [`ConfigError`]
//! - [`store`] — [`RuleStore`] trait and the JSON-file implementation
//! - [`config`] — engine/provider configuration file

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::SyncConfig;
pub use error::{ConfigError, StoreError};
pub use store::{JsonRuleStore, RuleStore};
pub use types::{Credentials, Provider, Rule, Task, TaskListId, UserId};
