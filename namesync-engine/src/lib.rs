//! # namesync-engine
//!
//! The name synchronization engine: renders a display name from a rule's
//! outstanding tasks, detects manual edits on the profile provider, and
//! either pushes the freshly rendered name or disables automation for that
//! rule. Call [`SyncEngine::run_once`] once per external scheduler tick.

pub mod drift;
pub mod render;
pub mod report;
pub mod runner;

pub use drift::{decide, Decision};
pub use render::render;
pub use report::{DisableReason, RuleOutcome, RuleReport, RunReport, SkipReason};
pub use runner::{ApplyError, EngineError, SyncEngine};
