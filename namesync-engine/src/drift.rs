//! Drift detection.
//!
//! Automation must never clobber a name a human deliberately set outside
//! the tool. The only signal available is comparing the provider's live
//! name against the name the engine itself wrote last time.
//!
//! Decision precedence:
//! 1. `AlreadyCurrent` — live name equals the freshly computed target
//! 2. `Proceed` — live name equals the engine's last write (no manual edit)
//! 3. `Disable` — live name matches neither: someone else changed it

use serde::Serialize;

/// Terminal per-rule decision for one run. No retry within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Write the computed name and advance the stored baseline.
    Proceed,
    /// Nothing to do; remote already shows the computed name.
    AlreadyCurrent,
    /// Manual edit detected; halt automation for this rule.
    Disable,
}

/// Classify the provider's live name against the last engine write and the
/// freshly computed target. Total over the three-way outcome set.
pub fn decide(current_remote: &str, last_generated: &str, computed: &str) -> Decision {
    if current_remote == computed {
        Decision::AlreadyCurrent
    } else if current_remote == last_generated {
        Decision::Proceed
    } else {
        Decision::Disable
    }
}
