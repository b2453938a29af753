//! Per-run outcome reporting.
//!
//! `run_once` returns a [`RunReport`] for observability; callers only need
//! the side effects plus the aggregate counts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use namesync_core::types::{Provider, UserId};

/// Why a rule was disabled (or would be, in dry-run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "cause")]
pub enum DisableReason {
    /// The live profile name matched neither the last engine write nor the
    /// fresh target — a human (or another process) changed it.
    Drift { remote_name: String },
    /// A provider rejected the credential.
    Auth { provider: Provider, detail: String },
}

/// Why a rule was skipped without any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "cause")]
pub enum SkipReason {
    /// No token provisioned for this provider — a configuration gap, not an
    /// error.
    MissingCredentials { provider: Provider },
    /// Rule is enabled but has no recorded last generated name, so drift
    /// cannot be told apart from a first write.
    MissingBaseline,
}

/// Terminal outcome for one rule in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RuleOutcome {
    /// Profile written and baseline advanced.
    Updated { name: String },
    /// Dry-run: the profile *would* have been written.
    WouldUpdate { name: String },
    /// Remote already shows the computed name; nothing written.
    AlreadyCurrent,
    /// Automation halted for this rule.
    Disabled { reason: DisableReason },
    /// Dry-run: automation *would* have been halted.
    WouldDisable { reason: DisableReason },
    /// No attempt made this run.
    Skipped { reason: SkipReason },
    /// Transient or protocol failure; rule untouched, retried next run.
    Failed { detail: String },
}

/// One rule's outcome, tagged with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub user_id: UserId,
    pub outcome: RuleOutcome,
}

/// Aggregate result of one `run_once` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub dry_run: bool,
    pub rules: Vec<RuleReport>,
}

impl RunReport {
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, RuleOutcome::Updated { .. } | RuleOutcome::WouldUpdate { .. }))
    }

    pub fn already_current(&self) -> usize {
        self.count(|o| matches!(o, RuleOutcome::AlreadyCurrent))
    }

    pub fn disabled(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                RuleOutcome::Disabled { .. } | RuleOutcome::WouldDisable { .. }
            )
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RuleOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RuleOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RuleOutcome) -> bool) -> usize {
        self.rules.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<RuleOutcome>) -> RunReport {
        RunReport {
            started_at: Utc::now(),
            duration_ms: 1,
            dry_run: false,
            rules: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| RuleReport {
                    user_id: UserId::from(format!("u-{i}")),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn aggregate_counts() {
        let r = report(vec![
            RuleOutcome::Updated {
                name: "a".to_string(),
            },
            RuleOutcome::AlreadyCurrent,
            RuleOutcome::Disabled {
                reason: DisableReason::Drift {
                    remote_name: "x".to_string(),
                },
            },
            RuleOutcome::Skipped {
                reason: SkipReason::MissingBaseline,
            },
            RuleOutcome::Failed {
                detail: "boom".to_string(),
            },
        ]);
        assert_eq!(r.updated(), 1);
        assert_eq!(r.already_current(), 1);
        assert_eq!(r.disabled(), 1);
        assert_eq!(r.skipped(), 1);
        assert_eq!(r.failed(), 1);
    }

    #[test]
    fn dry_run_variants_count_with_their_real_counterparts() {
        let r = report(vec![
            RuleOutcome::WouldUpdate {
                name: "a".to_string(),
            },
            RuleOutcome::WouldDisable {
                reason: DisableReason::Drift {
                    remote_name: "x".to_string(),
                },
            },
        ]);
        assert_eq!(r.updated(), 1);
        assert_eq!(r.disabled(), 1);
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(RuleOutcome::Updated {
            name: "a".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "updated");
    }
}
