//! Sync orchestration.
//!
//! One invocation of [`SyncEngine::run_once`] processes every eligible rule
//! exactly once: fetch tasks → render → read live name → drift decision →
//! conditional write + baseline advance, with each rule isolated so one
//! failure never aborts the batch. Rules are driven concurrently up to a
//! bounded worker count; the steps within one rule stay strictly
//! sequential.
//!
//! The profile write and the baseline persist are sequential, not
//! transactional. A crash between them self-heals: the next run sees the
//! remote equal to the computed name (`AlreadyCurrent`), or — if the tasks
//! changed in the meantime — neither value, which lands on the fail-safe
//! `Disable` default.

use std::time::Instant;

use chrono::Utc;
use futures::{stream, StreamExt};
use thiserror::Error;

use namesync_core::error::StoreError;
use namesync_core::store::RuleStore;
use namesync_core::types::{Credentials, Provider, Rule};
use namesync_providers::{ProfileSink, ProviderError, TaskSource};

use crate::drift::{decide, Decision};
use crate::render::render;
use crate::report::{DisableReason, RuleOutcome, RuleReport, RunReport, SkipReason};

/// Failures that abort an entire run (as opposed to a single rule).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rule store could not be read at all.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures from [`SyncEngine::apply_rule`], the one-shot submission path.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("no {provider} credentials provisioned for this user")]
    MissingCredentials { provider: Provider },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The name synchronization engine, generic over its three collaborators.
pub struct SyncEngine<S, T, P> {
    store: S,
    tasks: T,
    profile: P,
    parallelism: usize,
    dry_run: bool,
}

impl<S, T, P> SyncEngine<S, T, P>
where
    S: RuleStore,
    T: TaskSource,
    P: ProfileSink,
{
    pub fn new(store: S, tasks: T, profile: P) -> Self {
        Self {
            store,
            tasks,
            profile,
            parallelism: 4,
            dry_run: false,
        }
    }

    /// Upper bound on rules processed concurrently within one run.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Report what a run would do without writing to the profile provider
    /// or mutating the store.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process every eligible rule once and return the aggregate report.
    ///
    /// Per-rule failures surface as [`RuleOutcome`]s, never as an `Err`;
    /// only an unreadable store aborts the run.
    pub async fn run_once(&self) -> Result<RunReport, EngineError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let rules = self.store.list_eligible_rules()?;
        tracing::info!(eligible = rules.len(), dry_run = self.dry_run, "sync run started");

        let reports: Vec<RuleReport> = stream::iter(rules.into_iter().map(|rule| async move {
            let user_id = rule.user_id.clone();
            let outcome = self.sync_rule(rule).await;
            RuleReport { user_id, outcome }
        }))
        .buffer_unordered(self.parallelism)
        .collect()
        .await;

        let report = RunReport {
            started_at,
            duration_ms: clock.elapsed().as_millis(),
            dry_run: self.dry_run,
            rules: reports,
        };
        tracing::info!(
            updated = report.updated(),
            current = report.already_current(),
            disabled = report.disabled(),
            skipped = report.skipped(),
            failed = report.failed(),
            duration_ms = report.duration_ms as u64,
            "sync run finished"
        );
        Ok(report)
    }

    /// Steps 1–6 for a single rule. Every early return is a terminal
    /// outcome for this run; nothing retries in-run.
    async fn sync_rule(&self, rule: Rule) -> RuleOutcome {
        let Some(last_generated) = rule.last_generated_name.clone() else {
            tracing::warn!(user = %rule.user_id, "enabled rule has no baseline name; skipping");
            return RuleOutcome::Skipped {
                reason: SkipReason::MissingBaseline,
            };
        };

        let tasks_creds = match self.resolve_credentials(&rule, Provider::Tasks) {
            Ok(creds) => creds,
            Err(outcome) => return outcome,
        };
        let profile_creds = match self.resolve_credentials(&rule, Provider::Profile) {
            Ok(creds) => creds,
            Err(outcome) => return outcome,
        };

        let tasks = match self.tasks.fetch_tasks(&tasks_creds, &rule.task_list_id).await {
            Ok(tasks) => tasks,
            Err(err) => return self.provider_failure(&rule, Provider::Tasks, err),
        };

        let computed = render(&tasks, &rule);

        let current = match self.profile.read_current_name(&profile_creds).await {
            Ok(name) => name,
            Err(err) => return self.provider_failure(&rule, Provider::Profile, err),
        };

        match decide(&current, &last_generated, &computed) {
            Decision::AlreadyCurrent => {
                tracing::debug!(user = %rule.user_id, "name already current");
                RuleOutcome::AlreadyCurrent
            }
            Decision::Disable => self.disable(
                &rule,
                DisableReason::Drift {
                    remote_name: current,
                },
            ),
            Decision::Proceed => self.push_name(&rule, &profile_creds, computed).await,
        }
    }

    /// Write the computed name and advance the stored baseline.
    async fn push_name(
        &self,
        rule: &Rule,
        profile_creds: &Credentials,
        computed: String,
    ) -> RuleOutcome {
        if self.dry_run {
            return RuleOutcome::WouldUpdate { name: computed };
        }

        if let Err(err) = self.profile.write_name(profile_creds, &computed).await {
            return self.provider_failure(rule, Provider::Profile, err);
        }

        if let Err(err) = self
            .store
            .set_last_generated_name(&rule.user_id, &computed)
        {
            // Profile already carries the new name; next run resolves this
            // as AlreadyCurrent.
            tracing::error!(user = %rule.user_id, error = %err, "failed to persist baseline after write");
            return RuleOutcome::Failed {
                detail: err.to_string(),
            };
        }

        tracing::info!(user = %rule.user_id, name = %computed, "profile name updated");
        RuleOutcome::Updated { name: computed }
    }

    /// Map a classified provider failure to its terminal outcome: auth
    /// disables, everything else is logged and retried next run.
    fn provider_failure(
        &self,
        rule: &Rule,
        provider: Provider,
        err: ProviderError,
    ) -> RuleOutcome {
        match err {
            ProviderError::Auth { .. } => self.disable(
                rule,
                DisableReason::Auth {
                    provider,
                    detail: err.to_string(),
                },
            ),
            ProviderError::Transient { .. } => {
                tracing::warn!(user = %rule.user_id, %provider, error = %err, "transient provider failure; will retry next run");
                RuleOutcome::Failed {
                    detail: err.to_string(),
                }
            }
            ProviderError::Protocol { .. } => {
                tracing::error!(user = %rule.user_id, %provider, error = %err, "provider contract violation; skipping this cycle");
                RuleOutcome::Failed {
                    detail: err.to_string(),
                }
            }
        }
    }

    fn disable(&self, rule: &Rule, reason: DisableReason) -> RuleOutcome {
        if self.dry_run {
            return RuleOutcome::WouldDisable { reason };
        }
        match self.store.disable(&rule.user_id) {
            Ok(()) => {
                tracing::warn!(user = %rule.user_id, ?reason, "automation disabled");
                RuleOutcome::Disabled { reason }
            }
            Err(err) => {
                tracing::error!(user = %rule.user_id, error = %err, "failed to disable rule");
                RuleOutcome::Failed {
                    detail: err.to_string(),
                }
            }
        }
    }

    fn resolve_credentials(
        &self,
        rule: &Rule,
        provider: Provider,
    ) -> Result<Credentials, RuleOutcome> {
        match self.store.credentials(&rule.user_id, provider) {
            Ok(Some(creds)) => Ok(creds),
            Ok(None) => {
                tracing::info!(user = %rule.user_id, %provider, "no credentials provisioned; skipping rule");
                Err(RuleOutcome::Skipped {
                    reason: SkipReason::MissingCredentials { provider },
                })
            }
            Err(err) => {
                tracing::error!(user = %rule.user_id, %provider, error = %err, "credential lookup failed");
                Err(RuleOutcome::Failed {
                    detail: err.to_string(),
                })
            }
        }
    }

    /// One-shot submission path used when a rule is created or re-enabled:
    /// fetch the rule's tasks, render, and write the profile immediately.
    ///
    /// Returns the written name so the caller can persist it as the rule's
    /// baseline. No drift check — the user just asked for this write.
    pub async fn apply_rule(&self, rule: &Rule) -> Result<String, ApplyError> {
        let tasks_creds = self
            .store
            .credentials(&rule.user_id, Provider::Tasks)?
            .ok_or(ApplyError::MissingCredentials {
                provider: Provider::Tasks,
            })?;
        let profile_creds = self
            .store
            .credentials(&rule.user_id, Provider::Profile)?
            .ok_or(ApplyError::MissingCredentials {
                provider: Provider::Profile,
            })?;

        let tasks = self.tasks.fetch_tasks(&tasks_creds, &rule.task_list_id).await?;
        let name = render(&tasks, rule);
        self.profile.write_name(&profile_creds, &name).await?;
        tracing::info!(user = %rule.user_id, name = %name, "rule applied");
        Ok(name)
    }
}
