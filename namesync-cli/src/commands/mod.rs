//! Subcommand implementations.

pub mod credentials;
pub mod rules;
pub mod run;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use namesync_core::{JsonRuleStore, SyncConfig};
use namesync_engine::SyncEngine;
use namesync_providers::{HttpProfileSink, HttpTaskSource};

/// Wire the engine to the JSON store and the configured HTTP providers.
pub(crate) fn build_engine(
    home: &Path,
) -> Result<SyncEngine<JsonRuleStore, HttpTaskSource, HttpProfileSink>> {
    let config = SyncConfig::load_at(home).context("failed to load config")?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let store = JsonRuleStore::at(home);
    let tasks = HttpTaskSource::new(&config.tasks_base_url, timeout)
        .context("failed to build task provider client")?;
    let profile = HttpProfileSink::new(&config.profile_base_url, timeout)
        .context("failed to build profile provider client")?;

    Ok(SyncEngine::new(store, tasks, profile).with_parallelism(config.parallelism))
}

/// Multi-thread runtime for the async engine calls.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")
}
