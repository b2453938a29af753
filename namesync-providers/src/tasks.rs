//! Task provider adapter.
//!
//! One round trip per fetch: `GET {base}/lists/{list_id}/tasks` with
//! `showCompleted=false`, bearer auth. The provider is expected to
//! pre-filter completed items; the adapter filters defensively anyway
//! before returning.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use namesync_core::types::{Credentials, Task, TaskListId};

use crate::error::{build_client, classify_status, classify_transport, ProviderError};

/// Fetches the outstanding tasks for a rule's configured list.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Outstanding (non-completed) tasks in provider order.
    async fn fetch_tasks(
        &self,
        credentials: &Credentials,
        task_list_id: &TaskListId,
    ) -> Result<Vec<Task>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TaskListPayload {
    #[serde(default)]
    items: Vec<TaskItemPayload>,
}

#[derive(Debug, Deserialize)]
struct TaskItemPayload {
    /// Optional on the wire; an absent title becomes an empty string, so
    /// the rendered name shows a bare separator where the task would be.
    #[serde(default)]
    title: Option<String>,
    /// Opaque lexicographic sort key. Required on outstanding items; a
    /// missing or non-string value makes ordering undefined and is a
    /// contract violation, never silently coerced.
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

// ---------------------------------------------------------------------------
// HTTP adapter
// ---------------------------------------------------------------------------

/// [`TaskSource`] over a Google-Tasks-shaped REST API.
#[derive(Debug, Clone)]
pub struct HttpTaskSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTaskSource {
    /// Adapter rooted at `base_url` with a hard per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = build_client(&base_url, timeout)?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn endpoint(&self, task_list_id: &TaskListId) -> String {
        format!("{}/lists/{}/tasks", self.base_url, task_list_id)
    }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    async fn fetch_tasks(
        &self,
        credentials: &Credentials,
        task_list_id: &TaskListId,
    ) -> Result<Vec<Task>, ProviderError> {
        let endpoint = self.endpoint(task_list_id);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("showCompleted", "false")])
            .bearer_auth(&credentials.access_token)
            .send()
            .await
            .map_err(|e| classify_transport(&endpoint, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(&endpoint, status));
        }

        let payload: TaskListPayload = response
            .json()
            .await
            .map_err(|e| classify_transport(&endpoint, self.timeout, e))?;

        let mut tasks = Vec::with_capacity(payload.items.len());
        for item in payload.items {
            if item.status.as_deref() == Some("completed") {
                continue;
            }
            let Some(position) = item.position else {
                return Err(ProviderError::protocol(
                    &endpoint,
                    "task item missing string `position`",
                ));
            };
            tasks.push(Task {
                title: item.title.unwrap_or_default(),
                position,
            });
        }

        tracing::debug!(list = %task_list_id, count = tasks.len(), "fetched outstanding tasks");
        Ok(tasks)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
