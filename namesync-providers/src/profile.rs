//! Profile provider adapter.
//!
//! Two operations, one round trip each: read the current display name
//! (`GET {base}/profile`) and set it (`PATCH {base}/profile`). The write is
//! idempotent in effect — the orchestrator compares names before calling it,
//! and re-writing an identical name is safe.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use namesync_core::types::Credentials;

use crate::error::{build_client, classify_status, classify_transport, ProviderError};

/// Reads and writes the display name on the profile provider.
#[async_trait]
pub trait ProfileSink: Send + Sync {
    /// The profile's current display name.
    async fn read_current_name(&self, credentials: &Credentials) -> Result<String, ProviderError>;

    /// Set the display name.
    async fn write_name(&self, credentials: &Credentials, name: &str)
        -> Result<(), ProviderError>;
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProfilePayload {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct NameUpdatePayload<'a> {
    name: &'a str,
}

// ---------------------------------------------------------------------------
// HTTP adapter
// ---------------------------------------------------------------------------

/// [`ProfileSink`] over a bearer-token REST profile API.
#[derive(Debug, Clone)]
pub struct HttpProfileSink {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpProfileSink {
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

    fn endpoint(&self) -> String {
        format!("{}/profile", self.base_url)
    }
}

#[async_trait]
impl ProfileSink for HttpProfileSink {
    async fn read_current_name(&self, credentials: &Credentials) -> Result<String, ProviderError> {
        let endpoint = self.endpoint();

        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(&credentials.access_token)
            .send()
            .await
            .map_err(|e| classify_transport(&endpoint, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(&endpoint, status));
        }

        let payload: ProfilePayload = response
            .json()
            .await
            .map_err(|e| classify_transport(&endpoint, self.timeout, e))?;

        payload
            .name
            .ok_or_else(|| ProviderError::protocol(&endpoint, "profile missing `name` field"))
    }

    async fn write_name(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<(), ProviderError> {
        let endpoint = self.endpoint();

        let response = self
            .client
            .patch(&endpoint)
            .bearer_auth(&credentials.access_token)
            .json(&NameUpdatePayload { name })
            .send()
            .await
            .map_err(|e| classify_transport(&endpoint, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(&endpoint, status));
        }

        tracing::debug!("profile name written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(server: &MockServer) -> HttpProfileSink {
        HttpProfileSink::new(server.uri(), Duration::from_secs(2)).unwrap()
    }

    fn creds() -> Credentials {
        Credentials::new("tok-2")
    }

    #[tokio::test]
    async fn reads_current_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .and(bearer_token("tok-2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "name": "Alex@Buy milk" })),
            )
            .mount(&server)
            .await;

        let name = sink(&server).read_current_name(&creds()).await.unwrap();
        assert_eq!(name, "Alex@Buy milk");
    }

    #[tokio::test]
    async fn missing_name_field_is_a_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "123" })))
            .mount(&server)
            .await;

        let err = sink(&server).read_current_name(&creds()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Protocol { .. }));
    }

    #[tokio::test]
    async fn writes_name_as_json_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/profile"))
            .and(bearer_token("tok-2"))
            .and(body_json(json!({ "name": "Alex@Buy milk、Call Bob" })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        sink(&server)
            .write_name(&creds(), "Alex@Buy milk、Call Bob")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn revoked_token_on_write_is_auth() {
        // Some profile providers reject dead tokens with 400 rather than 401.
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = sink(&server)
            .write_name(&creds(), "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Auth { status: 400, .. }));
    }

    #[tokio::test]
    async fn slow_write_times_out_as_transient() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let sink = HttpProfileSink::new(server.uri(), Duration::from_millis(200)).unwrap();
        let err = sink.write_name(&creds(), "anything").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transient { .. }), "{err}");
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = sink(&server).read_current_name(&creds()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transient { .. }));
    }
}
