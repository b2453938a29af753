//! Provider error taxonomy.
//!
//! Three closed variants drive the orchestrator's policy:
//! - [`ProviderError::Auth`] → the rule is disabled (fail-safe: never spin
//!   against a dead or revoked credential)
//! - [`ProviderError::Transient`] → logged, rule untouched, retried on the
//!   next scheduled run
//! - [`ProviderError::Protocol`] → logged as a defect, this cycle's write is
//!   skipped, rule not disabled (not the user's fault)

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Classified failure from a provider round trip.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credential invalid, expired, revoked, or missing scope.
    #[error("authentication rejected by {endpoint} (HTTP {status})")]
    Auth { endpoint: String, status: u16 },

    /// Network failure, timeout, rate limit, or server-side error.
    #[error("transient failure calling {endpoint}: {reason}")]
    Transient { endpoint: String, reason: String },

    /// The response violated the provider contract.
    #[error("protocol violation from {endpoint}: {reason}")]
    Protocol { endpoint: String, reason: String },
}

impl ProviderError {
    pub(crate) fn protocol(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn transient(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transient {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

/// Map a non-success HTTP status to the taxonomy.
///
/// 400 is conventionally how the profile provider rejects bad tokens, so it
/// lands in Auth alongside 401/403. Other 4xx (404 for a deleted task list,
/// say) are Protocol — the credential may be fine and disabling would be
/// wrong.
pub(crate) fn classify_status(endpoint: &str, status: StatusCode) -> ProviderError {
    match status.as_u16() {
        400 | 401 | 403 => ProviderError::Auth {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        },
        408 | 429 => ProviderError::transient(endpoint, format!("HTTP {status}")),
        code if status.is_server_error() => {
            ProviderError::transient(endpoint, format!("HTTP {code}"))
        }
        code => ProviderError::protocol(endpoint, format!("unexpected HTTP {code}")),
    }
}

/// Map a reqwest transport/decoding failure to the taxonomy.
pub(crate) fn classify_transport(
    endpoint: &str,
    timeout: Duration,
    err: reqwest::Error,
) -> ProviderError {
    if err.is_timeout() {
        ProviderError::transient(endpoint, format!("timed out after {timeout:?}"))
    } else if err.is_decode() {
        ProviderError::protocol(endpoint, format!("undecodable response: {err}"))
    } else {
        ProviderError::transient(endpoint, err.to_string())
    }
}

/// Build the shared HTTP client with the per-request timeout bound every
/// provider call must honor.
pub(crate) fn build_client(
    endpoint: &str,
    timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::transient(endpoint, format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses() {
        for code in [400u16, 401, 403] {
            let err = classify_status("ep", StatusCode::from_u16(code).unwrap());
            assert!(matches!(err, ProviderError::Auth { status, .. } if status == code));
        }
    }

    #[test]
    fn transient_statuses() {
        for code in [408u16, 429, 500, 502, 503] {
            let err = classify_status("ep", StatusCode::from_u16(code).unwrap());
            assert!(matches!(err, ProviderError::Transient { .. }), "HTTP {code}");
        }
    }

    #[test]
    fn other_client_errors_are_protocol() {
        for code in [404u16, 409, 418] {
            let err = classify_status("ep", StatusCode::from_u16(code).unwrap());
            assert!(matches!(err, ProviderError::Protocol { .. }), "HTTP {code}");
        }
    }
}
