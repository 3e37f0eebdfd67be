use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use http::{header::CONTENT_TYPE, Request};
use serde::{Deserialize, Serialize};

use crate::{
    config::ValidatorConfig,
    core::{
        credential::CredentialStatus, diagnostic::DiagnosticContext, error::ValidationError,
        proof::ProofSet, util::AsyncHttpClient,
    },
};

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_ISSUED: &str = "ISSUED";
pub const STATUS_REVOKED: &str = "REVOKED";
pub const STATUS_DELETED: &str = "DELETED";
pub const STATUS_EXPIRED: &str = "EXPIRED";
pub const STATUS_INVALID: &str = "INVALID";
pub const STATUS_CLAIMED: &str = "CLAIMED";
pub const STATUS_SUSPEND: &str = "SUSPEND";

/// Document served by a credential status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableStatus {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub verifiable_credential: Vec<StatusCredential>,
}

impl VerifiableStatus {
    /// The status claim about `credential_id`, if the document has one.
    pub fn claim(&self, credential_id: &str) -> Option<&StatusClaim> {
        self.verifiable_credential
            .iter()
            .map(|record| &record.claim)
            .find(|claim| claim.id == credential_id)
    }
}

/// A signed statement about the status of one credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCredential {
    pub claim: StatusClaim,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusClaim {
    pub id: String,
    /// One of the `STATUS_*` values, unknown values are kept as is.
    pub current_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The endpoint answered and the credential is not in good standing.
    #[error("credential status not valid: {0}")]
    NotValid(String),
    #[error("credential status unreachable: {0:#}")]
    Transport(anyhow::Error),
}

impl From<StatusError> for ValidationError {
    fn from(value: StatusError) -> Self {
        match value {
            StatusError::NotValid(_) => ValidationError::StatusNotValid,
            StatusError::Transport(e) => ValidationError::Transport(e),
        }
    }
}

/// Looks up credential revocation status at the endpoint named by `credentialStatus.id`.
#[derive(Clone)]
pub struct StatusChecker {
    client: Arc<dyn AsyncHttpClient + Send + Sync>,
    timeout: Duration,
    trace_header: String,
}

impl std::fmt::Debug for StatusChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusChecker")
            .field("timeout", &self.timeout)
            .field("trace_header", &self.trace_header)
            .finish_non_exhaustive()
    }
}

impl StatusChecker {
    pub fn new(client: Arc<dyn AsyncHttpClient + Send + Sync>, config: &ValidatorConfig) -> Self {
        Self {
            client,
            timeout: config.status_timeout(),
            trace_header: config.trace_header().to_string(),
        }
    }

    /// Succeeds only when the endpoint reports the credential as [STATUS_ISSUED].
    ///
    /// The lookup is abandoned after the configured timeout or the context deadline,
    /// whichever comes first.
    pub async fn check(
        &self,
        ctx: &DiagnosticContext,
        status: &CredentialStatus,
        credential_id: &str,
    ) -> Result<(), StatusError> {
        let request = Request::builder()
            .method("GET")
            .uri(status.id.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(self.trace_header.as_str(), ctx.trace_id())
            .body(vec![])
            .context("failed to build status request")
            .map_err(StatusError::Transport)?;

        let response = ctx
            .bounded(Some(self.timeout), self.client.execute(request))
            .await
            .map_err(|_| StatusError::Transport(anyhow!("status request to {} timed out", status.id)))?
            .context(format!("failed to make status request at {}", status.id))
            .map_err(StatusError::Transport)?;

        let code = response.status();
        if !code.is_success() {
            return Err(StatusError::NotValid(format!(
                "status request was unsuccessful (status: {code})"
            )));
        }

        let document: VerifiableStatus = serde_json::from_slice(response.body())
            .map_err(|e| StatusError::NotValid(format!("unable to decode status document: {e}")))?;

        let claim = document.claim(credential_id).ok_or_else(|| {
            StatusError::NotValid(format!("no status recorded for {credential_id}"))
        })?;

        if claim.current_status != STATUS_ISSUED {
            tracing::debug!(
                "credential {credential_id} is {}: {}",
                claim.current_status,
                claim.status_reason.as_deref().unwrap_or_default()
            );
            return Err(StatusError::NotValid(claim.current_status.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use http::Response;
    use serde_json::json;

    struct Endpoint {
        status: u16,
        body: Vec<u8>,
        delay: Option<Duration>,
        seen: Mutex<Vec<Request<Vec<u8>>>>,
    }

    impl Endpoint {
        fn new(status: u16, body: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string().into_bytes(),
                delay: None,
                seen: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl AsyncHttpClient for Endpoint {
        async fn execute(&self, request: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>> {
            self.seen.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(Response::builder()
                .status(self.status)
                .body(self.body.clone())?)
        }
    }

    fn status_document(current_status: &str) -> serde_json::Value {
        json!({
            "id": "https://example.edu/status/24",
            "verifiableCredential": [{
                "claim": {
                    "id": "cred:example:employee12345",
                    "currentStatus": current_status,
                    "statusReason": "Disciplinary action"
                },
                "issued": "2017-12-05T14:27:42Z",
                "issuer": "did:example:ebfeb1f712ebc6f1c276e12ec21"
            }]
        })
    }

    fn pointer() -> CredentialStatus {
        CredentialStatus {
            id: "https://example.edu/status/24".into(),
            status_type: "CredentialStatusList2017".into(),
        }
    }

    #[tokio::test]
    async fn issued_credential_passes_and_trace_is_propagated() {
        let endpoint = Endpoint::new(200, status_document(STATUS_ISSUED));
        let checker = StatusChecker::new(endpoint.clone(), &ValidatorConfig::default());
        let ctx = DiagnosticContext::with_trace_id("trace-42");

        checker
            .check(&ctx, &pointer(), "cred:example:employee12345")
            .await
            .unwrap();

        let seen = endpoint.seen.lock().unwrap();
        assert_eq!(seen[0].headers()["X-Span-Id"], "trace-42");
        assert_eq!(seen[0].headers()[CONTENT_TYPE], "application/json");
        assert_eq!(seen[0].uri(), "https://example.edu/status/24");
    }

    #[tokio::test]
    async fn revoked_or_unknown_credentials_fail() {
        let ctx = DiagnosticContext::new();
        let config = ValidatorConfig::default();

        let checker = StatusChecker::new(Endpoint::new(200, status_document(STATUS_REVOKED)), &config);
        let err = checker
            .check(&ctx, &pointer(), "cred:example:employee12345")
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::NotValid(ref s) if s == STATUS_REVOKED));

        let checker = StatusChecker::new(Endpoint::new(200, status_document(STATUS_ISSUED)), &config);
        let err = checker
            .check(&ctx, &pointer(), "cred:example:other")
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::NotValid(_)));

        let checker = StatusChecker::new(Endpoint::new(404, json!({})), &config);
        let err = checker
            .check(&ctx, &pointer(), "cred:example:employee12345")
            .await
            .unwrap_err();
        assert!(matches!(
            ValidationError::from(err),
            ValidationError::StatusNotValid
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_endpoint_times_out() {
        let endpoint = Arc::new(Endpoint {
            status: 200,
            body: status_document(STATUS_ISSUED).to_string().into_bytes(),
            delay: Some(Duration::from_secs(10)),
            seen: Mutex::new(vec![]),
        });
        let checker = StatusChecker::new(endpoint, &ValidatorConfig::default());

        let err = checker
            .check(&DiagnosticContext::new(), &pointer(), "cred:example:employee12345")
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::Transport(_)));
    }
}
