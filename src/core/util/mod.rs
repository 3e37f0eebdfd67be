use anyhow::{Context, Result};
use async_trait::async_trait;
use http::{Request, Response};
use std::sync::Arc;

/// Generic HTTP client, used to fetch JSON schemas and credential status records.
///
/// A trait is used here so that embedders can bring their own HTTP/TLS stack, and
/// tests can answer requests without a network.
#[async_trait]
pub trait AsyncHttpClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>>;
}

#[async_trait]
impl<T> AsyncHttpClient for Arc<T>
where
    T: AsyncHttpClient + Send + Sync + ?Sized,
{
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        (**self).execute(request).await
    }
}

/// [AsyncHttpClient] over a rustls backed [reqwest::Client].
#[derive(Debug, Clone)]
pub struct ReqwestClient(reqwest::Client);

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .context("unable to build http client")
            .map(Self)
    }
}

#[async_trait]
impl AsyncHttpClient for ReqwestClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        let uri = request.uri().to_string();
        let request = request
            .try_into()
            .context(format!("unable to send a request to {uri}"))?;
        let response = self
            .0
            .execute(request)
            .await
            .context(format!("request to {uri} failed"))?;

        // Status lookups read the status code and the body, schema fetches the body.
        let status = response.status();
        let body = response
            .bytes()
            .await
            .context(format!("failed to read the response of {uri}"))?;

        Response::builder()
            .status(status)
            .body(body.to_vec())
            .context("unable to construct response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relative_uri_is_rejected_before_sending() {
        let client = ReqwestClient::new().unwrap();
        let request = Request::get("/credentials/status/3").body(vec![]).unwrap();

        let error = client.execute(request).await.unwrap_err();
        assert!(error.to_string().contains("/credentials/status/3"));
    }
}
