//! Outbound HTTPS client used to talk to the identity provider.

use crate::error::FetchError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, header};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use once_cell::sync::OnceCell;
use rustls::{ClientConfig, RootCertStore};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::time::{Duration, timeout};

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

const USER_AGENT: &str = concat!("quiz-portal/", env!("CARGO_PKG_VERSION"));

/// Shared TLS configuration to avoid rebuilding the root store per client.
static TLS_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

pub fn get_shared_tls_config() -> Arc<ClientConfig> {
    TLS_CONFIG
        .get_or_init(|| {
            let mut root_cert_store = RootCertStore::empty();
            root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = ClientConfig::builder()
                .with_root_certificates(root_cert_store)
                .with_no_client_auth();

            Arc::new(config)
        })
        .clone()
}

/// Build a pooled HTTP/1 client. Plain `http` is accepted so a local provider
/// can be used in development.
pub fn build_https_client() -> HttpsClient {
    let connector = HttpsConnectorBuilder::new()
        .with_tls_config((*get_shared_tls_config()).clone())
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new()).build(connector)
}

/// A buffered response.
#[derive(Debug)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl FetchedResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Json(e.to_string()))
    }
}

#[tracing::instrument(name = "provider_fetch", level = "debug", skip(client, body))]
async fn send(
    client: &HttpsClient,
    method: Method,
    url: &str,
    body: Option<String>,
    limit: Duration,
) -> Result<FetchedResponse, FetchError> {
    let mut builder = Request::builder()
        .method(method)
        .uri(url)
        .header(header::USER_AGENT, USER_AGENT)
        .header(header::ACCEPT, "application/json");
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    }
    let req = builder
        .body(Full::new(Bytes::from(body.unwrap_or_default())))
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    let exchange = async {
        let response = client
            .request(req)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .to_bytes();
        Ok(FetchedResponse { status, body })
    };

    timeout(limit, exchange)
        .await
        .map_err(|_| FetchError::Timeout(limit))?
}

/// GET a JSON document, failing on any non-success status.
pub async fn get_json<T: DeserializeOwned>(
    client: &HttpsClient,
    url: &str,
    limit: Duration,
) -> Result<T, FetchError> {
    let response = send(client, Method::GET, url, None, limit).await?;
    if !response.status.is_success() {
        return Err(FetchError::Http {
            status: response.status,
            context: url.to_string(),
        });
    }
    response.json()
}

/// POST an urlencoded form and hand back whatever the server answered.
pub async fn post_form(
    client: &HttpsClient,
    url: &str,
    fields: &[(&str, &str)],
    limit: Duration,
) -> Result<FetchedResponse, FetchError> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    send(client, Method::POST, url, Some(body), limit).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_tls_config() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let config1 = get_shared_tls_config();
        let config2 = get_shared_tls_config();

        assert!(Arc::ptr_eq(&config1, &config2));
    }

    #[test]
    fn fetched_response_reports_bad_json() {
        let response = FetchedResponse {
            status: StatusCode::OK,
            body: Bytes::from_static(b"not json"),
        };
        let parsed: Result<serde_json::Value, _> = response.json();
        assert!(matches!(parsed, Err(FetchError::Json(_))));
    }
}
