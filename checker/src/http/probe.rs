//! Bounded-timeout HTTP probes against node APIs and reference sources

use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::constants::http::{LOOKUP_TIMEOUT, MAX_OK_STATUS};
use crate::errors::CheckError;

/// Status and body of one GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn is_usable(&self) -> bool {
        self.status <= MAX_OK_STATUS
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiProbe {
    client: HttpClient,
}

impl ApiProbe {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(),
        }
    }

    /// One GET, bounded by `limit`; any status is returned as-is
    pub async fn get(&self, url: &str, limit: Duration) -> Result<ApiReply, CheckError> {
        debug!("GET {}", url);

        let response = timeout(limit, self.client.get(url).send())
            .await
            .map_err(|_| {
                CheckError::request(url, format!("timed out after {} seconds", limit.as_secs()))
            })?
            .map_err(|e| CheckError::request(url, e))?;

        let status = response.status().as_u16();
        let body = timeout(limit, response.text())
            .await
            .map_err(|_| CheckError::request(url, "body read timed out"))?
            .map_err(|e| CheckError::request(url, e))?;

        Ok(ApiReply { status, body })
    }

    /// Advisory lookup: `None` on network failure, unusable status or malformed JSON
    pub async fn external_lookup(&self, url: &str) -> Option<Value> {
        let reply = match self.get(url, LOOKUP_TIMEOUT).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Reference lookup {} failed: {}", url, e);
                return None;
            }
        };

        if !(200..300).contains(&reply.status) {
            debug!("Reference lookup {} answered {}", url, reply.status);
            return None;
        }

        serde_json::from_str(&reply.body).ok()
    }

    /// Integer `field` of the reference document, given as number or numeric string
    pub async fn reference_height(&self, url: &str, field: &str) -> Option<i64> {
        let document = self.external_lookup(url).await?;
        integer_field(&document, field)
    }
}

pub fn integer_field(document: &Value, field: &str) -> Option<i64> {
    match document.get(field)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_integer_field_variants() {
        let document = json!({"ledger_version": "1042", "epoch": 7, "name": "devnet"});
        assert_eq!(integer_field(&document, "ledger_version"), Some(1042));
        assert_eq!(integer_field(&document, "epoch"), Some(7));
        assert_eq!(integer_field(&document, "name"), None);
        assert_eq!(integer_field(&document, "missing"), None);
    }

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let reply = ApiProbe::new()
            .get(&format!("{}/metrics", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(reply.status, 503);
        assert_eq!(reply.body, "unavailable");
        assert!(!reply.is_usable());
    }

    #[tokio::test]
    async fn test_get_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = ApiProbe::new()
            .get(&server.uri(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Request { .. }));
    }

    #[tokio::test]
    async fn test_reference_height_from_string_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chain_id": 4,
                "ledger_version": "5000"
            })))
            .mount(&server)
            .await;

        let height = ApiProbe::new()
            .reference_height(&format!("{}/", server.uri()), "ledger_version")
            .await;
        assert_eq!(height, Some(5000));
    }

    #[tokio::test]
    async fn test_external_lookup_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let probe = ApiProbe::new();
        assert!(probe.external_lookup(&format!("{}/broken", server.uri())).await.is_none());
        assert!(probe.external_lookup(&format!("{}/down", server.uri())).await.is_none());
        assert!(probe.external_lookup("http://127.0.0.1:1/").await.is_none());
    }
}
