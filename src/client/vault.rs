//! Blocking HTTP client for the Vault list endpoint

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::string_utils::SEPARATOR;

use super::{KeyLister, ListError};

const TOKEN_HEADER: &str = "X-Vault-Token";
const API_VERSION: &str = "v1";

/// Connection settings for [`VaultClient`].
#[derive(Debug, Clone)]
pub struct VaultClientConfig {
    pub address: Url,
    pub token: Option<String>,
    /// Accept invalid TLS certificates
    pub skip_verify: bool,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("HTTP client construction failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("token is not a valid header value")]
    InvalidToken,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Option<ListData>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    keys: Option<Vec<String>>,
}

/// Lists keys with `GET /v1/<path>?list=true`.
#[derive(Debug, Clone)]
pub struct VaultClient {
    address: Url,
    client: Client,
}

impl VaultClient {
    pub fn new(config: VaultClientConfig) -> Result<Self, ClientBuildError> {
        Self::build(config, Client::builder())
    }

    fn build(config: VaultClientConfig, builder: ClientBuilder) -> Result<Self, ClientBuildError> {
        let mut default_headers = HeaderMap::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value =
                HeaderValue::from_str(token).map_err(|_| ClientBuildError::InvalidToken)?;
            value.set_sensitive(true);
            default_headers.insert(TOKEN_HEADER, value);
        }

        let client = builder
            .default_headers(default_headers)
            .danger_accept_invalid_certs(config.skip_verify)
            .timeout(config.timeout)
            .build()?;

        let mut address = config.address;
        if !address.path().ends_with('/') {
            let path = format!("{}/", address.path());
            address.set_path(&path);
        }

        Ok(Self { address, client })
    }

    /// Get the server address requests are sent to
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// URL for listing `path`.
    ///
    /// Each segment is percent-encoded on its own, so `#`, `?` and `%` in a
    /// key name reach the server literally. `.` and `..` segments would be
    /// resolved away by URL normalization and are rejected.
    pub fn list_url(&self, path: &str) -> Result<Url, ListError> {
        let invalid = |reason: &str| ListError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = path.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
        if segments.iter().any(|s| matches!(*s, "." | "..")) {
            return Err(invalid("dot segments cannot be sent literally"));
        }

        let mut url = self.address.clone();
        url.path_segments_mut()
            .map_err(|()| invalid("server address cannot carry a path"))?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(segments);
        url.query_pairs_mut().append_pair("list", "true");
        Ok(url)
    }
}

impl KeyLister for VaultClient {
    fn list(&self, path: &str) -> Result<Option<Vec<String>>, ListError> {
        let url = self.list_url(path)?;

        tracing::debug!(path, %url, "listing");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ListError::Transport {
                path: path.to_string(),
                source: Box::new(e),
            })?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::FORBIDDEN => {
                return Err(ListError::PermissionDenied {
                    path: path.to_string(),
                });
            }
            status if !status.is_success() => {
                let body = response.text().unwrap_or_default();
                return Err(ListError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                    body: body.trim().to_string(),
                });
            }
            _ => {}
        }

        let body: ListResponse = response.json().map_err(|e| ListError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(body.data.and_then(|d| d.keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::VaultStub;

    fn config(address: &str) -> VaultClientConfig {
        VaultClientConfig {
            address: Url::parse(address).unwrap(),
            token: Some("s.token".to_string()),
            skip_verify: false,
            timeout: Duration::from_secs(5),
        }
    }

    fn client(address: &str) -> VaultClient {
        VaultClient::new(config(address)).unwrap()
    }

    /// Client for a loopback stub, ignoring any proxy set in the environment.
    fn local_client(address: &str) -> VaultClient {
        VaultClient::build(config(address), Client::builder().no_proxy()).unwrap()
    }

    #[test]
    fn test_list_url_appends_api_prefix_and_query() {
        let c = client("https://foo.vault.service.bar.consul:8200");
        let url = c.list_url("secret/app").unwrap();
        assert_eq!(
            url.as_str(),
            "https://foo.vault.service.bar.consul:8200/v1/secret/app?list=true"
        );
    }

    #[test]
    fn test_list_url_keeps_address_path_prefix() {
        let c = client("https://proxy.example.com/vault");
        let url = c.list_url("/secret").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.example.com/vault/v1/secret?list=true"
        );
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let result = VaultClient::new(VaultClientConfig {
            address: Url::parse("https://localhost:8200").unwrap(),
            token: Some("bad\ntoken".to_string()),
            skip_verify: false,
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(ClientBuildError::InvalidToken)));
    }

    #[test]
    fn test_list_response_decoding() {
        let body: ListResponse =
            serde_json::from_str(r#"{"request_id":"x","data":{"keys":["a","b/"]}}"#).unwrap();
        assert_eq!(
            body.data.and_then(|d| d.keys),
            Some(vec!["a".to_string(), "b/".to_string()])
        );

        let empty: ListResponse = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(empty.data.is_none());
    }

    #[test]
    fn test_list_url_encodes_each_segment() {
        let c = client("https://vault.local:8200");
        let path_of = |p: &str| c.list_url(p).unwrap();

        let fragment = path_of("secret/a#b");
        assert_eq!(fragment.path(), "/v1/secret/a%23b");
        assert_eq!(fragment.fragment(), None);

        let question = path_of("secret/what?x");
        assert_eq!(question.path(), "/v1/secret/what%3Fx");
        assert_eq!(question.query(), Some("list=true"));

        assert_eq!(path_of("secret/pct%41").path(), "/v1/secret/pct%2541");
        assert_eq!(path_of("secret/with space").path(), "/v1/secret/with%20space");
    }

    #[test]
    fn test_list_url_rejects_dot_segments() {
        let c = client("https://vault.local:8200");
        for path in ["secret/a/../b", "secret/./a", "secret/.."] {
            let err = c.list_url(path).unwrap_err();
            assert!(matches!(err, ListError::InvalidPath { .. }), "{}", path);
            assert_eq!(err.path(), path);
        }
        assert!(c.list_url("secret/.hidden/..x").is_ok());
    }

    #[test]
    fn test_list_returns_keys_and_sends_token() {
        let stub = VaultStub::new().keys("secret", &["a", "b/"]).start().unwrap();
        let keys = local_client(stub.address()).list("secret").unwrap();

        assert_eq!(keys, Some(vec!["a".to_string(), "b/".to_string()]));
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target, "/v1/secret?list=true");
        assert_eq!(requests[0].token.as_deref(), Some("s.token"));
    }

    #[test]
    fn test_list_sends_encoded_key_names() {
        let stub = VaultStub::new()
            .reply("/v1/secret/a%23b", 200, r#"{"data":{"keys":["inner"]}}"#)
            .start()
            .unwrap();
        let keys = local_client(stub.address()).list("secret/a#b").unwrap();

        assert_eq!(keys, Some(vec!["inner".to_string()]));
        assert_eq!(stub.requests()[0].target, "/v1/secret/a%23b?list=true");
    }

    #[test]
    fn test_not_found_and_no_content_are_leaves() {
        let stub = VaultStub::new().reply("/v1/secret/empty", 204, "").start().unwrap();
        let c = local_client(stub.address());

        assert_eq!(c.list("secret/unknown").unwrap(), None);
        assert_eq!(c.list("secret/empty").unwrap(), None);
    }

    #[test]
    fn test_missing_data_is_a_leaf() {
        let stub = VaultStub::new().reply("/v1/secret/plain", 200, "{}").start().unwrap();
        assert_eq!(local_client(stub.address()).list("secret/plain").unwrap(), None);
    }

    #[test]
    fn test_forbidden_is_permission_denied() {
        let stub = VaultStub::new()
            .reply("/v1/secret/locked", 403, r#"{"errors":["permission denied"]}"#)
            .start()
            .unwrap();
        let err = local_client(stub.address()).list("secret/locked").unwrap_err();

        assert!(matches!(err, ListError::PermissionDenied { ref path } if path == "secret/locked"));
        assert_eq!(err.kind(), "permission_denied");
    }

    #[test]
    fn test_server_error_keeps_status_and_body() {
        let stub = VaultStub::new()
            .reply("/v1/secret", 500, "{\"errors\":[\"sealed\"]}\n")
            .start()
            .unwrap();
        let err = local_client(stub.address()).list("secret").unwrap_err();

        match err {
            ListError::Status { path, status, body } => {
                assert_eq!(path, "secret");
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"errors":["sealed"]}"#);
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let stub = VaultStub::new()
            .reply("/v1/secret", 200, "<html>proxy login</html>")
            .start()
            .unwrap();
        let err = local_client(stub.address()).list("secret").unwrap_err();
        assert!(matches!(err, ListError::Decode { .. }));
    }

    #[test]
    fn test_dot_segment_is_rejected_before_sending() {
        let stub = VaultStub::new().start().unwrap();
        let err = local_client(stub.address()).list("secret/..").unwrap_err();

        assert_eq!(err.kind(), "invalid_path");
        assert!(stub.requests().is_empty());
    }
}
