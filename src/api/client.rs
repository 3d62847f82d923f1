use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::loadable::LoadError;

/// Failure to set up a [`WebClient`]. Distinct from [`LoadError`]: this is a
/// configuration problem, not a failed request.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("access token is not a valid header value")]
    InvalidToken,
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

const USER_AGENT: &str = concat!("reposcope/", env!("CARGO_PKG_VERSION"));

/// Thin JSON-over-HTTP client bound to one base URL.
///
/// Every call is a `GET` with `Accept: application/json`. Failures are
/// mapped onto [`LoadError`] so interactors can drop them straight into a
/// `Loadable::Failed`.
#[derive(Clone, Debug)]
pub struct WebClient {
    base_url: String,
    client: reqwest::Client,
}

impl WebClient {
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| ClientError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL. Absolute URLs pass through untouched.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Issues a `GET` and decodes the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, LoadError> {
        let url = self.url_for(path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} failed with HTTP {}", url, status.as_u16());
            return Err(LoadError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;
        debug!("GET {} -> {} bytes", url, body.len());

        serde_json::from_slice(&body).map_err(|e| {
            warn!("Failed to decode response from {}: {}", url, e);
            LoadError::Decoding(e.to_string())
        })
    }
}
