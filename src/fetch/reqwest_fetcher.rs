//! Default [`FetchCapability`] implementation: a shared `reqwest` client
//! with a cookie jar, bounded redirects, and the configured user-agent
//! header (spec.md §4.3's transport requirements).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;

use crate::error::{FetchError, HttpError, NetworkError};
use crate::utils::MAX_REDIRECTS;

use super::{FetchCapability, RawResponse};

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a client with a cookie jar and the redirect limit spec.md
    /// §4.3 specifies. `HTTP_PROXY` is honored natively by `reqwest` from
    /// the environment; no further env lookup happens here or deeper in
    /// the call stack.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| FetchError::Network(NetworkError::Connect(e.to_string())))?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl FetchCapability for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Network(NetworkError::Timeout(timeout))
                } else if e.is_connect() {
                    FetchError::Network(NetworkError::Connect(e.to_string()))
                } else {
                    FetchError::Network(NetworkError::Connect(e.to_string()))
                }
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        if !response.status().is_success() {
            // Still read the body for diagnostic purposes where possible,
            // but the caller decides retry behavior from `status`.
            return Err(FetchError::Http(HttpError { status }));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(NetworkError::Connect(e.to_string())))?
            .to_vec();

        Ok(RawResponse {
            status,
            final_url,
            headers,
            body,
        })
    }
}
