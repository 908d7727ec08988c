//! HTTP client abstraction used by the gateway integration.
//!
//! The gateway client never talks to `reqwest` directly. It goes through
//! [`HttpClient`], so tests can hand it canned responses and inspect the
//! requests it built without touching the network.
//!
//! # Example Usage:
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use groupcast_core::http::{HttpClient, DefaultHttpClient};
//! use groupcast_core::Error;
//!
//! let http: Arc<dyn HttpClient<Error = Error>> =
//!     Arc::new(DefaultHttpClient::with_timeout(Duration::from_secs(15))?);
//! # Ok::<(), Error>(())
//! ```

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use reqwest;
use crate::Error;

/// Status code and raw body of a completed request. Non-2xx responses are
/// returned here, not as errors; callers decide what a bad status means.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A generic trait for making HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get(
        &self,
        url: String,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse, Self::Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Every request made through this client fails with a timeout error
    /// once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    type Error = Error;

    async fn get(
        &self,
        url: String,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse, Self::Error> {
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
