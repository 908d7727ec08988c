// File: groupcast-core/src/platforms/uazapi/client.rs

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};
use crate::http::HttpClient;
use crate::Error;

/// Entry point for every UAZAPI call. Endpoint-specific requests live in
/// `requests::*` as further `impl UazapiClient` blocks.
pub struct UazapiClient {
    http: Arc<dyn HttpClient<Error = Error>>,
    base_url: String,
}

impl UazapiClient {
    /// - `base_url`: the gateway server, e.g. `https://acme.uazapi.com`
    /// - `http`: transport; production code passes a `DefaultHttpClient` with a timeout
    pub fn new(base_url: &str, http: Arc<dyn HttpClient<Error = Error>>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GETs `path` on behalf of the instance owning `token` and returns the raw
    /// body of a 2xx reply. Anything else becomes `Error::Gateway`.
    pub(crate) async fn get_authorized(
        &self,
        token: &str,
        path: &str,
        label: &str,
    ) -> Result<String, Error> {
        let url = self.endpoint(path);
        let mut headers = HashMap::new();
        headers.insert("token".to_string(), token.to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());

        let resp = self
            .http
            .get(url.clone(), headers)
            .await
            .map_err(|e| Error::Gateway(format!("{label} network error: {e}")))?;

        trace!("{} => HTTP {} => body={}", label, resp.status, resp.body);

        if !resp.is_success() {
            warn!("{} => status={} url='{}'", label, resp.status, url);
            return Err(Error::Gateway(format!(
                "{label}: HTTP {} => {}",
                resp.status, resp.body
            )));
        }

        Ok(resp.body)
    }
}
