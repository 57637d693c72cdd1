//! HTTP access behind a small trait so that loaders can be tested offline.

use std::io::Read;
use std::time::Duration;

use crate::error::FetchError;

/// Fetches the body of a URL.
pub trait Transport: Send + Sync {
    /// Returns the response body of a successful GET request.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`Transport`] over a blocking `ureq` agent.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Creates a transport with the given per-request read timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .timeout_read(timeout)
            .build();
        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(target = "esma.loader", url, "GET");
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _response) => FetchError::Status {
                url: url.to_string(),
                code,
            },
            ureq::Error::Transport(transport) => FetchError::Transport {
                url: url.to_string(),
                reason: transport.to_string(),
            },
        })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|err| FetchError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        Ok(body)
    }
}
