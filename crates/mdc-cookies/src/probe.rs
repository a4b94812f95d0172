//! HTTP probe port. Implementations live outside this crate.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{CookieEntry, TransportError};

/// HTTP method for a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    /// POST with url-encoded form fields.
    Post { form: Vec<(String, String)> },
}

/// One outbound probe request.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub url: String,
    pub method: ProbeMethod,
    pub cookies: Vec<CookieEntry>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ProbeRequest {
    /// GET `url` with `cookies` attached.
    pub fn get(url: &str, cookies: &[CookieEntry], timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            method: ProbeMethod::Get,
            cookies: cookies.to_vec(),
            headers: Vec::new(),
            timeout,
        }
    }
}

/// What came back from the server.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl ProbeResponse {
    /// First value of header `name`, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Performs exactly one HTTP request per call, with no retries.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    async fn send(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError>;
}

#[async_trait]
impl<T: ProbeClient + ?Sized> ProbeClient for &T {
    async fn send(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError> {
        (**self).send(request).await
    }
}
