//! reqwest-backed probe client.
//!
//! One request per call: no retries, no HTTP/1.1 fallback. Cookies travel as
//! a single `Cookie` header so the jar never outlives the probe.

use std::error::Error as StdError;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::COOKIE;

use mdc_cookies::probe::{ProbeClient, ProbeMethod, ProbeRequest, ProbeResponse};
use mdc_cookies::store;
use mdc_cookies::TransportError;

/// Desktop Chrome user agent sent with every probe.
pub const CHROME_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                             AppleWebKit/537.36 (KHTML, like Gecko) \
                             Chrome/131.0.0.0 Safari/537.36";

/// Settings for [`HttpProbeClient`].
#[derive(Debug, Clone)]
pub struct ProbeClientConfig {
    pub user_agent: String,
    /// Proxy URL applied to all schemes.
    pub proxy: Option<String>,
    pub verify_tls: bool,
    pub redirect_limit: usize,
}

impl Default for ProbeClientConfig {
    fn default() -> Self {
        Self {
            user_agent: CHROME_UA.to_string(),
            proxy: None,
            verify_tls: true,
            redirect_limit: 5,
        }
    }
}

/// HTTP client for cookie probes.
#[derive(Clone)]
pub struct HttpProbeClient {
    client: reqwest::Client,
}

impl HttpProbeClient {
    pub fn new(config: &ProbeClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(config.redirect_limit))
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(!config.verify_tls);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .with_context(|| format!("invalid proxy URL '{proxy}'"))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn send(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError> {
        let mut builder = match &request.method {
            ProbeMethod::Get => self.client.get(&request.url),
            ProbeMethod::Post { form } => self.client.post(&request.url).form(form),
        }
        .timeout(request.timeout);

        if !request.cookies.is_empty() {
            builder = builder.header(COOKIE, store::header_value(&request.cookies));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let start = Instant::now();
        let resp = builder
            .send()
            .await
            .map_err(|e| map_error(&e, request.timeout))?;

        let status = resp.status().as_u16();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = resp
            .text()
            .await
            .map_err(|e| map_error(&e, request.timeout))?;

        Ok(ProbeResponse {
            status,
            body,
            headers,
            elapsed: start.elapsed(),
        })
    }
}

/// Sort a reqwest failure into the transport taxonomy.
fn map_error(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout { after: timeout };
    }

    let message = error_chain(err);
    if tls_failure(err) {
        TransportError::Tls(message)
    } else if err.is_connect() {
        TransportError::Connect(message)
    } else {
        TransportError::Other(message)
    }
}

/// Whether a source of `err` reports a TLS failure. The outer error is
/// skipped since reqwest puts the request URL in it.
fn tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        let text = e.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return true;
        }
        source = e.source();
    }
    false
}

/// Join an error and its sources with `": "`.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.dedup();
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpProbeClient::new(&ProbeClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = ProbeClientConfig {
            proxy: Some("http://[::1".into()),
            ..ProbeClientConfig::default()
        };
        assert!(HttpProbeClient::new(&config).is_err());
    }

    #[derive(Debug)]
    struct Layer(&'static str, Option<Box<Layer>>);

    impl std::fmt::Display for Layer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.1.as_deref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let err = Layer(
            "error sending request",
            Some(Box::new(Layer("invalid peer certificate: UnknownIssuer", None))),
        );
        assert_eq!(
            error_chain(&err),
            "error sending request: invalid peer certificate: UnknownIssuer"
        );
        assert!(tls_failure(&err));
    }

    #[test]
    fn test_tls_words_in_url_ignored() {
        let err = Layer(
            "error sending request for url (https://ssl-tls.example/certificate)",
            Some(Box::new(Layer("tcp connect error: Connection refused", None))),
        );
        assert!(!tls_failure(&err));
    }
}
