//! reqwest-backed oracle with proxying, pacing and request counting

use crate::config::ReconConfig;
use crate::error::{Result, TiresiasError};
use crate::http::Oracle;
use crate::models::ProbeResult;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// HTTP oracle. Cheap to clone; clones share the connection pool and counter.
#[derive(Clone)]
pub struct HttpOracle {
    client: Client,
    request_count: Arc<AtomicU64>,
    probe_delay: Option<Duration>,
}

impl HttpOracle {
    /// Creates a new HttpOracle from the reconnaissance configuration
    pub fn from_config(config: &ReconConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| TiresiasError::ConfigError(format!("Invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TiresiasError::ConfigError(format!("Invalid value for '{key}': {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .cookie_store(true);

        if let Some(ref proxy_url) = config.proxy {
            debug!("Routing probes through proxy {proxy_url}");
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| TiresiasError::ConfigError(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TiresiasError::ConfigError(format!("HTTP client setup failed: {e}")))?;

        let probe_delay = config
            .rate_limit
            .filter(|rps| *rps > 0)
            .map(|rps| Duration::from_millis(1000 / u64::from(rps)));

        Ok(Self {
            client,
            request_count: Arc::new(AtomicU64::new(0)),
            probe_delay,
        })
    }

    /// Returns the total number of probes sent
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn probe(&self, url: &str) -> Result<ProbeResult> {
        if let Some(delay) = self.probe_delay {
            sleep(delay).await;
        }

        self.request_count.fetch_add(1, Ordering::Relaxed);
        debug!("Probing {url}");

        let transport = |e: reqwest::Error| {
            warn!("Probe failed for {url}: {e}");
            TiresiasError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport)?;
        debug!("Response: {status} ({} bytes) for {url}", body.len());

        Ok(ProbeResult::new(status, body.to_vec()))
    }
}
