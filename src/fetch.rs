//! Remote Page Fetcher. One GET per call, no caching, no retries.

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};
use url::Url;

use crate::config::SiteConfig;

#[derive(Debug, Clone)]
pub struct RemotePage {
    pub url: Url,
    pub markup: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("GET {url}: remote responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("GET {url}: {message}")]
    Transport { url: String, message: String },
    #[error("GET {url}: read body: {message}")]
    Body { url: String, message: String },
}

impl FetchFailure {
    /// Stable identifier for logs and monitoring.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Status { .. } => "http_status",
            Self::Transport { .. } => "transport",
            Self::Body { .. } => "body",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Body { .. } => None,
        }
    }
}

#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<RemotePage, FetchFailure>;
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl PageFetcher {
    pub fn new(config: &SiteConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build page fetcher http client")?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait::async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &Url) -> Result<RemotePage, FetchFailure> {
        tracing::info!(%url, "fetching remote page");

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|err| FetchFailure::Transport {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let markup = response.text().await.map_err(|err| FetchFailure::Body {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        Ok(RemotePage {
            url: url.clone(),
            markup,
            fetched_at: Utc::now(),
        })
    }
}
