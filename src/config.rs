use anyhow::Context as _;
use url::Url;

use crate::rewrite::LinkRewriteMap;

pub const DEFAULT_SITE_URL: &str = "https://vladclaudecode.wpenginepowered.com";
pub const SITE_URL_ENV: &str = "WORDPRESS_API_URL";

const REST_API_SUFFIX: &str = "/wp-json/wp/v2";

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Root of the remote site, always ending in `/`.
    pub site_url: Url,
    pub user_agent: String,
    /// Applied to header fragments only.
    pub header_links: LinkRewriteMap,
}

impl SiteConfig {
    pub fn new(site_url: Url) -> Self {
        let header_links = LinkRewriteMap::for_site(&site_url);
        Self {
            site_url,
            user_agent: format!("pressfront/{}", env!("CARGO_PKG_VERSION")),
            header_links,
        }
    }

    /// Accepts either the site root or its REST API root.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let raw = raw.trim();
        let raw = raw.trim_end_matches('/');
        let raw = raw.strip_suffix(REST_API_SUFFIX).unwrap_or(raw);

        let mut url = Url::parse(raw).with_context(|| format!("parse site url: {raw}"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("site url must be http/https: {url}");
        }
        if url.host_str().is_none() {
            anyhow::bail!("site url must have host: {url}");
        }
        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self::new(url))
    }

    /// Flag value first, then `WORDPRESS_API_URL`, then the default host.
    pub fn resolve(flag: Option<&str>) -> anyhow::Result<Self> {
        Self::resolve_with(flag, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(
        flag: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let from_env = env(SITE_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let raw = flag
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or(from_env)
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
        Self::parse(&raw)
    }

    /// The document the header, footer and styles are scraped from.
    pub fn root_url(&self) -> &Url {
        &self.site_url
    }
}
