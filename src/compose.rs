//! Fallback Composer: every extraction ends in a well-formed value.
//!
//! A backend outage (`FetchFailed`) and a theme that simply does not use the
//! expected markup (`PatternMiss`) produce the same empty shape, but only the
//! former carries an [`ErrorIndicator`].

use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;
use crate::fetch::{FetchFailure, PageSource, RemotePage};
use crate::fragment::{self, FragmentKind};
use crate::rewrite::LinkRewriteMap;
use crate::styles::{self, StyleBundle, StyleTopic};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentResult {
    pub content: String,
    pub styles: String,
    #[serde(rename = "hasContent")]
    pub has_content: bool,
}

impl FragmentResult {
    pub fn new(content: String, styles: String) -> Self {
        let has_content = !content.is_empty();
        Self {
            content,
            styles,
            has_content,
        }
    }

    pub fn empty() -> Self {
        Self::new(String::new(), String::new())
    }
}

impl Default for FragmentResult {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Found,
    PatternMiss,
    FetchFailed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::PatternMiss => "pattern_miss",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

/// Machine-readable failure detail; for logs, never for end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorIndicator {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl From<&FetchFailure> for ErrorIndicator {
    fn from(failure: &FetchFailure) -> Self {
        Self {
            code: failure.code().to_string(),
            status: failure.status(),
            message: failure.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composed<T> {
    pub value: T,
    pub outcome: Outcome,
    pub error: Option<ErrorIndicator>,
}

impl<T> Composed<T> {
    fn found(value: T) -> Self {
        Self {
            value,
            outcome: Outcome::Found,
            error: None,
        }
    }

    fn miss(value: T) -> Self {
        Self {
            value,
            outcome: Outcome::PatternMiss,
            error: None,
        }
    }

    fn failed(value: T, failure: &FetchFailure) -> Self {
        Self {
            value,
            outcome: Outcome::FetchFailed,
            error: Some(ErrorIndicator::from(failure)),
        }
    }

    pub fn is_fetch_failure(&self) -> bool {
        self.outcome == Outcome::FetchFailed
    }
}

/// Header fragments are passed through `header_links`; footers are not.
pub fn compose_fragment(
    fetched: Result<RemotePage, FetchFailure>,
    kind: FragmentKind,
    header_links: &LinkRewriteMap,
) -> Composed<FragmentResult> {
    let page = match fetched {
        Ok(page) => page,
        Err(failure) => {
            tracing::warn!(
                kind = %kind,
                outcome = Outcome::FetchFailed.as_str(),
                code = failure.code(),
                error = %failure,
                "fragment unavailable"
            );
            return Composed::failed(FragmentResult::empty(), &failure);
        }
    };

    let located = fragment::locate(&page.markup, kind);
    let mut content = crate::sanitize::strip_scripts(located);
    if kind == FragmentKind::Header {
        content = crate::rewrite::rewrite(&content, header_links);
    }

    if content.trim().is_empty() {
        tracing::debug!(
            kind = %kind,
            outcome = Outcome::PatternMiss.as_str(),
            url = %page.url,
            "no fragment rule matched"
        );
        return Composed::miss(FragmentResult::empty());
    }

    let styles = styles::fragment_styles(&page.markup, kind);
    Composed::found(FragmentResult::new(content, styles))
}

pub fn compose_styles(
    fetched: Result<RemotePage, FetchFailure>,
    topic: StyleTopic,
) -> Composed<StyleBundle> {
    let page = match fetched {
        Ok(page) => page,
        Err(failure) => {
            tracing::warn!(
                topic = %topic,
                outcome = Outcome::FetchFailed.as_str(),
                code = failure.code(),
                error = %failure,
                "styles unavailable"
            );
            return Composed::failed(StyleBundle::default(), &failure);
        }
    };

    let bundle = styles::aggregate(&page.markup, topic);
    if bundle.has_extracted_content() {
        Composed::found(bundle)
    } else {
        tracing::debug!(
            topic = %topic,
            outcome = Outcome::PatternMiss.as_str(),
            url = %page.url,
            "no styles extracted"
        );
        Composed::miss(bundle)
    }
}

/// Fetches the site root and composes one fragment.
pub async fn fetch_fragment(
    source: &dyn PageSource,
    config: &SiteConfig,
    kind: FragmentKind,
) -> Composed<FragmentResult> {
    let fetched = source.fetch(config.root_url()).await;
    compose_fragment(fetched, kind, &config.header_links)
}

/// Fetches the site root and composes the style bundle for `topic`.
pub async fn fetch_styles(
    source: &dyn PageSource,
    config: &SiteConfig,
    topic: StyleTopic,
) -> Composed<StyleBundle> {
    let fetched = source.fetch(config.root_url()).await;
    compose_styles(fetched, topic)
}
