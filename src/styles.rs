//! Style Aggregator: collects the CSS a rendered page relies on so the local
//! front end can reproduce the remote theme.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fragment::FragmentKind;
use crate::markup::Scanner;

/// Tokens that make a `<style>` block relevant for every topic.
const ALWAYS_RELEVANT: &[&str] = &["global-styles", "wp-block-library", "custom-css"];

/// Tokens that make a stylesheet href relevant for every topic.
const STYLESHEET_TOKENS: &[&str] = &["elementor", "wp-content/themes", "wp-includes/css"];

static ROOT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i):root\s*\{([^}]+)\}").expect("root block regex"));
static KIT_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.elementor-kit-\d+\s*\{[^}]+\}").expect("kit rule regex")
});

/// Minimum layout for the page builder's section/column/widget containers.
pub const BASE_STYLES: &str = r#"/* Elementor base styles */
.elementor-section {
  position: relative;
}
.elementor-container {
  display: flex;
  margin-right: auto;
  margin-left: auto;
  position: relative;
}
.elementor-column {
  position: relative;
  min-height: 1px;
  display: flex;
}
.elementor-widget-wrap {
  position: relative;
  width: 100%;
  flex-wrap: wrap;
  align-content: flex-start;
}
.elementor-widget {
  position: relative;
}
.elementor-column-gap-default > .elementor-column > .elementor-element-populated {
  padding: 10px;
}
.elementor-widget-container {
  transition: background .3s, border .3s, border-radius .3s, box-shadow .3s;
}
@media (max-width: 1024px) {
  .elementor-reverse-tablet > .elementor-container > .elementor-row > :first-child {
    order: 10;
  }
}
@media (max-width: 767px) {
  .elementor-reverse-mobile > .elementor-container > .elementor-row > :first-child {
    order: 10;
  }
}
"#;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum StyleTopic {
    Header,
    Footer,
    #[default]
    Global,
}

impl StyleTopic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Global => "global",
        }
    }

    /// Case-insensitive; an empty value selects the default topic.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => Some(Self::default()),
            "header" => Some(Self::Header),
            "footer" => Some(Self::Footer),
            "global" => Some(Self::Global),
            _ => None,
        }
    }

    fn fragment(self) -> Option<FragmentKind> {
        match self {
            Self::Header => Some(FragmentKind::Header),
            Self::Footer => Some(FragmentKind::Footer),
            Self::Global => None,
        }
    }

    fn style_tokens(self) -> Vec<String> {
        let mut tokens: Vec<String> = match self.fragment() {
            Some(kind) => {
                let mut tokens: Vec<String> =
                    kind.style_tokens().iter().map(|t| t.to_string()).collect();
                tokens.push(format!("elementor-location-{}", kind.as_str()));
                tokens
            }
            None => vec!["elementor".to_string()],
        };
        tokens.extend(ALWAYS_RELEVANT.iter().map(|t| t.to_string()));
        tokens
    }

    fn stylesheet_tokens(self) -> Vec<&'static str> {
        let mut tokens = STYLESHEET_TOKENS.to_vec();
        tokens.push(self.as_str());
        tokens
    }
}

impl From<FragmentKind> for StyleTopic {
    fn from(kind: FragmentKind) -> Self {
        match kind {
            FragmentKind::Header => Self::Header,
            FragmentKind::Footer => Self::Footer,
        }
    }
}

impl std::fmt::Display for StyleTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire names follow the boundary contract consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleBundle {
    #[serde(rename = "styles")]
    pub inline_styles: String,
    #[serde(rename = "stylesheets")]
    pub stylesheet_links: Vec<String>,
    #[serde(rename = "elementorConfig")]
    pub embedded_config: Option<Map<String, Value>>,
    #[serde(rename = "rootVars")]
    pub root_variables: String,
    #[serde(rename = "customCss")]
    pub topic_custom_css: String,
    #[serde(rename = "elementorBase")]
    pub base_styles: String,
}

impl Default for StyleBundle {
    fn default() -> Self {
        Self {
            inline_styles: String::new(),
            stylesheet_links: Vec::new(),
            embedded_config: None,
            root_variables: String::new(),
            topic_custom_css: String::new(),
            base_styles: BASE_STYLES.to_string(),
        }
    }
}

impl StyleBundle {
    /// True when anything beyond the base styles was extracted.
    pub fn has_extracted_content(&self) -> bool {
        !self.inline_styles.is_empty()
            || !self.stylesheet_links.is_empty()
            || self.embedded_config.is_some()
            || !self.root_variables.is_empty()
            || !self.topic_custom_css.is_empty()
    }

    /// Inline CSS ready for a single `<style>` element. Later layers override
    /// earlier ones: root variables, base, extracted blocks, topic rules.
    pub fn layered_css(&self) -> String {
        let mut out = String::new();
        if !self.root_variables.is_empty() {
            out.push_str(":root { ");
            out.push_str(&self.root_variables);
            out.push_str(" }\n");
        }
        for layer in [&self.base_styles, &self.inline_styles, &self.topic_custom_css] {
            if layer.is_empty() {
                continue;
            }
            out.push_str(layer);
            if !layer.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

/// Builds a bundle from `markup`. Every step is independent; a step that finds
/// nothing leaves its field at the default.
pub fn aggregate(markup: &str, topic: StyleTopic) -> StyleBundle {
    let scanner = Scanner::new(markup);
    StyleBundle {
        inline_styles: collect_style_blocks(&scanner, &topic.style_tokens(), true),
        stylesheet_links: collect_stylesheets(&scanner, &topic.stylesheet_tokens()),
        embedded_config: crate::embedded_config::extract(markup),
        root_variables: collect_root_variables(markup),
        topic_custom_css: collect_kit_rules(markup),
        base_styles: BASE_STYLES.to_string(),
    }
}

/// `<style>` bodies relevant to one fragment, matched on the body only.
pub fn fragment_styles(markup: &str, kind: FragmentKind) -> String {
    let tokens: Vec<String> = kind.style_tokens().iter().map(|t| t.to_string()).collect();
    collect_style_blocks(&Scanner::new(markup), &tokens, false)
}

fn collect_style_blocks(scanner: &Scanner<'_>, tokens: &[String], match_tag: bool) -> String {
    scanner
        .raw_elements("style")
        .filter(|el| !el.body.trim().is_empty())
        .filter(|el| {
            let haystack = if match_tag {
                scanner.html()[el.outer_range()].to_ascii_lowercase()
            } else {
                el.body.to_ascii_lowercase()
            };
            tokens.iter().any(|token| haystack.contains(token.as_str()))
        })
        .map(|el| el.body)
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_stylesheets(scanner: &Scanner<'_>, tokens: &[&str]) -> Vec<String> {
    scanner
        .open_tags("link")
        .filter(|tag| {
            tag.attr("rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("stylesheet"))
            })
        })
        .filter_map(|tag| tag.attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter(|href| {
            let lower = href.to_ascii_lowercase();
            tokens.iter().any(|token| lower.contains(token))
        })
        .map(force_https)
        .collect()
}

/// Upgrades `http://` and protocol-relative hrefs; relative paths are kept.
pub fn force_https(href: &str) -> String {
    if href
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http://"))
    {
        format!("https://{}", &href[7..])
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        href.to_string()
    }
}

fn collect_root_variables(markup: &str) -> String {
    ROOT_BLOCK
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .filter(|body| !body.is_empty())
        .map(|body| {
            if body.ends_with(';') {
                body.to_string()
            } else {
                format!("{body};")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_kit_rules(markup: &str) -> String {
    KIT_RULE
        .find_iter(markup)
        .map(|rule| format!("{}\n", rule.as_str()))
        .collect()
}
