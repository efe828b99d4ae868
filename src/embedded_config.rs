//! Recovery of the page builder's client configuration object.
//!
//! The object is emitted as a JavaScript literal, not JSON. Normalization is a
//! plain textual rewrite (single to double quotes, bare keys quoted, trailing
//! commas dropped) and breaks on string values containing quotes, or a comma
//! followed by `word:`. Any such input ends in a parse error and the caller
//! treats the config as absent; it is never returned half-converted.
//! Escaped single quotes (`\'`) would turn into valid but altered JSON, so
//! they are rejected before the rewrite.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

pub const CONFIG_VARIABLE: &str = "elementorFrontendConfig";

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:var|let|const)\s+|\bwindow\.)elementorFrontendConfig\s*=\s*\{")
        .expect("assignment regex")
});
static LITERAL_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}\s*;").expect("literal end regex"));
static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:").expect("bare key regex")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex"));

#[derive(Debug, thiserror::Error)]
pub enum ConfigParseFailure {
    #[error("no elementorFrontendConfig assignment found")]
    Missing,
    #[error("elementorFrontendConfig object literal is not terminated")]
    Unterminated,
    #[error("normalized elementorFrontendConfig is not valid JSON: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("elementorFrontendConfig contains an escaped single quote")]
    EscapedQuote,
    #[error("elementorFrontendConfig is not an object")]
    NotAnObject,
}

impl ConfigParseFailure {
    /// `Missing` is the normal case for sites without the page builder.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Locates the raw object literal, from its `{` through the first `}` that is
/// followed by `;`.
pub fn find_literal(markup: &str) -> Result<&str, ConfigParseFailure> {
    let assignment = ASSIGNMENT
        .find(markup)
        .ok_or(ConfigParseFailure::Missing)?;
    let open = assignment.end() - 1;
    let end = LITERAL_END
        .find(&markup[open..])
        .ok_or(ConfigParseFailure::Unterminated)?;
    Ok(&markup[open..=open + end.start()])
}

pub fn normalize_loose_object(literal: &str) -> String {
    let text = literal.replace('\'', "\"");
    let text = BARE_KEY.replace_all(&text, "${1}\"${2}\":");
    TRAILING_COMMA.replace_all(&text, "$1").into_owned()
}

pub fn parse(markup: &str) -> Result<Map<String, Value>, ConfigParseFailure> {
    let literal = find_literal(markup)?;
    if literal.contains("\\'") {
        return Err(ConfigParseFailure::EscapedQuote);
    }
    let normalized = normalize_loose_object(literal);
    match serde_json::from_str::<Value>(&normalized)? {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigParseFailure::NotAnObject),
    }
}

/// Like [`parse`], but every failure collapses to `None`.
pub fn extract(markup: &str) -> Option<Map<String, Value>> {
    match parse(markup) {
        Ok(map) => Some(map),
        Err(err) if err.is_missing() => None,
        Err(err) => {
            tracing::debug!(error = %err, "could not parse embedded config");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn loose_literal_is_normalized() {
        let html = "<script>var elementorFrontendConfig = {foo: 'bar', baz: 1};</script>";
        let config = extract(html).unwrap();
        assert_eq!(Value::Object(config), json!({"foo": "bar", "baz": 1}));
    }

    #[test]
    fn strict_json_with_urls_survives() {
        let html = r#"<script id="elementor-frontend-js-before">
var elementorFrontendConfig = {"environmentMode":{"edit":false,"isScriptDebug":false},"urls":{"assets":"https:\/\/example.com\/wp-content\/plugins\/elementor\/assets\/"},"breakpoints":[767,1024,],};
</script>"#;
        let config = extract(html).unwrap();
        assert_eq!(config["environmentMode"], json!({"edit": false, "isScriptDebug": false}));
        assert_eq!(
            config["urls"]["assets"],
            json!("https://example.com/wp-content/plugins/elementor/assets/")
        );
        assert_eq!(config["breakpoints"], json!([767, 1024]));
    }

    #[test]
    fn window_assignment_and_nested_bare_keys() {
        let html = "window.elementorFrontendConfig = { kit: { id: 5, }, is_rtl: false } ;";
        let config = extract(html).unwrap();
        assert_eq!(Value::Object(config), json!({"kit": {"id": 5}, "is_rtl": false}));
    }

    #[test]
    fn unbalanced_braces_are_absent() {
        let html = "<script>var elementorFrontendConfig = {foo: {bar: 1};</script>";
        assert!(matches!(parse(html), Err(ConfigParseFailure::Invalid(_))));
        assert_eq!(extract(html), None);
    }

    #[test]
    fn embedded_apostrophe_degrades_to_absent() {
        let html = "var elementorFrontendConfig = {title: 'Vlad's kitchen', x: 1};";
        assert_eq!(extract(html), None);
    }

    #[test]
    fn escaped_apostrophe_is_rejected_not_rewritten() {
        let html = r"var elementorFrontendConfig = {title: 'Vlad\'s kitchen', x: 1};";
        assert!(matches!(parse(html), Err(ConfigParseFailure::EscapedQuote)));
        assert_eq!(extract(html), None);
    }

    #[test]
    fn comma_and_colon_inside_string_degrades_to_absent() {
        let html = "var elementorFrontendConfig = {a: 'x, b: y'};";
        assert_eq!(extract(html), None);
    }

    #[test]
    fn missing_and_unterminated() {
        assert!(parse("<p>no config</p>").unwrap_err().is_missing());
        assert!(matches!(
            parse("var elementorFrontendConfig = {a: 1}"),
            Err(ConfigParseFailure::Unterminated)
        ));
        assert!(matches!(
            parse("var notElementorFrontendConfig = {a: 1};"),
            Err(ConfigParseFailure::Missing)
        ));
    }
}
