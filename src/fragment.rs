//! Fragment Locator: best-effort structural inference of the site header and
//! footer regions inside a rendered page.
//!
//! The result is heuristic by nature. Each [`FragmentKind`] owns a fixed list of
//! [`PatternRule`]s ordered from most to least specific; the first rule that
//! yields a non-empty match wins.

use serde::{Deserialize, Serialize};

use crate::markup::{OpenTag, Scanner};

/// Attribute the page builder stamps on its template containers.
pub const ROLE_ATTRIBUTE: &str = "data-elementor-type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Header,
    Footer,
}

impl FragmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
        }
    }

    pub fn rules(self) -> &'static [PatternRule] {
        match self {
            Self::Header => &HEADER_RULES,
            Self::Footer => &FOOTER_RULES,
        }
    }

    /// Tokens that mark a `<style>` body as relevant to this fragment.
    pub fn style_tokens(self) -> &'static [&'static str] {
        match self {
            Self::Header => &[
                "header",
                "navigation",
                "menu",
                ".site-header",
                ".elementor-location-header",
            ],
            Self::Footer => &[
                "footer",
                ".site-footer",
                ".elementor-location-footer",
                "copyright",
            ],
        }
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a candidate element starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// A `<div>` whose role attribute equals `role`.
    RoleMarker { role: &'static str },
    /// The semantic element of that name, first occurrence only.
    SemanticTag { tag: &'static str },
    /// A `<div>` whose class attribute contains any token.
    ClassToken { tokens: &'static [&'static str] },
}

/// Where a candidate element is allowed to end when its closing tag cannot be
/// balanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Before the next role-marked `<div>` carrying one of `roles`. Without
    /// such a sibling the rule does not match.
    NextRoleSibling { roles: &'static [&'static str] },
    /// Before `</body>`.
    EndOfBody,
    /// At the first closing tag of the same name.
    ClosingTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRule {
    pub name: &'static str,
    pub anchor: Anchor,
    pub boundary: Boundary,
}

const HEADER_SIBLINGS: &[&str] = &["wp-post", "wp-page", "footer"];

static HEADER_RULES: [PatternRule; 3] = [
    PatternRule {
        name: "role-marker",
        anchor: Anchor::RoleMarker { role: "header" },
        boundary: Boundary::NextRoleSibling {
            roles: HEADER_SIBLINGS,
        },
    },
    PatternRule {
        name: "semantic-tag",
        anchor: Anchor::SemanticTag { tag: "header" },
        boundary: Boundary::ClosingTag,
    },
    PatternRule {
        name: "class-token",
        anchor: Anchor::ClassToken {
            tokens: &["site-header", "page-header", "header"],
        },
        boundary: Boundary::NextRoleSibling {
            roles: HEADER_SIBLINGS,
        },
    },
];

static FOOTER_RULES: [PatternRule; 3] = [
    PatternRule {
        name: "role-marker",
        anchor: Anchor::RoleMarker { role: "footer" },
        boundary: Boundary::EndOfBody,
    },
    PatternRule {
        name: "semantic-tag",
        anchor: Anchor::SemanticTag { tag: "footer" },
        boundary: Boundary::ClosingTag,
    },
    PatternRule {
        name: "class-token",
        anchor: Anchor::ClassToken {
            tokens: &["site-footer", "page-footer", "footer"],
        },
        boundary: Boundary::EndOfBody,
    },
];

impl PatternRule {
    /// Applies the rule, returning the matched outer markup.
    pub fn apply<'a>(&self, scanner: &Scanner<'a>) -> Option<&'a str> {
        let html = scanner.html();
        match self.anchor {
            Anchor::SemanticTag { tag } => {
                let open = scanner.find_open(tag, 0, scanner.len())?;
                let end = self.element_end(scanner, tag, &open)?;
                non_empty(&html[open.start..end])
            }
            Anchor::RoleMarker { role } => scanner
                .open_tags("div")
                .filter(|open| open.attr_is(ROLE_ATTRIBUTE, role))
                .find_map(|open| {
                    let end = self.element_end(scanner, "div", &open)?;
                    non_empty(&html[open.start..end])
                }),
            Anchor::ClassToken { tokens } => scanner
                .open_tags("div")
                .filter(|open| open.attr_contains_any("class", tokens))
                .find_map(|open| {
                    let end = self.element_end(scanner, "div", &open)?;
                    non_empty(&html[open.start..end])
                }),
        }
    }

    /// The balanced closing tag wins. Malformed markup falls back to the last
    /// closing tag before the rule's boundary.
    fn element_end(&self, scanner: &Scanner<'_>, tag: &str, open: &OpenTag<'_>) -> Option<usize> {
        if let Some(end) = scanner.balanced_close(tag, open) {
            return Some(end);
        }

        match self.boundary {
            Boundary::ClosingTag => scanner.find_close(tag, open.end).map(|(_, end)| end),
            Boundary::EndOfBody => {
                let limit = body_end(scanner, open.end);
                scanner.last_close_before(tag, open.end, limit)
            }
            Boundary::NextRoleSibling { roles } => {
                let sibling = scanner
                    .open_tags("div")
                    .skip_while(|next| next.start < open.end)
                    .find(|next| roles.iter().any(|role| next.attr_is(ROLE_ATTRIBUTE, role)))?;
                scanner.last_close_before(tag, open.end, sibling.start)
            }
        }
    }
}

fn body_end(scanner: &Scanner<'_>, from: usize) -> usize {
    scanner
        .find_close("body", from)
        .map_or(scanner.len(), |(start, _)| start)
}

fn non_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() { None } else { Some(s) }
}

/// Runs the rule cascade for `kind` and reports which rule matched.
pub fn locate_with_rule(markup: &str, kind: FragmentKind) -> Option<(&'static PatternRule, &str)> {
    let scanner = Scanner::new(markup);
    kind.rules()
        .iter()
        .find_map(|rule| rule.apply(&scanner).map(|found| (rule, found)))
}

/// Returns the best-matching fragment, or `""` when no rule matches.
pub fn locate(markup: &str, kind: FragmentKind) -> &str {
    match locate_with_rule(markup, kind) {
        Some((rule, found)) => {
            tracing::debug!(kind = %kind, rule = rule.name, bytes = found.len(), "fragment located");
            found
        }
        None => "",
    }
}
