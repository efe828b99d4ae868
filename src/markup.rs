//! Bounded, case-insensitive tag scanning over raw markup.
//!
//! Nothing here builds a tree. Offsets are byte offsets into the original text;
//! the lowercase shadow copy has identical offsets because only ASCII bytes are
//! folded.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenTag<'a> {
    /// Offset of the `<`.
    pub start: usize,
    /// Offset just past the closing `>`.
    pub end: usize,
    text: &'a str,
    name_len: usize,
}

impl<'a> OpenTag<'a> {
    /// The full tag text, `<div class="x">`.
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Looks up an attribute value by name (case-insensitive name match).
    /// Valueless attributes yield `Some("")`.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        let inner = self.text[1 + self.name_len..].trim_end_matches('>');
        Attributes { rest: inner }
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// True when the attribute exists and its value equals `value` ignoring case.
    pub fn attr_is(&self, name: &str, value: &str) -> bool {
        self.attr(name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(value))
    }

    /// True when the attribute exists and contains any of `tokens` ignoring case.
    pub fn attr_contains_any(&self, name: &str, tokens: &[&str]) -> bool {
        let Some(value) = self.attr(name) else {
            return false;
        };
        let value = value.to_ascii_lowercase();
        tokens.iter().any(|token| value.contains(token))
    }
}

struct Attributes<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self
            .rest
            .trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        let after_name = rest[name_end..].trim_start();

        let Some(after_eq) = after_name.strip_prefix('=') else {
            self.rest = after_name;
            return Some((name, ""));
        };
        let after_eq = after_eq.trim_start();

        let (value, remaining) = match after_eq.as_bytes().first() {
            Some(&quote @ (b'"' | b'\'')) => {
                let body = &after_eq[1..];
                match body.find(quote as char) {
                    Some(close) => (&body[..close], &body[close + 1..]),
                    None => (body, ""),
                }
            }
            _ => {
                let end = after_eq
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };
        self.rest = remaining;
        Some((name, value))
    }
}

/// A raw-text element such as `<style>` or `<script>`, whose body cannot nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawElement<'a> {
    pub open: OpenTag<'a>,
    pub body: &'a str,
    /// Byte range of the whole element including both tags.
    pub outer: (usize, usize),
}

impl RawElement<'_> {
    pub fn outer_range(&self) -> Range<usize> {
        self.outer.0..self.outer.1
    }
}

#[derive(Debug)]
pub struct Scanner<'a> {
    html: &'a str,
    lower: String,
}

impl<'a> Scanner<'a> {
    pub fn new(html: &'a str) -> Self {
        Self {
            html,
            lower: html.to_ascii_lowercase(),
        }
    }

    pub fn html(&self) -> &'a str {
        self.html
    }

    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }

    /// Finds a lowercase needle at or after `from`.
    pub fn find(&self, needle: &str, from: usize) -> Option<usize> {
        let from = from.min(self.lower.len());
        self.lower[from..].find(needle).map(|rel| from + rel)
    }

    /// Finds the next opening tag named `name` (lowercase) starting in
    /// `from..limit`.
    pub fn find_open(&self, name: &str, from: usize, limit: usize) -> Option<OpenTag<'a>> {
        let limit = limit.min(self.lower.len());
        let needle = format!("<{name}");
        let mut pos = from;
        while pos < limit {
            let start = self.find(&needle, pos)?;
            if start >= limit {
                return None;
            }
            let name_end = start + needle.len();
            if !is_name_boundary(self.lower.as_bytes().get(name_end).copied()) {
                pos = name_end;
                continue;
            }
            let end = self.tag_end(name_end)?;
            return Some(OpenTag {
                start,
                end,
                text: &self.html[start..end],
                name_len: name.len(),
            });
        }
        None
    }

    /// Iterates every opening tag named `name` in document order.
    pub fn open_tags<'s>(&'s self, name: &'s str) -> impl Iterator<Item = OpenTag<'a>> + 's {
        let mut pos = 0usize;
        std::iter::from_fn(move || {
            let tag = self.find_open(name, pos, self.lower.len())?;
            pos = tag.end;
            Some(tag)
        })
    }

    /// Finds the start of the next closing tag `</name` at or after `from`.
    /// Returns `(start, end)` where `end` is just past its `>`.
    pub fn find_close(&self, name: &str, from: usize) -> Option<(usize, usize)> {
        let needle = format!("</{name}");
        let mut pos = from;
        loop {
            let start = self.find(&needle, pos)?;
            let name_end = start + needle.len();
            if !is_name_boundary(self.lower.as_bytes().get(name_end).copied()) {
                pos = name_end;
                continue;
            }
            let end = self
                .find(">", name_end)
                .map_or(self.lower.len(), |gt| gt + 1);
            return Some((start, end));
        }
    }

    /// End offset (past `>`) of the closing tag that balances `open`, counting
    /// nested elements of the same name. Returns `None` for unbalanced input.
    pub fn balanced_close(&self, name: &str, open: &OpenTag<'_>) -> Option<usize> {
        let mut depth = 1usize;
        let mut pos = open.end;
        loop {
            let (close_start, close_end) = self.find_close(name, pos)?;
            match self.find_open(name, pos, close_start) {
                Some(nested) => {
                    depth += 1;
                    pos = nested.end;
                }
                None => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(close_end);
                    }
                    pos = close_end;
                }
            }
        }
    }

    /// End offset of the last `</name>` that starts at or after `from` and
    /// finishes at or before `limit`.
    pub fn last_close_before(&self, name: &str, from: usize, limit: usize) -> Option<usize> {
        let mut last = None;
        let mut pos = from;
        while let Some((start, end)) = self.find_close(name, pos) {
            if end > limit {
                break;
            }
            last = Some(end);
            pos = start + 1;
        }
        last
    }

    /// Iterates `<name ...>body</name>` raw-text elements in document order.
    /// An unterminated trailing element is ignored.
    pub fn raw_elements<'s>(&'s self, name: &'s str) -> impl Iterator<Item = RawElement<'a>> + 's {
        let mut pos = 0usize;
        std::iter::from_fn(move || {
            let open = self.find_open(name, pos, self.lower.len())?;
            let (close_start, close_end) = self.find_close(name, open.end)?;
            pos = close_end;
            Some(RawElement {
                open,
                body: &self.html[open.end..close_start],
                outer: (open.start, close_end),
            })
        })
    }

    fn tag_end(&self, from: usize) -> Option<usize> {
        let bytes = self.lower.as_bytes();
        let mut quote: Option<u8> = None;
        for (offset, &b) in bytes[from..].iter().enumerate() {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => return Some(from + offset + 1),
                None => {}
            }
        }
        None
    }
}

fn is_name_boundary(next: Option<u8>) -> bool {
    match next {
        None => true,
        Some(b) => b.is_ascii_whitespace() || b == b'>' || b == b'/',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_in_any_order_and_quote_style() {
        let scanner = Scanner::new(r#"<DIV id=main data-Role='x' class="a b" hidden>"#);
        let tag = scanner.find_open("div", 0, scanner.len()).unwrap();
        assert_eq!(tag.attr("id"), Some("main"));
        assert_eq!(tag.attr("data-role"), Some("x"));
        assert_eq!(tag.attr("CLASS"), Some("a b"));
        assert_eq!(tag.attr("hidden"), Some(""));
        assert_eq!(tag.attr("missing"), None);
    }

    #[test]
    fn tag_end_ignores_gt_inside_quotes() {
        let scanner = Scanner::new(r#"<div title="a > b" class="x">body</div>"#);
        let tag = scanner.find_open("div", 0, scanner.len()).unwrap();
        assert_eq!(tag.as_str(), r#"<div title="a > b" class="x">"#);
        assert_eq!(tag.attr("class"), Some("x"));
    }

    #[test]
    fn name_prefix_is_not_a_match() {
        let scanner = Scanner::new("<head><headers></headers><header>h</header></head>");
        let tag = scanner.find_open("header", 0, scanner.len()).unwrap();
        assert_eq!(tag.as_str(), "<header>");
        assert_eq!(tag.start, "<head><headers></headers>".len());
    }

    #[test]
    fn balanced_close_counts_nested_elements() {
        let html = "<div a><div b><div c></div></div></div><div d></div>";
        let scanner = Scanner::new(html);
        let open = scanner.find_open("div", 0, html.len()).unwrap();
        let end = scanner.balanced_close("div", &open).unwrap();
        assert_eq!(&html[..end], "<div a><div b><div c></div></div></div>");
    }

    #[test]
    fn balanced_close_is_none_when_unclosed() {
        let html = "<div a><div b></div>";
        let scanner = Scanner::new(html);
        let open = scanner.find_open("div", 0, html.len()).unwrap();
        assert_eq!(scanner.balanced_close("div", &open), None);
    }

    #[test]
    fn raw_elements_skip_unterminated_tail() {
        let html = "<style>a{}</style><STYLE media=x>b{}</STYLE><style>c{}";
        let scanner = Scanner::new(html);
        let bodies: Vec<_> = scanner.raw_elements("style").map(|e| e.body).collect();
        assert_eq!(bodies, vec!["a{}", "b{}"]);
    }

    #[test]
    fn last_close_before_limit() {
        let html = "<div><p></div>x</div> <div id=next>";
        let scanner = Scanner::new(html);
        let limit = html.find("<div id=next>").unwrap();
        let end = scanner.last_close_before("div", 0, limit).unwrap();
        assert_eq!(&html[..end], "<div><p></div>x</div>");
    }
}
