//! Link Rewriter: maps the remote site's navigational URLs onto local routes.
//!
//! Only `href` attribute values are touched, and only when the whole value is a
//! mapped URL (an optional trailing slash is tolerated). Text that merely
//! mentions the remote host is left alone.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewrite {
    pub remote: String,
    pub local: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRewriteMap {
    entries: Vec<LinkRewrite>,
}

impl LinkRewriteMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, remote: impl Into<String>, local: impl Into<String>) {
        let remote = remote.into();
        let remote = remote.trim_end_matches('/').to_string();
        self.entries.push(LinkRewrite {
            remote,
            local: local.into(),
        });
    }

    pub fn with(mut self, remote: impl Into<String>, local: impl Into<String>) -> Self {
        self.push(remote, local);
        self
    }

    /// Adds `https://` and `http://` entries for `host_and_path`
    /// (for example `example.com/our-team`).
    pub fn with_any_scheme(self, host_and_path: &str, local: &str) -> Self {
        let host_and_path = host_and_path.trim_start_matches('/');
        self.with(format!("https://{host_and_path}"), local)
            .with(format!("http://{host_and_path}"), local)
    }

    /// The site's root and well-known pages mapped onto this front end's routes.
    pub fn for_site(site_url: &Url) -> Self {
        let Some(host) = site_url.host_str() else {
            return Self::new();
        };
        let host = match site_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let base_path = site_url.path().trim_end_matches('/');
        let site = format!("{host}{base_path}");

        Self::new()
            .with_any_scheme(&site, "/")
            .with_any_scheme(&format!("{site}/our-team"), "/about")
            .with_any_scheme(&format!("{site}/contact-us"), "/contact")
            .with_any_scheme(&format!("{site}/our-menu"), "/blog")
    }

    pub fn entries(&self) -> &[LinkRewrite] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve<'a>(&'a self, value: &'a str) -> &'a str {
        let mut current = value;
        for entry in &self.entries {
            let bare = current.strip_suffix('/').unwrap_or(current);
            if bare == entry.remote {
                current = entry.local.as_str();
            }
        }
        current
    }
}

/// Rewrites quoted `href` values of `html` through `map`.
pub fn rewrite(html: &str, map: &LinkRewriteMap) -> String {
    if map.is_empty() {
        return html.to_string();
    }

    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut copied = 0usize;
    let mut pos = 0usize;

    while let Some(rel) = lower[pos..].find("href=") {
        let at = pos + rel;
        let start = at + "href=".len();
        // `data-href=` and `xlink:href=` are not navigation targets.
        if !at
            .checked_sub(1)
            .and_then(|i| html.as_bytes().get(i))
            .is_some_and(u8::is_ascii_whitespace)
        {
            pos = start;
            continue;
        }
        let Some(quote) = html.as_bytes().get(start).copied() else {
            break;
        };
        if quote != b'"' && quote != b'\'' {
            pos = start;
            continue;
        }
        let value_start = start + 1;
        let Some(end_rel) = html[value_start..].find(quote as char) else {
            break;
        };
        let value_end = value_start + end_rel;
        let value = &html[value_start..value_end];

        let resolved = map.resolve(value);
        if resolved != value {
            out.push_str(&html[copied..value_start]);
            out.push_str(resolved);
            copied = value_end;
        }
        pos = value_end + 1;
    }

    out.push_str(&html[copied..]);
    out
}
