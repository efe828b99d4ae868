use crate::markup::Scanner;

/// Removes complete `<script>...</script>` elements. An unterminated script tag
/// is left in place.
pub fn strip_scripts(html: &str) -> String {
    let scanner = Scanner::new(html);
    let mut out = String::with_capacity(html.len());
    let mut copied = 0usize;
    for element in scanner.raw_elements("script") {
        let range = element.outer_range();
        out.push_str(&html[copied..range.start]);
        copied = range.end;
    }
    out.push_str(&html[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_inline_and_external_scripts() {
        let html = r#"<div><script>alert(1)</script><p>a</p><SCRIPT src="x.js" defer></SCRIPT>b</div>"#;
        assert_eq!(strip_scripts(html), "<div><p>a</p>b</div>");
    }

    #[test]
    fn keeps_script_like_text() {
        let html = "<p>scripts &lt;script&gt; are fun</p><noscript>n</noscript>";
        assert_eq!(strip_scripts(html), html);
    }

    #[test]
    fn unterminated_script_is_left_alone() {
        let html = "<p>a</p><script>var x = 1;";
        assert_eq!(strip_scripts(html), html);
    }
}
