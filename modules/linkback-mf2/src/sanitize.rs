use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::urls::is_url;

/// Tags allowed to survive in comment content. Everything else is stripped
/// down to its inner text.
const ALLOWED_TAGS: [&str; 18] = [
    "a", "abbr", "b", "blockquote", "cite", "code", "del", "em", "i", "q", "strike", "strong",
    "pre", "br", "p", "ul", "ol", "li",
];

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)</?([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").expect("valid regex"));
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)title\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

fn is_allowed(tag: &str) -> bool {
    ALLOWED_TAGS.contains(&tag)
}

/// Reduce markup to a comment-safe subset: script/style payloads and HTML
/// comments are dropped wholesale, disallowed tags are unwrapped to their
/// inner text, and attributes are stripped except `href`/`title` on links
/// (`href` must itself be URL-shaped). Text and entities pass through.
pub fn sanitize_html(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let without_styles = STYLE_RE.replace_all(&without_scripts, "");
    let without_comments = COMMENT_RE.replace_all(&without_styles, "");

    TAG_RE
        .replace_all(&without_comments, |caps: &Captures| {
            let raw = &caps[0];
            let tag = caps[1].to_lowercase();
            if !is_allowed(&tag) {
                return String::new();
            }
            if raw.starts_with("</") {
                return format!("</{tag}>");
            }
            if tag == "a" {
                let mut attrs = String::new();
                if let Some(href) = HREF_RE.captures(raw).map(|c| c[1].to_string()) {
                    if is_url(&href) {
                        attrs.push_str(&format!(r#" href="{href}""#));
                    }
                }
                if let Some(title) = TITLE_RE.captures(raw).map(|c| c[1].to_string()) {
                    attrs.push_str(&format!(r#" title="{title}""#));
                }
                return format!("<a{attrs}>");
            }
            format!("<{tag}>")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_payloads_are_dropped_wholesale() {
        let html = r#"<p>before</p><script>alert("x")</script><p>after</p>"#;
        assert_eq!(sanitize_html(html), "<p>before</p><p>after</p>");
    }

    #[test]
    fn style_blocks_and_comments_are_dropped() {
        let html = "<style>p { color: red }</style><!-- hidden -->text";
        assert_eq!(sanitize_html(html), "text");
    }

    #[test]
    fn disallowed_tags_are_unwrapped_to_text() {
        let html = r#"<div class="e-content"><span>Hello</span> <em>world</em></div>"#;
        assert_eq!(sanitize_html(html), "Hello <em>world</em>");
    }

    #[test]
    fn link_keeps_only_href_and_title() {
        let html = r#"<a class="u-url" href="https://example.com/post" onclick="evil()" title="the post">link</a>"#;
        assert_eq!(
            sanitize_html(html),
            r#"<a href="https://example.com/post" title="the post">link</a>"#
        );
    }

    #[test]
    fn non_url_href_is_dropped() {
        let html = r#"<a href="javascript:alert(1)">click</a>"#;
        assert_eq!(sanitize_html(html), "<a>click</a>");
    }

    #[test]
    fn attributes_are_stripped_from_allowed_tags() {
        let html = r#"<blockquote cite="https://x.example/" style="color:red">quoted</blockquote>"#;
        assert_eq!(sanitize_html(html), "<blockquote>quoted</blockquote>");
    }

    #[test]
    fn entities_pass_through() {
        assert_eq!(sanitize_html("a &amp; b"), "a &amp; b");
    }
}
