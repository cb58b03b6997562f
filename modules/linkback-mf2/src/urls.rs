use std::sync::LazyLock;

use regex::Regex;

/// The shape a value must have before it is treated as a URL anywhere in
/// the interpreter. Values failing this are opaque text, never errors.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+\..+$").expect("valid regex"));

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("valid regex"));

pub fn is_url(s: &str) -> bool {
    URL_RE.is_match(s)
}

/// Normalize and escape a URL for storage. Unparseable input is returned
/// unchanged, treated as opaque text.
pub fn escape_url(s: &str) -> String {
    match url::Url::parse(s) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => s.to_string(),
    }
}

/// Compare one URL against a list of candidates.
///
/// With `schemeless` (the usual mode) the needle's scheme is stripped and
/// both `http://` and `https://` reconstructions are tested, so comparison
/// is scheme-insensitive but otherwise exact. No trailing-slash or `www.`
/// normalization happens here; functionally identical URLs differing in
/// those respects do not match.
pub fn compare_urls(needle: &str, haystack: &[String], schemeless: bool) -> bool {
    if !is_url(needle) {
        return false;
    }

    let needles: Vec<String> = if schemeless {
        let bare = SCHEME_RE.replace(needle, "");
        vec![format!("http://{bare}"), format!("https://{bare}")]
    } else {
        vec![needle.to_string()]
    };

    haystack.iter().any(|candidate| needles.iter().any(|n| n == candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_pattern_requires_scheme_and_dot() {
        assert!(is_url("https://example.com/post"));
        assert!(is_url("http://example.com/post"));
        assert!(!is_url("example.com/post"));
        assert!(!is_url("ftp://example.com/post"));
        assert!(!is_url("https://localhost/post"));
        assert!(!is_url("just some text"));
    }

    #[test]
    fn comparison_is_invariant_under_scheme_swap() {
        let haystack = vec!["https://example.com/post".to_string()];
        assert!(compare_urls("https://example.com/post", &haystack, true));
        assert!(compare_urls("http://example.com/post", &haystack, true));
    }

    #[test]
    fn non_url_needle_never_matches() {
        let haystack = vec!["not-a-url".to_string()];
        assert!(!compare_urls("not-a-url", &haystack, true));
        assert!(!compare_urls("not-a-url", &haystack, false));
    }

    #[test]
    fn strict_mode_is_exact() {
        let haystack = vec!["https://example.com/post".to_string()];
        assert!(compare_urls("https://example.com/post", &haystack, false));
        assert!(!compare_urls("http://example.com/post", &haystack, false));
    }

    #[test]
    fn trailing_slash_and_www_are_not_normalized() {
        let haystack = vec!["https://example.com/post/".to_string()];
        assert!(!compare_urls("https://example.com/post", &haystack, true));

        let haystack = vec!["https://www.example.com/post".to_string()];
        assert!(!compare_urls("https://example.com/post", &haystack, true));
    }

    #[test]
    fn escape_normalizes_parseable_urls() {
        assert_eq!(
            escape_url("https://EXAMPLE.com/a b"),
            "https://example.com/a%20b"
        );
        assert_eq!(escape_url("not a url"), "not a url");
    }
}
