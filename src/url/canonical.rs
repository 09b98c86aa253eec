const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";
const WWW_PREFIX: &str = "www.";

/// Canonicalizes a URL according to lemmadex's comparison rules
///
/// Every URL that is stored, compared, or scope-checked goes through this
/// function first.
///
/// # Canonicalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Rewrite a leading `http://` to `https://`
/// 3. Ensure the host carries a `www.` prefix:
///    - `https://www.host/` is kept as is
///    - `https://host/` becomes `https://www.host/`
///    - `www.host/` becomes `https://www.host/`
///    - `host/` becomes `https://www.host/`
/// 4. Append a trailing `/` unless the string already ends in one
///
/// The result is a plain string rather than a parsed [`url::Url`]: the rule
/// is textual and must stay idempotent for every input.
///
/// # Examples
///
/// ```
/// use lemmadex::url::canonicalize;
///
/// assert_eq!(canonicalize("http://example.com"), "https://www.example.com/");
/// assert_eq!(canonicalize("https://www.example.com/news/"), "https://www.example.com/news/");
/// assert_eq!(canonicalize("example.com/about"), "https://www.example.com/about/");
/// ```
pub fn canonicalize(url: &str) -> String {
    let trimmed = url.trim();

    let secure = match trimmed.strip_prefix(HTTP_PREFIX) {
        Some(rest) => format!("{}{}", HTTPS_PREFIX, rest),
        None => trimmed.to_string(),
    };

    // The slash goes on last so that "https://" alone still ends in '/'
    let mut canonical = if let Some(rest) = secure.strip_prefix(HTTPS_PREFIX) {
        if rest.starts_with(WWW_PREFIX) {
            secure
        } else {
            format!("{}{}{}", HTTPS_PREFIX, WWW_PREFIX, rest)
        }
    } else if secure.starts_with(WWW_PREFIX) {
        format!("{}{}", HTTPS_PREFIX, secure)
    } else {
        format!("{}{}{}", HTTPS_PREFIX, WWW_PREFIX, secure)
    };

    if !canonical.ends_with('/') {
        canonical.push('/');
    }

    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_http_to_https() {
        assert_eq!(
            canonicalize("http://www.example.com/page/"),
            "https://www.example.com/page/"
        );
    }

    #[test]
    fn test_adds_trailing_slash() {
        assert_eq!(
            canonicalize("https://www.example.com/page"),
            "https://www.example.com/page/"
        );
    }

    #[test]
    fn test_keeps_existing_trailing_slash() {
        assert_eq!(
            canonicalize("https://www.example.com/"),
            "https://www.example.com/"
        );
    }

    #[test]
    fn test_adds_www_to_https() {
        assert_eq!(
            canonicalize("https://example.com/"),
            "https://www.example.com/"
        );
    }

    #[test]
    fn test_adds_scheme_to_www() {
        assert_eq!(
            canonicalize("www.example.com"),
            "https://www.example.com/"
        );
    }

    #[test]
    fn test_bare_host() {
        assert_eq!(canonicalize("example.com"), "https://www.example.com/");
    }

    #[test]
    fn test_http_without_www() {
        assert_eq!(
            canonicalize("http://example.com/a/b"),
            "https://www.example.com/a/b/"
        );
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            canonicalize("  https://example.com/page \n"),
            "https://www.example.com/page/"
        );
    }

    #[test]
    fn test_query_string_gets_slash() {
        assert_eq!(
            canonicalize("https://www.example.com/search?q=1"),
            "https://www.example.com/search?q=1/"
        );
    }

    #[test]
    fn test_fragment_is_preserved() {
        // Fragment links are rejected by the scope rule, not rewritten here
        assert!(canonicalize("https://example.com/page#top").contains('#'));
    }

    #[test]
    fn test_idempotent_on_known_forms() {
        for url in [
            "http://example.com",
            "https://example.com/news",
            "www.example.com/a/",
            "example.com",
            "https://www.example.com/",
            "",
        ] {
            let once = canonicalize(url);
            assert_eq!(canonicalize(&once), once, "not idempotent for {:?}", url);
        }
    }

    proptest! {
        #[test]
        fn test_canonicalize_is_idempotent(url in "\\PC*") {
            let once = canonicalize(&url);
            prop_assert_eq!(canonicalize(&once), once);
        }

        #[test]
        fn test_canonical_form_shape(url in "(https?://)?(www\\.)?[a-z]{1,10}\\.[a-z]{2,3}(/[a-z0-9]{1,8}){0,3}/?") {
            let canonical = canonicalize(&url);
            prop_assert!(canonical.starts_with("https://www."));
            prop_assert!(canonical.ends_with('/'));
        }
    }
}
