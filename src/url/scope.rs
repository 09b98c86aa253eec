/// Checks whether a canonical link belongs to a crawl rooted at `root`
///
/// A link is in scope when it starts with the site's canonical root and
/// carries no fragment marker. Both arguments must already be canonical.
///
/// # Examples
///
/// ```
/// use lemmadex::url::is_in_scope;
///
/// let root = "https://www.example.com/";
/// assert!(is_in_scope(root, "https://www.example.com/news/"));
/// assert!(!is_in_scope(root, "https://www.example.com/news/#top/"));
/// assert!(!is_in_scope(root, "https://www.other.com/"));
/// ```
pub fn is_in_scope(root: &str, url: &str) -> bool {
    url.starts_with(root) && !url.contains('#')
}

/// Derives the stored page path from a canonical URL
///
/// The path is the URL with the canonical root removed, keeping the leading
/// slash, so the root itself maps to `/`. Returns None when the URL is not
/// under the root.
///
/// # Examples
///
/// ```
/// use lemmadex::url::site_path;
///
/// let root = "https://www.example.com/";
/// assert_eq!(site_path(root, root).as_deref(), Some("/"));
/// assert_eq!(site_path(root, "https://www.example.com/about/").as_deref(), Some("/about/"));
/// assert_eq!(site_path(root, "https://www.other.com/"), None);
/// ```
pub fn site_path(root: &str, url: &str) -> Option<String> {
    let rest = url.strip_prefix(root)?;
    let rest = rest.trim_start_matches('/');
    Some(format!("/{}", rest))
}

/// Picks the root that owns a canonical URL
///
/// When several roots match, the longest (most specific) one wins.
pub fn owning_root<'a, I>(roots: I, url: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    roots
        .into_iter()
        .filter(|root| url.starts_with(root))
        .max_by_key(|root| root.len())
}
