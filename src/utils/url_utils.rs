//! URL canonicalization and validation utilities.
//!
//! Canonicalization rules here implement spec.md §4.1's "Fragment and query
//! canonicalization" step: fragments are stripped, tracking query keys are
//! removed, remaining query pairs are sorted lexicographically, and the
//! path's trailing slash is normalized. The Scope Guard and Admission both
//! operate on the canonical form.

use url::Url;

/// Strip the fragment, remove tracking query keys, sort the remaining
/// query lexicographically, and normalize the trailing slash.
///
/// Returns `None` if `url` does not parse. `tracking_keys` is
/// case-sensitive, matching the configured key set.
#[must_use]
pub fn canonicalize(url: &str, tracking_keys: &[String]) -> Option<Url> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !tracking_keys.iter().any(|t| t == k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    normalize_trailing_slash(&mut parsed);
    Some(parsed)
}

/// Collapse a path ending in `/index.html`/`/index.htm` or carrying a
/// redundant trailing slash on a non-root path down to one canonical form:
/// keep a single trailing slash for directory-like paths, none otherwise.
fn normalize_trailing_slash(url: &mut Url) {
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        if !trimmed.is_empty() {
            url.set_path(trimmed);
        }
    }
}

/// Resolve `href` against `base`, returning `None` for unresolvable or
/// non-http(s) targets.
#[must_use]
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let joined = base.join(href).ok()?;
    matches!(joined.scheme(), "http" | "https").then_some(joined)
}
