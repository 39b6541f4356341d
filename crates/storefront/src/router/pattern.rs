//! Path normalization and pattern matching.
//!
//! Matching ignores the query string and fragment, empty segments and a
//! trailing slash. Static segments compare case-insensitively; `:name`
//! segments capture one percent-decoded segment.

use std::borrow::Cow;

/// Parameters captured from `:name` segments, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(&'static str, String)>);

impl Params {
    /// Value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if no parameter was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

/// Strip query and fragment and split into non-empty segments.
#[must_use]
pub fn segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical form of a path: leading slash, no trailing slash, no query.
#[must_use]
pub fn normalize(path: &str) -> String {
    format!("/{}", segments(path).join("/"))
}

/// Query string of a path, without the `?` and fragment.
#[must_use]
pub fn query(path: &str) -> Option<&str> {
    let start = path.find('?')? + 1;
    let rest = &path[start..];
    let end = rest.find('#').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Percent-decoded value of `key` in a path's query string.
#[must_use]
pub fn query_param(path: &str, key: &str) -> Option<String> {
    query(path)?
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| decode(&v.replace('+', " ")).into_owned())
}

fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Match already-split `segments` against `pattern`.
pub(super) fn match_pattern(pattern: &'static str, segments: &[&str]) -> Option<Params> {
    let expected: Vec<&'static str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    if expected.len() != segments.len() {
        return None;
    }

    let mut params = Vec::new();
    for (want, got) in expected.into_iter().zip(segments) {
        if let Some(name) = want.strip_prefix(':') {
            params.push((name, decode(got).into_owned()));
        } else if !want.eq_ignore_ascii_case(got) {
            return None;
        }
    }
    Some(Params(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_ignore_query_fragment_and_slashes() {
        assert_eq!(segments("/search?query=tea#top"), vec!["search"]);
        assert_eq!(segments("//orders/"), vec!["orders"]);
        assert!(segments("/").is_empty());
        assert!(segments("").is_empty());
        assert!(segments("?x=1").is_empty());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("admin/orders/"), "/admin/orders");
        assert_eq!(normalize("/?a=b"), "/");
    }

    #[test]
    fn test_match_static_and_params() {
        let params = match_pattern("/reset-password/:uid/:token", &["reset-password", "7", "abc"]);
        let params = params.expect("should match");
        assert_eq!(params.get("uid"), Some("7"));
        assert_eq!(params.get("token"), Some("abc"));
        assert_eq!(params.get("missing"), None);

        assert!(match_pattern("/orders", &["orders", "x"]).is_none());
        assert!(match_pattern("/orders/:oid", &["orders"]).is_none());
        assert!(match_pattern("/", &[]).is_some_and(|p| p.is_empty()));
    }

    #[test]
    fn test_static_segments_are_case_insensitive() {
        assert!(match_pattern("/admin/add-product", &["Admin", "ADD-PRODUCT"]).is_some());
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let params = match_pattern("/detail/:slug", &["green%20tea"]).expect("should match");
        assert_eq!(params.get("slug"), Some("green tea"));

        // Invalid UTF-8 escapes are kept verbatim.
        let params = match_pattern("/detail/:slug", &["bad%FF"]).expect("should match");
        assert_eq!(params.get("slug"), Some("bad%FF"));
    }

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param("/search?query=green+tea&x=1#frag", "query"),
            Some("green tea".to_string())
        );
        assert_eq!(
            query_param("/payment-success/k7?session_id=cs_123", "session_id"),
            Some("cs_123".to_string())
        );
        assert_eq!(query_param("/search", "query"), None);
        assert_eq!(query_param("/search?flag", "flag"), Some(String::new()));
    }
}
