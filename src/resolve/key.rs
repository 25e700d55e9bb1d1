//! Canonical key derivation.
//!
//! Maps `(method, path, query)` onto the string used to address both the
//! scenario config and the fixture files on disk:
//!
//! ```text
//! <method>.<path-segment>[-<name>-<value>[-<name>-<value>...]]
//! ```
//!
//! Only query parameters in the `requestDTO.` namespace take part in the key,
//! and of those, anything that looks like a date filter is skipped so that
//! date ranges do not fragment the key space.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace marker for query parameters that contribute to the key.
pub const REQUEST_DTO_PREFIX: &str = "requestDTO.";

/// Parameter names containing this substring (any case) are ignored.
const DATE_MARKER: &str = "data";

/// Parameter whose value is only lowercased, never character-filtered.
const STATUS_PARAM: &str = "status";

/// Query parameters of a request, keyed by their full (prefixed) name.
///
/// A `BTreeMap` keeps iteration sorted, which is what makes the parameter
/// section of the key deterministic.
pub type QueryParams = BTreeMap<String, String>;

/// Collects raw `(name, value)` pairs into [`QueryParams`].
///
/// A name that appears more than once keeps every value, joined with `,` in
/// arrival order.
#[must_use]
pub fn collect_query<I, K, V>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut params = QueryParams::new();
    for (name, value) in pairs {
        let value = value.into();
        params
            .entry(name.into())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    params
}

/// Canonical identifier of a mocked endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for CanonicalKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Derives the canonical key for a request.
///
/// `raw_path` may still carry a query string or fragment; both are cut off
/// before the path is flattened.
#[must_use]
pub fn normalize(method: &str, raw_path: &str, query: &QueryParams) -> CanonicalKey {
    let path = raw_path.split(['?', '#']).next().unwrap_or(raw_path);
    let mut segment = path.strip_prefix('/').unwrap_or(path).replace('/', "-");

    let params: Vec<String> = query
        .iter()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix(REQUEST_DTO_PREFIX)?;
            if is_date_param(name) {
                return None;
            }
            Some(format!("{name}-{}", normalize_value(name, value)))
        })
        .collect();

    if !params.is_empty() {
        segment.push('-');
        segment.push_str(&params.join("-"));
    }

    CanonicalKey(format!("{}.{segment}", method.to_lowercase()))
}

fn is_date_param(name: &str) -> bool {
    name.to_lowercase().contains(DATE_MARKER)
}

fn normalize_value(name: &str, value: &str) -> String {
    let lowered = value.to_lowercase();
    if name == STATUS_PARAM {
        return lowered;
    }
    lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        collect_query(pairs.iter().copied())
    }

    #[test]
    fn plain_path() {
        let key = normalize("GET", "/api/users", &QueryParams::new());
        assert_eq!(key.as_str(), "get.api-users");
    }

    #[test]
    fn status_lowercased_and_date_dropped() {
        let q = query(&[
            ("requestDTO.status", "ACTIVE"),
            ("requestDTO.dataInicio", "2024-01-01"),
        ]);
        let key = normalize("GET", "/api/orders", &q);
        assert_eq!(key.as_str(), "get.api-orders-status-active");
    }

    #[test]
    fn special_characters_collapse_to_hyphens() {
        let q = query(&[("requestDTO.type", "A B!")]);
        let first = normalize("POST", "/api/x/", &q);
        let second = normalize("POST", "/api/x/", &q);
        assert_eq!(first.as_str(), "post.api-x--type-a-b-");
        assert_eq!(first, second);
    }

    #[test]
    fn status_value_keeps_special_characters() {
        let q = query(&[("requestDTO.status", "In Review")]);
        let key = normalize("GET", "/tickets", &q);
        assert_eq!(key.as_str(), "get.tickets-status-in review");
    }

    #[test]
    fn query_and_fragment_stripped_from_path() {
        let empty = QueryParams::new();
        assert_eq!(
            normalize("GET", "/api/users?page=2", &empty).as_str(),
            "get.api-users"
        );
        assert_eq!(
            normalize("GET", "/api/users#top", &empty).as_str(),
            "get.api-users"
        );
    }

    #[test]
    fn only_one_leading_slash_stripped() {
        let key = normalize("GET", "//double", &QueryParams::new());
        assert_eq!(key.as_str(), "get.-double");
    }

    #[test]
    fn root_path() {
        assert_eq!(normalize("DELETE", "/", &QueryParams::new()).as_str(), "delete.");
    }

    #[test]
    fn params_outside_namespace_ignored() {
        let q = query(&[("page", "2"), ("sort", "name"), ("status", "X")]);
        assert_eq!(normalize("GET", "/api/users", &q).as_str(), "get.api-users");
    }

    #[test]
    fn date_filter_is_case_insensitive() {
        let q = query(&[
            ("requestDTO.DATAFIM", "2024-12-31"),
            ("requestDTO.periodData", "x"),
            ("requestDTO.updated", "yes"),
        ]);
        assert_eq!(
            normalize("GET", "/report", &q).as_str(),
            "get.report-updated-yes"
        );
    }

    #[test]
    fn params_sorted_by_name() {
        let q = query(&[("requestDTO.zeta", "1"), ("requestDTO.alpha", "2")]);
        assert_eq!(
            normalize("GET", "/items", &q).as_str(),
            "get.items-alpha-2-zeta-1"
        );
    }

    #[test]
    fn repeated_params_joined_with_comma() {
        let q = query(&[("requestDTO.tag", "a"), ("requestDTO.tag", "b")]);
        assert_eq!(q.get("requestDTO.tag").map(String::as_str), Some("a,b"));
        assert_eq!(normalize("GET", "/items", &q).as_str(), "get.items-tag-a-b");
    }

    #[test]
    fn non_ascii_characters_replaced() {
        let q = query(&[("requestDTO.city", "São Paulo")]);
        assert_eq!(
            normalize("GET", "/cities", &q).as_str(),
            "get.cities-city-s-o-paulo"
        );
    }

    #[test]
    fn canonical_key_serializes_as_plain_string() {
        let key = CanonicalKey::from("get.api-users");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"get.api-users\"");
        assert_eq!(key.to_string(), "get.api-users");
    }

    proptest! {
        #[test]
        fn irrelevant_params_never_change_key(
            path in "/[a-z]{1,8}(/[a-z0-9]{1,8}){0,3}",
            noise in proptest::collection::vec(("[a-zA-Z]{1,6}", "[ -~]{0,8}"), 0..6),
        ) {
            let baseline = normalize("GET", &path, &QueryParams::new());
            let forward = collect_query(noise.iter().cloned());
            let backward = collect_query(noise.iter().rev().cloned());
            prop_assert_eq!(&normalize("GET", &path, &forward), &baseline);
            prop_assert_eq!(&normalize("GET", &path, &backward), &baseline);
        }

        #[test]
        fn namespaced_param_order_does_not_matter(
            params in proptest::collection::btree_map("[a-z]{1,6}", "[ -~]{0,8}", 0..5),
        ) {
            let pairs: Vec<(String, String)> = params
                .iter()
                .map(|(k, v)| (format!("{REQUEST_DTO_PREFIX}{k}"), v.clone()))
                .collect();
            let forward = collect_query(pairs.iter().cloned());
            let backward = collect_query(pairs.iter().rev().cloned());
            prop_assert_eq!(
                normalize("PUT", "/a/b", &forward),
                normalize("PUT", "/a/b", &backward)
            );
        }

        #[test]
        fn key_path_segment_has_no_slashes(path in "/[a-z/]{0,20}") {
            let key = normalize("GET", &path, &QueryParams::new());
            prop_assert!(!key.as_str().contains('/'));
        }
    }
}
