//! Normalized view of a request's query parameters.
//!
//! HTTP allows a key to repeat, so every key maps to one-or-many values.
//! Built once per request and handed to the script engine; never shared
//! between requests.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::Uri;
use log::warn;

#[derive(Debug, Default, Clone)]
pub struct ParameterMap {
    entries: HashMap<String, Vec<String>>,
}

impl ParameterMap {
    /// Decodes the query string of `uri`.
    ///
    /// A malformed query degrades to an empty map with a warning; a request
    /// never fails over its parameters.
    pub fn from_uri(uri: &Uri) -> Self {
        match Query::<Vec<(String, String)>>::try_from_uri(uri) {
            Ok(Query(pairs)) => Self::from_pairs(pairs),
            Err(e) => {
                warn!("ignoring undecodable query string on {}: {e}", uri.path());
                Self::default()
            }
        }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            entries.entry(key).or_default().push(value);
        }
        Self { entries }
    }

    /// First value for `key`, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// Every value supplied for `key`, in request order.
    pub fn all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_keep_every_value_in_order() {
        let uri: Uri = "/page.cfm?id=1&id=2&name=x".parse().unwrap();
        let params = ParameterMap::from_uri(&uri);
        assert_eq!(params.all("id"), ["1", "2"]);
        assert_eq!(params.first("name"), Some("x"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn absent_query_yields_an_empty_map() {
        let uri: Uri = "/anything/else".parse().unwrap();
        let params = ParameterMap::from_uri(&uri);
        assert!(params.is_empty());
        assert_eq!(params.first("id"), None);
        assert!(params.all("id").is_empty());
    }

    #[test]
    fn values_are_percent_decoded() {
        let uri: Uri = "/page.cfm?msg=hello%20world".parse().unwrap();
        let params = ParameterMap::from_uri(&uri);
        assert_eq!(params.first("msg"), Some("hello world"));
    }
}
