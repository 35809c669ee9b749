//! Header extraction for inbound webhook deliveries.
//!
//! Web frameworks hand headers over in different shapes: single-valued maps,
//! multi-valued maps, pair lists, or `http::HeaderMap`. [`HeaderSource`] is
//! the one capability the verifier needs from any of them, so the
//! verification logic does not depend on the host framework.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use reqwest::header::HeaderMap;

/// Header carrying `sha256=<hex>`.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Header carrying the Unix timestamp (seconds) the delivery was signed at.
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";

/// Read-only, case-insensitive access to a collection of HTTP headers.
pub trait HeaderSource {
    /// Every value received for `name`, in order. Names match
    /// case-insensitively.
    fn header_values(&self, name: &str) -> Vec<&str>;

    /// The first value received for `name`.
    fn first_of(&self, name: &str) -> Option<&str> {
        self.header_values(name).into_iter().next()
    }

    /// All values for `name` joined with `", "`, the way HTTP folds repeated
    /// headers.
    fn lookup(&self, name: &str) -> Option<String> {
        let values = self.header_values(name);
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }
}

/// Keys of a hash map matching `name` case-insensitively, in a stable order:
/// an exact-case match first, then the rest sorted by key.
fn matching_keys<'a, V, S>(
    map: &'a HashMap<String, V, S>,
    name: &str,
) -> Vec<(&'a String, &'a V)> {
    let mut matches: Vec<_> = map
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .collect();
    matches.sort_by_key(|(key, _)| (key.as_str() != name, *key));
    matches
}

/// A hash map has no arrival order, so when several keys differ only in
/// case, the key spelled exactly like `name` comes first and the others
/// follow in byte order.
impl<S: BuildHasher> HeaderSource for HashMap<String, String, S> {
    fn header_values(&self, name: &str) -> Vec<&str> {
        matching_keys(self, name)
            .into_iter()
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

/// Keys differing only in case are ordered as for the single-valued map;
/// values under one key keep their order.
impl<S: BuildHasher> HeaderSource for HashMap<String, Vec<String>, S> {
    fn header_values(&self, name: &str) -> Vec<&str> {
        matching_keys(self, name)
            .into_iter()
            .flat_map(|(_, values)| values.iter().map(String::as_str))
            .collect()
    }
}

impl HeaderSource for BTreeMap<String, String> {
    fn header_values(&self, name: &str) -> Vec<&str> {
        self.iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

impl HeaderSource for [(String, String)] {
    fn header_values(&self, name: &str) -> Vec<&str> {
        self.iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

impl HeaderSource for Vec<(String, String)> {
    fn header_values(&self, name: &str) -> Vec<&str> {
        self.as_slice().header_values(name)
    }
}

impl HeaderSource for HeaderMap {
    fn header_values(&self, name: &str) -> Vec<&str> {
        // A value that is not visible ASCII reads as empty, keeping its
        // position so the first value received is still the first reported.
        self.get_all(name)
            .iter()
            .map(|value| value.to_str().unwrap_or_default())
            .collect()
    }
}

impl<T: HeaderSource + ?Sized> HeaderSource for &T {
    fn header_values(&self, name: &str) -> Vec<&str> {
        (**self).header_values(name)
    }
}

/// Signature and timestamp of a delivery.
///
/// Missing headers are represented by empty strings, which the verifier
/// rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub signature: String,
    pub timestamp: String,
}

/// Pull the signature and timestamp out of a header collection.
///
/// When a header was sent more than once, the first value wins. Absent
/// headers yield empty strings; this never fails.
pub fn extract_webhook_headers<H>(headers: &H) -> WebhookHeaders
where
    H: HeaderSource + ?Sized,
{
    WebhookHeaders {
        signature: headers
            .first_of(SIGNATURE_HEADER)
            .unwrap_or_default()
            .to_string(),
        timestamp: headers
            .first_of(TIMESTAMP_HEADER)
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
#[path = "headers_tests.rs"]
mod tests;
