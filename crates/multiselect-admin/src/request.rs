//! The part of an HTTP request the change list reads.

use std::collections::BTreeMap;

/// An admin list request: a path and its decoded query parameters.
#[derive(Debug, Clone, Default)]
pub struct AdminRequest {
    /// Request path.
    pub path: String,
    /// Query string parameters.
    pub query: BTreeMap<String, String>,
}

impl AdminRequest {
    /// Creates a request without query parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Creates a request from a URL such as `/admin/articles/?status__in=A`.
    pub fn from_url(url: &str) -> Self {
        match url.split_once('?') {
            Some((path, query)) => Self {
                path: path.to_string(),
                query: Self::parse_query_string(query),
            },
            None => Self::new(url),
        }
    }

    /// Sets a query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Gets a query parameter.
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Parses query parameters from a query string.
    ///
    /// When a key repeats, the last value wins.
    pub fn parse_query_string(query: &str) -> BTreeMap<String, String> {
        query
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (urldecode(key), urldecode(value))
            })
            .collect()
    }
}

/// Form-urlencodes a string: unreserved characters pass through, spaces
/// become `+`, every other byte is percent-encoded.
pub(crate) fn urlencode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Decodes a form-urlencoded string. Malformed escapes are kept verbatim.
pub(crate) fn urldecode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    decoded.push(byte);
                    i += 3;
                    continue;
                }
                decoded.push(b'%');
            }
            b'+' => decoded.push(b' '),
            other => decoded.push(other),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
