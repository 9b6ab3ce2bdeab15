//! URL encoding/decoding utilities

use std::collections::HashMap;

/// Encodes a string using URL encoding
///
/// # Examples
/// ```
/// use clashconvert::utils::url::url_encode;
///
/// let encoded = url_encode("Hello World!");
/// assert_eq!(encoded, "Hello%20World%21");
/// ```
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Decodes a URL-encoded string
///
/// Returns the original string if decoding fails.
///
/// # Examples
/// ```
/// use clashconvert::utils::url::url_decode;
///
/// let decoded = url_decode("Hello%20World%21");
/// assert_eq!(decoded, "Hello World!");
/// ```
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Parse a `k=v&k2=v2` query string into a map, percent-decoding keys and values.
///
/// Later duplicates win. Unlike form decoding, `+` is kept literally because
/// proxy links routinely carry base64 values in their query.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        params.insert(url_decode(key), url_decode(value));
    }
    params
}

/// Build a query string from ordered pairs, percent-encoding the values.
pub fn build_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, url_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Interpret common truthy query values (`1`, `true`).
pub fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let params = parse_query("sni=example.com&allowInsecure=1&path=%2Fws&flag");
        assert_eq!(params["sni"], "example.com");
        assert_eq!(params["allowInsecure"], "1");
        assert_eq!(params["path"], "/ws");
        assert_eq!(params["flag"], "");
    }

    #[test]
    fn test_build_query() {
        let query = build_query(&[("path", "/ws".to_string()), ("sni", "a.com".to_string())]);
        assert_eq!(query, "path=%2Fws&sni=a.com");
    }
}
