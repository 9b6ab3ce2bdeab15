//! String utility functions for text processing

use crate::error::DecodeError;

/// Scheme token of a link (the text before `://`), if the line has one.
pub fn scheme_of(link: &str) -> Option<&str> {
    link.find("://").map(|pos| &link[..pos])
}

/// Lowercase only the scheme prefix of a link, keeping the payload untouched.
///
/// Base64 payloads are case sensitive, so only the part before `://` may be
/// normalized.
pub fn normalize_scheme(link: &str) -> String {
    match link.find("://") {
        Some(pos) => format!("{}{}", link[..pos].to_ascii_lowercase(), &link[pos..]),
        None => link.to_string(),
    }
}

/// Strip `scheme://` from a link, returning the remainder when it matches.
pub fn strip_scheme<'a>(link: &'a str, scheme: &str) -> Option<&'a str> {
    link.strip_prefix(scheme)?.strip_prefix("://")
}

/// Split a trailing `#fragment` off a link body.
pub fn split_fragment(body: &str) -> (&str, Option<&str>) {
    match body.find('#') {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    }
}

/// Split a `?query` off a link body. A `/` right before `?` is dropped as well.
pub fn split_query(body: &str) -> (&str, Option<&str>) {
    match body.find('?') {
        Some(pos) => {
            let head = &body[..pos];
            (head.strip_suffix('/').unwrap_or(head), Some(&body[pos + 1..]))
        }
        None => (body, None),
    }
}

/// Parse `host:port`, accepting bracketed IPv6 literals (`[::1]:443`).
pub fn split_host_port(input: &str) -> Result<(String, u16), DecodeError> {
    let input = input.trim().trim_end_matches('/');
    let (host, port) = if let Some(rest) = input.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| DecodeError::Malformed(format!("unterminated IPv6 host: {}", input)))?;
        let port = rest[end + 1..]
            .strip_prefix(':')
            .ok_or(DecodeError::MissingField("port"))?;
        (&rest[..end], port)
    } else {
        input
            .rsplit_once(':')
            .ok_or(DecodeError::MissingField("port"))?
    };

    if host.is_empty() {
        return Err(DecodeError::MissingField("server"));
    }
    Ok((host.to_string(), parse_port(port)?))
}

/// Parse a port number, rejecting 0 and anything outside `u16`.
pub fn parse_port(port: &str) -> Result<u16, DecodeError> {
    match port.trim().parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(DecodeError::InvalidPort(port.to_string())),
    }
}

/// Render a host for use in a URI authority, bracketing IPv6 literals.
pub fn format_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// `Some(s)` when `s` is non-empty.
pub fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// A proxy name usable as the key of a Loon `name = ...` line.
///
/// Loon splits those lines on `=` and `,`, so both become `_`.
pub fn loon_proxy_name(name: &str) -> String {
    name.trim().replace([',', '='], "_")
}
