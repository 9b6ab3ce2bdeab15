//! Multi-line link parser

use std::borrow::Cow;

use log::{debug, warn};

use super::{LinkError, ParseResult};
use crate::codec::{CodecRegistry, DecodeOutcome, ProxyCodec};
use crate::error::DecodeError;
use crate::models::{default_name, Proxy, ProxyType};
use crate::utils::base64::base64_decode;
use crate::utils::string::{normalize_scheme, scheme_of};

/// Expand a base64-encoded subscription body into its link list.
///
/// Input that already carries links, or that does not decode to links, is
/// returned unchanged.
pub fn explode_subscription(content: &str) -> Cow<'_, str> {
    if content.contains("://") {
        return Cow::Borrowed(content);
    }
    match base64_decode(content) {
        Some(decoded) if decoded.contains("://") => {
            debug!("Decoded base64 subscription body");
            Cow::Owned(decoded)
        }
        _ => Cow::Borrowed(content),
    }
}

/// Offer one normalized line to each codec in priority order. The first
/// codec that recognizes the scheme decides the outcome.
fn decode_line(
    codecs: &[&dyn ProxyCodec],
    link: &str,
) -> Option<(ProxyType, Result<Proxy, DecodeError>)> {
    codecs.iter().find_map(|codec| match codec.decode(link) {
        DecodeOutcome::NotMatched => None,
        DecodeOutcome::Decoded(proxy) => Some((codec.proxy_type(), Ok(proxy))),
        DecodeOutcome::Malformed(err) => Some((codec.proxy_type(), Err(err))),
    })
}

/// Parse newline-separated proxy links.
///
/// Lines are separated by `\n`, `\r\n` or `\r`; blank lines are skipped.
/// Unnamed nodes receive `defaultName_<n>`, counting from 1 within this call.
/// Corrupt lines of a recognized scheme end up in `malformed`, lines with an
/// unknown scheme in `unsupported`, and anything else is dropped.
pub fn parse_links(registry: &CodecRegistry, content: &str) -> ParseResult {
    let content = explode_subscription(content);
    let codecs = registry.in_priority_order();
    let mut result = ParseResult::default();
    let mut unnamed = 0usize;

    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    for (index, raw) in normalized.split('\n').enumerate() {
        let line_no = index + 1;
        let line = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
        if line.is_empty() {
            continue;
        }

        let link = normalize_scheme(line);
        match decode_line(&codecs, &link) {
            Some((_, Ok(mut proxy))) => {
                if proxy.name.is_empty() {
                    unnamed += 1;
                    proxy.name = default_name(unnamed);
                }
                result.proxies.push(proxy);
            }
            Some((proxy_type, Err(error))) => {
                warn!(
                    "Skipping malformed {} link on line {}: {}",
                    proxy_type, line_no, error
                );
                result.malformed.push(LinkError {
                    line: line_no,
                    scheme: scheme_of(&link).unwrap_or(proxy_type.as_tag()).to_string(),
                    error,
                });
            }
            None => match scheme_of(&link) {
                Some(scheme) if !scheme.is_empty() && !registry.is_known_scheme(scheme) => {
                    debug!("Unsupported scheme '{}' on line {}", scheme, line_no);
                    result.unsupported.push(scheme.to_string());
                }
                Some(scheme) => {
                    debug!("Ignoring unclaimed {} line {}", scheme, line_no);
                }
                None => {
                    debug!("Ignoring line {} without a scheme", line_no);
                }
            },
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProxySettings, ShadowsocksSettings};
    use crate::utils::base64::base64_encode;

    fn registry() -> CodecRegistry {
        CodecRegistry::with_defaults()
    }

    const SS_LINK: &str = "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#node1";

    #[test]
    fn test_single_ss_link() {
        let result = parse_links(&registry(), SS_LINK);
        assert_eq!(result.proxies.len(), 1);
        let proxy = &result.proxies[0];
        assert_eq!(proxy.name, "node1");
        assert_eq!(proxy.server, "1.2.3.4");
        assert_eq!(proxy.port, 8388);
        assert_eq!(
            proxy.settings,
            ProxySettings::Shadowsocks(ShadowsocksSettings {
                cipher: Some("aes-256-gcm".to_string()),
                password: "pass".to_string(),
                ..Default::default()
            })
        );
        assert!(result.unsupported.is_empty());
    }

    #[test]
    fn test_unsupported_and_noise_lines() {
        let input = format!(
            "{}\r\nwireguard://foo\n\n# a comment\r\ntg://proxy?server=a&port=1\nhttps://example.com/sub?x=1",
            SS_LINK
        );
        let result = parse_links(&registry(), &input);
        assert_eq!(result.proxies.len(), 1);
        assert_eq!(result.unsupported, vec!["wireguard", "tg"]);
        assert!(result.malformed.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let content = format!("\u{feff}{}\r\n\u{feff}{}", SS_LINK, SS_LINK);
        let result = parse_links(&registry(), &content);
        assert_eq!(result.proxies.len(), 2);
        assert!(result.unsupported.is_empty());
        assert!(result.malformed.is_empty());
    }

    #[test]
    fn test_scheme_case_is_normalized() {
        let result = parse_links(&registry(), "SS://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#x");
        assert_eq!(result.proxies.len(), 1);
    }

    #[test]
    fn test_default_names_are_sequential() {
        let input = "socks5://1.1.1.1:1080\nsocks5://2.2.2.2:1080#named\nsocks5://3.3.3.3:1080";
        let names: Vec<String> = parse_links(&registry(), input)
            .proxies
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["defaultName_1", "named", "defaultName_2"]);
    }

    #[test]
    fn test_corrupt_line_does_not_abort_batch() {
        let input = format!("vmess://!!!corrupt!!!\n{}", SS_LINK);
        let result = parse_links(&registry(), &input);
        assert_eq!(result.proxies.len(), 1);
        assert_eq!(result.malformed.len(), 1);
        assert_eq!(result.malformed[0].line, 1);
        assert_eq!(result.malformed[0].scheme, "vmess");
        assert_eq!(result.malformed[0].error, DecodeError::InvalidBase64);
    }

    #[test]
    fn test_base64_subscription_body() {
        let body = base64_encode(&format!("{}\nsocks5://1.1.1.1:1080", SS_LINK));
        let result = parse_links(&registry(), &body);
        assert_eq!(result.proxies.len(), 2);
    }

    #[test]
    fn test_hysteria_variants_not_confused() {
        let input = "hysteria2://pw@a.com:443#two\nhysteria://b.com:443?auth=x#one";
        let types: Vec<ProxyType> = parse_links(&registry(), input)
            .proxies
            .iter()
            .map(|p| p.proxy_type())
            .collect();
        assert_eq!(types, vec![ProxyType::Hysteria2, ProxyType::Hysteria]);
    }
}
