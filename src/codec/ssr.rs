use serde_json::json;

use super::common::{clash_base, insert_opt, loon_line, loon_quote};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, Proxy, ProxySettings, ProxyType, ShadowsocksRSettings};
use crate::utils::base64::{base64_decode, url_safe_base64_encode};
use crate::utils::string::{non_empty, parse_port, strip_scheme};
use crate::utils::url::parse_query;

/// Cipher name used by Clash for "no cipher"; SSR links spell it `auto`.
const CLASH_NONE_CIPHER: &str = "dummy";
const LINK_NONE_CIPHER: &str = "auto";

pub struct ShadowsocksRCodec;

impl ShadowsocksRCodec {
    fn explode(payload: &str) -> Result<Proxy, DecodeError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(DecodeError::MissingField("server"));
        }

        // `b64(main)/b64(params)`: try every separator since standard base64
        // may itself contain `/`
        for (pos, _) in payload.match_indices('/') {
            let main = base64_decode(&payload[..pos]);
            let params = base64_decode(&payload[pos + 1..]);
            if let (Some(main), Some(params)) = (main, params) {
                let main = main.trim_end_matches('/');
                if let Ok(proxy) = parse_segments(main, Some(params.trim_start_matches('?'))) {
                    return Ok(proxy);
                }
            }
        }

        // `b64(main/?params)`
        let decoded = base64_decode(payload).ok_or(DecodeError::InvalidBase64)?;
        match decoded.split_once("/?") {
            Some((main, params)) => parse_segments(main, Some(params)),
            None => parse_segments(decoded.trim_end_matches('/'), None),
        }
    }
}

fn parse_segments(main: &str, params: Option<&str>) -> Result<Proxy, DecodeError> {
    // server may be an IPv6 literal, so split from the right
    let fields: Vec<&str> = main.rsplitn(6, ':').collect();
    if fields.len() != 6 {
        return Err(DecodeError::Malformed(format!(
            "expected 6 fields in SSR main segment, got {}",
            fields.len()
        )));
    }
    let (password_b64, obfs, cipher, protocol, port, server) =
        (fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]);

    if server.is_empty() {
        return Err(DecodeError::MissingField("server"));
    }
    let port = parse_port(port)?;
    let password = if password_b64.is_empty() {
        String::new()
    } else {
        base64_decode(password_b64).ok_or(DecodeError::InvalidBase64)?
    };
    let cipher = match cipher {
        LINK_NONE_CIPHER => CLASH_NONE_CIPHER.to_string(),
        other => other.to_string(),
    };

    let params = params.map(parse_query).unwrap_or_default();
    let param = |key: &str| {
        params
            .get(key)
            .filter(|v| !v.is_empty())
            .and_then(|v| base64_decode(v))
            .and_then(|v| non_empty(&v))
    };

    let settings = ShadowsocksRSettings {
        cipher,
        password,
        protocol: protocol.to_string(),
        protocol_param: param("protoparam"),
        obfs: obfs.to_string(),
        obfs_param: param("obfsparam"),
        group: param("group"),
        udp: None,
    };

    Ok(Proxy::new(
        param("remarks").unwrap_or_default(),
        server.trim_start_matches('[').trim_end_matches(']'),
        port,
        ProxySettings::ShadowsocksR(settings),
    ))
}

impl ProxyCodec for ShadowsocksRCodec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::ShadowsocksR
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["ssr"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        match strip_scheme(link, "ssr") {
            Some(body) => Self::explode(body).into(),
            None => DecodeOutcome::NotMatched,
        }
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let ssr = settings_of!(proxy, ShadowsocksR, ProxyType::ShadowsocksR);
        let cipher = match ssr.cipher.as_str() {
            CLASH_NONE_CIPHER => LINK_NONE_CIPHER,
            other => other,
        };
        let main = format!(
            "{}:{}:{}:{}:{}:{}/",
            proxy.server,
            proxy.port,
            ssr.protocol,
            cipher,
            ssr.obfs,
            url_safe_base64_encode(&ssr.password)
        );

        let mut params = Vec::new();
        if !proxy.has_default_name() {
            params.push(format!("remarks={}", url_safe_base64_encode(&proxy.name)));
        }
        let optional = [
            ("group", &ssr.group),
            ("protoparam", &ssr.protocol_param),
            ("obfsparam", &ssr.obfs_param),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push(format!("{}={}", key, url_safe_base64_encode(value)));
            }
        }

        let mut link = format!("ssr://{}", url_safe_base64_encode(&main));
        if !params.is_empty() {
            link.push('/');
            link.push_str(&url_safe_base64_encode(&params.join("&")));
        }
        Ok(link)
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let ssr = settings_of!(proxy, ShadowsocksR, ProxyType::ShadowsocksR);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "ssr");
                map.insert("cipher".into(), json!(ssr.cipher));
                map.insert("password".into(), json!(ssr.password));
                map.insert("protocol".into(), json!(ssr.protocol));
                map.insert("obfs".into(), json!(ssr.obfs));
                insert_opt(&mut map, "protocol-param", ssr.protocol_param.clone());
                insert_opt(&mut map, "obfs-param", ssr.obfs_param.clone());
                insert_opt(&mut map, "udp", ssr.udp);
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => Err(EncodeError::UnsupportedProtocol {
                proxy_type: ProxyType::ShadowsocksR,
                dialect,
            }),
            Dialect::Loon => {
                let mut parts = vec![
                    "ShadowsocksR".to_string(),
                    proxy.server.clone(),
                    proxy.port.to_string(),
                    ssr.cipher.clone(),
                    loon_quote(&ssr.password),
                    format!("protocol={}", ssr.protocol),
                ];
                if let Some(param) = &ssr.protocol_param {
                    parts.push(format!("protocol-param={}", param));
                }
                parts.push(format!("obfs={}", ssr.obfs));
                if let Some(param) = &ssr.obfs_param {
                    parts.push(format!("obfs-param={}", param));
                }
                if let Some(udp) = ssr.udp {
                    parts.push(format!("udp={}", udp));
                }
                Ok(ProxyEntry::Line(loon_line(&proxy.name, &parts)))
            }
        }
    }
}
