use serde_json::json;

use super::common::{clash_base, insert_opt, link_fragment, parse_uri, singbox_base, singbox_tls};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, HysteriaSettings, Proxy, ProxySettings, ProxyType, TlsOptions};
use crate::utils::de::parse_leading_u32;
use crate::utils::string::{format_host, non_empty};
use crate::utils::url::{build_query, is_truthy};

const DEFAULT_UP_MBPS: u32 = 10;
const DEFAULT_DOWN_MBPS: u32 = 50;

pub struct HysteriaCodec;

impl HysteriaCodec {
    fn explode(link: &str) -> Result<Proxy, DecodeError> {
        let uri = parse_uri(link)?;
        let params = &uri.params;
        let get = |key: &str| params.get(key).and_then(|v| non_empty(v));

        let tls = TlsOptions {
            sni: get("peer").or_else(|| get("sni")),
            skip_cert_verify: params.get("insecure").map(|v| is_truthy(v)),
            alpn: get("alpn").map(|a| a.split(',').map(|s| s.trim().to_string()).collect()),
            ..Default::default()
        };

        let settings = HysteriaSettings {
            auth_str: get("auth").or_else(|| non_empty(&uri.user)),
            protocol: get("protocol"),
            up: get("upmbps").and_then(|v| parse_leading_u32(&v)),
            down: get("downmbps").and_then(|v| parse_leading_u32(&v)),
            obfs: get("obfsParam"),
            tls,
        };
        Ok(Proxy::new(
            uri.name,
            uri.server,
            uri.port,
            ProxySettings::Hysteria(settings),
        ))
    }
}

impl ProxyCodec for HysteriaCodec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::Hysteria
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["hysteria"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        if !link.starts_with("hysteria://") {
            return DecodeOutcome::NotMatched;
        }
        Self::explode(link).into()
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let hy = settings_of!(proxy, Hysteria, ProxyType::Hysteria);

        let mut params = Vec::new();
        if let Some(protocol) = &hy.protocol {
            params.push(("protocol", protocol.clone()));
        }
        if let Some(auth) = &hy.auth_str {
            params.push(("auth", auth.clone()));
        }
        if let Some(sni) = &hy.tls.sni {
            params.push(("peer", sni.clone()));
        }
        if let Some(insecure) = hy.tls.skip_cert_verify {
            params.push(("insecure", if insecure { "1" } else { "0" }.to_string()));
        }
        if let Some(up) = hy.up {
            params.push(("upmbps", up.to_string()));
        }
        if let Some(down) = hy.down {
            params.push(("downmbps", down.to_string()));
        }
        if let Some(alpn) = &hy.tls.alpn {
            params.push(("alpn", alpn.join(",")));
        }
        if let Some(obfs) = &hy.obfs {
            params.push(("obfs", "xplus".to_string()));
            params.push(("obfsParam", obfs.clone()));
        }

        let mut link = format!("hysteria://{}:{}", format_host(&proxy.server), proxy.port);
        if !params.is_empty() {
            link.push('?');
            link.push_str(&build_query(&params));
        }
        link.push_str(&link_fragment(proxy));
        Ok(link)
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let hy = settings_of!(proxy, Hysteria, ProxyType::Hysteria);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "hysteria");
                insert_opt(&mut map, "auth-str", hy.auth_str.clone());
                map.insert(
                    "protocol".into(),
                    json!(hy.protocol.as_deref().unwrap_or("udp")),
                );
                map.insert("up".into(), json!(hy.up.unwrap_or(DEFAULT_UP_MBPS)));
                map.insert("down".into(), json!(hy.down.unwrap_or(DEFAULT_DOWN_MBPS)));
                insert_opt(&mut map, "obfs", hy.obfs.clone());
                insert_opt(&mut map, "sni", hy.tls.sni.clone());
                map.insert(
                    "skip-cert-verify".into(),
                    json!(hy.tls.skip_cert_verify.unwrap_or(false)),
                );
                map.insert(
                    "alpn".into(),
                    json!(hy.tls.alpn.clone().unwrap_or_else(|| vec!["h3".to_string()])),
                );
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => {
                let mut map = singbox_base(proxy, "hysteria");
                map.insert("up_mbps".into(), json!(hy.up.unwrap_or(DEFAULT_UP_MBPS)));
                map.insert(
                    "down_mbps".into(),
                    json!(hy.down.unwrap_or(DEFAULT_DOWN_MBPS)),
                );
                insert_opt(&mut map, "auth_str", hy.auth_str.clone());
                insert_opt(&mut map, "obfs", hy.obfs.clone());
                if let Some(tls) = singbox_tls(&hy.tls, true) {
                    map.insert("tls".into(), tls);
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::Loon => Err(EncodeError::UnsupportedProtocol {
                proxy_type: ProxyType::Hysteria,
                dialect,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> Proxy {
        Proxy::new(
            name,
            "hy.example.com",
            36712,
            ProxySettings::Hysteria(HysteriaSettings {
                auth_str: Some("token".to_string()),
                protocol: Some("udp".to_string()),
                up: Some(20),
                down: Some(100),
                obfs: Some("xplus-secret".to_string()),
                tls: TlsOptions {
                    sni: Some("hy.example.com".to_string()),
                    skip_cert_verify: Some(false),
                    alpn: Some(vec!["h3".to_string()]),
                    ..Default::default()
                },
            }),
        )
    }

    #[test]
    fn test_link_round_trip() {
        let proxy = node("HY");
        let link = HysteriaCodec.encode_link(&proxy).unwrap();
        assert_eq!(HysteriaCodec.decode(&link), DecodeOutcome::Decoded(proxy));
    }

    #[test]
    fn test_does_not_claim_hysteria2() {
        assert_eq!(
            HysteriaCodec.decode("hysteria2://pw@a.com:443"),
            DecodeOutcome::NotMatched
        );
    }

    #[test]
    fn test_clash_defaults() {
        let proxy = Proxy::new(
            "bare",
            "a.com",
            443,
            ProxySettings::Hysteria(HysteriaSettings::default()),
        );
        let entry = HysteriaCodec.encode_structured(&proxy, Dialect::Clash).unwrap();
        let map = entry.as_object().unwrap();
        assert_eq!(map["protocol"], json!("udp"));
        assert_eq!(map["up"], json!(10));
        assert_eq!(map["down"], json!(50));
        assert_eq!(map["alpn"], json!(["h3"]));
        assert_eq!(map["skip-cert-verify"], json!(false));

        let singbox = HysteriaCodec.encode_structured(&proxy, Dialect::SingBox).unwrap();
        let map = singbox.as_object().unwrap();
        assert_eq!(map["up_mbps"], json!(10));
        assert_eq!(map["down_mbps"], json!(50));
        assert_eq!(map["tls"], json!({ "enabled": true }));
    }

    #[test]
    fn test_explicit_values_win_over_defaults() {
        let entry = HysteriaCodec.encode_structured(&node("n"), Dialect::Clash).unwrap();
        let map = entry.as_object().unwrap();
        assert_eq!(map["up"], json!(20));
        assert_eq!(map["down"], json!(100));
    }
}
