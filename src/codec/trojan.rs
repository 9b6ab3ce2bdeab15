use serde_json::json;

use super::common::{
    clash_base, clash_tls, clash_transport, link_fragment, loon_line, loon_quote, loon_tls,
    loon_transport, parse_uri, push_tls_query, push_transport_query, read_tls_query,
    read_transport_query, singbox_base, singbox_tls, singbox_transport,
};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, Proxy, ProxySettings, ProxyType, TrojanSettings};
use crate::utils::string::format_host;
use crate::utils::url::{build_query, url_encode};

pub struct TrojanCodec;

impl TrojanCodec {
    fn explode(link: &str) -> Result<Proxy, DecodeError> {
        let uri = parse_uri(link)?;
        let password = match uri.password {
            // `user:pass@` is not trojan syntax, but keep the whole secret
            Some(rest) => format!("{}:{}", uri.user, rest),
            None => uri.user,
        };
        if password.is_empty() {
            return Err(DecodeError::MissingField("password"));
        }

        let settings = TrojanSettings {
            password,
            udp: None,
            transport: read_transport_query(&uri.params),
            tls: read_tls_query(&uri.params),
        };
        Ok(Proxy::new(
            uri.name,
            uri.server,
            uri.port,
            ProxySettings::Trojan(settings),
        ))
    }
}

impl ProxyCodec for TrojanCodec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::Trojan
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["trojan"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        if !link.starts_with("trojan://") {
            return DecodeOutcome::NotMatched;
        }
        Self::explode(link).into()
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let trojan = settings_of!(proxy, Trojan, ProxyType::Trojan);

        let mut params = Vec::new();
        push_tls_query(&mut params, &trojan.tls);
        push_transport_query(&mut params, &trojan.transport);

        let mut link = format!(
            "trojan://{}@{}:{}",
            url_encode(&trojan.password),
            format_host(&proxy.server),
            proxy.port
        );
        if !params.is_empty() {
            link.push('?');
            link.push_str(&build_query(&params));
        }
        link.push_str(&link_fragment(proxy));
        Ok(link)
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let trojan = settings_of!(proxy, Trojan, ProxyType::Trojan);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "trojan");
                map.insert("password".into(), json!(trojan.password));
                map.insert("udp".into(), json!(trojan.udp.unwrap_or(true)));
                clash_tls(&mut map, &trojan.tls, "sni");
                clash_transport(&mut map, &trojan.transport, None);
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => {
                let mut map = singbox_base(proxy, "trojan");
                map.insert("password".into(), json!(trojan.password));
                if let Some(tls) = singbox_tls(&trojan.tls, true) {
                    map.insert("tls".into(), tls);
                }
                if let Some(transport) = singbox_transport(&trojan.transport) {
                    map.insert("transport".into(), transport);
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::Loon => {
                let mut parts = vec![
                    "trojan".to_string(),
                    proxy.server.clone(),
                    proxy.port.to_string(),
                    loon_quote(&trojan.password),
                ];
                if trojan.transport.network.is_some() {
                    loon_transport(&mut parts, &trojan.transport);
                }
                loon_tls(&mut parts, &trojan.tls, "tls-name");
                if let Some(udp) = trojan.udp {
                    parts.push(format!("udp={}", udp));
                }
                Ok(ProxyEntry::Line(loon_line(&proxy.name, &parts)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TlsOptions, TransportOptions};

    fn node(name: &str) -> Proxy {
        Proxy::new(
            name,
            "t.example.com",
            443,
            ProxySettings::Trojan(TrojanSettings {
                password: "pa ss#word".to_string(),
                udp: None,
                transport: TransportOptions::default(),
                tls: TlsOptions {
                    sni: Some("sni.example.com".to_string()),
                    skip_cert_verify: Some(true),
                    alpn: Some(vec!["h2".to_string()]),
                    ..Default::default()
                },
            }),
        )
    }

    #[test]
    fn test_link_round_trip() {
        let proxy = node("Trojan 1");
        let link = TrojanCodec.encode_link(&proxy).unwrap();
        assert!(link.contains("allowInsecure=1"));
        assert_eq!(TrojanCodec.decode(&link), DecodeOutcome::Decoded(proxy));
    }

    #[test]
    fn test_decode_peer_alias_and_ws() {
        let link = "trojan://secret@1.2.3.4:8443?peer=a.com&type=ws&path=%2Fws&host=cdn.a.com#ws";
        let DecodeOutcome::Decoded(proxy) = TrojanCodec.decode(link) else {
            panic!("link should decode");
        };
        let ProxySettings::Trojan(trojan) = proxy.settings else {
            unreachable!()
        };
        assert_eq!(trojan.tls.sni.as_deref(), Some("a.com"));
        assert_eq!(trojan.transport.network.as_deref(), Some("ws"));
        assert_eq!(trojan.transport.path.as_deref(), Some("/ws"));
        assert_eq!(trojan.transport.host.as_deref(), Some("cdn.a.com"));
    }

    #[test]
    fn test_missing_port_is_malformed() {
        assert!(matches!(
            TrojanCodec.decode("trojan://secret@1.2.3.4"),
            DecodeOutcome::Malformed(DecodeError::MissingField("port"))
        ));
    }

    #[test]
    fn test_structured() {
        let clash = TrojanCodec.encode_structured(&node("n"), Dialect::Clash).unwrap();
        let map = clash.as_object().unwrap();
        assert_eq!(map["sni"], json!("sni.example.com"));
        assert_eq!(map["udp"], json!(true));
        assert!(!map.contains_key("network"));

        let singbox = TrojanCodec.encode_structured(&node("n"), Dialect::SingBox).unwrap();
        assert_eq!(
            singbox.as_object().unwrap()["tls"],
            json!({
                "enabled": true,
                "server_name": "sni.example.com",
                "insecure": true,
                "alpn": ["h2"]
            })
        );
    }
}
