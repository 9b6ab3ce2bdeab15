use serde::{Deserialize, Serialize};
use serde_json::json;

use super::common::{
    clash_base, clash_tls, clash_transport, loon_line, loon_quote, loon_tls, loon_transport,
    singbox_base, singbox_tls, singbox_transport,
};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{
    Dialect, Proxy, ProxySettings, ProxyType, TlsOptions, TransportOptions, VMessSettings,
};
use crate::utils::base64::{base64_decode, base64_encode};
use crate::utils::de::deserialize_string_or_number;
use crate::utils::string::{non_empty, parse_port, strip_scheme};

/// The JSON object carried inside a `vmess://` link.
///
/// Numeric fields are written as strings and read back from either form.
#[derive(Debug, Default, Serialize, Deserialize)]
struct VMessLinkBody {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    v: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ps: Option<String>,
    #[serde(default)]
    add: String,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    port: Option<String>,
    #[serde(default)]
    id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    aid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    net: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    header_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tls: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sni: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alpn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fp: Option<String>,
}

pub struct VMessCodec;

impl VMessCodec {
    fn explode(body: &str) -> Result<Proxy, DecodeError> {
        let decoded = base64_decode(body).ok_or(DecodeError::InvalidBase64)?;
        let link: VMessLinkBody =
            serde_json::from_str(&decoded).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

        if link.add.is_empty() {
            return Err(DecodeError::MissingField("add"));
        }
        if link.id.is_empty() {
            return Err(DecodeError::MissingField("id"));
        }
        let port = parse_port(link.port.as_deref().ok_or(DecodeError::MissingField("port"))?)?;
        let alter_id = match link.aid.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(aid) => Some(
                aid.parse::<u32>()
                    .map_err(|_| DecodeError::Malformed(format!("invalid aid: {}", aid)))?,
            ),
            None => None,
        };

        let network = link.net.as_deref().and_then(non_empty);
        let mut transport = TransportOptions {
            network: network.clone(),
            host: link.host.as_deref().and_then(non_empty),
            path: link.path.as_deref().and_then(non_empty),
            service_name: None,
        };
        // gRPC service names travel in `path`
        if network.as_deref() == Some("grpc") {
            transport.service_name = transport.path.take();
        }

        let tls = TlsOptions {
            enabled: link.tls.as_deref().map(|t| t == "tls"),
            sni: link.sni.as_deref().and_then(non_empty),
            alpn: link
                .alpn
                .as_deref()
                .filter(|a| !a.is_empty())
                .map(|a| a.split(',').map(|s| s.trim().to_string()).collect()),
            client_fingerprint: link.fp.as_deref().and_then(non_empty),
            ..Default::default()
        };

        let settings = VMessSettings {
            uuid: link.id,
            alter_id,
            cipher: link.scy.as_deref().and_then(non_empty),
            udp: None,
            transport,
            tls,
        };

        Ok(Proxy::new(
            link.ps.unwrap_or_default(),
            link.add,
            port,
            ProxySettings::VMess(settings),
        ))
    }
}

impl ProxyCodec for VMessCodec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::VMess
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["vmess"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        match strip_scheme(link, "vmess") {
            Some(body) => Self::explode(body).into(),
            None => DecodeOutcome::NotMatched,
        }
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let vmess = settings_of!(proxy, VMess, ProxyType::VMess);
        let transport = &vmess.transport;
        let path = if transport.network.as_deref() == Some("grpc") {
            transport.service_name.clone()
        } else {
            transport.path.clone()
        };

        let body = VMessLinkBody {
            v: Some("2".to_string()),
            ps: (!proxy.has_default_name()).then(|| proxy.name.clone()),
            add: proxy.server.clone(),
            port: Some(proxy.port.to_string()),
            id: vmess.uuid.clone(),
            aid: vmess.alter_id.map(|a| a.to_string()),
            scy: vmess.cipher.clone(),
            net: transport.network.clone(),
            header_type: None,
            host: transport.host.clone(),
            path,
            tls: vmess
                .tls
                .enabled
                .map(|on| if on { "tls" } else { "" }.to_string()),
            sni: vmess.tls.sni.clone(),
            alpn: vmess.tls.alpn.as_ref().map(|a| a.join(",")),
            fp: vmess.tls.client_fingerprint.clone(),
        };

        // Serializing a plain struct of strings cannot fail
        let json = serde_json::to_string(&body).unwrap_or_default();
        Ok(format!("vmess://{}", base64_encode(&json)))
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let vmess = settings_of!(proxy, VMess, ProxyType::VMess);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "vmess");
                map.insert("uuid".into(), json!(vmess.uuid));
                map.insert("alterId".into(), json!(vmess.alter_id.unwrap_or(0)));
                map.insert(
                    "cipher".into(),
                    json!(vmess.cipher.as_deref().unwrap_or("auto")),
                );
                map.insert("udp".into(), json!(vmess.udp.unwrap_or(true)));
                clash_transport(&mut map, &vmess.transport, Some("tcp"));
                clash_tls(&mut map, &vmess.tls, "servername");
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => {
                let mut map = singbox_base(proxy, "vmess");
                map.insert("uuid".into(), json!(vmess.uuid));
                map.insert(
                    "security".into(),
                    json!(vmess.cipher.as_deref().unwrap_or("auto")),
                );
                map.insert("alter_id".into(), json!(vmess.alter_id.unwrap_or(0)));
                map.insert("packet_encoding".into(), json!("xudp"));
                if let Some(tls) = singbox_tls(&vmess.tls, false) {
                    map.insert("tls".into(), tls);
                }
                if let Some(transport) = singbox_transport(&vmess.transport) {
                    map.insert("transport".into(), transport);
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::Loon => {
                let mut parts = vec![
                    "vmess".to_string(),
                    proxy.server.clone(),
                    proxy.port.to_string(),
                    vmess.cipher.as_deref().unwrap_or("auto").to_string(),
                    loon_quote(&vmess.uuid),
                ];
                loon_transport(&mut parts, &vmess.transport);
                parts.push(format!("alterId={}", vmess.alter_id.unwrap_or(0)));
                loon_tls(&mut parts, &vmess.tls, "tls-name");
                Ok(ProxyEntry::Line(loon_line(&proxy.name, &parts)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> Proxy {
        Proxy::new(
            name,
            "v.example.com",
            443,
            ProxySettings::VMess(VMessSettings {
                uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
                alter_id: Some(0),
                cipher: Some("auto".to_string()),
                udp: None,
                transport: TransportOptions {
                    network: Some("ws".to_string()),
                    path: Some("/ray".to_string()),
                    host: Some("cdn.example.com".to_string()),
                    service_name: None,
                },
                tls: TlsOptions {
                    enabled: Some(true),
                    sni: Some("v.example.com".to_string()),
                    ..Default::default()
                },
            }),
        )
    }

    #[test]
    fn test_link_round_trip() {
        let proxy = node("JP 01");
        let link = VMessCodec.encode_link(&proxy).unwrap();
        assert_eq!(VMessCodec.decode(&link), DecodeOutcome::Decoded(proxy));
    }

    #[test]
    fn test_numeric_fields_encoded_as_strings() {
        let link = VMessCodec.encode_link(&node("n")).unwrap();
        let json = base64_decode(link.trim_start_matches("vmess://")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["port"], json!("443"));
        assert_eq!(value["aid"], json!("0"));
        assert_eq!(value["v"], json!("2"));
    }

    #[test]
    fn test_decode_numeric_port() {
        let json = r#"{"v":2,"ps":"num","add":"1.1.1.1","port":8080,"id":"abc","aid":64,"net":"tcp"}"#;
        let link = format!("vmess://{}", base64_encode(json));
        let DecodeOutcome::Decoded(proxy) = VMessCodec.decode(&link) else {
            panic!("numeric fields should decode");
        };
        assert_eq!(proxy.port, 8080);
        let ProxySettings::VMess(vmess) = proxy.settings else {
            unreachable!()
        };
        assert_eq!(vmess.alter_id, Some(64));
        assert_eq!(vmess.tls.enabled, None);
    }

    #[test]
    fn test_default_name_omitted() {
        let link = VMessCodec.encode_link(&node("defaultName_1")).unwrap();
        let json = base64_decode(link.trim_start_matches("vmess://")).unwrap();
        assert!(!json.contains("\"ps\""));
    }

    #[test]
    fn test_corrupt_payloads() {
        assert!(matches!(
            VMessCodec.decode("vmess://%%%"),
            DecodeOutcome::Malformed(DecodeError::InvalidBase64)
        ));
        let not_json = format!("vmess://{}", base64_encode("hello"));
        assert!(matches!(
            VMessCodec.decode(&not_json),
            DecodeOutcome::Malformed(DecodeError::InvalidJson(_))
        ));
        let no_port = format!("vmess://{}", base64_encode(r#"{"add":"a.com","id":"x"}"#));
        assert_eq!(
            VMessCodec.decode(&no_port),
            DecodeOutcome::Malformed(DecodeError::MissingField("port"))
        );
    }

    #[test]
    fn test_grpc_service_name_in_path() {
        let mut proxy = node("grpc");
        if let ProxySettings::VMess(vmess) = &mut proxy.settings {
            vmess.transport = TransportOptions {
                network: Some("grpc".to_string()),
                service_name: Some("svc".to_string()),
                ..Default::default()
            };
        }
        let link = VMessCodec.encode_link(&proxy).unwrap();
        assert_eq!(VMessCodec.decode(&link), DecodeOutcome::Decoded(proxy));
    }

    #[test]
    fn test_structured_defaults() {
        let mut proxy = node("n");
        if let ProxySettings::VMess(vmess) = &mut proxy.settings {
            vmess.alter_id = None;
            vmess.cipher = None;
            vmess.transport = TransportOptions::default();
            vmess.tls = TlsOptions::default();
        }
        let clash = VMessCodec.encode_structured(&proxy, Dialect::Clash).unwrap();
        let map = clash.as_object().unwrap();
        assert_eq!(map["alterId"], json!(0));
        assert_eq!(map["cipher"], json!("auto"));
        assert_eq!(map["network"], json!("tcp"));
        assert_eq!(map["udp"], json!(true));
        assert!(!map.contains_key("tls"));

        let singbox = VMessCodec.encode_structured(&proxy, Dialect::SingBox).unwrap();
        let map = singbox.as_object().unwrap();
        assert_eq!(map["security"], json!("auto"));
        assert_eq!(map["packet_encoding"], json!("xudp"));
        assert!(!map.contains_key("tls"));
        assert!(!map.contains_key("transport"));
    }

    #[test]
    fn test_singbox_nested_tls() {
        let entry = VMessCodec.encode_structured(&node("n"), Dialect::SingBox).unwrap();
        let map = entry.as_object().unwrap();
        assert_eq!(
            map["tls"],
            json!({ "enabled": true, "server_name": "v.example.com" })
        );
        assert_eq!(
            map["transport"],
            json!({ "type": "ws", "path": "/ray", "headers": { "Host": "cdn.example.com" } })
        );
    }
}
