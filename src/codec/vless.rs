use serde_json::json;

use super::common::{
    clash_base, clash_tls, clash_transport, insert_opt, link_fragment, loon_line, loon_quote,
    loon_tls, loon_transport, parse_uri, push_tls_query, push_transport_query, read_tls_query,
    read_transport_query, singbox_base, singbox_tls, singbox_transport,
};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, Proxy, ProxySettings, ProxyType, VlessSettings};
use crate::utils::string::{format_host, non_empty};
use crate::utils::url::{build_query, url_encode};

pub struct VlessCodec;

impl VlessCodec {
    fn explode(link: &str) -> Result<Proxy, DecodeError> {
        let uri = parse_uri(link)?;
        if uri.user.is_empty() {
            return Err(DecodeError::MissingField("uuid"));
        }

        let settings = VlessSettings {
            uuid: uri.user,
            flow: uri.params.get("flow").and_then(|f| non_empty(f)),
            udp: None,
            transport: read_transport_query(&uri.params),
            tls: read_tls_query(&uri.params),
        };
        Ok(Proxy::new(
            uri.name,
            uri.server,
            uri.port,
            ProxySettings::Vless(settings),
        ))
    }
}

impl ProxyCodec for VlessCodec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::Vless
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["vless"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        if !link.starts_with("vless://") {
            return DecodeOutcome::NotMatched;
        }
        Self::explode(link).into()
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let vless = settings_of!(proxy, Vless, ProxyType::Vless);

        let mut params = vec![("encryption", "none".to_string())];
        if let Some(flow) = &vless.flow {
            params.push(("flow", flow.clone()));
        }
        push_tls_query(&mut params, &vless.tls);
        push_transport_query(&mut params, &vless.transport);

        Ok(format!(
            "vless://{}@{}:{}?{}{}",
            url_encode(&vless.uuid),
            format_host(&proxy.server),
            proxy.port,
            build_query(&params),
            link_fragment(proxy)
        ))
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let vless = settings_of!(proxy, Vless, ProxyType::Vless);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "vless");
                map.insert("uuid".into(), json!(vless.uuid));
                insert_opt(&mut map, "flow", vless.flow.clone());
                insert_opt(&mut map, "udp", vless.udp);
                clash_transport(&mut map, &vless.transport, Some("tcp"));
                clash_tls(&mut map, &vless.tls, "servername");
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => {
                let mut map = singbox_base(proxy, "vless");
                map.insert("uuid".into(), json!(vless.uuid));
                insert_opt(&mut map, "flow", vless.flow.clone());
                if let Some(tls) = singbox_tls(&vless.tls, false) {
                    map.insert("tls".into(), tls);
                }
                if let Some(transport) = singbox_transport(&vless.transport) {
                    map.insert("transport".into(), transport);
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::Loon => {
                let mut parts = vec![
                    "VLESS".to_string(),
                    proxy.server.clone(),
                    proxy.port.to_string(),
                    loon_quote(&vless.uuid),
                ];
                loon_transport(&mut parts, &vless.transport);
                if let Some(flow) = &vless.flow {
                    parts.push(format!("flow={}", flow));
                }
                loon_tls(&mut parts, &vless.tls, "tls-name");
                if let Some(udp) = vless.udp {
                    parts.push(format!("udp={}", udp));
                }
                Ok(ProxyEntry::Line(loon_line(&proxy.name, &parts)))
            }
        }
    }
}
