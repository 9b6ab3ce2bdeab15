use serde_json::{json, Map, Value};

use super::common::{
    clash_base, clash_tls, insert_opt, link_fragment, loon_line, loon_quote, loon_tls, parse_uri,
    read_tls_query, singbox_base, singbox_tls,
};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, Hysteria2Settings, Proxy, ProxySettings, ProxyType};
use crate::utils::de::parse_leading_u32;
use crate::utils::string::{format_host, non_empty};
use crate::utils::url::{build_query, url_encode};

pub struct Hysteria2Codec;

impl Hysteria2Codec {
    fn explode(link: &str) -> Result<Proxy, DecodeError> {
        let uri = parse_uri(link)?;
        let password = match &uri.password {
            Some(rest) => format!("{}:{}", uri.user, rest),
            None => uri.user.clone(),
        };

        let params = &uri.params;
        let get = |key: &str| params.get(key).and_then(|v| non_empty(v));
        let mut tls = read_tls_query(params);
        // Hysteria2 is always TLS; there is no `security` switch
        tls.enabled = None;
        tls.reality = None;

        let settings = Hysteria2Settings {
            password,
            obfs: get("obfs"),
            obfs_password: get("obfs-password"),
            up: get("upmbps").and_then(|v| parse_leading_u32(&v)),
            down: get("downmbps").and_then(|v| parse_leading_u32(&v)),
            tls,
        };
        Ok(Proxy::new(
            uri.name,
            uri.server,
            uri.port,
            ProxySettings::Hysteria2(settings),
        ))
    }
}

impl ProxyCodec for Hysteria2Codec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::Hysteria2
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["hysteria2", "hy2"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        if let Some(rest) = link.strip_prefix("hy2://") {
            return Self::explode(&format!("hysteria2://{}", rest)).into();
        }
        if !link.starts_with("hysteria2://") {
            return DecodeOutcome::NotMatched;
        }
        Self::explode(link).into()
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let hy2 = settings_of!(proxy, Hysteria2, ProxyType::Hysteria2);

        let mut params = Vec::new();
        if let Some(obfs) = &hy2.obfs {
            params.push(("obfs", obfs.clone()));
        }
        if let Some(obfs_password) = &hy2.obfs_password {
            params.push(("obfs-password", obfs_password.clone()));
        }
        if let Some(sni) = &hy2.tls.sni {
            params.push(("sni", sni.clone()));
        }
        if let Some(insecure) = hy2.tls.skip_cert_verify {
            params.push(("insecure", if insecure { "1" } else { "0" }.to_string()));
        }
        if let Some(alpn) = &hy2.tls.alpn {
            params.push(("alpn", alpn.join(",")));
        }
        if let Some(fp) = &hy2.tls.client_fingerprint {
            params.push(("fp", fp.clone()));
        }
        if let Some(up) = hy2.up {
            params.push(("upmbps", up.to_string()));
        }
        if let Some(down) = hy2.down {
            params.push(("downmbps", down.to_string()));
        }

        let mut link = format!(
            "hysteria2://{}@{}:{}",
            url_encode(&hy2.password),
            format_host(&proxy.server),
            proxy.port
        );
        if !params.is_empty() {
            link.push_str("/?");
            link.push_str(&build_query(&params));
        }
        link.push_str(&link_fragment(proxy));
        Ok(link)
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let hy2 = settings_of!(proxy, Hysteria2, ProxyType::Hysteria2);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "hysteria2");
                map.insert("password".into(), json!(hy2.password));
                insert_opt(&mut map, "obfs", hy2.obfs.clone());
                insert_opt(&mut map, "obfs-password", hy2.obfs_password.clone());
                insert_opt(&mut map, "up", hy2.up);
                insert_opt(&mut map, "down", hy2.down);
                clash_tls(&mut map, &hy2.tls, "sni");
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => {
                let mut map = singbox_base(proxy, "hysteria2");
                map.insert("password".into(), json!(hy2.password));
                insert_opt(&mut map, "up_mbps", hy2.up);
                insert_opt(&mut map, "down_mbps", hy2.down);
                if let Some(obfs) = &hy2.obfs {
                    let mut obj = Map::new();
                    obj.insert("type".into(), json!(obfs));
                    insert_opt(&mut obj, "password", hy2.obfs_password.clone());
                    map.insert("obfs".into(), Value::Object(obj));
                }
                if let Some(tls) = singbox_tls(&hy2.tls, true) {
                    map.insert("tls".into(), tls);
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::Loon => {
                let mut parts = vec![
                    "Hysteria2".to_string(),
                    proxy.server.clone(),
                    proxy.port.to_string(),
                    loon_quote(&hy2.password),
                ];
                loon_tls(&mut parts, &hy2.tls, "sni");
                if let Some(down) = hy2.down {
                    parts.push(format!("download-bandwidth={}", down));
                }
                if let Some(obfs_password) = &hy2.obfs_password {
                    parts.push(format!("salamander-password={}", obfs_password));
                }
                Ok(ProxyEntry::Line(loon_line(&proxy.name, &parts)))
            }
        }
    }
}
