use std::collections::HashMap;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::codec::ss::split_plugin;
use crate::models::{
    HttpSettings, Hysteria2Settings, HysteriaSettings, Proxy, ProxySettings, RealityOptions,
    ShadowsocksSettings, TlsOptions, TransportOptions, TrojanSettings, VMessSettings,
    VlessSettings,
};

#[derive(Debug, Default, Deserialize)]
struct SingBoxConfig {
    #[serde(default)]
    outbounds: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SingBoxTls {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub insecure: Option<bool>,
    #[serde(default)]
    pub alpn: Option<Vec<String>>,
    #[serde(default)]
    pub utls: Option<SingBoxUtls>,
    #[serde(default)]
    pub reality: Option<SingBoxReality>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SingBoxUtls {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SingBoxReality {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub short_id: Option<String>,
}

impl SingBoxTls {
    /// `explicit` keeps the `enabled` flag for protocols where TLS is optional.
    fn into_options(self, explicit: bool) -> TlsOptions {
        TlsOptions {
            enabled: explicit.then_some(self.enabled),
            sni: self.server_name.filter(|s| !s.is_empty()),
            skip_cert_verify: self.insecure,
            alpn: self.alpn.filter(|a| !a.is_empty()),
            client_fingerprint: self
                .utls
                .filter(|u| u.enabled)
                .and_then(|u| u.fingerprint),
            reality: self.reality.filter(|r| r.enabled).map(|r| RealityOptions {
                public_key: r.public_key,
                short_id: r.short_id,
            }),
        }
    }
}

fn tls_options(tls: Option<SingBoxTls>, explicit: bool) -> TlsOptions {
    tls.map(|t| t.into_options(explicit)).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SingBoxTransport {
    #[serde(rename = "type", default)]
    pub transport_type: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub host: Option<Vec<String>>,
    #[serde(default)]
    pub service_name: Option<String>,
}

impl SingBoxTransport {
    fn into_options(self) -> TransportOptions {
        let network = match self.transport_type.as_str() {
            "http" => "h2".to_string(),
            other => other.to_string(),
        };
        let host = self
            .headers
            .as_ref()
            .and_then(|h| {
                h.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("host"))
                    .map(|(_, v)| v.clone())
            })
            .or_else(|| self.host.and_then(|h| h.into_iter().next()));
        TransportOptions {
            network: Some(network).filter(|n| !n.is_empty()),
            path: self.path.filter(|p| !p.is_empty()),
            host,
            service_name: self.service_name.filter(|s| !s.is_empty()),
        }
    }
}

fn transport_options(transport: Option<SingBoxTransport>) -> TransportOptions {
    transport.map(SingBoxTransport::into_options).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SingBoxObfs {
    #[serde(rename = "type", default)]
    pub obfs_type: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// One sing-box outbound. Non-proxy outbounds fall into `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SingBoxOutbound {
    Shadowsocks {
        #[serde(default)]
        tag: String,
        server: String,
        server_port: u16,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        password: String,
        #[serde(default)]
        plugin: Option<String>,
        #[serde(default)]
        plugin_opts: Option<String>,
    },
    Vmess {
        #[serde(default)]
        tag: String,
        server: String,
        server_port: u16,
        uuid: String,
        #[serde(default)]
        security: Option<String>,
        #[serde(default)]
        alter_id: Option<u32>,
        #[serde(default)]
        tls: Option<SingBoxTls>,
        #[serde(default)]
        transport: Option<SingBoxTransport>,
    },
    Vless {
        #[serde(default)]
        tag: String,
        server: String,
        server_port: u16,
        uuid: String,
        #[serde(default)]
        flow: Option<String>,
        #[serde(default)]
        tls: Option<SingBoxTls>,
        #[serde(default)]
        transport: Option<SingBoxTransport>,
    },
    Trojan {
        #[serde(default)]
        tag: String,
        server: String,
        server_port: u16,
        #[serde(default)]
        password: String,
        #[serde(default)]
        tls: Option<SingBoxTls>,
        #[serde(default)]
        transport: Option<SingBoxTransport>,
    },
    Hysteria {
        #[serde(default)]
        tag: String,
        server: String,
        server_port: u16,
        #[serde(default)]
        auth_str: Option<String>,
        #[serde(default)]
        up_mbps: Option<u32>,
        #[serde(default)]
        down_mbps: Option<u32>,
        #[serde(default)]
        obfs: Option<String>,
        #[serde(default)]
        tls: Option<SingBoxTls>,
    },
    Hysteria2 {
        #[serde(default)]
        tag: String,
        server: String,
        server_port: u16,
        #[serde(default)]
        password: String,
        #[serde(default)]
        up_mbps: Option<u32>,
        #[serde(default)]
        down_mbps: Option<u32>,
        #[serde(default)]
        obfs: Option<SingBoxObfs>,
        #[serde(default)]
        tls: Option<SingBoxTls>,
    },
    Http {
        #[serde(default)]
        tag: String,
        server: String,
        server_port: u16,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        tls: Option<SingBoxTls>,
    },
    #[serde(other)]
    Other,
}

impl SingBoxOutbound {
    fn into_proxy(self) -> Option<Proxy> {
        let (tag, server, port, settings) = match self {
            SingBoxOutbound::Shadowsocks {
                tag,
                server,
                server_port,
                method,
                password,
                plugin,
                plugin_opts,
            } => {
                let mut ss = ShadowsocksSettings {
                    cipher: method.filter(|m| !m.is_empty()),
                    password,
                    ..Default::default()
                };
                if let Some(plugin) = plugin.filter(|p| !p.is_empty()) {
                    let spec = match plugin_opts.filter(|o| !o.is_empty()) {
                        Some(opts) => format!("{};{}", plugin, opts),
                        None => plugin,
                    };
                    let (name, opts) = split_plugin(&spec);
                    ss.plugin = Some(name);
                    ss.plugin_opts = opts;
                }
                (tag, server, server_port, ProxySettings::Shadowsocks(ss))
            }
            SingBoxOutbound::Vmess {
                tag,
                server,
                server_port,
                uuid,
                security,
                alter_id,
                tls,
                transport,
            } => (
                tag,
                server,
                server_port,
                ProxySettings::VMess(VMessSettings {
                    uuid,
                    alter_id,
                    cipher: security,
                    udp: None,
                    transport: transport_options(transport),
                    tls: tls_options(tls, true),
                }),
            ),
            SingBoxOutbound::Vless {
                tag,
                server,
                server_port,
                uuid,
                flow,
                tls,
                transport,
            } => (
                tag,
                server,
                server_port,
                ProxySettings::Vless(VlessSettings {
                    uuid,
                    flow: flow.filter(|f| !f.is_empty()),
                    udp: None,
                    transport: transport_options(transport),
                    tls: tls_options(tls, true),
                }),
            ),
            SingBoxOutbound::Trojan {
                tag,
                server,
                server_port,
                password,
                tls,
                transport,
            } => (
                tag,
                server,
                server_port,
                ProxySettings::Trojan(TrojanSettings {
                    password,
                    udp: None,
                    transport: transport_options(transport),
                    tls: tls_options(tls, false),
                }),
            ),
            SingBoxOutbound::Hysteria {
                tag,
                server,
                server_port,
                auth_str,
                up_mbps,
                down_mbps,
                obfs,
                tls,
            } => (
                tag,
                server,
                server_port,
                ProxySettings::Hysteria(HysteriaSettings {
                    auth_str,
                    protocol: None,
                    up: up_mbps,
                    down: down_mbps,
                    obfs,
                    tls: tls_options(tls, false),
                }),
            ),
            SingBoxOutbound::Hysteria2 {
                tag,
                server,
                server_port,
                password,
                up_mbps,
                down_mbps,
                obfs,
                tls,
            } => {
                let obfs = obfs.unwrap_or_default();
                (
                    tag,
                    server,
                    server_port,
                    ProxySettings::Hysteria2(Hysteria2Settings {
                        password,
                        obfs: obfs.obfs_type,
                        obfs_password: obfs.password,
                        up: up_mbps,
                        down: down_mbps,
                        tls: tls_options(tls, false),
                    }),
                )
            }
            SingBoxOutbound::Http {
                tag,
                server,
                server_port,
                username,
                password,
                tls,
            } => (
                tag,
                server,
                server_port,
                ProxySettings::Http(HttpSettings {
                    username,
                    password,
                    tls: tls_options(tls, true),
                }),
            ),
            SingBoxOutbound::Other => return None,
        };

        if server.is_empty() || port == 0 {
            return None;
        }
        Some(Proxy::new(tag, server, port, settings))
    }
}

/// Extract proxy nodes from a sing-box JSON configuration.
///
/// Only `outbounds` is read; selector, urltest, direct, block, dns and any
/// other non-proxy outbound is skipped, as is SOCKS.
pub fn parse_singbox_json(content: &str) -> Vec<Proxy> {
    let config: SingBoxConfig = match serde_json::from_str(content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse sing-box JSON: {}", e);
            return Vec::new();
        }
    };

    config
        .outbounds
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let kind = value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match serde_json::from_value::<SingBoxOutbound>(value) {
                Ok(outbound) => {
                    let proxy = outbound.into_proxy();
                    if proxy.is_none() {
                        debug!("Skipping outbound #{} of type '{}'", index + 1, kind);
                    }
                    proxy
                }
                Err(e) => {
                    debug!("Skipping outbound #{} ({}): {}", index + 1, kind, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;

    const CONFIG: &str = r#"{
      "log": {"level": "info"},
      "outbounds": [
        {"type": "selector", "tag": "Proxy", "outbounds": ["ss-1", "vless-1"]},
        {"type": "shadowsocks", "tag": "ss-1", "server": "1.2.3.4", "server_port": 8388,
         "method": "aes-128-gcm", "password": "pw",
         "plugin": "obfs-local", "plugin_opts": "obfs=http;obfs-host=bing.com"},
        {"type": "vless", "tag": "vless-1", "server": "v.example.com", "server_port": 443,
         "uuid": "uuid-1", "flow": "xtls-rprx-vision",
         "tls": {"enabled": true, "server_name": "www.microsoft.com",
                 "utls": {"enabled": true, "fingerprint": "chrome"},
                 "reality": {"enabled": true, "public_key": "pk", "short_id": "sid"}}},
        {"type": "socks", "tag": "local", "server": "127.0.0.1", "server_port": 1080},
        {"type": "hysteria2", "tag": "hy2", "server": "h.example.com", "server_port": 443,
         "password": "pw", "obfs": {"type": "salamander", "password": "o"},
         "tls": {"enabled": true, "server_name": "h.example.com"}},
        {"type": "vmess", "tag": "ws", "server": "w.example.com", "server_port": 443,
         "uuid": "uuid-2", "security": "auto",
         "transport": {"type": "ws", "path": "/ray", "headers": {"Host": "cdn.example.com"}}},
        {"type": "direct", "tag": "direct"},
        {"type": "dns", "tag": "dns-out"}
      ],
      "route": {"final": "Proxy"}
    }"#;

    #[test]
    fn test_parse_outbounds() {
        let proxies = parse_singbox_json(CONFIG);
        let types: Vec<ProxyType> = proxies.iter().map(|p| p.proxy_type()).collect();
        assert_eq!(
            types,
            vec![
                ProxyType::Shadowsocks,
                ProxyType::Vless,
                ProxyType::Hysteria2,
                ProxyType::VMess
            ]
        );

        let ProxySettings::Shadowsocks(ss) = &proxies[0].settings else {
            unreachable!()
        };
        assert_eq!(ss.plugin.as_deref(), Some("obfs-local"));
        assert_eq!(ss.plugin_opts.len(), 2);

        let ProxySettings::Vless(vless) = &proxies[1].settings else {
            unreachable!()
        };
        assert_eq!(vless.tls.client_fingerprint.as_deref(), Some("chrome"));
        assert_eq!(
            vless.tls.reality,
            Some(RealityOptions {
                public_key: "pk".to_string(),
                short_id: Some("sid".to_string()),
            })
        );

        let ProxySettings::VMess(vmess) = &proxies[3].settings else {
            unreachable!()
        };
        assert_eq!(vmess.transport.host.as_deref(), Some("cdn.example.com"));
        assert_eq!(vmess.tls, TlsOptions::default());
    }

    #[test]
    fn test_invalid_json_yields_nothing() {
        assert!(parse_singbox_json("{not json").is_empty());
        assert!(parse_singbox_json(r#"{"route": {}}"#).is_empty());
    }
}
