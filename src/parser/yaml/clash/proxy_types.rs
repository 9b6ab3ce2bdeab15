use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::{RealityOptions, TlsOptions, TransportOptions};
use crate::utils::de::deserialize_string_or_number;

/// TLS keys shared by the TLS-capable Clash proxy types.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashTlsFields {
    #[serde(default)]
    pub tls: Option<bool>,
    #[serde(default)]
    pub servername: Option<String>,
    #[serde(default)]
    pub sni: Option<String>,
    #[serde(default)]
    pub skip_cert_verify: Option<bool>,
    #[serde(default)]
    pub alpn: Option<Vec<String>>,
    #[serde(default, alias = "fingerprint")]
    pub client_fingerprint: Option<String>,
    #[serde(default)]
    pub reality_opts: Option<ClashRealityOpts>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashRealityOpts {
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub short_id: Option<String>,
}

impl ClashTlsFields {
    pub fn into_options(self) -> TlsOptions {
        TlsOptions {
            enabled: self.tls,
            sni: self.servername.or(self.sni).filter(|s| !s.is_empty()),
            skip_cert_verify: self.skip_cert_verify,
            alpn: self.alpn.filter(|a| !a.is_empty()),
            client_fingerprint: self.client_fingerprint.filter(|f| !f.is_empty()),
            reality: self.reality_opts.map(|r| RealityOptions {
                public_key: r.public_key,
                short_id: r.short_id,
            }),
        }
    }
}

/// `network` plus the per-transport option blocks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashTransportFields {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub ws_opts: Option<ClashWsOpts>,
    #[serde(default)]
    pub grpc_opts: Option<ClashGrpcOpts>,
    #[serde(default)]
    pub h2_opts: Option<ClashH2Opts>,
    // Legacy flat ws keys
    #[serde(default)]
    pub ws_path: Option<String>,
    #[serde(default)]
    pub ws_headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClashWsOpts {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashGrpcOpts {
    #[serde(default)]
    pub grpc_service_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClashH2Opts {
    #[serde(default)]
    pub host: Option<Vec<String>>,
    #[serde(default)]
    pub path: Option<String>,
}

fn host_header(headers: &HashMap<String, String>) -> Option<String> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("host"))
        .map(|(_, v)| v.clone())
}

impl ClashTransportFields {
    pub fn into_options(self) -> TransportOptions {
        let mut transport = TransportOptions {
            network: self.network.filter(|n| !n.is_empty()),
            ..Default::default()
        };
        match transport.network.as_deref() {
            Some("ws") => {
                let opts = self.ws_opts.unwrap_or_default();
                transport.path = opts.path.or(self.ws_path);
                transport.host = opts
                    .headers
                    .or(self.ws_headers)
                    .as_ref()
                    .and_then(host_header);
            }
            Some("grpc") => {
                transport.service_name = self.grpc_opts.and_then(|o| o.grpc_service_name);
            }
            Some("h2") => {
                if let Some(opts) = self.h2_opts {
                    transport.host = opts.host.and_then(|h| h.into_iter().next());
                    transport.path = opts.path;
                }
            }
            _ => {}
        }
        transport
    }
}

/// One entry of a Clash `proxies:` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClashProxyYamlInput {
    #[serde(rename = "ss")]
    Shadowsocks {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        #[serde(default)]
        cipher: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        password: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
        #[serde(default)]
        plugin: Option<String>,
        #[serde(rename = "plugin-opts", default)]
        plugin_opts: Option<Map<String, Value>>,
    },

    #[serde(rename = "ssr")]
    ShadowsocksR {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        cipher: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        password: Option<String>,
        protocol: String,
        obfs: String,
        #[serde(rename = "protocol-param", alias = "protocolparam", default)]
        protocol_param: Option<String>,
        #[serde(rename = "obfs-param", alias = "obfsparam", default)]
        obfs_param: Option<String>,
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(rename = "vmess")]
    VMess {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        uuid: String,
        #[serde(rename = "alterId", default, deserialize_with = "deserialize_string_or_number")]
        alter_id: Option<String>,
        #[serde(default)]
        cipher: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
        #[serde(flatten)]
        tls: ClashTlsFields,
        #[serde(flatten)]
        transport: ClashTransportFields,
    },

    #[serde(rename = "vless")]
    Vless {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        uuid: String,
        #[serde(default)]
        flow: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
        #[serde(flatten)]
        tls: ClashTlsFields,
        #[serde(flatten)]
        transport: ClashTransportFields,
    },

    #[serde(rename = "trojan")]
    Trojan {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        password: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
        #[serde(flatten)]
        tls: ClashTlsFields,
        #[serde(flatten)]
        transport: ClashTransportFields,
    },

    #[serde(rename = "hysteria")]
    Hysteria {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        #[serde(rename = "auth-str", alias = "auth_str", alias = "auth", default)]
        auth_str: Option<String>,
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        up: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        down: Option<String>,
        #[serde(default)]
        obfs: Option<String>,
        #[serde(flatten)]
        tls: ClashTlsFields,
    },

    #[serde(rename = "hysteria2", alias = "hy2")]
    Hysteria2 {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        #[serde(default, alias = "auth", deserialize_with = "deserialize_string_or_number")]
        password: Option<String>,
        #[serde(default)]
        obfs: Option<String>,
        #[serde(rename = "obfs-password", default)]
        obfs_password: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        up: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        down: Option<String>,
        #[serde(flatten)]
        tls: ClashTlsFields,
    },

    #[serde(rename = "http")]
    Http {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        username: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        password: Option<String>,
        #[serde(flatten)]
        tls: ClashTlsFields,
    },

    #[serde(rename = "socks5")]
    Socks5 {
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        name: Option<String>,
        server: String,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        port: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        username: Option<String>,
        #[serde(default, deserialize_with = "deserialize_string_or_number")]
        password: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(other)]
    Unknown,
}
