//! Proxy model definitions
//!
//! Contains the normalized representation of a single proxy endpoint. Every
//! parser produces [`Proxy`] values and every generator consumes them.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix used for names generated when a link carries no label.
pub const DEFAULT_NAME_PREFIX: &str = "defaultName_";

static DEFAULT_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^defaultName_\d+$").expect("static regex"));

/// Build the synthetic name for the `index`-th unnamed node (1-based).
pub fn default_name(index: usize) -> String {
    format!("{}{}", DEFAULT_NAME_PREFIX, index)
}

/// Whether `name` is a synthetic placeholder rather than a user supplied label.
pub fn is_default_name(name: &str) -> bool {
    DEFAULT_NAME_REGEX.is_match(name)
}

/// Represents the type of a proxy.
/// This is the canonical enum used for proxy type identification across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProxyType {
    Shadowsocks,
    ShadowsocksR,
    VMess,
    Vless,
    Trojan,
    Hysteria,
    Hysteria2,
    HTTP,
    Socks5,
}

impl ProxyType {
    /// All supported protocol tags, in declaration order.
    pub const ALL: [ProxyType; 9] = [
        ProxyType::Shadowsocks,
        ProxyType::ShadowsocksR,
        ProxyType::VMess,
        ProxyType::Vless,
        ProxyType::Trojan,
        ProxyType::Hysteria,
        ProxyType::Hysteria2,
        ProxyType::HTTP,
        ProxyType::Socks5,
    ];

    /// Short protocol tag, as used in Clash `type:` fields and diagnostics.
    pub fn as_tag(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss",
            ProxyType::ShadowsocksR => "ssr",
            ProxyType::VMess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::Hysteria => "hysteria",
            ProxyType::Hysteria2 => "hysteria2",
            ProxyType::HTTP => "http",
            ProxyType::Socks5 => "socks5",
        }
    }

    /// Human-readable protocol name.
    pub fn display_name(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "SS",
            ProxyType::ShadowsocksR => "SSR",
            ProxyType::VMess => "VMess",
            ProxyType::Vless => "VLESS",
            ProxyType::Trojan => "Trojan",
            ProxyType::Hysteria => "Hysteria",
            ProxyType::Hysteria2 => "Hysteria2",
            ProxyType::HTTP => "HTTP",
            ProxyType::Socks5 => "SOCKS5",
        }
    }

    /// Rank used by the link parser. Lower ranks are tried first, so the
    /// Hysteria variants are attempted before the generic schemes.
    pub fn decode_priority(self) -> u8 {
        match self {
            ProxyType::Shadowsocks => 0,
            ProxyType::ShadowsocksR => 1,
            ProxyType::VMess => 2,
            ProxyType::Trojan => 3,
            ProxyType::Hysteria2 => 4,
            ProxyType::Hysteria => 5,
            ProxyType::Vless => 6,
            ProxyType::HTTP => 7,
            ProxyType::Socks5 => 8,
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for ProxyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProxyType::ALL
            .iter()
            .copied()
            .find(|t| t.as_tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown proxy type: {}", s))
    }
}

/// REALITY parameters carried by VLESS nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealityOptions {
    pub public_key: String,
    pub short_id: Option<String>,
}

/// TLS related attributes shared by the TLS-capable protocols.
///
/// Every field is optional so that "not provided" stays distinguishable from
/// an explicit `false` or empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    pub enabled: Option<bool>,
    pub sni: Option<String>,
    pub skip_cert_verify: Option<bool>,
    pub alpn: Option<Vec<String>>,
    pub client_fingerprint: Option<String>,
    pub reality: Option<RealityOptions>,
}

impl TlsOptions {
    /// True when any field other than an explicit `enabled = false` is set.
    pub fn is_configured(&self) -> bool {
        self.enabled == Some(true)
            || self.sni.is_some()
            || self.skip_cert_verify.is_some()
            || self.alpn.is_some()
            || self.client_fingerprint.is_some()
            || self.reality.is_some()
    }
}

/// Transport (stream) settings for V2Ray-family protocols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// `tcp`, `ws`, `grpc`, `h2`, `http`...
    pub network: Option<String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub service_name: Option<String>,
}

impl TransportOptions {
    pub fn network_or_tcp(&self) -> &str {
        self.network.as_deref().unwrap_or("tcp")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowsocksSettings {
    /// Absent cipher is resolved to a dialect default at encode time only.
    pub cipher: Option<String>,
    pub password: String,
    pub udp: Option<bool>,
    pub plugin: Option<String>,
    /// Plugin options in link order, e.g. `obfs=http`, `obfs-host=example.com`.
    pub plugin_opts: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowsocksRSettings {
    pub cipher: String,
    pub password: String,
    pub protocol: String,
    pub protocol_param: Option<String>,
    pub obfs: String,
    pub obfs_param: Option<String>,
    pub group: Option<String>,
    pub udp: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VMessSettings {
    pub uuid: String,
    pub alter_id: Option<u32>,
    pub cipher: Option<String>,
    pub udp: Option<bool>,
    pub transport: TransportOptions,
    pub tls: TlsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VlessSettings {
    pub uuid: String,
    pub flow: Option<String>,
    pub udp: Option<bool>,
    pub transport: TransportOptions,
    pub tls: TlsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrojanSettings {
    pub password: String,
    pub udp: Option<bool>,
    pub transport: TransportOptions,
    pub tls: TlsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HysteriaSettings {
    pub auth_str: Option<String>,
    /// `udp`, `wechat-video` or `faketcp`.
    pub protocol: Option<String>,
    /// upload speed in Mbps
    pub up: Option<u32>,
    /// download speed in Mbps
    pub down: Option<u32>,
    pub obfs: Option<String>,
    pub tls: TlsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hysteria2Settings {
    pub password: String,
    pub obfs: Option<String>,
    pub obfs_password: Option<String>,
    pub up: Option<u32>,
    pub down: Option<u32>,
    pub tls: TlsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: TlsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Socks5Settings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub udp: Option<bool>,
}

/// Protocol specific attributes. The variant determines the [`ProxyType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxySettings {
    Shadowsocks(ShadowsocksSettings),
    ShadowsocksR(ShadowsocksRSettings),
    VMess(VMessSettings),
    Vless(VlessSettings),
    Trojan(TrojanSettings),
    Hysteria(HysteriaSettings),
    Hysteria2(Hysteria2Settings),
    Http(HttpSettings),
    Socks5(Socks5Settings),
}

impl ProxySettings {
    pub fn proxy_type(&self) -> ProxyType {
        match self {
            ProxySettings::Shadowsocks(_) => ProxyType::Shadowsocks,
            ProxySettings::ShadowsocksR(_) => ProxyType::ShadowsocksR,
            ProxySettings::VMess(_) => ProxyType::VMess,
            ProxySettings::Vless(_) => ProxyType::Vless,
            ProxySettings::Trojan(_) => ProxyType::Trojan,
            ProxySettings::Hysteria(_) => ProxyType::Hysteria,
            ProxySettings::Hysteria2(_) => ProxyType::Hysteria2,
            ProxySettings::Http(_) => ProxyType::HTTP,
            ProxySettings::Socks5(_) => ProxyType::Socks5,
        }
    }
}

/// Represents a proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    /// Display label; also the identifier used by generated proxy groups.
    pub name: String,
    pub server: String,
    pub port: u16,
    pub settings: ProxySettings,
}

impl Proxy {
    pub fn new(
        name: impl Into<String>,
        server: impl Into<String>,
        port: u16,
        settings: ProxySettings,
    ) -> Self {
        Proxy {
            name: name.into(),
            server: server.into(),
            port,
            settings,
        }
    }

    pub fn proxy_type(&self) -> ProxyType {
        self.settings.proxy_type()
    }

    /// Whether the node still carries a synthetic placeholder name.
    pub fn has_default_name(&self) -> bool {
        self.name.is_empty() || is_default_name(&self.name)
    }
}
