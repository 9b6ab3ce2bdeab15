use serde_json::{json, Map, Value};

use super::common::{clash_base, fragment_name, link_fragment, loon_line, loon_quote, singbox_base};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, Proxy, ProxySettings, ProxyType, ShadowsocksSettings};
use crate::utils::base64::{base64_decode, base64_encode};
use crate::utils::string::{
    format_host, split_fragment, split_host_port, split_query, strip_scheme,
};
use crate::utils::url::{build_query, parse_query, url_decode};

/// Cipher used for Clash, Loon and link output when the node has none.
pub const SS_DEFAULT_CIPHER: &str = "aes-256-gcm";
/// Cipher used for sing-box output when the node has none.
pub const SS_SINGBOX_DEFAULT_CIPHER: &str = "aes-128-gcm";

const OBFS_PLUGINS: [&str; 2] = ["obfs-local", "simple-obfs"];

pub struct ShadowsocksCodec;

impl ShadowsocksCodec {
    fn explode(body: &str) -> Result<Proxy, DecodeError> {
        let (body, fragment) = split_fragment(body);
        let (main, query) = split_query(body);

        let (userinfo, authority) = match main.rfind('@') {
            Some(pos) => (decode_userinfo(&main[..pos])?, main[pos + 1..].to_string()),
            None => {
                // Legacy form: the whole `method:password@host:port` is base64
                let decoded = base64_decode(main).ok_or(DecodeError::InvalidBase64)?;
                let (userinfo, authority) = decoded
                    .rsplit_once('@')
                    .ok_or_else(|| DecodeError::Malformed("missing '@' separator".into()))?;
                (userinfo.to_string(), authority.to_string())
            }
        };

        let (cipher, password) = userinfo
            .split_once(':')
            .ok_or(DecodeError::MissingField("password"))?;
        let (server, port) = split_host_port(&authority)?;

        let mut settings = ShadowsocksSettings {
            cipher: Some(cipher.to_string()).filter(|c| !c.is_empty()),
            password: password.to_string(),
            ..Default::default()
        };

        if let Some(query) = query {
            let params = parse_query(query);
            if let Some(plugin) = params.get("plugin").filter(|p| !p.is_empty()) {
                let (name, opts) = split_plugin(plugin);
                settings.plugin = Some(name);
                settings.plugin_opts = opts;
            }
        }

        Ok(Proxy::new(
            fragment_name(fragment),
            server,
            port,
            ProxySettings::Shadowsocks(settings),
        ))
    }
}

/// SIP002 userinfo is base64 of `method:password`, though some exporters
/// percent-encode it in plain text instead.
fn decode_userinfo(userinfo: &str) -> Result<String, DecodeError> {
    match base64_decode(userinfo) {
        Some(decoded) if decoded.contains(':') => Ok(decoded),
        _ => {
            let plain = url_decode(userinfo);
            if plain.contains(':') {
                Ok(plain)
            } else {
                Err(DecodeError::InvalidBase64)
            }
        }
    }
}

/// Split `name;k=v;flag` into the plugin name and its option pairs.
pub(crate) fn split_plugin(plugin: &str) -> (String, Vec<(String, String)>) {
    let mut parts = plugin.split(';');
    let name = parts.next().unwrap_or_default().to_string();
    let opts = parts
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (p.to_string(), String::new()),
        })
        .collect();
    (name, opts)
}

fn join_plugin_opts(opts: &[(String, String)]) -> String {
    opts.iter()
        .map(|(k, v)| {
            if v.is_empty() {
                k.clone()
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn plugin_opt<'a>(opts: &'a [(String, String)], key: &str) -> Option<&'a str> {
    opts.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Clash `plugin` / `plugin-opts` for a node's SIP002 plugin.
pub(crate) fn clash_plugin(settings: &ShadowsocksSettings) -> Option<(String, Value)> {
    let plugin = settings.plugin.as_deref()?;
    if OBFS_PLUGINS.contains(&plugin) {
        let mut opts = Map::new();
        if let Some(mode) = plugin_opt(&settings.plugin_opts, "obfs") {
            opts.insert("mode".into(), json!(mode));
        }
        if let Some(host) = plugin_opt(&settings.plugin_opts, "obfs-host") {
            opts.insert("host".into(), json!(host));
        }
        return Some(("obfs".to_string(), Value::Object(opts)));
    }

    let opts: Map<String, Value> = settings
        .plugin_opts
        .iter()
        .map(|(k, v)| {
            let value = if v.is_empty() { json!(true) } else { json!(v) };
            (k.clone(), value)
        })
        .collect();
    Some((plugin.to_string(), Value::Object(opts)))
}

/// Inverse of [`clash_plugin`].
pub(crate) fn plugin_from_clash(
    plugin: &str,
    opts: Option<&Map<String, Value>>,
) -> (String, Vec<(String, String)>) {
    let empty = Map::new();
    let opts = opts.unwrap_or(&empty);
    let as_text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        Value::Bool(true) => String::new(),
        other => other.to_string(),
    };

    if plugin == "obfs" {
        let mut pairs = Vec::new();
        if let Some(mode) = opts.get("mode") {
            pairs.push(("obfs".to_string(), as_text(mode)));
        }
        if let Some(host) = opts.get("host") {
            pairs.push(("obfs-host".to_string(), as_text(host)));
        }
        return ("obfs-local".to_string(), pairs);
    }

    let pairs = opts
        .iter()
        .filter(|(_, v)| !matches!(v, Value::Bool(false)))
        .map(|(k, v)| (k.clone(), as_text(v)))
        .collect();
    (plugin.to_string(), pairs)
}

impl ProxyCodec for ShadowsocksCodec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::Shadowsocks
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["ss"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        match strip_scheme(link, "ss") {
            Some(body) => Self::explode(body).into(),
            None => DecodeOutcome::NotMatched,
        }
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let ss = settings_of!(proxy, Shadowsocks, ProxyType::Shadowsocks);
        let cipher = ss.cipher.as_deref().unwrap_or(SS_DEFAULT_CIPHER);
        let userinfo = base64_encode(&format!("{}:{}", cipher, ss.password));

        let mut link = format!(
            "ss://{}@{}:{}",
            userinfo,
            format_host(&proxy.server),
            proxy.port
        );
        if let Some(plugin) = &ss.plugin {
            let mut value = plugin.clone();
            if !ss.plugin_opts.is_empty() {
                value.push(';');
                value.push_str(&join_plugin_opts(&ss.plugin_opts));
            }
            link.push_str("/?");
            link.push_str(&build_query(&[("plugin", value)]));
        }
        link.push_str(&link_fragment(proxy));
        Ok(link)
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let ss = settings_of!(proxy, Shadowsocks, ProxyType::Shadowsocks);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "ss");
                map.insert(
                    "cipher".into(),
                    json!(ss.cipher.as_deref().unwrap_or(SS_DEFAULT_CIPHER)),
                );
                map.insert("password".into(), json!(ss.password));
                map.insert("udp".into(), json!(ss.udp.unwrap_or(true)));
                if let Some((plugin, opts)) = clash_plugin(ss) {
                    map.insert("plugin".into(), json!(plugin));
                    map.insert("plugin-opts".into(), opts);
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => {
                let mut map = singbox_base(proxy, "shadowsocks");
                map.insert(
                    "method".into(),
                    json!(ss.cipher.as_deref().unwrap_or(SS_SINGBOX_DEFAULT_CIPHER)),
                );
                map.insert("password".into(), json!(ss.password));
                if let Some(plugin) = &ss.plugin {
                    map.insert("plugin".into(), json!(plugin));
                    if !ss.plugin_opts.is_empty() {
                        map.insert("plugin_opts".into(), json!(join_plugin_opts(&ss.plugin_opts)));
                    }
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::Loon => {
                let mut parts = vec![
                    "Shadowsocks".to_string(),
                    proxy.server.clone(),
                    proxy.port.to_string(),
                    ss.cipher.as_deref().unwrap_or(SS_DEFAULT_CIPHER).to_string(),
                    loon_quote(&ss.password),
                ];
                if ss.plugin.as_deref().map_or(false, |p| OBFS_PLUGINS.contains(&p)) {
                    if let Some(mode) = plugin_opt(&ss.plugin_opts, "obfs") {
                        parts.push(format!("obfs-name={}", mode));
                    }
                    if let Some(host) = plugin_opt(&ss.plugin_opts, "obfs-host") {
                        parts.push(format!("obfs-host={}", host));
                    }
                }
                if let Some(udp) = ss.udp {
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

    fn node(name: &str) -> Proxy {
        Proxy::new(
            name,
            "1.2.3.4",
            8388,
            ProxySettings::Shadowsocks(ShadowsocksSettings {
                cipher: Some("aes-256-gcm".to_string()),
                password: "pass".to_string(),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_decode_sip002() {
        let link = "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#node1";
        match ShadowsocksCodec.decode(link) {
            DecodeOutcome::Decoded(proxy) => assert_eq!(proxy, node("node1")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_decode_legacy_and_plain_userinfo() {
        // base64("aes-128-gcm:secret@example.com:443")
        let legacy = format!("ss://{}#legacy", base64_encode("aes-128-gcm:secret@example.com:443"));
        let DecodeOutcome::Decoded(proxy) = ShadowsocksCodec.decode(&legacy) else {
            panic!("legacy link should decode");
        };
        assert_eq!(proxy.server, "example.com");
        assert_eq!(proxy.port, 443);

        let plain = "ss://chacha20-ietf-poly1305:p%40ss@example.com:443";
        let DecodeOutcome::Decoded(proxy) = ShadowsocksCodec.decode(plain) else {
            panic!("plain userinfo should decode");
        };
        let ProxySettings::Shadowsocks(ss) = proxy.settings else {
            unreachable!()
        };
        assert_eq!(ss.password, "p@ss");
        assert!(proxy.name.is_empty());
    }

    #[test]
    fn test_decode_rejects_corrupt_payload() {
        assert!(matches!(
            ShadowsocksCodec.decode("ss://!!!notbase64"),
            DecodeOutcome::Malformed(_)
        ));
        assert_eq!(
            ShadowsocksCodec.decode("vmess://abc"),
            DecodeOutcome::NotMatched
        );
    }

    #[test]
    fn test_link_round_trip_with_plugin() {
        let mut proxy = node("with plugin");
        if let ProxySettings::Shadowsocks(ss) = &mut proxy.settings {
            ss.plugin = Some("obfs-local".to_string());
            ss.plugin_opts = vec![
                ("obfs".to_string(), "http".to_string()),
                ("obfs-host".to_string(), "bing.com".to_string()),
            ];
        }
        let link = ShadowsocksCodec.encode_link(&proxy).unwrap();
        assert_eq!(ShadowsocksCodec.decode(&link), DecodeOutcome::Decoded(proxy));
    }

    #[test]
    fn test_default_name_not_encoded() {
        let link = ShadowsocksCodec.encode_link(&node("defaultName_3")).unwrap();
        assert!(!link.contains('#'));
    }

    #[test]
    fn test_dialect_default_ciphers() {
        let mut proxy = node("n");
        if let ProxySettings::Shadowsocks(ss) = &mut proxy.settings {
            ss.cipher = None;
        }
        let clash = ShadowsocksCodec.encode_structured(&proxy, Dialect::Clash).unwrap();
        assert_eq!(clash.as_object().unwrap()["cipher"], json!("aes-256-gcm"));
        assert_eq!(clash.as_object().unwrap()["udp"], json!(true));

        let singbox = ShadowsocksCodec.encode_structured(&proxy, Dialect::SingBox).unwrap();
        assert_eq!(singbox.as_object().unwrap()["method"], json!("aes-128-gcm"));
        assert_eq!(singbox.as_object().unwrap()["server_port"], json!(8388));
    }

    #[test]
    fn test_clash_obfs_plugin_round_trip() {
        let settings = ShadowsocksSettings {
            plugin: Some("obfs-local".to_string()),
            plugin_opts: vec![
                ("obfs".to_string(), "tls".to_string()),
                ("obfs-host".to_string(), "a.com".to_string()),
            ],
            ..Default::default()
        };
        let (name, opts) = clash_plugin(&settings).unwrap();
        assert_eq!(name, "obfs");
        assert_eq!(opts, json!({ "mode": "tls", "host": "a.com" }));

        let (plugin, pairs) = plugin_from_clash(&name, opts.as_object());
        assert_eq!(Some(plugin), settings.plugin);
        assert_eq!(pairs, settings.plugin_opts);
    }

    #[test]
    fn test_loon_line() {
        let entry = ShadowsocksCodec.encode_structured(&node("HK"), Dialect::Loon).unwrap();
        assert_eq!(
            entry.as_line().unwrap(),
            "HK = Shadowsocks,1.2.3.4,8388,aes-256-gcm,\"pass\""
        );
    }

    #[test]
    fn test_loon_line_separators_in_name() {
        let entry = ShadowsocksCodec.encode_structured(&node("a,b=c"), Dialect::Loon).unwrap();
        assert_eq!(
            entry.as_line().unwrap(),
            "a_b_c = Shadowsocks,1.2.3.4,8388,aes-256-gcm,\"pass\""
        );
    }
}
