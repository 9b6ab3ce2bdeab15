use log::{debug, warn};
use serde::Deserialize;
use serde_yaml::Value as YamlValue;

use super::proxy_types::ClashProxyYamlInput;
use crate::codec::ss::plugin_from_clash;
use crate::models::{
    HttpSettings, Hysteria2Settings, HysteriaSettings, Proxy, ProxySettings,
    ShadowsocksRSettings, ShadowsocksSettings, Socks5Settings, TrojanSettings, VMessSettings,
    VlessSettings,
};
use crate::utils::de::parse_leading_u32;
use crate::utils::string::parse_port;

/// The only part of a Clash document this parser reads.
#[derive(Debug, Default, Deserialize)]
struct ClashYamlInput {
    #[serde(default, alias = "Proxy")]
    proxies: Option<Vec<YamlValue>>,
}

/// Extract proxy nodes from a Clash YAML document.
///
/// Groups, rules and every other section are ignored. Entries whose type is
/// unknown or whose fields do not map are skipped individually.
pub fn parse_clash_yaml(content: &str) -> Vec<Proxy> {
    let entries = extract_entries(content);
    let total = entries.len();

    let proxies: Vec<Proxy> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_yaml::from_value(value) {
            Ok(input) => convert(input, index),
            Err(e) => {
                debug!("Skipping proxy entry #{}: {}", index + 1, e);
                None
            }
        })
        .collect();

    if proxies.len() < total {
        debug!("Kept {} of {} Clash proxy entries", proxies.len(), total);
    }
    proxies
}

/// Locate the `proxies:` entries, tolerating documents that are not valid
/// YAML as a whole.
fn extract_entries(content: &str) -> Vec<YamlValue> {
    match serde_yaml::from_str::<ClashYamlInput>(content) {
        Ok(input) => return input.proxies.unwrap_or_default(),
        Err(e) => warn!("Clash document is not valid YAML ({}), scanning proxies block", e),
    }

    let block = proxies_block(content);
    if let Ok(input) = serde_yaml::from_str::<ClashYamlInput>(&block) {
        return input.proxies.unwrap_or_default();
    }

    // Last resort: one flow mapping per `- {...}` line
    block
        .lines()
        .filter_map(|line| {
            let flow = line.trim().strip_prefix('-')?.trim();
            if !flow.starts_with('{') {
                return None;
            }
            serde_yaml::from_str::<YamlValue>(flow).ok()
        })
        .collect()
}

/// The `proxies:` line and everything up to the next top-level key.
fn proxies_block(content: &str) -> String {
    let mut block = Vec::new();
    let mut inside = false;
    for line in content.lines() {
        let top_level = !line.starts_with(|c: char| c.is_whitespace() || c == '-')
            && !line.trim().is_empty()
            && !line.trim_start().starts_with('#');
        if top_level {
            if inside {
                break;
            }
            inside = line.starts_with("proxies:");
        }
        if inside {
            block.push(line);
        }
    }
    block.join("\n")
}

/// Map one typed entry onto the node model.
fn convert(input: ClashProxyYamlInput, index: usize) -> Option<Proxy> {
    let (name, server, port, settings) = match input {
        ClashProxyYamlInput::Shadowsocks {
            name,
            server,
            port,
            cipher,
            password,
            udp,
            plugin,
            plugin_opts,
        } => {
            let mut ss = ShadowsocksSettings {
                cipher: cipher.filter(|c| !c.is_empty()),
                password: password.unwrap_or_default(),
                udp,
                ..Default::default()
            };
            if let Some(plugin) = plugin.filter(|p| !p.is_empty()) {
                let (plugin, opts) = plugin_from_clash(&plugin, plugin_opts.as_ref());
                ss.plugin = Some(plugin);
                ss.plugin_opts = opts;
            }
            (name, server, port, ProxySettings::Shadowsocks(ss))
        }
        ClashProxyYamlInput::ShadowsocksR {
            name,
            server,
            port,
            cipher,
            password,
            protocol,
            obfs,
            protocol_param,
            obfs_param,
            group,
            udp,
        } => (
            name,
            server,
            port,
            ProxySettings::ShadowsocksR(ShadowsocksRSettings {
                cipher,
                password: password.unwrap_or_default(),
                protocol,
                protocol_param: protocol_param.filter(|p| !p.is_empty()),
                obfs,
                obfs_param: obfs_param.filter(|p| !p.is_empty()),
                group,
                udp,
            }),
        ),
        ClashProxyYamlInput::VMess {
            name,
            server,
            port,
            uuid,
            alter_id,
            cipher,
            udp,
            tls,
            transport,
        } => (
            name,
            server,
            port,
            ProxySettings::VMess(VMessSettings {
                uuid,
                alter_id: alter_id.and_then(|a| a.trim().parse().ok()),
                cipher,
                udp,
                transport: transport.into_options(),
                tls: tls.into_options(),
            }),
        ),
        ClashProxyYamlInput::Vless {
            name,
            server,
            port,
            uuid,
            flow,
            udp,
            tls,
            transport,
        } => (
            name,
            server,
            port,
            ProxySettings::Vless(VlessSettings {
                uuid,
                flow: flow.filter(|f| !f.is_empty()),
                udp,
                transport: transport.into_options(),
                tls: tls.into_options(),
            }),
        ),
        ClashProxyYamlInput::Trojan {
            name,
            server,
            port,
            password,
            udp,
            tls,
            transport,
        } => (
            name,
            server,
            port,
            ProxySettings::Trojan(TrojanSettings {
                password: password.unwrap_or_default(),
                udp,
                transport: transport.into_options(),
                tls: tls.into_options(),
            }),
        ),
        ClashProxyYamlInput::Hysteria {
            name,
            server,
            port,
            auth_str,
            protocol,
            up,
            down,
            obfs,
            tls,
        } => (
            name,
            server,
            port,
            ProxySettings::Hysteria(HysteriaSettings {
                auth_str,
                protocol,
                up: up.as_deref().and_then(parse_leading_u32),
                down: down.as_deref().and_then(parse_leading_u32),
                obfs,
                tls: tls.into_options(),
            }),
        ),
        ClashProxyYamlInput::Hysteria2 {
            name,
            server,
            port,
            password,
            obfs,
            obfs_password,
            up,
            down,
            tls,
        } => (
            name,
            server,
            port,
            ProxySettings::Hysteria2(Hysteria2Settings {
                password: password.unwrap_or_default(),
                obfs: obfs.filter(|o| !o.is_empty()),
                obfs_password,
                up: up.as_deref().and_then(parse_leading_u32),
                down: down.as_deref().and_then(parse_leading_u32),
                tls: tls.into_options(),
            }),
        ),
        ClashProxyYamlInput::Http {
            name,
            server,
            port,
            username,
            password,
            tls,
        } => (
            name,
            server,
            port,
            ProxySettings::Http(HttpSettings {
                username,
                password,
                tls: tls.into_options(),
            }),
        ),
        ClashProxyYamlInput::Socks5 {
            name,
            server,
            port,
            username,
            password,
            udp,
        } => (
            name,
            server,
            port,
            ProxySettings::Socks5(Socks5Settings {
                username,
                password,
                udp,
            }),
        ),
        ClashProxyYamlInput::Unknown => {
            debug!("Skipping proxy entry #{} of unsupported type", index + 1);
            return None;
        }
    };

    if server.is_empty() {
        debug!("Skipping proxy entry #{} without server", index + 1);
        return None;
    }
    let port = match port.as_deref().map(parse_port) {
        Some(Ok(port)) => port,
        _ => {
            debug!("Skipping proxy entry #{} with invalid port", index + 1);
            return None;
        }
    };

    Some(Proxy::new(name.unwrap_or_default(), server, port, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;

    const DOCUMENT: &str = r#"
port: 7890
mode: rule
proxies:
  - {name: "HK 01", type: ss, server: 1.2.3.4, port: 8388, cipher: aes-256-gcm, password: pass, udp: true}
  - name: JP 01
    type: vmess
    server: jp.example.com
    port: "443"
    uuid: b831381d-6324-4d53-ad4f-8cda48b30811
    alterId: 0
    cipher: auto
    tls: true
    servername: jp.example.com
    network: ws
    ws-opts:
      path: /ray
      headers:
        Host: cdn.example.com
  - {name: WG, type: wireguard, server: 5.6.7.8, port: 51820}
  - {name: TR, type: trojan, server: tr.example.com, port: 443, password: secret, sni: tr.example.com}
proxy-groups:
  - {name: Proxy, type: select, proxies: [HK 01, JP 01, TR]}
rules:
  - DOMAIN-SUFFIX,google.com,Proxy
  - DOMAIN-SUFFIX,github.com,Proxy
  - DOMAIN-KEYWORD,youtube,Proxy
  - DOMAIN,example.org,DIRECT
  - IP-CIDR,10.0.0.0/8,DIRECT
  - IP-CIDR,172.16.0.0/12,DIRECT
  - IP-CIDR,192.168.0.0/16,DIRECT
  - IP-CIDR,127.0.0.0/8,DIRECT
  - GEOIP,CN,DIRECT
  - MATCH,Proxy
"#;

    #[test]
    fn test_parse_document_skips_unknown_types() {
        let proxies = parse_clash_yaml(DOCUMENT);
        let types: Vec<ProxyType> = proxies.iter().map(|p| p.proxy_type()).collect();
        assert_eq!(
            types,
            vec![ProxyType::Shadowsocks, ProxyType::VMess, ProxyType::Trojan]
        );

        let ProxySettings::VMess(vmess) = &proxies[1].settings else {
            panic!("second entry should be vmess");
        };
        assert_eq!(proxies[1].port, 443);
        assert_eq!(vmess.alter_id, Some(0));
        assert_eq!(vmess.tls.enabled, Some(true));
        assert_eq!(vmess.tls.sni.as_deref(), Some("jp.example.com"));
        assert_eq!(vmess.transport.path.as_deref(), Some("/ray"));
        assert_eq!(vmess.transport.host.as_deref(), Some("cdn.example.com"));
    }

    #[test]
    fn test_fallback_to_flow_lines() {
        // An unterminated flow sequence in an unrelated section
        let broken = "proxies:\n  - {name: a, type: socks5, server: 1.1.1.1, port: 1080}\n  - {name: b, type: http, server: 2.2.2.2, port: 8080}\nrules:\n  - MATCH,DIRECT\nbroken: [unclosed\n";
        let proxies = parse_clash_yaml(broken);
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[1].name, "b");
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let doc = "proxies:\n  - {name: a, type: ss, server: 1.1.1.1, port: 0, password: x}\n  - {name: b, type: ss, server: 1.1.1.1, port: 8388, password: x}\n  - just a string\n";
        let proxies = parse_clash_yaml(doc);
        assert_eq!(proxies.len(), 1);
        assert_eq!(proxies[0].name, "b");
    }

    #[test]
    fn test_no_proxies_section() {
        assert!(parse_clash_yaml("rules:\n  - MATCH,DIRECT\n").is_empty());
        assert!(parse_clash_yaml("").is_empty());
    }
}
