use serde::Serialize;

use crate::codec::ProxyEntry;
use crate::error::ConvertError;
use crate::generator::config::group::group_members;
use crate::generator::RenderedNode;
use crate::models::{ProxyGroupConfig, Scaffold};

const CLASH_HEADER: &str = "port: 7890
socks-port: 7891
allow-lan: false
mode: rule
log-level: info
external-controller: 127.0.0.1:9090
";

#[derive(Debug, Serialize)]
struct ClashProxyGroup<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    group_type: &'static str,
    proxies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tolerance: Option<u32>,
}

impl<'a> ClashProxyGroup<'a> {
    fn new(group: &'a ProxyGroupConfig, node_names: &[&str]) -> Self {
        let checked = group.group_type.is_health_checked();
        ClashProxyGroup {
            name: &group.name,
            group_type: group.type_str(),
            proxies: group_members(group, node_names),
            url: checked.then_some(group.url.as_str()).filter(|u| !u.is_empty()),
            interval: checked.then_some(group.interval).filter(|i| *i > 0),
            tolerance: checked.then_some(group.tolerance).filter(|t| *t > 0),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClashGroupsSection<'a> {
    #[serde(rename = "proxy-groups")]
    proxy_groups: Vec<ClashProxyGroup<'a>>,
}

#[derive(Debug, Serialize)]
struct ClashRulesSection<'a> {
    rules: &'a [String],
}

/// Render a Clash YAML document.
///
/// Proxies are written one flow mapping per line so that each entry stays
/// greppable; the scaffold groups and rules follow in block style.
pub fn render(nodes: &[RenderedNode], scaffold: &Scaffold) -> Result<String, ConvertError> {
    let mut output = String::from(CLASH_HEADER);

    if nodes.is_empty() {
        output.push_str("proxies: []\n");
    } else {
        output.push_str("proxies:\n");
        for node in nodes {
            if let ProxyEntry::Object(map) = &node.entry {
                let line = serde_json::to_string(map)?;
                output.push_str("  - ");
                output.push_str(&line);
                output.push('\n');
            }
        }
    }

    let node_names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    if !scaffold.proxy_groups.is_empty() {
        let groups = ClashGroupsSection {
            proxy_groups: scaffold
                .proxy_groups
                .iter()
                .map(|group| ClashProxyGroup::new(group, &node_names))
                .collect(),
        };
        output.push_str(&serde_yaml::to_string(&groups)?);
    }
    if !scaffold.rules.is_empty() {
        output.push_str(&serde_yaml::to_string(&ClashRulesSection {
            rules: &scaffold.rules,
        })?);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use serde_yaml::Value as YamlValue;

    fn node(name: &str, kind: &str) -> RenderedNode {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(name));
        map.insert("type".to_string(), json!(kind));
        map.insert("server".to_string(), json!("1.2.3.4"));
        map.insert("port".to_string(), json!(443));
        RenderedNode {
            name: name.to_string(),
            entry: ProxyEntry::Object(map),
        }
    }

    #[test]
    fn test_render_document() {
        let nodes = vec![node("HK 01", "ss"), node("JP: 02", "trojan")];
        let text = render(&nodes, &Scaffold::default()).unwrap();

        let entries = text.lines().filter(|l| l.starts_with("  - {")).count();
        assert_eq!(entries, 2);

        let doc: YamlValue = serde_yaml::from_str(&text).unwrap();
        assert_eq!(doc["proxies"][1]["name"].as_str(), Some("JP: 02"));
        assert_eq!(doc["proxy-groups"][0]["name"].as_str(), Some("Proxy"));
        let members: Vec<&str> = doc["proxy-groups"][0]["proxies"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(members, vec!["Auto", "HK 01", "JP: 02", "DIRECT"]);
        assert_eq!(doc["proxy-groups"][1]["interval"].as_u64(), Some(300));
        assert_eq!(doc["rules"].as_sequence().unwrap().len(), 5);
    }

    #[test]
    fn test_render_without_nodes() {
        let text = render(&[], &Scaffold::default()).unwrap();
        let doc: YamlValue = serde_yaml::from_str(&text).unwrap();
        assert!(doc["proxies"].as_sequence().unwrap().is_empty());
        assert_eq!(doc["proxy-groups"][1]["proxies"][0].as_str(), Some("DIRECT"));
    }
}
