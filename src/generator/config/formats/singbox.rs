use std::collections::HashSet;

use log::{debug, warn};
use serde_json::{self, json, Value};

use crate::codec::ProxyEntry;
use crate::error::ConvertError;
use crate::generator::config::group::group_members;
use crate::generator::RenderedNode;
use crate::models::proxy_group_config::{DEFAULT_TEST_INTERVAL, DEFAULT_TEST_URL};
use crate::models::{ProxyGroupConfig, ProxyGroupType, Scaffold};

const DIRECT_TAG: &str = "direct";
const BLOCK_TAG: &str = "block";

/// Map Clash-style policy names onto built-in sing-box outbound tags.
fn outbound_tag(name: &str) -> String {
    match name {
        "DIRECT" => DIRECT_TAG.to_string(),
        "REJECT" => BLOCK_TAG.to_string(),
        other => other.to_string(),
    }
}

fn format_interval(interval: u32) -> String {
    let interval = if interval == 0 {
        DEFAULT_TEST_INTERVAL
    } else {
        interval
    };
    format!("{}s", interval)
}

/// Give every node a tag no other outbound uses.
///
/// Group names, the built-in `direct`/`block` tags and the policy names that
/// map onto them are taken first; a clashing node gets a ` 2`, ` 3`, ... suffix.
fn node_tags(nodes: &[RenderedNode], scaffold: &Scaffold) -> Vec<String> {
    let mut taken: HashSet<String> = [DIRECT_TAG, BLOCK_TAG, "DIRECT", "REJECT"]
        .iter()
        .map(|t| t.to_string())
        .collect();
    taken.extend(scaffold.proxy_groups.iter().map(|g| g.name.clone()));

    nodes
        .iter()
        .map(|node| {
            let mut tag = node.name.clone();
            let mut n = 2;
            while taken.contains(&tag) {
                tag = format!("{} {}", node.name, n);
                n += 1;
            }
            if tag != node.name {
                warn!("Renaming sing-box outbound '{}' to '{}'", node.name, tag);
            }
            taken.insert(tag.clone());
            tag
        })
        .collect()
}

fn group_outbound(group: &ProxyGroupConfig, node_tags: &[&str]) -> Value {
    let members: Vec<String> = group_members(group, node_tags)
        .into_iter()
        .map(|m| {
            if node_tags.contains(&m.as_str()) {
                m
            } else {
                outbound_tag(&m)
            }
        })
        .collect();

    match group.group_type {
        ProxyGroupType::Select => json!({
            "type": "selector",
            "tag": group.name,
            "outbounds": members,
            "default": members.first().cloned().unwrap_or_else(|| DIRECT_TAG.to_string()),
        }),
        ProxyGroupType::URLTest | ProxyGroupType::Fallback => {
            let url = if group.url.is_empty() {
                DEFAULT_TEST_URL
            } else {
                group.url.as_str()
            };
            let mut outbound = json!({
                "type": "urltest",
                "tag": group.name,
                "outbounds": members,
                "url": url,
                "interval": format_interval(group.interval),
            });
            if group.tolerance > 0 {
                outbound["tolerance"] = json!(group.tolerance);
            }
            outbound
        }
    }
}

/// Translate one Clash rule line into a sing-box route rule.
///
/// `MATCH` is not a rule in sing-box; it becomes `route.final` instead and
/// yields `None` here, as do rule types without a sing-box counterpart.
fn route_rule(rule: &str) -> Option<Value> {
    let parts: Vec<&str> = rule.split(',').map(str::trim).collect();
    let (kind, content, target) = match parts.as_slice() {
        [kind, content, target, ..] => (*kind, *content, *target),
        _ => return None,
    };
    let outbound = outbound_tag(target);
    let rule = match kind {
        "DOMAIN" => json!({"domain": [content], "outbound": outbound}),
        "DOMAIN-SUFFIX" => json!({"domain_suffix": [content], "outbound": outbound}),
        "DOMAIN-KEYWORD" => json!({"domain_keyword": [content], "outbound": outbound}),
        "IP-CIDR" | "IP-CIDR6" => json!({"ip_cidr": [content], "outbound": outbound}),
        "DST-PORT" => json!({"port": [content.parse::<u16>().ok()?], "outbound": outbound}),
        _ => {
            debug!("No sing-box equivalent for rule '{}'", rule);
            return None;
        }
    };
    Some(rule)
}

/// Target of the `MATCH` rule, or the first group when there is none.
fn final_outbound(scaffold: &Scaffold) -> String {
    scaffold
        .rules
        .iter()
        .find_map(|rule| {
            let (kind, target) = rule.split_once(',')?;
            (kind.trim() == "MATCH").then(|| outbound_tag(target.trim()))
        })
        .or_else(|| scaffold.primary_group().map(outbound_tag))
        .unwrap_or_else(|| DIRECT_TAG.to_string())
}

/// Render a sing-box JSON configuration.
pub fn render(nodes: &[RenderedNode], scaffold: &Scaffold) -> Result<String, ConvertError> {
    let tags = node_tags(nodes, scaffold);
    let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();

    let mut outbounds: Vec<Value> = scaffold
        .proxy_groups
        .iter()
        .map(|group| group_outbound(group, &tag_refs))
        .collect();
    outbounds.extend(nodes.iter().zip(&tags).filter_map(|(node, tag)| match &node.entry {
        ProxyEntry::Object(map) => {
            let mut map = map.clone();
            map.insert("tag".to_string(), json!(tag));
            Some(Value::Object(map))
        }
        ProxyEntry::Line(_) => None,
    }));
    outbounds.push(json!({"type": "direct", "tag": DIRECT_TAG}));
    outbounds.push(json!({"type": "block", "tag": BLOCK_TAG}));

    let mut rules = vec![json!({"ip_is_private": true, "outbound": DIRECT_TAG})];
    rules.extend(scaffold.rules.iter().filter_map(|r| route_rule(r)));

    let config = json!({
        "log": {
            "level": "info",
            "timestamp": true
        },
        "outbounds": outbounds,
        "route": {
            "rules": rules,
            "final": final_outbound(scaffold),
            "auto_detect_interface": true
        }
    });

    Ok(serde_json::to_string_pretty(&config)?)
}
