//! Group generation utilities
//!
//! Expands the member patterns of a scaffold group into concrete names.

use log::warn;
use regex::Regex;

use crate::models::ProxyGroupConfig;

/// Name used when a group would otherwise end up without members.
pub const FALLBACK_MEMBER: &str = "DIRECT";

/// Expand one member pattern against the node names.
///
/// `[]NAME` yields `NAME` verbatim (another group, `DIRECT`, `REJECT`...).
/// Anything else is a regular expression; every node name it matches is
/// returned in node order. An invalid expression matches nothing.
pub fn group_generate(rule: &str, node_names: &[&str]) -> Vec<String> {
    if let Some(literal) = rule.strip_prefix("[]") {
        return vec![literal.to_string()];
    }

    match Regex::new(rule) {
        Ok(re) => node_names
            .iter()
            .filter(|name| re.is_match(name))
            .map(|name| name.to_string())
            .collect(),
        Err(e) => {
            warn!("Invalid group pattern '{}': {}", rule, e);
            Vec::new()
        }
    }
}

/// All members of `group`, deduplicated in first-seen order.
///
/// A group whose patterns select nothing falls back to `DIRECT` so that the
/// generated document stays loadable.
pub fn group_members(group: &ProxyGroupConfig, node_names: &[&str]) -> Vec<String> {
    let mut members: Vec<String> = Vec::new();
    for rule in &group.proxies {
        for name in group_generate(rule, node_names) {
            if name != group.name && !members.contains(&name) {
                members.push(name);
            }
        }
    }
    if members.is_empty() {
        members.push(FALLBACK_MEMBER.to_string());
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyGroupType;

    const NAMES: [&str; 4] = ["HK 01", "HK 02", "JP 01", "US 01"];

    #[test]
    fn test_literal_and_regex_rules() {
        assert_eq!(group_generate("[]DIRECT", &NAMES), vec!["DIRECT"]);
        assert_eq!(group_generate("^HK", &NAMES), vec!["HK 01", "HK 02"]);
        assert!(group_generate("(unclosed", &NAMES).is_empty());
    }

    #[test]
    fn test_members_are_deduplicated() {
        let group = ProxyGroupConfig::new("Proxy", ProxyGroupType::Select)
            .with_proxies(["[]Auto", "HK", ".*", "[]DIRECT"]);
        assert_eq!(
            group_members(&group, &NAMES),
            vec!["Auto", "HK 01", "HK 02", "JP 01", "US 01", "DIRECT"]
        );
    }

    #[test]
    fn test_empty_group_falls_back_to_direct() {
        let group = ProxyGroupConfig::new("Auto", ProxyGroupType::URLTest).with_proxies([".*"]);
        assert_eq!(group_members(&group, &[]), vec!["DIRECT"]);
    }

    #[test]
    fn test_group_never_contains_itself() {
        let group = ProxyGroupConfig::new("Proxy", ProxyGroupType::Select)
            .with_proxies(["[]Proxy", "[]DIRECT"]);
        assert_eq!(group_members(&group, &NAMES), vec!["DIRECT"]);
    }
}
