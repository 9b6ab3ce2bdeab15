use crate::codec::ProxyEntry;
use crate::generator::config::group::group_members;
use crate::generator::RenderedNode;
use crate::models::proxy_group_config::{DEFAULT_TEST_INTERVAL, DEFAULT_TEST_URL};
use crate::models::{ProxyGroupConfig, Scaffold};
use crate::utils::string::loon_proxy_name;

const LOON_GENERAL: [&str; 8] = [
    "ipv6 = true",
    "skip-proxy = 192.168.0.0/16, 10.0.0.0/8, 172.16.0.0/12, localhost, *.local",
    "bypass-tun = 10.0.0.0/8, 100.64.0.0/10, 127.0.0.0/8, 169.254.0.0/16, 172.16.0.0/12, 192.168.0.0/16, 224.0.0.0/4, 255.255.255.255/32",
    "dns-server = 119.29.29.29, 223.5.5.5",
    "allow-wifi-access = false",
    "proxy-test-url = http://connectivitycheck.gstatic.com",
    "test-timeout = 2",
    "interface-mode = auto",
];

fn group_line(group: &ProxyGroupConfig, node_names: &[&str]) -> String {
    let mut line = format!(
        "{} = {},{}",
        group.name,
        group.type_str(),
        group_members(group, node_names).join(",")
    );
    if group.group_type.is_health_checked() {
        let url = if group.url.is_empty() {
            DEFAULT_TEST_URL
        } else {
            group.url.as_str()
        };
        let interval = if group.interval == 0 {
            DEFAULT_TEST_INTERVAL
        } else {
            group.interval
        };
        line.push_str(&format!(",url={},interval={}", url, interval));
        if group.tolerance > 0 {
            line.push_str(&format!(",tolerance={}", group.tolerance));
        }
    }
    line
}

/// Loon spells the catch-all rule `FINAL`.
fn rule_line(rule: &str) -> String {
    match rule.split_once(',') {
        Some((kind, target)) if kind.trim() == "MATCH" => format!("FINAL,{}", target.trim()),
        _ => rule.to_string(),
    }
}

fn push_section<I, S>(config: &mut String, title: &str, lines: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if !config.is_empty() {
        config.push('\n');
    }
    config.push_str(title);
    config.push('\n');
    for line in lines {
        config.push_str(line.as_ref());
        config.push('\n');
    }
}

/// Render a Loon configuration.
///
/// Sections without content are still written so the file keeps the layout
/// Loon itself produces.
pub fn render(nodes: &[RenderedNode], scaffold: &Scaffold) -> String {
    // members must match the keys written on the [Proxy] lines
    let loon_names: Vec<String> = nodes.iter().map(|n| loon_proxy_name(&n.name)).collect();
    let node_names: Vec<&str> = loon_names.iter().map(String::as_str).collect();
    let mut config = String::new();

    push_section(&mut config, "[General]", LOON_GENERAL);
    push_section(
        &mut config,
        "[Proxy]",
        nodes.iter().filter_map(|node| match &node.entry {
            ProxyEntry::Line(line) => Some(line.as_str()),
            ProxyEntry::Object(_) => None,
        }),
    );
    push_section(&mut config, "[Remote Proxy]", std::iter::empty::<&str>());
    push_section(
        &mut config,
        "[Proxy Group]",
        scaffold
            .proxy_groups
            .iter()
            .map(|group| group_line(group, &node_names)),
    );
    push_section(&mut config, "[Remote Rule]", std::iter::empty::<&str>());
    push_section(
        &mut config,
        "[Rule]",
        scaffold.rules.iter().map(|rule| rule_line(rule)),
    );
    for section in ["[Rewrite]", "[Script]", "[MITM]"] {
        push_section(&mut config, section, std::iter::empty::<&str>());
    }

    config
}
