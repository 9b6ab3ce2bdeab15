use serde::{Deserialize, Serialize};

/// Type of proxy group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyGroupType {
    Select,
    #[serde(rename = "url-test", alias = "urltest")]
    URLTest,
    Fallback,
}

impl ProxyGroupType {
    /// Get string representation of the proxy group type
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyGroupType::Select => "select",
            ProxyGroupType::URLTest => "url-test",
            ProxyGroupType::Fallback => "fallback",
        }
    }

    /// Whether the group measures latency against a test URL.
    pub fn is_health_checked(&self) -> bool {
        matches!(self, ProxyGroupType::URLTest | ProxyGroupType::Fallback)
    }
}

/// Configuration for a proxy group of the generated scaffold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyGroupConfig {
    /// Name of the proxy group
    pub name: String,
    /// Type of the proxy group
    #[serde(rename = "type")]
    pub group_type: ProxyGroupType,
    /// Member patterns. `[]NAME` inserts `NAME` literally, anything else is a
    /// regular expression matched against node names.
    #[serde(alias = "rule")]
    pub proxies: Vec<String>,
    /// URL for testing
    pub url: String,
    /// Interval in seconds between tests
    pub interval: u32,
    /// Tolerance value for tests
    pub tolerance: u32,
}

impl Default for ProxyGroupConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            group_type: ProxyGroupType::Select,
            proxies: Vec::new(),
            url: String::new(),
            interval: 0,
            tolerance: 0,
        }
    }
}

impl ProxyGroupConfig {
    /// Create a new proxy group config
    pub fn new(name: impl Into<String>, group_type: ProxyGroupType) -> Self {
        Self {
            name: name.into(),
            group_type,
            ..Default::default()
        }
    }

    pub fn with_proxies<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxies = proxies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_health_check(mut self, url: impl Into<String>, interval: u32) -> Self {
        self.url = url.into();
        self.interval = interval;
        self
    }

    /// Get string representation of the group type
    pub fn type_str(&self) -> &'static str {
        self.group_type.as_str()
    }
}

/// A collection of proxy group configurations
pub type ProxyGroupConfigs = Vec<ProxyGroupConfig>;

pub const DEFAULT_TEST_URL: &str = "http://www.gstatic.com/generate_204";
pub const DEFAULT_TEST_INTERVAL: u32 = 300;

/// Static routing groups and rules appended around the proxy list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scaffold {
    pub proxy_groups: ProxyGroupConfigs,
    /// Rules in Clash syntax; `MATCH` is rewritten to `FINAL` for Loon.
    pub rules: Vec<String>,
}

impl Default for Scaffold {
    fn default() -> Self {
        Scaffold {
            proxy_groups: vec![
                ProxyGroupConfig::new("Proxy", ProxyGroupType::Select)
                    .with_proxies(["[]Auto", ".*", "[]DIRECT"]),
                ProxyGroupConfig::new("Auto", ProxyGroupType::URLTest)
                    .with_proxies([".*"])
                    .with_health_check(DEFAULT_TEST_URL, DEFAULT_TEST_INTERVAL),
            ],
            rules: vec![
                "DOMAIN-SUFFIX,local,DIRECT".to_string(),
                "IP-CIDR,127.0.0.0/8,DIRECT".to_string(),
                "IP-CIDR,192.168.0.0/16,DIRECT".to_string(),
                "GEOIP,CN,DIRECT".to_string(),
                "MATCH,Proxy".to_string(),
            ],
        }
    }
}

impl Scaffold {
    /// Name of the group used as the final route, i.e. the first group.
    pub fn primary_group(&self) -> Option<&str> {
        self.proxy_groups.first().map(|g| g.name.as_str())
    }
}
