//! Source and target format tags

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConvertError;
use crate::models::ProxyType;

/// The structured dialect a codec renders a single proxy entry into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Clash / Clash.Meta proxy mapping (YAML document)
    Clash,
    /// sing-box outbound object (JSON document)
    SingBox,
    /// Loon `[Proxy]` line (INI-like document)
    Loon,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Clash => "clash",
            Dialect::SingBox => "sing-box",
            Dialect::Loon => "loon",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The conversion input / output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Newline separated proxy links
    Txt,
    ClashMeta,
    ClashPremium,
    SingBox,
    Loon,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Txt,
        Format::ClashMeta,
        Format::ClashPremium,
        Format::SingBox,
        Format::Loon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Txt => "txt",
            Format::ClashMeta => "clash-meta",
            Format::ClashPremium => "clash-premium",
            Format::SingBox => "sing-box",
            Format::Loon => "loon",
        }
    }

    /// Name used in user-facing messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Format::Txt => "TXT",
            Format::ClashMeta => "Clash Meta",
            Format::ClashPremium => "Clash Premium",
            Format::SingBox => "Sing-Box",
            Format::Loon => "Loon",
        }
    }

    /// Structured dialect used for per-proxy rendering, `None` for link lists.
    pub fn dialect(self) -> Option<Dialect> {
        match self {
            Format::Txt => None,
            Format::ClashMeta | Format::ClashPremium => Some(Dialect::Clash),
            Format::SingBox => Some(Dialect::SingBox),
            Format::Loon => Some(Dialect::Loon),
        }
    }

    /// Whether nodes of `proxy_type` survive filtering for this format.
    pub fn supports(self, proxy_type: ProxyType) -> bool {
        match self {
            Format::Txt | Format::ClashMeta => true,
            Format::ClashPremium => !matches!(
                proxy_type,
                ProxyType::Vless | ProxyType::Hysteria | ProxyType::Hysteria2
            ),
            Format::SingBox => proxy_type != ProxyType::ShadowsocksR,
            Format::Loon => !matches!(proxy_type, ProxyType::Socks5 | ProxyType::Hysteria),
        }
    }

    /// YAML and JSON documents count as structured output.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            Format::ClashMeta | Format::ClashPremium | Format::SingBox
        )
    }

    /// Syntax of the rendered text, for caller-side highlighting.
    pub fn syntax(self) -> &'static str {
        match self {
            Format::Txt => "plaintext",
            Format::ClashMeta | Format::ClashPremium => "yaml",
            Format::SingBox => "json",
            Format::Loon => "ini",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            Format::Txt => "txt",
            Format::ClashMeta | Format::ClashPremium => "yaml",
            Format::SingBox => "json",
            Format::Loon => "conf",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Format::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ConvertError::UnknownFormat(s.to_string()))
    }
}

impl Serialize for Format {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Format {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("clash-meta".parse::<Format>().unwrap(), Format::ClashMeta);
        assert_eq!(" Sing-Box ".parse::<Format>().unwrap(), Format::SingBox);
        assert!(matches!(
            "surge".parse::<Format>(),
            Err(ConvertError::UnknownFormat(tag)) if tag == "surge"
        ));
    }

    #[test]
    fn test_support_table() {
        assert!(!Format::ClashPremium.supports(ProxyType::Vless));
        assert!(!Format::ClashPremium.supports(ProxyType::Hysteria2));
        assert!(Format::ClashPremium.supports(ProxyType::ShadowsocksR));
        assert!(!Format::SingBox.supports(ProxyType::ShadowsocksR));
        assert!(Format::SingBox.supports(ProxyType::Socks5));
        assert!(!Format::Loon.supports(ProxyType::Socks5));
        for t in ProxyType::ALL {
            assert!(Format::ClashMeta.supports(t));
            assert!(Format::Txt.supports(t));
        }
    }

    #[test]
    fn test_caller_side_metadata() {
        assert_eq!(Format::SingBox.syntax(), "json");
        assert_eq!(Format::Loon.syntax(), "ini");
        assert_eq!(Format::ClashPremium.file_extension(), "yaml");
        assert_eq!(Format::Loon.file_extension(), "conf");
        assert!(Format::SingBox.is_structured());
        assert!(!Format::Loon.is_structured());
    }
}
