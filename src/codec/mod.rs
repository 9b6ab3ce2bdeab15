//! Per-protocol codecs
//!
//! Each codec knows one protocol family: how to decode its link scheme into a
//! [`Proxy`], how to encode a [`Proxy`] back into a link, and how to render it
//! as a proxy entry for each structured [`Dialect`].

/// Borrow the protocol settings of `$proxy`, or return a type mismatch error.
macro_rules! settings_of {
    ($proxy:expr, $variant:ident, $expected:expr) => {
        match &$proxy.settings {
            $crate::models::ProxySettings::$variant(settings) => settings,
            other => {
                return Err($crate::error::EncodeError::TypeMismatch {
                    expected: $expected,
                    found: other.proxy_type(),
                })
            }
        }
    };
}

mod common;
pub mod http;
pub mod hysteria;
pub mod hysteria2;
pub mod registry;
pub mod socks5;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod vless;
pub mod vmess;

use serde_json::{Map, Value};

use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, Proxy, ProxyType};

pub use registry::CodecRegistry;

/// Result of offering one line of text to a codec.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// The scheme is not this codec's; try the next one.
    NotMatched,
    /// The line was decoded into a node. The name is empty when the link
    /// carried no label.
    Decoded(Proxy),
    /// The scheme matched but the body is corrupt.
    Malformed(DecodeError),
}

impl From<Result<Proxy, DecodeError>> for DecodeOutcome {
    fn from(result: Result<Proxy, DecodeError>) -> Self {
        match result {
            Ok(proxy) => DecodeOutcome::Decoded(proxy),
            Err(e) => DecodeOutcome::Malformed(e),
        }
    }
}

/// A single rendered proxy entry of a structured document.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyEntry {
    /// Key/value object for the YAML and JSON dialects
    Object(Map<String, Value>),
    /// One `name = type,...` line for the Loon dialect
    Line(String),
}

impl ProxyEntry {
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            ProxyEntry::Object(map) => Some(map),
            ProxyEntry::Line(_) => None,
        }
    }

    pub fn as_line(&self) -> Option<&str> {
        match self {
            ProxyEntry::Line(line) => Some(line),
            ProxyEntry::Object(_) => None,
        }
    }
}

/// The decode/encode unit for one protocol tag.
pub trait ProxyCodec: Send + Sync {
    fn proxy_type(&self) -> ProxyType;

    /// Lowercase link schemes (without `://`) this codec claims.
    fn schemes(&self) -> &'static [&'static str];

    /// Try to decode one link. The scheme prefix is expected to be lowercase
    /// already; the payload keeps its original casing.
    fn decode(&self, link: &str) -> DecodeOutcome;

    /// Encode a node back into link form. Stable for a given node.
    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError>;

    /// Render a node as one proxy entry of `dialect`.
    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect)
        -> Result<ProxyEntry, EncodeError>;
}
