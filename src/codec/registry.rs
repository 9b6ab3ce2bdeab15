//! Protocol tag → codec lookup

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use log::{debug, warn};

use super::http::HttpCodec;
use super::hysteria::HysteriaCodec;
use super::hysteria2::Hysteria2Codec;
use super::socks5::Socks5Codec;
use super::ss::ShadowsocksCodec;
use super::ssr::ShadowsocksRCodec;
use super::trojan::TrojanCodec;
use super::vless::VlessCodec;
use super::vmess::VMessCodec;
use super::ProxyCodec;
use crate::error::RegistryError;
use crate::models::ProxyType;

fn builtin_codecs() -> Vec<Box<dyn ProxyCodec>> {
    vec![
        Box::new(ShadowsocksCodec),
        Box::new(ShadowsocksRCodec),
        Box::new(VMessCodec),
        Box::new(TrojanCodec),
        Box::new(Hysteria2Codec),
        Box::new(HysteriaCodec),
        Box::new(VlessCodec),
        Box::new(HttpCodec),
        Box::new(Socks5Codec),
    ]
}

/// Holds exactly one codec per protocol tag.
///
/// Built once and then shared read-only by the parsers and generators.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<ProxyType, Box<dyn ProxyCodec>>,
}

impl CodecRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register each codec in turn, failing on the first repeated tag.
    pub fn from_codecs<I>(codecs: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Box<dyn ProxyCodec>>,
    {
        let mut registry = Self::new();
        for codec in codecs {
            registry.register(codec)?;
        }
        Ok(registry)
    }

    /// A registry holding the built-in codec for every protocol.
    pub fn try_with_defaults() -> Result<Self, RegistryError> {
        Self::from_codecs(builtin_codecs())
    }

    /// Like [`CodecRegistry::try_with_defaults`], but a clashing built-in is
    /// logged and skipped so the first codec for a tag is kept.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for codec in builtin_codecs() {
            if let Err(e) = registry.register(codec) {
                warn!("Skipping built-in codec: {}", e);
            }
        }
        registry
    }

    /// Add a codec. Fails when its protocol tag is already taken.
    pub fn register(&mut self, codec: Box<dyn ProxyCodec>) -> Result<(), RegistryError> {
        let proxy_type = codec.proxy_type();
        if self.codecs.contains_key(&proxy_type) {
            return Err(RegistryError::Duplicate(proxy_type));
        }
        debug!("Registered codec for {}", proxy_type);
        self.codecs.insert(proxy_type, codec);
        Ok(())
    }

    pub fn get(&self, proxy_type: ProxyType) -> Option<&dyn ProxyCodec> {
        self.codecs.get(&proxy_type).map(|codec| codec.as_ref())
    }

    pub fn registered_tags(&self) -> BTreeSet<ProxyType> {
        self.codecs.keys().copied().collect()
    }

    /// Registered codecs in link-decoding priority order.
    pub fn in_priority_order(&self) -> Vec<&dyn ProxyCodec> {
        let mut codecs: Vec<&dyn ProxyCodec> = self.codecs.values().map(|c| c.as_ref()).collect();
        codecs.sort_by_key(|c| c.proxy_type().decode_priority());
        codecs
    }

    /// Whether any registered codec claims `scheme` (lowercase, no `://`).
    pub fn is_known_scheme(&self, scheme: &str) -> bool {
        self.codecs
            .values()
            .any(|codec| codec.schemes().iter().any(|s| *s == scheme))
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("tags", &self.registered_tags())
            .finish()
    }
}
