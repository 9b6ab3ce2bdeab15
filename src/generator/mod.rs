//! Format generators
//!
//! Every generator consumes normalized nodes, drops the ones the target
//! format cannot carry and renders the rest around the configured scaffold.

pub mod config;

use std::collections::BTreeMap;

use log::warn;

pub use config::group::{group_generate, group_members};

use crate::codec::{CodecRegistry, ProxyCodec, ProxyEntry};
use crate::error::{ConvertError, EncodeError};
use crate::models::{Format, Proxy, ProxyType, Scaffold};

/// One node that survived filtering, rendered for the target format.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub name: String,
    pub entry: ProxyEntry,
}

/// Output text plus per-protocol counts of nodes left out of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResult {
    pub text: String,
    pub filtered_counts: BTreeMap<ProxyType, usize>,
    /// Number of nodes written into `text`
    pub proxy_count: usize,
}

impl GenerateResult {
    pub fn filtered_total(&self) -> usize {
        self.filtered_counts.values().sum()
    }
}

fn render_node(
    codec: &dyn ProxyCodec,
    proxy: &Proxy,
    format: Format,
) -> Result<ProxyEntry, EncodeError> {
    match format.dialect() {
        None => codec.encode_link(proxy).map(ProxyEntry::Line),
        Some(dialect) => codec.encode_structured(proxy, dialect),
    }
}

/// Render `nodes` as `format`.
///
/// Nodes whose protocol is excluded by the format, or whose codec refuses
/// the dialect, are counted in `filtered_counts` instead of failing the batch.
pub fn generate(
    registry: &CodecRegistry,
    nodes: &[Proxy],
    format: Format,
    scaffold: &Scaffold,
) -> Result<GenerateResult, ConvertError> {
    let mut filtered_counts: BTreeMap<ProxyType, usize> = BTreeMap::new();
    let mut rendered = Vec::with_capacity(nodes.len());

    for proxy in nodes {
        let proxy_type = proxy.proxy_type();
        if !format.supports(proxy_type) {
            *filtered_counts.entry(proxy_type).or_default() += 1;
            continue;
        }
        let Some(codec) = registry.get(proxy_type) else {
            warn!("No codec registered for {}, dropping '{}'", proxy_type, proxy.name);
            *filtered_counts.entry(proxy_type).or_default() += 1;
            continue;
        };
        match render_node(codec, proxy, format) {
            Ok(entry) => rendered.push(RenderedNode {
                name: proxy.name.clone(),
                entry,
            }),
            Err(e) => {
                warn!("Dropping node '{}': {}", proxy.name, e);
                *filtered_counts.entry(proxy_type).or_default() += 1;
            }
        }
    }

    for (proxy_type, count) in &filtered_counts {
        warn!(
            "{} {} node(s) filtered out (not supported by {})",
            count,
            proxy_type.display_name(),
            format.display_name()
        );
    }

    let text = match format {
        Format::Txt => config::formats::links::render(&rendered),
        Format::ClashMeta | Format::ClashPremium => {
            config::formats::clash::render(&rendered, scaffold)?
        }
        Format::SingBox => config::formats::singbox::render(&rendered, scaffold)?,
        Format::Loon => config::formats::loon::render(&rendered, scaffold),
    };

    Ok(GenerateResult {
        text,
        filtered_counts,
        proxy_count: rendered.len(),
    })
}
