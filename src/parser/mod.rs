//! Source parsers: link lists and structured documents

pub mod json;
pub mod subparser;
pub mod yaml;

use log::debug;

use crate::codec::CodecRegistry;
use crate::error::{ConvertError, DecodeError};
use crate::models::{default_name, Format, Proxy};

pub use json::parse_singbox_json;
pub use subparser::parse_links;
pub use yaml::clash::parse_clash_yaml;

/// A line whose scheme was recognized but whose payload was corrupt.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkError {
    /// 1-based line number in the (decoded) input
    pub line: usize,
    pub scheme: String,
    pub error: DecodeError,
}

/// Nodes extracted from one input plus per-line diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub proxies: Vec<Proxy>,
    /// Foreign scheme tokens, once per occurrence, in input order
    pub unsupported: Vec<String>,
    pub malformed: Vec<LinkError>,
}

impl ParseResult {
    pub(crate) fn from_proxies(mut proxies: Vec<Proxy>) -> Self {
        assign_default_names(&mut proxies);
        ParseResult {
            proxies,
            ..Default::default()
        }
    }
}

/// Give every unnamed node a sequential placeholder name.
fn assign_default_names(proxies: &mut [Proxy]) {
    for (index, proxy) in proxies
        .iter_mut()
        .filter(|p| p.name.is_empty())
        .enumerate()
    {
        proxy.name = default_name(index + 1);
    }
}

/// Parse `content` as `format`.
///
/// Loon is an output-only dialect and has no parser.
pub fn parse(
    registry: &CodecRegistry,
    content: &str,
    format: Format,
) -> Result<ParseResult, ConvertError> {
    // editors on Windows like to prepend a byte-order mark
    let content = content.trim_start_matches('\u{feff}');
    let result = match format {
        Format::Txt => parse_links(registry, content),
        Format::ClashMeta | Format::ClashPremium => {
            ParseResult::from_proxies(parse_clash_yaml(content))
        }
        Format::SingBox => ParseResult::from_proxies(parse_singbox_json(content)),
        Format::Loon => return Err(ConvertError::ParserNotFound(format)),
    };
    debug!(
        "Parsed {} node(s) from {} input",
        result.proxies.len(),
        format
    );
    Ok(result)
}
