//! Conversion entry point tying parsers and generators together

use std::collections::BTreeMap;

use log::{debug, info};

use crate::codec::CodecRegistry;
use crate::error::ConvertError;
use crate::generator::{self, GenerateResult};
use crate::models::{Format, Proxy, ProxyType, Scaffold};
use crate::parser::{self, LinkError, ParseResult};

/// Everything a caller needs to show the result of one conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionResult {
    pub output: String,
    pub filtered_counts: BTreeMap<ProxyType, usize>,
    /// Foreign link schemes, once per offending line
    pub unsupported: Vec<String>,
    pub malformed: Vec<LinkError>,
    /// YAML or JSON document output
    pub is_structured_output: bool,
    /// Nodes present in `output`
    pub proxy_count: usize,
}

impl ConversionResult {
    /// `unsupported` without repetitions, in first-seen order.
    pub fn unique_unsupported(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for scheme in &self.unsupported {
            if !seen.contains(&scheme.as_str()) {
                seen.push(scheme);
            }
        }
        seen
    }
}

/// Owns the codec registry and the routing scaffold for its lifetime.
///
/// Conversions borrow it immutably, so one instance can serve any number of
/// threads.
pub struct Converter {
    registry: CodecRegistry,
    scaffold: Scaffold,
}

impl Default for Converter {
    fn default() -> Self {
        Converter::new(CodecRegistry::with_defaults(), Scaffold::default())
    }
}

impl Converter {
    pub fn new(registry: CodecRegistry, scaffold: Scaffold) -> Self {
        Converter { registry, scaffold }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn scaffold(&self) -> &Scaffold {
        &self.scaffold
    }

    /// Parse `input` as `format` without generating anything.
    pub fn parse(&self, input: &str, format: Format) -> Result<ParseResult, ConvertError> {
        if input.trim().is_empty() {
            return Ok(ParseResult::default());
        }
        parser::parse(&self.registry, input, format)
    }

    /// Render already parsed nodes as `format`.
    pub fn generate(&self, nodes: &[Proxy], format: Format) -> Result<GenerateResult, ConvertError> {
        generator::generate(&self.registry, nodes, format, &self.scaffold)
    }

    /// Parse `input` as `from` and render the nodes as `to`.
    ///
    /// Link lists are re-encoded node by node even when `from == to`.
    pub fn convert(
        &self,
        input: &str,
        from: Format,
        to: Format,
    ) -> Result<ConversionResult, ConvertError> {
        if input.trim().is_empty() {
            debug!("Empty input, nothing to convert");
            return Ok(ConversionResult {
                is_structured_output: to.is_structured(),
                ..Default::default()
            });
        }

        info!("Converting {} input to {}", from.display_name(), to.display_name());
        let parsed = self.parse(input, from)?;
        let generated = self.generate(&parsed.proxies, to)?;

        info!(
            "Converted {} of {} node(s) ({} unsupported line(s), {} malformed)",
            generated.proxy_count,
            parsed.proxies.len(),
            parsed.unsupported.len(),
            parsed.malformed.len()
        );

        Ok(ConversionResult {
            output: generated.text,
            filtered_counts: generated.filtered_counts,
            unsupported: parsed.unsupported,
            malformed: parsed.malformed,
            is_structured_output: to.is_structured(),
            proxy_count: generated.proxy_count,
        })
    }

    /// Like [`Converter::convert`] with format tags given as strings.
    pub fn convert_tags(
        &self,
        input: &str,
        from: &str,
        to: &str,
    ) -> Result<ConversionResult, ConvertError> {
        let from: Format = from.parse()?;
        let to: Format = to.parse()?;
        self.convert(input, from, to)
    }
}
