//! Plain link list output

use crate::codec::ProxyEntry;
use crate::generator::RenderedNode;

/// One link per line, in node order, without a trailing newline.
pub fn render(nodes: &[RenderedNode]) -> String {
    nodes
        .iter()
        .filter_map(|node| match &node.entry {
            ProxyEntry::Line(link) => Some(link.as_str()),
            ProxyEntry::Object(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
