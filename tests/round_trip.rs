mod common;

use clashconvert::models::default_name;
use clashconvert::{CodecRegistry, DecodeOutcome, Format, Proxy, ProxyType};

use common::sample_nodes;

#[test]
fn test_every_protocol_round_trips_through_its_link() {
    let registry = CodecRegistry::with_defaults();
    let nodes = sample_nodes();
    assert_eq!(nodes.len(), ProxyType::ALL.len());

    for proxy in nodes {
        let codec = registry.get(proxy.proxy_type()).unwrap();
        let link = codec.encode_link(&proxy).unwrap();
        assert_eq!(
            codec.encode_link(&proxy).unwrap(),
            link,
            "encoding must be stable"
        );
        assert_eq!(
            codec.decode(&link),
            DecodeOutcome::Decoded(proxy.clone()),
            "{}",
            link
        );
    }
}

#[test]
fn test_synthetic_names_are_not_written_back() {
    let registry = CodecRegistry::with_defaults();
    for mut proxy in sample_nodes() {
        proxy.name = default_name(7);
        let codec = registry.get(proxy.proxy_type()).unwrap();
        let link = codec.encode_link(&proxy).unwrap();
        assert!(!link.contains("defaultName_7"), "{}", link);

        let DecodeOutcome::Decoded(decoded) = codec.decode(&link) else {
            panic!("{} should decode", link);
        };
        assert!(decoded.name.is_empty(), "{}", link);
        assert_eq!(
            Proxy {
                name: proxy.name.clone(),
                ..decoded
            },
            proxy
        );
    }
}

#[test]
fn test_link_list_survives_txt_to_txt() {
    let registry = CodecRegistry::with_defaults();
    let nodes = sample_nodes();
    let links = clashconvert::generate(
        &registry,
        &nodes,
        Format::Txt,
        &Default::default(),
    )
    .unwrap();
    assert_eq!(links.proxy_count, nodes.len());

    let parsed = clashconvert::parse(&registry, &links.text, Format::Txt).unwrap();
    assert_eq!(parsed.proxies, nodes);
    assert!(parsed.unsupported.is_empty());
    assert!(parsed.malformed.is_empty());
}
