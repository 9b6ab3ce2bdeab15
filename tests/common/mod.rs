#![allow(dead_code)]

use clashconvert::models::{
    HttpSettings, Hysteria2Settings, HysteriaSettings, RealityOptions, ShadowsocksRSettings,
    ShadowsocksSettings, Socks5Settings, TlsOptions, TransportOptions, TrojanSettings,
    VMessSettings, VlessSettings,
};
use clashconvert::{Proxy, ProxySettings};

pub const SS_LINK: &str = "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#node1";

pub const VMESS_LINK: &str = "vmess://eyJ2IjoiMiIsInBzIjoidGVzdCIsImFkZCI6ImV4YW1wbGUuY29tIiwicG9ydCI6IjQ0MyIsImlkIjoiYjgzMTM4MWQtNjMyNC00ZDUzLWFkNGYtOGNkYTQ4YjMwODExIiwiYWlkIjoiMCIsIm5ldCI6IndzIiwidHlwZSI6Im5vbmUiLCJob3N0IjoiIiwicGF0aCI6Ii8iLCJ0bHMiOiJ0bHMifQ==";

pub const VLESS_LINK: &str = "vless://d342d11e-d424-4583-b36e-524ab1f0afa4@203.0.113.10:443?encryption=none&flow=xtls-rprx-vision&security=reality&sni=www.microsoft.com&fp=chrome&pbk=Z84J2IelR9ch3k8VtlVhhs5ycBUlXA7wHBWcBrjqnAw&sid=6ba85179e30d4fc2&type=tcp#Reality%20Node";

pub const TROJAN_LINK: &str = "trojan://secret@1.2.3.4:8443?peer=a.com&type=ws&path=%2Fws&host=cdn.a.com#ws";

pub const HY2_LINK: &str = "hy2://letmein@hy2.example.com:443/?obfs=salamander&obfs-password=cry_me_a_r1ver&sni=real.example.com&insecure=1&downmbps=100#HY2";

/// One fully populated node per protocol.
pub fn sample_nodes() -> Vec<Proxy> {
    vec![
        Proxy::new(
            "SS 01",
            "ss.example.com",
            8388,
            ProxySettings::Shadowsocks(ShadowsocksSettings {
                cipher: Some("chacha20-ietf-poly1305".to_string()),
                password: "secret".to_string(),
                udp: None,
                plugin: Some("obfs-local".to_string()),
                plugin_opts: vec![
                    ("obfs".to_string(), "http".to_string()),
                    ("obfs-host".to_string(), "bing.com".to_string()),
                ],
            }),
        ),
        Proxy::new(
            "SSR 香港",
            "ssr.example.com",
            8989,
            ProxySettings::ShadowsocksR(ShadowsocksRSettings {
                cipher: "aes-256-cfb".to_string(),
                password: "p@ss/word".to_string(),
                protocol: "auth_aes128_md5".to_string(),
                protocol_param: Some("32:abc".to_string()),
                obfs: "tls1.2_ticket_auth".to_string(),
                obfs_param: Some("cdn.example.com".to_string()),
                group: Some("My Group".to_string()),
                udp: None,
            }),
        ),
        Proxy::new(
            "JP 01",
            "v.example.com",
            443,
            ProxySettings::VMess(VMessSettings {
                uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
                alter_id: Some(0),
                cipher: Some("auto".to_string()),
                udp: None,
                transport: TransportOptions {
                    network: Some("ws".to_string()),
                    path: Some("/ray".to_string()),
                    host: Some("cdn.example.com".to_string()),
                    service_name: None,
                },
                tls: TlsOptions {
                    enabled: Some(true),
                    sni: Some("v.example.com".to_string()),
                    ..Default::default()
                },
            }),
        ),
        Proxy::new(
            "US Reality",
            "203.0.113.10",
            443,
            ProxySettings::Vless(VlessSettings {
                uuid: "d342d11e-d424-4583-b36e-524ab1f0afa4".to_string(),
                flow: Some("xtls-rprx-vision".to_string()),
                udp: None,
                transport: TransportOptions {
                    network: Some("tcp".to_string()),
                    ..Default::default()
                },
                tls: TlsOptions {
                    enabled: Some(true),
                    sni: Some("www.microsoft.com".to_string()),
                    client_fingerprint: Some("chrome".to_string()),
                    reality: Some(RealityOptions {
                        public_key: "Z84J2IelR9ch3k8VtlVhhs5ycBUlXA7wHBWcBrjqnAw".to_string(),
                        short_id: Some("6ba85179e30d4fc2".to_string()),
                    }),
                    ..Default::default()
                },
            }),
        ),
        Proxy::new(
            "Trojan 1",
            "t.example.com",
            443,
            ProxySettings::Trojan(TrojanSettings {
                password: "pa ss#word".to_string(),
                udp: None,
                transport: TransportOptions::default(),
                tls: TlsOptions {
                    sni: Some("sni.example.com".to_string()),
                    skip_cert_verify: Some(true),
                    alpn: Some(vec!["h2".to_string()]),
                    ..Default::default()
                },
            }),
        ),
        Proxy::new(
            "HY",
            "hy.example.com",
            36712,
            ProxySettings::Hysteria(HysteriaSettings {
                auth_str: Some("token".to_string()),
                protocol: Some("udp".to_string()),
                up: Some(20),
                down: Some(100),
                obfs: Some("xplus-secret".to_string()),
                tls: TlsOptions {
                    sni: Some("hy.example.com".to_string()),
                    skip_cert_verify: Some(false),
                    alpn: Some(vec!["h3".to_string()]),
                    ..Default::default()
                },
            }),
        ),
        Proxy::new(
            "HY2",
            "hy2.example.com",
            443,
            ProxySettings::Hysteria2(Hysteria2Settings {
                password: "letmein".to_string(),
                obfs: Some("salamander".to_string()),
                obfs_password: Some("cry_me_a_r1ver".to_string()),
                up: None,
                down: Some(100),
                tls: TlsOptions {
                    sni: Some("real.example.com".to_string()),
                    skip_cert_verify: Some(true),
                    ..Default::default()
                },
            }),
        ),
        Proxy::new(
            "office",
            "proxy.example.com",
            8080,
            ProxySettings::Http(HttpSettings {
                username: Some("user".to_string()),
                password: Some("p:ss".to_string()),
                tls: TlsOptions {
                    enabled: Some(true),
                    ..Default::default()
                },
            }),
        ),
        Proxy::new(
            "home",
            "10.0.0.1",
            1080,
            ProxySettings::Socks5(Socks5Settings {
                username: Some("alice".to_string()),
                password: Some("s3cret".to_string()),
                udp: None,
            }),
        ),
    ]
}

/// Number of `- {...}` proxy lines in a generated Clash document.
pub fn clash_entry_count(text: &str) -> usize {
    text.lines().filter(|l| l.starts_with("  - {")).count()
}
