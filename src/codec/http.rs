use super::common::{
    clash_base, clash_tls, fragment_name, insert_opt, link_fragment, loon_line, loon_quote,
    singbox_base, singbox_tls,
};
use super::{DecodeOutcome, ProxyCodec, ProxyEntry};
use crate::error::{DecodeError, EncodeError};
use crate::models::{Dialect, HttpSettings, Proxy, ProxySettings, ProxyType, TlsOptions};
use crate::utils::string::{format_host, non_empty, split_fragment, split_host_port, strip_scheme};
use crate::utils::url::{url_decode, url_encode};

pub struct HttpCodec;

impl HttpCodec {
    /// `None` when the link is a web address rather than a proxy endpoint.
    fn explode(body: &str, tls: bool) -> Option<Result<Proxy, DecodeError>> {
        let (body, fragment) = split_fragment(body);
        let body = body.strip_suffix('/').unwrap_or(body);
        if body.contains('?') || body.contains('/') {
            return None;
        }

        let (userinfo, authority) = match body.rfind('@') {
            Some(pos) => (Some(&body[..pos]), &body[pos + 1..]),
            None => (None, body),
        };
        if !authority.contains(':') || authority.ends_with(']') {
            return None;
        }

        let (username, password) = match userinfo {
            Some(info) => match info.split_once(':') {
                Some((user, pass)) => (non_empty(&url_decode(user)), non_empty(&url_decode(pass))),
                None => (non_empty(&url_decode(info)), None),
            },
            None => (None, None),
        };

        Some(split_host_port(authority).map(|(server, port)| {
            let settings = HttpSettings {
                username,
                password,
                tls: TlsOptions {
                    enabled: tls.then_some(true),
                    ..Default::default()
                },
            };
            Proxy::new(fragment_name(fragment), server, port, ProxySettings::Http(settings))
        }))
    }
}

impl ProxyCodec for HttpCodec {
    fn proxy_type(&self) -> ProxyType {
        ProxyType::HTTP
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["http", "https"]
    }

    fn decode(&self, link: &str) -> DecodeOutcome {
        let parsed = if let Some(body) = strip_scheme(link, "https") {
            Self::explode(body, true)
        } else if let Some(body) = strip_scheme(link, "http") {
            Self::explode(body, false)
        } else {
            None
        };
        match parsed {
            Some(result) => result.into(),
            None => DecodeOutcome::NotMatched,
        }
    }

    fn encode_link(&self, proxy: &Proxy) -> Result<String, EncodeError> {
        let http = settings_of!(proxy, Http, ProxyType::HTTP);
        let scheme = if http.tls.enabled == Some(true) {
            "https"
        } else {
            "http"
        };

        let userinfo = match (&http.username, &http.password) {
            (Some(user), Some(pass)) => format!("{}:{}@", url_encode(user), url_encode(pass)),
            (Some(user), None) => format!("{}@", url_encode(user)),
            (None, Some(pass)) => format!(":{}@", url_encode(pass)),
            (None, None) => String::new(),
        };
        Ok(format!(
            "{}://{}{}:{}{}",
            scheme,
            userinfo,
            format_host(&proxy.server),
            proxy.port,
            link_fragment(proxy)
        ))
    }

    fn encode_structured(&self, proxy: &Proxy, dialect: Dialect) -> Result<ProxyEntry, EncodeError> {
        let http = settings_of!(proxy, Http, ProxyType::HTTP);
        match dialect {
            Dialect::Clash => {
                let mut map = clash_base(proxy, "http");
                insert_opt(&mut map, "username", http.username.clone());
                insert_opt(&mut map, "password", http.password.clone());
                clash_tls(&mut map, &http.tls, "sni");
                Ok(ProxyEntry::Object(map))
            }
            Dialect::SingBox => {
                let mut map = singbox_base(proxy, "http");
                insert_opt(&mut map, "username", http.username.clone());
                insert_opt(&mut map, "password", http.password.clone());
                if let Some(tls) = singbox_tls(&http.tls, false) {
                    map.insert("tls".into(), tls);
                }
                Ok(ProxyEntry::Object(map))
            }
            Dialect::Loon => {
                let tls = http.tls.enabled == Some(true);
                let mut parts = vec![
                    if tls { "https" } else { "http" }.to_string(),
                    proxy.server.clone(),
                    proxy.port.to_string(),
                ];
                if let Some(user) = &http.username {
                    parts.push(user.clone());
                    parts.push(loon_quote(http.password.as_deref().unwrap_or_default()));
                }
                if let Some(sni) = &http.tls.sni {
                    parts.push(format!("tls-name={}", sni));
                }
                if let Some(skip) = http.tls.skip_cert_verify {
                    parts.push(format!("skip-cert-verify={}", skip));
                }
                Ok(ProxyEntry::Line(loon_line(&proxy.name, &parts)))
            }
        }
    }
}
