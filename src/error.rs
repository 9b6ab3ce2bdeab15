//! Error types

use thiserror::Error;

use crate::models::{Dialect, Format, ProxyType};

/// A link whose scheme matched a codec but whose body could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base64 payload")]
    InvalidBase64,

    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("malformed link: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{proxy_type} cannot be represented in {dialect}")]
    UnsupportedProtocol {
        proxy_type: ProxyType,
        dialect: Dialect,
    },

    #[error("codec for {expected} was given a {found} node")]
    TypeMismatch {
        expected: ProxyType,
        found: ProxyType,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a codec is already registered for {0}")]
    Duplicate(ProxyType),
}

/// Caller-level failures of a conversion request.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("no parser found for format: {0}")]
    ParserNotFound(Format),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures while loading a settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
