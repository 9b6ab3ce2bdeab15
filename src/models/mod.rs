//! Core data models for the application
//!
//! This module contains the primary data structures used throughout the application,
//! separated from the logic that operates on them.
//!
//! # Usage
//!
//! ```rust
//! use clashconvert::models::{Proxy, ProxySettings, ProxyType, ShadowsocksSettings};
//!
//! let proxy = Proxy::new(
//!     "HK 01",
//!     "example.com",
//!     8388,
//!     ProxySettings::Shadowsocks(ShadowsocksSettings {
//!         password: "secret".to_string(),
//!         ..Default::default()
//!     }),
//! );
//! assert_eq!(proxy.proxy_type(), ProxyType::Shadowsocks);
//! ```

mod format;
mod proxy;
pub mod proxy_group_config;

pub use format::{Dialect, Format};
pub use proxy::*;
pub use proxy_group_config::{ProxyGroupConfig, ProxyGroupConfigs, ProxyGroupType, Scaffold};
