//! Convert proxy subscriptions between link lists, Clash, sing-box and Loon.
//!
//! ```rust
//! use clashconvert::{Converter, Format};
//!
//! let converter = Converter::default();
//! let result = converter
//!     .convert(
//!         "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#node1",
//!         Format::Txt,
//!         Format::ClashMeta,
//!     )
//!     .unwrap();
//! assert_eq!(result.proxy_count, 1);
//! assert!(result.is_structured_output);
//! ```

pub mod codec;
pub mod error;
pub mod generator;
pub mod interfaces;
pub mod models;
pub mod parser;
pub mod settings;
pub mod utils;

pub use codec::{CodecRegistry, DecodeOutcome, ProxyCodec, ProxyEntry};
pub use error::{ConvertError, DecodeError, EncodeError, RegistryError, SettingsError};
pub use generator::{generate, GenerateResult};
pub use interfaces::{ConversionResult, Converter};
pub use models::{Dialect, Format, Proxy, ProxySettings, ProxyType, Scaffold};
pub use parser::{parse, ParseResult};
pub use settings::Settings;
