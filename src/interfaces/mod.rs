pub mod converter;

pub use converter::{ConversionResult, Converter};
