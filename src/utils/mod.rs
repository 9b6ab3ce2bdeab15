pub mod base64;
pub mod de;
pub mod string;
pub mod url;

// Re-export common utilities
pub use string::{non_empty, normalize_scheme, scheme_of};
