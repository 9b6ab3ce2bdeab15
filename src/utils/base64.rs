use base64::alphabet;
use base64::engine::general_purpose::{self, GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

/// Decoder accepting both padded and unpadded input.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes a string to Base64 format.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Decodes a Base64 string to its original form.
///
/// Accepts the standard and the URL-safe alphabet, with or without padding,
/// and ignores embedded whitespace. Returns `None` when the input is not valid
/// Base64 or does not decode to UTF-8.
pub fn base64_decode(input: &str) -> Option<String> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let trimmed = normalized.trim_end_matches('=');
    if trimmed.is_empty() {
        return None;
    }

    let bytes = LENIENT_STANDARD.decode(trimmed).ok()?;
    String::from_utf8(bytes).ok()
}

/// Converts a Base64 string to URL-safe Base64 format by replacing specific characters.
pub fn url_safe_base64_apply(input: &str) -> String {
    input
        .replace('+', "-")
        .replace('/', "_")
        .replace('=', "") // Remove padding
}

/// Encodes a string to URL-safe Base64 format.
pub fn url_safe_base64_encode(input: &str) -> String {
    url_safe_base64_apply(&base64_encode(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_padding_and_alphabet() {
        assert_eq!(base64_decode("YWJj").as_deref(), Some("abc"));
        assert_eq!(base64_decode("YWI=").as_deref(), Some("ab"));
        assert_eq!(base64_decode("YWI").as_deref(), Some("ab"));
        // "??>" encodes to "Pz8+" (standard) / "Pz8-" (url safe)
        assert_eq!(base64_decode("Pz8+").as_deref(), Some("??>"));
        assert_eq!(base64_decode("Pz8-").as_deref(), Some("??>"));
    }

    #[test]
    fn test_decode_invalid() {
        assert_eq!(base64_decode("not base64!"), None);
        assert_eq!(base64_decode(""), None);
        assert_eq!(base64_decode("===="), None);
    }

    #[test]
    fn test_url_safe_encode() {
        assert_eq!(url_safe_base64_encode("??>"), "Pz8-");
        assert_eq!(url_safe_base64_encode("ab"), "YWI");
    }
}
