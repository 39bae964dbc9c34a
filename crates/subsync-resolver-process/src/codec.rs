//! Resolver output codec
//!
//! Standard padded base64 with three substitutions so the text survives
//! command lines and URLs unescaped:
//!
//! | standard | codec |
//! |----------|-------|
//! | `+`      | `-`   |
//! | `/`      | `_`   |
//! | `=`      | `,`   |
//!
//! The first two are exactly the URL-safe alphabet; only padding differs.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use subsync_core::{Error, Result};

/// Encode UTF-8 text
pub fn encode(text: &str) -> String {
    URL_SAFE.encode(text.as_bytes()).replace('=', ",")
}

/// Decode codec text back to UTF-8
///
/// Surrounding whitespace is ignored.
pub fn decode(encoded: &str) -> Result<String> {
    let padded = encoded.trim().replace(',', "=");

    let bytes = URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| Error::resolver(format!("Invalid codec text: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| Error::resolver(format!("Decoded output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution_table() {
        // 0xfb 0xff encodes to "+/8=" in standard base64
        let standard = base64::engine::general_purpose::STANDARD.encode([0xfbu8, 0xff]);
        assert_eq!(standard, "+/8=");

        let custom = URL_SAFE.encode([0xfbu8, 0xff]).replace('=', ",");
        assert_eq!(custom, "-_8,");
    }

    #[test]
    fn test_decode_then_encode_is_identity() {
        for text in ["", "W10,", "eyJhIjoxfQ,,", "aGVsbG8gd29ybGQ,"] {
            let decoded = decode(text).unwrap();
            assert_eq!(encode(&decoded), text);
        }
    }

    #[test]
    fn test_encode_then_decode_is_identity() {
        for text in ["", "a", "ab", "abc", "[{\"Answer\":[]}]", "ünïcødé ✓", "line\nbreak"] {
            assert_eq!(decode(&encode(text)).unwrap(), text);
        }
    }

    #[test]
    fn test_encoded_text_has_no_reserved_characters() {
        let encoded = encode("??>>~~ some text that produces every symbol ??>>");
        assert!(!encoded.contains(['+', '/', '=']));
    }

    #[test]
    fn test_trailing_newline_is_ignored() {
        assert_eq!(decode("W10,\n").unwrap(), "[]");
    }

    #[test]
    fn test_invalid_text_is_resolver_error() {
        assert!(matches!(decode("not codec text!"), Err(Error::Resolver(_))));
    }

    #[test]
    fn test_non_utf8_is_resolver_error() {
        let encoded = URL_SAFE.encode([0xffu8, 0xfe]).replace('=', ",");
        assert!(matches!(decode(&encoded), Err(Error::Resolver(_))));
    }
}
