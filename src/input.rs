//! Input boundary between the content provider and the pipeline.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Input that is not text at all.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input is not valid UTF-8 text: {0}")]
    NotText(#[from] std::str::Utf8Error),
    #[error("input is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Validates raw bytes as text.
///
/// A leading byte order mark is dropped.
///
/// # Errors
///
/// Returns [`InputError::NotText`] if the bytes are not UTF-8.
pub fn decode_text(bytes: &[u8]) -> Result<&str, InputError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Decodes base64 file content as served by repository content APIs.
///
/// Those payloads are wrapped at 60 or 76 columns, so all ASCII whitespace is
/// ignored before decoding.
///
/// # Errors
///
/// Returns error if the payload is not base64 or decodes to non UTF-8 bytes.
pub fn decode_base64(content: &str) -> Result<String, InputError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(decode_text(&bytes)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_valid() {
        assert_eq!(decode_text(b"# Hello").unwrap(), "# Hello");
    }

    #[test]
    fn test_decode_text_strips_bom() {
        assert_eq!(decode_text("\u{feff}# Hi".as_bytes()).unwrap(), "# Hi");
    }

    #[test]
    fn test_decode_text_rejects_binary() {
        // Arrange
        let bytes = [0xff, 0xfe, 0x00, 0x80];

        // Act
        let result = decode_text(&bytes);

        // Assert
        assert!(matches!(result, Err(InputError::NotText(_))));
    }

    #[test]
    fn test_decode_base64_wrapped() {
        // Arrange: "# Title\n\nHello **world**\n" wrapped mid-payload
        let content = "IyBUaXRsZQoKSGVsbG8g\nKip3b3JsZCoqCg==\n";

        // Act
        let decoded = decode_base64(content).expect("Should decode");

        // Assert
        assert_eq!(decoded, "# Title\n\nHello **world**\n");
    }

    #[test]
    fn test_decode_base64_invalid() {
        let result = decode_base64("not base64!!");
        assert!(matches!(result, Err(InputError::Base64(_))));
    }

    #[test]
    fn test_decode_base64_non_utf8_payload() {
        // "/w==" decodes to a lone 0xff byte
        let result = decode_base64("/w==");
        assert!(matches!(result, Err(InputError::NotText(_))));
    }
}
