//! Text encodings for file-sourced properties.
//!
//! A file property is read as raw bytes and turned into the string that the
//! rule table works on. Text encodings decode the bytes; `Base64`,
//! `Base64Url` and `Hex` instead render the bytes as text, which is how a
//! binary secret (a key file, say) becomes a configuration string.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;

/// Encoding used to turn a file's bytes into a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// UTF-8 text (the default). Invalid sequences are an error.
    #[default]
    Utf8,
    /// 7-bit ASCII text. Bytes above 0x7F are an error.
    Ascii,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// Little-endian UTF-16 text.
    Utf16Le,
    /// Standard padded base64 rendering of the bytes.
    Base64,
    /// URL-safe unpadded base64 rendering of the bytes.
    Base64Url,
    /// Lowercase hex rendering of the bytes.
    Hex,
}

impl Encoding {
    /// Canonical name of this encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin1",
            Encoding::Utf16Le => "utf16le",
            Encoding::Base64 => "base64",
            Encoding::Base64Url => "base64url",
            Encoding::Hex => "hex",
        }
    }

    /// Turn raw file bytes into a string.
    ///
    /// Returns a human-readable reason on failure; only the text encodings
    /// can fail.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string()),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(format!(
                    "byte 0x{:02x} at offset {} is not ASCII",
                    bytes[offset], offset
                )),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(format!("odd number of bytes ({})", bytes.len()));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|e| e.to_string())
            }
            Encoding::Base64 => Ok(STANDARD.encode(bytes)),
            Encoding::Base64Url => Ok(URL_SAFE_NO_PAD.encode(bytes)),
            Encoding::Hex => Ok(hex::encode(bytes)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when an encoding name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown encoding '{0}'")]
pub struct UnknownEncoding(pub String);

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "ascii" => Ok(Encoding::Ascii),
            "latin1" | "binary" => Ok(Encoding::Latin1),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Encoding::Utf16Le),
            "base64" => Ok(Encoding::Base64),
            "base64url" => Ok(Encoding::Base64Url),
            "hex" => Ok(Encoding::Hex),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}
