//! Codec trait and implementations for turning records into bytes.
//!
//! A "codec" (coder/decoder) converts between message types and raw
//! bytes. The message types already know their text form; a codec only
//! decides how that text is encoded. This is the strategy pattern: the
//! server is generic over [`Codec`] and the encoding is swapped without
//! touching anything else.
//!
//! Two encodings are provided:
//!
//! - [`Utf8Codec`]: what browsers and most WebSocket clients send.
//! - [`Utf16Codec`]: little-endian UTF-16, as written by the legacy
//!   game client.
//!
//! [`Encoding`] picks one of them at runtime from configuration.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::ProtocolError;

/// A codec that can encode messages to bytes and decode bytes back.
///
/// ## Generic methods
///
/// - `encode<T: Display>` → anything with a text form can be sent.
/// - `decode<T: FromStr>` → anything that parses from text (with a
///   [`ProtocolError`] on failure) can be received. The server decodes
///   [`ClientMessage`](crate::ClientMessage)s; test clients decode
///   [`ServerMessage`](crate::ServerMessage)s with the same codec.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: fmt::Display>(&self, value: &T) -> Vec<u8>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidEncoding`] if the bytes are not
    /// valid text, or whatever the parser of `T` reports.
    fn decode<T>(&self, data: &[u8]) -> Result<T, ProtocolError>
    where
        T: FromStr<Err = ProtocolError>;

    /// Whether [`encode`](Codec::encode) always produces valid UTF-8,
    /// so the bytes can go out as a text frame.
    fn is_text(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Utf8Codec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes records as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl Codec for Utf8Codec {
    fn encode<T: fmt::Display>(&self, value: &T) -> Vec<u8> {
        value.to_string().into_bytes()
    }

    fn decode<T>(&self, data: &[u8]) -> Result<T, ProtocolError>
    where
        T: FromStr<Err = ProtocolError>,
    {
        let text = std::str::from_utf8(data)
            .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))?;
        text.parse()
    }

    fn is_text(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Utf16Codec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes records as little-endian UTF-16, two bytes per
/// code unit, without a byte-order mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf16Codec;

impl Codec for Utf16Codec {
    fn encode<T: fmt::Display>(&self, value: &T) -> Vec<u8> {
        value
            .to_string()
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect()
    }

    fn decode<T>(&self, data: &[u8]) -> Result<T, ProtocolError>
    where
        T: FromStr<Err = ProtocolError>,
    {
        if data.len() % 2 != 0 {
            return Err(ProtocolError::InvalidEncoding(format!(
                "odd byte count {} for UTF-16",
                data.len()
            )));
        }
        let units: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let text =
            String::from_utf16(&units).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))?;
        text.parse()
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Runtime choice between the two codecs, as named in configuration
/// files (`"utf8"` or `"utf16"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16,
}

impl Codec for Encoding {
    fn encode<T: fmt::Display>(&self, value: &T) -> Vec<u8> {
        match self {
            Self::Utf8 => Utf8Codec.encode(value),
            Self::Utf16 => Utf16Codec.encode(value),
        }
    }

    fn decode<T>(&self, data: &[u8]) -> Result<T, ProtocolError>
    where
        T: FromStr<Err = ProtocolError>,
    {
        match self {
            Self::Utf8 => Utf8Codec.decode(data),
            Self::Utf16 => Utf16Codec.decode(data),
        }
    }

    fn is_text(&self) -> bool {
        match self {
            Self::Utf8 => Utf8Codec.is_text(),
            Self::Utf16 => Utf16Codec.is_text(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("utf8"),
            Self::Utf16 => f.write_str("utf16"),
        }
    }
}
