//! Minimal PNG walker that pulls a character definition out of a `tEXt` chunk.
//!
//! Only the signature and chunk headers are consulted. Chunk CRCs are never
//! read, and a header that points past the end of the buffer ends the scan
//! instead of failing it.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use tracing::debug;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Keyword under which card tools store the base64 encoded card JSON.
pub const CHARA_KEYWORD: &str = "chara";

const TEXT_CHUNK: [u8; 4] = *b"tEXt";
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_CRC_LEN: usize = 4;

// Card writers are inconsistent about padding and trailing bits.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, PartialEq, Eq)]
pub enum PngTextError {
    InvalidSignature,
    MissingKeyword(String),
}

impl fmt::Display for PngTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PngTextError::InvalidSignature => write!(f, "file is not a PNG"),
            PngTextError::MissingKeyword(keyword) => {
                write!(f, "missing '{}' tEXt metadata", keyword)
            }
        }
    }
}

impl std::error::Error for PngTextError {}

/// One chunk as laid out in the stream, borrowed from the input buffer.
struct RawChunk<'a> {
    chunk_type: [u8; 4],
    data: &'a [u8],
}

/// Iterates chunks after the signature, stopping at the first header or
/// payload that would read past the buffer.
struct Chunks<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Chunks<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: PNG_SIGNATURE.len(),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = RawChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let header_end = self.offset.checked_add(CHUNK_HEADER_LEN)?;
        let header = self.data.get(self.offset..header_end)?;
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let chunk_type = [header[4], header[5], header[6], header[7]];

        let Some(data) = header_end
            .checked_add(length)
            .and_then(|data_end| self.data.get(header_end..data_end))
        else {
            debug!(
                offset = self.offset,
                length, "chunk runs past end of buffer, ending scan"
            );
            self.offset = self.data.len();
            return None;
        };

        // The trailing CRC may be missing on the final chunk; the next header
        // read simply fails in that case.
        self.offset = header_end
            .saturating_add(length)
            .saturating_add(CHUNK_CRC_LEN);

        Some(RawChunk { chunk_type, data })
    }
}

/// Returns the decoded text stored under `keyword` in the first matching
/// `tEXt` chunk.
///
/// The stored text is expected to be base64. When it does not decode, the raw
/// text is returned as-is so pre-base64 or hand-edited cards still import.
pub fn extract_text(data: &[u8], keyword: &str) -> Result<String, PngTextError> {
    if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(PngTextError::InvalidSignature);
    }

    for chunk in Chunks::new(data) {
        if chunk.chunk_type != TEXT_CHUNK {
            continue;
        }

        let Some(null_pos) = memchr::memchr(0, chunk.data) else {
            debug!("tEXt chunk without keyword separator, skipping");
            continue;
        };

        let keyword_bytes = &chunk.data[..null_pos];
        if keyword_bytes != keyword.as_bytes() {
            debug!(
                keyword = %String::from_utf8_lossy(keyword_bytes),
                "skipping unrelated tEXt chunk"
            );
            continue;
        }

        return Ok(decode_payload(&chunk.data[null_pos + 1..]));
    }

    Err(PngTextError::MissingKeyword(keyword.to_string()))
}

/// Convenience wrapper for the card keyword that only reports presence.
pub fn extract_card_text(data: &[u8]) -> Option<String> {
    match extract_text(data, CHARA_KEYWORD) {
        Ok(text) => Some(text),
        Err(err) => {
            debug!(%err, "no card text in buffer");
            None
        }
    }
}

fn decode_payload(value_bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(value_bytes);
    // Wrapped payloads carry line breaks anywhere in the body.
    let compact: Vec<u8> = value_bytes
        .iter()
        .copied()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    match LENIENT_BASE64.decode(&compact) {
        Ok(decoded) => String::from_utf8_lossy(&decoded).into_owned(),
        Err(err) => {
            debug!(%err, "chara payload is not base64, using raw text");
            text.into_owned()
        }
    }
}
