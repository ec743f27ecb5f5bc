// Test helpers for character card testing
// Builds small but well-formed PNG buffers and card JSON fixtures.

#[cfg(test)]
pub(crate) mod helpers {
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine;
    use crc32fast::Hasher;
    use serde_json::Value;

    use crate::character::png_text::PNG_SIGNATURE;

    const TEST_IHDR: [u8; 13] = [
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
    ];

    const TEST_IDAT: [u8; 12] = [
        0x78, 0xDA, 0x63, 0x60, 0x60, 0x60, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01,
    ];

    /// Encode one chunk with a correct CRC.
    pub fn chunk(chunk_type: [u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + data.len());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(&chunk_type);
        out.extend_from_slice(data);
        let mut hasher = Hasher::new();
        hasher.update(&chunk_type);
        hasher.update(data);
        out.extend_from_slice(&hasher.finalize().to_be_bytes());
        out
    }

    /// Flip the CRC bits of an encoded chunk.
    pub fn corrupt_crc(mut encoded: Vec<u8>) -> Vec<u8> {
        let len = encoded.len();
        for byte in &mut encoded[len - 4..] {
            *byte ^= 0xFF;
        }
        encoded
    }

    pub fn text_chunk(keyword: &str, text: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(keyword.len() + 1 + text.len());
        data.extend_from_slice(keyword.as_bytes());
        data.push(0);
        data.extend_from_slice(text);
        chunk(*b"tEXt", &data)
    }

    /// A 1x1 PNG with `extra` chunks placed between IHDR and IDAT.
    pub fn build_png(extra: &[Vec<u8>]) -> Vec<u8> {
        let mut png = Vec::new();
        png.extend_from_slice(&PNG_SIGNATURE);
        png.extend_from_slice(&chunk(*b"IHDR", &TEST_IHDR));
        for encoded in extra {
            png.extend_from_slice(encoded);
        }
        png.extend_from_slice(&chunk(*b"IDAT", &TEST_IDAT));
        png.extend_from_slice(&chunk(*b"IEND", &[]));
        png
    }

    /// A PNG carrying `card` the way card editors write it.
    pub fn card_png(card: &Value) -> Vec<u8> {
        let encoded = BASE64_STANDARD.encode(card.to_string().as_bytes());
        build_png(&[text_chunk("chara", encoded.as_bytes())])
    }

    /// The card used across the end-to-end tests.
    pub fn detective_card() -> Value {
        serde_json::json!({
            "name": "沈墨",
            "first_mes": "你好",
            "character_book": {
                "entries": [
                    { "keys": ["书房"], "content": "案情", "enabled": true }
                ]
            }
        })
    }

    /// The same card wrapped in a V2 envelope.
    pub fn detective_card_v2() -> Value {
        serde_json::json!({
            "spec": "chara_card_v2",
            "spec_version": "2.0",
            "data": detective_card(),
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::character::png_text::extract_card_text;

        #[test]
        fn test_chunk_layout() {
            let encoded = chunk(*b"tEXt", b"ab");
            assert_eq!(encoded.len(), 14);
            assert_eq!(&encoded[..4], &[0, 0, 0, 2]);
            assert_eq!(&encoded[4..8], b"tEXt");
        }

        #[test]
        fn test_card_png_round_trip() {
            let card = detective_card();
            let text = extract_card_text(&card_png(&card)).unwrap();
            let parsed: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(parsed, card);
        }
    }
}
