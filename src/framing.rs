//! Length-prefixed blob framing and its base64 wrapper.
//!
//! Each obfuscated token is stored as a big-endian `u16` length followed by
//! that many bytes. The whole blob is then base64-encoded before being
//! handed to the AES layer.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{Error, Result};

/// Concatenates length-prefixed obfuscated tokens into one blob.
pub fn build_blob(tokens: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut blob = Vec::new();
    for token in tokens {
        let len = u16::try_from(token.len()).map_err(|_| Error::OutputTooLarge(token.len()))?;
        blob.extend_from_slice(&len.to_be_bytes());
        blob.extend_from_slice(token);
    }
    Ok(blob)
}

/// Reads length-prefixed records from `blob` until it is exactly consumed.
/// There is no overall token count in the wire format; the blob's own
/// length is the only terminator.
pub fn parse_blob(blob: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut tokens = Vec::new();
    let mut offset = 0usize;
    while offset < blob.len() {
        if offset + 2 > blob.len() {
            return Err(Error::MalformedBlob("length prefix overruns blob".into()));
        }
        let len = u16::from_be_bytes([blob[offset], blob[offset + 1]]) as usize;
        offset += 2;
        if offset + len > blob.len() {
            return Err(Error::MalformedBlob("token body overruns blob".into()));
        }
        tokens.push(blob[offset..offset + len].to_vec());
        offset += len;
    }
    Ok(tokens)
}

/// Standard-alphabet base64 encode, used both for the outer blob and the
/// AES ciphertext segment.
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Standard-alphabet base64 decode. Accepts either a `&str` or raw bytes,
/// since the AES layer operates on byte slices carved out of a transit
/// string without re-validating them as UTF-8.
pub fn decode_base64<T: AsRef<[u8]>>(s: T) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_round_trips() {
        let tokens = vec![b"cat".to_vec(), b"".to_vec(), b"dog food".to_vec()];
        let blob = build_blob(&tokens).unwrap();
        let parsed = parse_blob(&blob).unwrap();
        assert_eq!(parsed, tokens);
    }

    #[test]
    fn empty_mnemonic_is_one_empty_token() {
        let tokens = vec![b"".to_vec()];
        let blob = build_blob(&tokens).unwrap();
        assert_eq!(blob, vec![0x00, 0x00]);
        let parsed = parse_blob(&blob).unwrap();
        assert_eq!(parsed, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn oversized_token_is_rejected() {
        let huge = vec![0u8; 0x1_0000];
        let err = build_blob(&[huge]).unwrap_err();
        assert!(matches!(err, Error::OutputTooLarge(_)));
    }

    #[test]
    fn base64_round_trips() {
        let data = b"arbitrary bytes \x00\xff";
        let encoded = encode_base64(data);
        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn frame_parse_offsets_advance_to_exact_length() {
        let tokens = vec![b"a".to_vec(), b"bcd".to_vec()];
        let blob = build_blob(&tokens).unwrap();
        let mut offset = 0usize;
        for t in &tokens {
            let len = u16::from_be_bytes([blob[offset], blob[offset + 1]]) as usize;
            offset += 2 + len;
            assert_eq!(len, t.len());
        }
        assert_eq!(offset, blob.len());
    }
}
