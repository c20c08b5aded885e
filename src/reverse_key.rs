//! Reverse-key wire codecs: a whitespace-free JSON array-of-arrays for
//! V1/V2, and a length-prefixed nibble-packed sequence for V3.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{Error, Result};
use crate::version::Version;

/// `base64(JSON.stringify(reverse_key))`, `reverse_key` being an array of
/// per-token index arrays, e.g. `[[6,11,0,...],[4,2,...]]`, no whitespace.
fn encode_json(keys: &[Vec<u8>]) -> Result<String> {
    let as_ints: Vec<Vec<u32>> = keys
        .iter()
        .map(|k| k.iter().map(|&b| u32::from(b)).collect())
        .collect();
    let json = serde_json::to_string(&as_ints)
        .map_err(|e| Error::InvalidReverseKey(format!("json: {e}")))?;
    Ok(STANDARD.encode(json))
}

fn decode_json(raw: &[u8]) -> Result<Vec<Vec<u8>>> {
    let s = std::str::from_utf8(raw)
        .map_err(|_| Error::InvalidReverseKey("json reverse key is not valid UTF-8".into()))?;
    let as_ints: Vec<Vec<u32>> = serde_json::from_str(s)
        .map_err(|e| Error::InvalidReverseKey(format!("json: {e}")))?;
    as_ints
        .into_iter()
        .map(|key| {
            key.into_iter()
                .map(|v| {
                    u8::try_from(v)
                        .map_err(|_| Error::InvalidReverseKey(format!("index {v} out of range")))
                })
                .collect()
        })
        .collect()
}

/// Appends one token's `(len_byte, packed nibbles)` chunk to `out`.
fn encode_packed_chunk(out: &mut Vec<u8>, indices: &[u8]) -> Result<()> {
    let len = u8::try_from(indices.len())
        .map_err(|_| Error::InvalidReverseKey("reverse key longer than 255 entries".into()))?;
    out.push(len);
    for pair in indices.chunks(2) {
        let hi = pair[0] & 0x0F;
        let lo = pair.get(1).copied().unwrap_or(0) & 0x0F;
        out.push((hi << 4) | lo);
    }
    Ok(())
}

fn encode_packed(keys: &[Vec<u8>]) -> Result<String> {
    let mut out = Vec::new();
    for key in keys {
        encode_packed_chunk(&mut out, key)?;
    }
    Ok(STANDARD.encode(out))
}

/// Reads one `(len_byte, packed nibbles)` chunk starting at `offset`,
/// returning the decoded indices and the offset just past the chunk.
fn decode_packed_chunk(raw: &[u8], offset: usize) -> Result<(Vec<u8>, usize)> {
    let &len = raw.get(offset).ok_or_else(|| {
        Error::InvalidReverseKey("packed reverse key ends before a length byte".into())
    })?;
    let len = len as usize;
    let body_start = offset + 1;
    let body_len = len.div_ceil(2);
    if raw.len() < body_start + body_len {
        return Err(Error::InvalidReverseKey(
            "packed reverse key shorter than its length byte claims".into(),
        ));
    }
    let body = &raw[body_start..body_start + body_len];
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let byte = body[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        out.push(nibble);
    }
    Ok((out, body_start + body_len))
}

/// Reads self-describing `(len, nibbles)` chunks until `raw` is exactly
/// consumed. There is no overall token count in the wire format.
fn decode_packed(raw: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut offset = 0;
    let mut keys = Vec::new();
    while offset < raw.len() {
        let (key, next_offset) = decode_packed_chunk(raw, offset)?;
        keys.push(key);
        offset = next_offset;
    }
    Ok(keys)
}

/// Decodes with an implicit length of 12 per token, for the fallback path
/// where no length byte is present (`spec.md` §4.5's third dispatch branch).
/// Each token consumes exactly 6 bytes; the buffer must be an exact
/// multiple of that.
fn decode_packed_implicit_len12(raw: &[u8]) -> Result<Vec<Vec<u8>>> {
    if raw.is_empty() || raw.len() % 6 != 0 {
        return Err(Error::InvalidReverseKey(
            "packed reverse key is not a multiple of the implicit 12-entry layout".into(),
        ));
    }
    let mut keys = Vec::with_capacity(raw.len() / 6);
    for chunk in raw.chunks(6) {
        let mut key = Vec::with_capacity(12);
        for i in 0..12 {
            let byte = chunk[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            key.push(nibble);
        }
        keys.push(key);
    }
    Ok(keys)
}

/// Serializes the full per-token reverse-key list per `version`'s wire
/// format.
pub fn encode(keys: &[Vec<u8>], version: Version) -> Result<String> {
    if version.is_v3() {
        encode_packed(keys)
    } else {
        encode_json(keys)
    }
}

/// Deserializes the full per-token reverse-key list, auto-detecting the
/// JSON-array form when `version` doesn't already pin it down.
///
/// `spec.md` §4.5's unpacking dispatch: an explicit V3 envelope always uses
/// the packed form with length bytes; otherwise sniff the decoded bytes,
/// falling back to the packed form with an implicit per-token length of 12.
pub fn decode(encoded: &str, version: Version) -> Result<Vec<Vec<u8>>> {
    let raw = STANDARD
        .decode(encoded)
        .map_err(|e| Error::InvalidReverseKey(format!("base64: {e}")))?;
    if version.is_v3() {
        return decode_packed(&raw);
    }
    if raw.first() == Some(&b'[') {
        decode_json(&raw)
    } else {
        decode_packed_implicit_len12(&raw)
    }
}
