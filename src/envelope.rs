//! Version envelope: the `{"v":N,"data":"..."}` JSON wrapper for V2/V3, a
//! bare transit string for legacy V1, and the top-level `encrypt`/`decrypt`
//! entry points composed from every module beneath this one.

use serde::{Deserialize, Serialize};

use crate::aes;
use crate::error::{Error, Result};
use crate::framing;
use crate::pipeline;
use crate::reverse_key;
use crate::version::Version;

#[derive(Serialize, Deserialize)]
struct EnvelopeJson {
    v: u8,
    data: String,
}

fn emit(transit: &str, version: Version) -> Result<String> {
    match version.envelope_tag() {
        None => Ok(transit.to_string()),
        Some(tag) => Ok(serde_json::to_string(&EnvelopeJson {
            v: tag,
            data: transit.to_string(),
        })?),
    }
}

/// Splits `encrypted_data` into its AES transit string and the version it
/// was produced under. Per `spec.md` §4.6: if the trimmed input starts with
/// `{`, parse as a JSON envelope; otherwise it's a bare V1 string.
fn parse(encrypted_data: &str) -> Result<(String, Version)> {
    let trimmed = encrypted_data.trim();
    if !trimmed.starts_with('{') {
        return Ok((trimmed.to_string(), Version::V1));
    }
    let envelope: EnvelopeJson = serde_json::from_str(trimmed)?;
    let version = match envelope.v {
        2 => Version::V2,
        3 => Version::V3,
        other => {
            return Err(Error::InvalidEnvelope(format!(
                "unsupported envelope version {other}"
            )))
        }
    };
    Ok((envelope.data, version))
}

/// Splits a mnemonic into its ordered tokens, preserving empty tokens from
/// repeated or leading/trailing spaces (`spec.md` §3).
fn split_tokens(mnemonic: &str) -> Vec<&str> {
    mnemonic.split(' ').collect()
}

/// Encrypts `mnemonic` under `password`, returning `(encryptedData,
/// reverseKey)` as described in `spec.md` §1 and §6.
pub fn encrypt(mnemonic: &str, password: &str, version: Version) -> Result<(String, String)> {
    let password_bytes = password.as_bytes();
    let tokens = split_tokens(mnemonic);

    let mut obfuscated = Vec::with_capacity(tokens.len());
    let mut reverse_keys = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let encoded = pipeline::encode_token(password_bytes, token, version)?;
        obfuscated.push(encoded.bytes);
        reverse_keys.push(encoded.reverse_key);
    }

    let blob = framing::build_blob(&obfuscated)?;
    let inner = framing::encode_base64(&blob);

    let transit = if version.is_v3() {
        aes::encrypt_gcm(password_bytes, inner.as_bytes())?
    } else {
        aes::encrypt_cbc(password_bytes, inner.as_bytes())?
    };

    let encrypted_data = emit(&transit, version)?;
    let reverse_key_str = reverse_key::encode(&reverse_keys, version)?;
    Ok((encrypted_data, reverse_key_str))
}

/// Decrypts `(encrypted_data, reverse_key)` under `password` back to the
/// original mnemonic, per `spec.md` §1 and §4.3's decrypt sequence.
pub fn decrypt(encrypted_data: &str, reverse_key: &str, password: &str) -> Result<String> {
    let password_bytes = password.as_bytes();
    let (transit, version) = parse(encrypted_data)?;

    let inner_bytes = if version.is_v3() {
        aes::decrypt_gcm(password_bytes, &transit)?
    } else {
        aes::decrypt_cbc(password_bytes, &transit)?
    };
    let inner = String::from_utf8(inner_bytes)?;
    let blob = framing::decode_base64(&inner)?;
    let tokens = framing::parse_blob(&blob)?;

    let reverse_keys = reverse_key::decode(reverse_key, version)?;
    if reverse_keys.len() != tokens.len() {
        return Err(Error::InvalidReverseKey(format!(
            "reverse key has {} entries but blob has {} tokens",
            reverse_keys.len(),
            tokens.len()
        )));
    }

    let mut words = Vec::with_capacity(tokens.len());
    for (token, rk) in tokens.iter().zip(reverse_keys.iter()) {
        words.push(pipeline::decode_token(password_bytes, token, rk, version)?);
    }
    Ok(words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_envelope_is_bare_string() {
        let (encrypted, _) = encrypt("cat dog", "pw", Version::V1).unwrap();
        assert!(!encrypted.trim_start().starts_with('{'));
    }

    #[test]
    fn v2_and_v3_wrap_in_json_envelope() {
        let (v2, _) = encrypt("cat dog", "pw", Version::V2).unwrap();
        assert!(v2.starts_with(r#"{"v":2,"data":""#));
        let (v3, _) = encrypt("cat dog", "pw", Version::V3).unwrap();
        assert!(v3.starts_with(r#"{"v":3,"data":""#));
    }

    #[test]
    fn round_trips_across_all_versions() {
        for version in [Version::V1, Version::V2, Version::V3] {
            let (encrypted, rk) = encrypt("cat dog fish bird", "hunter2", version).unwrap();
            let decrypted = decrypt(&encrypted, &rk, "hunter2").unwrap();
            assert_eq!(decrypted, "cat dog fish bird", "version {version:?}");
        }
    }

    #[test]
    fn empty_mnemonic_round_trips() {
        let (encrypted, rk) = encrypt("", "", Version::V3).unwrap();
        let decrypted = decrypt(&encrypted, &rk, "").unwrap();
        assert_eq!(decrypted, "");
    }

    #[test]
    fn repeated_spaces_preserve_empty_tokens() {
        let (encrypted, rk) = encrypt("x  y", "pw", Version::V2).unwrap();
        let decrypted = decrypt(&encrypted, &rk, "pw").unwrap();
        assert_eq!(decrypted, "x  y");
    }

    #[test]
    fn wrong_password_fails_to_decrypt() {
        let (encrypted, rk) = encrypt("cat dog", "right", Version::V3).unwrap();
        let err = decrypt(&encrypted, &rk, "wrong").unwrap_err();
        assert!(matches!(err, Error::DecryptionError));
    }

    #[test]
    fn multibyte_password_round_trips_under_v2() {
        let (encrypted, rk) = encrypt("x y", "π", Version::V2).unwrap();
        let decrypted = decrypt(&encrypted, &rk, "π").unwrap();
        assert_eq!(decrypted, "x y");
    }
}
