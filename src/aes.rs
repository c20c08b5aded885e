//! Outer AES layer: PBKDF2-HMAC-SHA256 key derivation feeding AES-256-CBC
//! (V1/V2) or AES-256-GCM (V3), plus the transit-string packing that glues
//! salt/IV/ciphertext together for the wire.

use aes::Aes256;
use aes_gcm::{
    aead::{Aead, KeyInit as GcmKeyInit},
    Aes256Gcm, Nonce as GcmNonce,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

const ITERATIONS: u32 = 600_000;
const KEY_SIZE: usize = 32;
const SALT_SIZE: usize = 16;
const CBC_IV_SIZE: usize = 16;
const GCM_IV_SIZE: usize = 12;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| Error::RandomSourceUnavailable(e.to_string()))?;
    Ok(buf)
}

fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, ITERATIONS, key.as_mut());
    key
}

/// Encrypts `plaintext` under AES-256-CBC with PKCS#7 padding, returning
/// `hex(salt) || hex(iv) || base64(ciphertext)`.
pub fn encrypt_cbc(password: &[u8], plaintext: &[u8]) -> Result<String> {
    let salt = random_bytes(SALT_SIZE)?;
    let iv = random_bytes(CBC_IV_SIZE)?;
    let key = derive_key(password, &salt);

    let ciphertext = Aes256CbcEnc::new_from_slices(key.as_slice(), &iv)
        .expect("key and iv are fixed-length constants")
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok(format!(
        "{}{}{}",
        hex::encode(&salt),
        hex::encode(&iv),
        crate::framing::encode_base64(&ciphertext)
    ))
}

/// Decrypts a `hex||hex||base64` CBC transit string. Any failure (bad
/// password, non-ASCII or too-short transit string, malformed hex/base64,
/// padding mismatch) collapses to `Error::DecryptionError`.
///
/// `transit` comes from an envelope that may be attacker-controlled, so it's
/// sliced as raw bytes rather than by `str` index: a multi-byte codepoint
/// straddling one of the fixed offsets would otherwise panic instead of
/// producing an error.
pub fn decrypt_cbc(password: &[u8], transit: &str) -> Result<Vec<u8>> {
    let bytes = transit.as_bytes();
    let salt_hex = bytes.get(..SALT_SIZE * 2).ok_or(Error::DecryptionError)?;
    let iv_hex = bytes
        .get(SALT_SIZE * 2..SALT_SIZE * 2 + CBC_IV_SIZE * 2)
        .ok_or(Error::DecryptionError)?;
    let ct_b64 = bytes
        .get(SALT_SIZE * 2 + CBC_IV_SIZE * 2..)
        .ok_or(Error::DecryptionError)?;

    let salt = hex::decode(salt_hex).map_err(|_| Error::DecryptionError)?;
    let iv = hex::decode(iv_hex).map_err(|_| Error::DecryptionError)?;
    let ciphertext = crate::framing::decode_base64(ct_b64).map_err(|_| Error::DecryptionError)?;

    let key = derive_key(password, &salt);
    Aes256CbcDec::new_from_slices(key.as_slice(), &iv)
        .map_err(|_| Error::DecryptionError)?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| Error::DecryptionError)
}

/// Encrypts `plaintext` under AES-256-GCM (no AAD), returning
/// `hex(salt) || hex(iv) || base64(ciphertext || tag)`.
pub fn encrypt_gcm(password: &[u8], plaintext: &[u8]) -> Result<String> {
    let salt = random_bytes(SALT_SIZE)?;
    let iv = random_bytes(GCM_IV_SIZE)?;
    let key = derive_key(password, &salt);

    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).expect("key is a fixed-length constant");
    let nonce = GcmNonce::from_slice(&iv);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| Error::DecryptionError)?;

    Ok(format!(
        "{}{}{}",
        hex::encode(&salt),
        hex::encode(&iv),
        crate::framing::encode_base64(&ciphertext)
    ))
}

/// Decrypts a `hex||hex||base64` GCM transit string. Tag mismatch, bad
/// password, non-ASCII or too-short transit string, and malformed
/// hex/base64 all collapse to `Error::DecryptionError`.
///
/// As in `decrypt_cbc`, `transit` is sliced as raw bytes rather than by
/// `str` index, since it may come from an attacker-controlled envelope.
pub fn decrypt_gcm(password: &[u8], transit: &str) -> Result<Vec<u8>> {
    let bytes = transit.as_bytes();
    let salt_hex = bytes.get(..SALT_SIZE * 2).ok_or(Error::DecryptionError)?;
    let iv_hex = bytes
        .get(SALT_SIZE * 2..SALT_SIZE * 2 + GCM_IV_SIZE * 2)
        .ok_or(Error::DecryptionError)?;
    let ct_b64 = bytes
        .get(SALT_SIZE * 2 + GCM_IV_SIZE * 2..)
        .ok_or(Error::DecryptionError)?;

    let salt = hex::decode(salt_hex).map_err(|_| Error::DecryptionError)?;
    let iv = hex::decode(iv_hex).map_err(|_| Error::DecryptionError)?;
    let payload = crate::framing::decode_base64(ct_b64).map_err(|_| Error::DecryptionError)?;

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).expect("key is a fixed-length constant");
    let nonce = GcmNonce::from_slice(&iv);
    cipher
        .decrypt(nonce, payload.as_ref())
        .map_err(|_| Error::DecryptionError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbc_round_trips() {
        let password = b"correct horse battery staple";
        let plaintext = b"some base64-looking payload==";
        let transit = encrypt_cbc(password, plaintext).unwrap();
        let decrypted = decrypt_cbc(password, &transit).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn cbc_wrong_password_fails() {
        let plaintext = b"secret";
        let transit = encrypt_cbc(b"right", plaintext).unwrap();
        let err = decrypt_cbc(b"wrong", &transit).unwrap_err();
        assert!(matches!(err, Error::DecryptionError));
    }

    #[test]
    fn gcm_round_trips() {
        let password = b"correct horse battery staple";
        let plaintext = b"some base64-looking payload==";
        let transit = encrypt_gcm(password, plaintext).unwrap();
        let decrypted = decrypt_gcm(password, &transit).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn gcm_tampered_tag_fails() {
        let password = b"correct horse battery staple";
        let plaintext = b"payload";
        let mut transit = encrypt_gcm(password, plaintext).unwrap();
        let last = transit.pop().unwrap();
        let replacement = if last == 'A' { 'B' } else { 'A' };
        transit.push(replacement);
        let err = decrypt_gcm(password, &transit).unwrap_err();
        assert!(matches!(err, Error::DecryptionError));
    }

    #[test]
    fn malformed_transit_string_fails_cleanly() {
        let err = decrypt_cbc(b"pw", "not-hex-not-base64").unwrap_err();
        assert!(matches!(err, Error::DecryptionError));
    }

    #[test]
    fn multibyte_transit_string_does_not_panic() {
        let transit: String = std::iter::repeat('€').take(40).collect();
        let err = decrypt_cbc(b"pw", &transit).unwrap_err();
        assert!(matches!(err, Error::DecryptionError));
        let err = decrypt_gcm(b"pw", &transit).unwrap_err();
        assert!(matches!(err, Error::DecryptionError));
    }
}
