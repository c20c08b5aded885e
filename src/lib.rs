//! Darkstar: password-based encryption for short, space-delimited token
//! sequences (originally BIP-39-style mnemonics).
//!
//! This is obfuscation, not a cryptographically sound scheme in the
//! academic sense. An outer AES layer wraps an inner per-token pipeline
//! driven by seeded PRNGs and a 12-entry transform table. Its defining
//! property is **byte-exact cross-language interoperability**: an artifact
//! produced by one implementation must decrypt to the identical plaintext
//! in every other, quirks included. Nothing here is "improved" relative to
//! the reference behavior; it is reproduced exactly.
//!
//! The two entry points are [`encrypt`] and [`decrypt`]. Everything else in
//! this crate is a building block they compose.

mod aes;
mod envelope;
mod error;
mod framing;
mod obfuscate;
mod pipeline;
mod prng;
mod reverse_key;
mod version;

pub use error::{Error, Result};
pub use version::Version;

/// Encrypts `mnemonic` under `password`, returning `(encryptedData,
/// reverseKey)`. Draws fresh salt and IV from the OS CSPRNG; every other
/// input is deterministic.
pub fn encrypt(mnemonic: &str, password: &str, version: Version) -> Result<(String, String)> {
    envelope::encrypt(mnemonic, password, version)
}

/// Decrypts an `(encryptedData, reverseKey)` pair back to the original
/// mnemonic. The version is recovered from `encrypted_data`'s envelope, not
/// passed explicitly.
pub fn decrypt(encrypted_data: &str, reverse_key: &str, password: &str) -> Result<String> {
    envelope::decrypt(encrypted_data, reverse_key, password)
}
