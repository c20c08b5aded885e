//! Error types for the Darkstar core.

use thiserror::Error;

/// Result type for Darkstar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy surfaced by encrypt/decrypt and their building blocks.
///
/// The core never prints; callers (the CLI binary) map these to exit codes
/// and messages.
#[derive(Error, Debug)]
pub enum Error {
    /// Reverse key base64 decode failed, or it parsed as neither a JSON
    /// array nor the nibble-packed layout.
    #[error("invalid reverse key: {0}")]
    InvalidReverseKey(String),

    /// Envelope JSON malformed, or its `v` field names an unsupported
    /// version.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// PBKDF2/AES failure: wrong password, padding error, or GCM tag
    /// mismatch. These are deliberately collapsed into one variant per the
    /// spec so a caller cannot distinguish "wrong password" from "corrupt
    /// ciphertext".
    #[error("decryption failed")]
    DecryptionError,

    /// Inner base64 was invalid, or a length prefix overran the blob.
    #[error("malformed blob: {0}")]
    MalformedBlob(String),

    /// A deobfuscated token was not valid UTF-8.
    #[error("invalid UTF-8 in deobfuscated token")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// A token's obfuscated length exceeded the 16-bit length-prefix limit.
    #[error("obfuscated token length {0} exceeds 0xFFFF")]
    OutputTooLarge(usize),

    /// The OS CSPRNG failed to supply salt/IV bytes.
    #[error("random source unavailable: {0}")]
    RandomSourceUnavailable(String),
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::MalformedBlob(format!("base64: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidEnvelope(format!("json: {e}"))
    }
}
