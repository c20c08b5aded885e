//! Protocol version selection.

/// The three Darkstar protocol generations.
///
/// V1 is the legacy bare-string envelope, V2 introduced the `{"v":2,...}`
/// wrapper with a fixed obfuscation cycle depth, V3 added variable cycle
/// depth, the nibble-packed reverse key, and AES-256-GCM in place of CBC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
    V2,
    V3,
}

impl Default for Version {
    fn default() -> Self {
        Version::V3
    }
}

impl Version {
    /// V2 and V3 both use seeded per-token obfuscation; only the cycle
    /// depth and checksum-replay formula differ. V1 shares V2's crypto path
    /// end to end and only differs in envelope/reverse-key framing.
    pub fn is_v3(self) -> bool {
        matches!(self, Version::V3)
    }

    /// The JSON `v` tag emitted in the V2/V3 envelope. V1 has no envelope.
    pub fn envelope_tag(self) -> Option<u8> {
        match self {
            Version::V1 => None,
            Version::V2 => Some(2),
            Version::V3 => Some(3),
        }
    }
}
