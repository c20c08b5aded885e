//! Per-token obfuscation: function-order derivation, checksum derivation,
//! cycle depth selection, and the fold/replay that applies the obfuscator
//! table across a token.

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::obfuscate::{self, SeedContext, FIRST_SEEDED, TABLE_LEN};
use crate::prng::{ChaCha20Prng, Mulberry32, Prng};
use crate::version::Version;

/// Indices 2, 3, 8, 9 roughly double-to-quadruple their input's byte
/// length. Past the first 12-pass cycle in V3's deeper runs, they're
/// remapped to keep a 64-deep cycle from overflowing the blob's 16-bit
/// length prefix.
const EXPANDING_INDICES: [u8; 4] = [2, 3, 8, 9];

fn prng_factory(version: Version) -> Box<dyn Fn(&str) -> Box<dyn Prng>> {
    if version.is_v3() {
        Box::new(|s: &str| Box::new(ChaCha20Prng::new(s)) as Box<dyn Prng>)
    } else {
        Box::new(|s: &str| Box::new(Mulberry32::new(s)) as Box<dyn Prng>)
    }
}

fn fisher_yates_selection(seed: &str, version: Version) -> Vec<u8> {
    let mut selected: Vec<u8> = (0..TABLE_LEN as u8).collect();
    let mut prng = prng_factory(version)(seed);
    for i in (1..TABLE_LEN).rev() {
        let j = (prng.next() * (i as f64 + 1.0)) as usize;
        selected.swap(i, j);
    }
    selected
}

fn cycle_depth(seed: &str, version: Version) -> usize {
    if !version.is_v3() {
        return TABLE_LEN;
    }
    let digest = Sha256::digest(seed.as_bytes());
    let d = u16::from_be_bytes([digest[0], digest[1]]);
    TABLE_LEN + (u32::from(d) % 53) as usize
}

fn checksum_mod_997(indices: &[u8]) -> u32 {
    indices.iter().map(|&i| u32::from(i)).sum::<u32>() % 997
}

fn combined_seed(password: &[u8], checksum: u32) -> Vec<u8> {
    let mut out = password.to_vec();
    out.extend_from_slice(checksum.to_string().as_bytes());
    out
}

/// Result of obfuscating a single token: the obfuscated bytes and the
/// ordered list of obfuscator indices applied (the token's reverse key).
pub struct EncodedToken {
    pub bytes: Vec<u8>,
    pub reverse_key: Vec<u8>,
}

/// Encrypt-side fold: `spec.md` §4.3 steps 1-5.
pub fn encode_token(password: &[u8], word: &str, version: Version) -> Result<EncodedToken> {
    let password_str = std::str::from_utf8(password)
        .map_err(|_| Error::MalformedBlob("password is not valid UTF-8".into()))?;
    let selection_seed = format!("{password_str}{word}");

    let selected = fisher_yates_selection(&selection_seed, version);
    let depth = cycle_depth(&selection_seed, version);
    let checksum = checksum_mod_997(&selected);
    let seed = combined_seed(password, checksum);
    let factory = prng_factory(version);

    let mut current = word.as_bytes().to_vec();
    let mut reverse_key = Vec::with_capacity(depth);

    for i in 0..depth {
        let mut idx = selected[i % TABLE_LEN];
        if version.is_v3() && i >= TABLE_LEN && EXPANDING_INDICES.contains(&idx) {
            idx = (idx + 2) % TABLE_LEN as u8;
        }
        let ctx = seeded_ctx(idx, &seed, factory.as_ref());
        current = obfuscate::obfuscate(idx, &current, ctx.as_ref())?;
        reverse_key.push(idx);
    }

    Ok(EncodedToken {
        bytes: current,
        reverse_key,
    })
}

/// Decrypt-side replay: applies the deobfuscator table in reverse order of
/// the recorded reverse key, deriving `combined_seed` per `spec.md` §4.3's
/// decrypt formula (deliberately asymmetric with the encrypt-side one; see
/// `spec.md` §9).
pub fn decode_token(
    password: &[u8],
    encoded: &[u8],
    reverse_key: &[u8],
    version: Version,
) -> Result<String> {
    let checksum = if version.is_v3() {
        let mut seen = Vec::new();
        for &idx in reverse_key.iter().take(TABLE_LEN) {
            if !seen.contains(&idx) {
                seen.push(idx);
            }
        }
        checksum_mod_997(&seen)
    } else {
        checksum_mod_997(reverse_key)
    };
    let seed = combined_seed(password, checksum);
    let factory = prng_factory(version);

    let mut current = encoded.to_vec();
    for &idx in reverse_key.iter().rev() {
        let ctx = seeded_ctx(idx, &seed, factory.as_ref());
        current = obfuscate::deobfuscate(idx, &current, ctx.as_ref())?;
    }

    String::from_utf8(current).map_err(Error::from)
}

fn seeded_ctx<'a>(
    idx: u8,
    seed: &'a [u8],
    prng_factory: &'a dyn Fn(&str) -> Box<dyn Prng>,
) -> Option<SeedContext<'a>> {
    (idx >= FIRST_SEEDED).then_some(SeedContext { seed, prng_factory })
}
