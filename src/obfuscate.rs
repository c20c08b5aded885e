//! The 12-entry obfuscation/deobfuscation function table.
//!
//! Indices 0-5 are unseeded; 6-11 require a seed and a PRNG instance drawn
//! from a caller-supplied factory. ASCII letter classes mean bytes in
//! `[0x41, 0x5A]` (uppercase) or `[0x61, 0x7A]` (lowercase); everything
//! else passes through unchanged.

use crate::error::{Error, Result};
use crate::prng::Prng;

/// Number of entries in the table. Used by the pipeline to derive the
/// selection permutation and by `SeededSub` is unrelated (that one
/// permutes 256 byte values, not 12 function indices).
pub const TABLE_LEN: usize = 12;

/// Lowest index requiring a seed and PRNG.
pub const FIRST_SEEDED: u8 = 6;

const INTERLEAVE_ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn is_upper(b: u8) -> bool {
    (0x41..=0x5A).contains(&b)
}

fn is_lower(b: u8) -> bool {
    (0x61..=0x7A).contains(&b)
}

// --- 0: Reverse ---

fn reverse(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    out.reverse();
    out
}

// --- 1: Atbash ---

fn atbash(data: &[u8]) -> Vec<u8> {
    data.iter()
        .map(|&b| {
            if is_upper(b) {
                0x5A - (b - 0x41)
            } else if is_lower(b) {
                0x7A - (b - 0x61)
            } else {
                b
            }
        })
        .collect()
}

// --- 2: CharCodes ---

fn char_codes_obfuscate(data: &[u8]) -> Vec<u8> {
    let parts: Vec<String> = data.iter().map(|b| b.to_string()).collect();
    parts.join(",").into_bytes()
}

fn char_codes_deobfuscate(data: &[u8]) -> Result<Vec<u8>> {
    decimal_csv_to_bytes(data, "char codes")
}

fn decimal_csv_to_bytes(data: &[u8], what: &str) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let s = std::str::from_utf8(data)
        .map_err(|_| Error::MalformedBlob(format!("{what}: non-UTF8 payload")))?;
    s.split(',')
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u16>()
                .map_err(|_| Error::MalformedBlob(format!("{what}: invalid decimal value {p:?}")))
                .and_then(|v| {
                    u8::try_from(v)
                        .map_err(|_| Error::MalformedBlob(format!("{what}: value {v} out of byte range")))
                })
        })
        .collect()
}

// --- 3: Binary ---

fn binary_obfuscate(data: &[u8]) -> Vec<u8> {
    let parts: Vec<String> = data.iter().map(|b| format!("{b:b}")).collect();
    parts.join(",").into_bytes()
}

fn binary_deobfuscate(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let s = std::str::from_utf8(data)
        .map_err(|_| Error::MalformedBlob("binary: non-UTF8 payload".into()))?;
    s.split(',')
        .filter(|p| !p.is_empty())
        .map(|p| {
            u8::from_str_radix(p, 2)
                .map_err(|_| Error::MalformedBlob(format!("binary: invalid value {p:?}")))
        })
        .collect()
}

// --- 4: Caesar / ROT13 ---

fn caesar(data: &[u8]) -> Vec<u8> {
    data.iter()
        .map(|&b| {
            if is_upper(b) {
                (b - 0x41 + 13) % 26 + 0x41
            } else if is_lower(b) {
                (b - 0x61 + 13) % 26 + 0x61
            } else {
                b
            }
        })
        .collect()
}

// --- 5: SwapAdjacent ---

fn swap_adjacent(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    let mut i = 0;
    while i + 1 < out.len() {
        out.swap(i, i + 1);
        i += 2;
    }
    out
}

// --- 6: Shuffle ---

fn shuffle(data: &[u8], prng: &mut dyn Prng) -> Vec<u8> {
    let mut out = data.to_vec();
    let n = out.len();
    for i in (1..n).rev() {
        let j = (prng.next() * (i as f64 + 1.0)) as usize;
        out.swap(i, j);
    }
    out
}

fn unshuffle(data: &[u8], prng: &mut dyn Prng) -> Vec<u8> {
    let n = data.len();
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = (prng.next() * (i as f64 + 1.0)) as usize;
        indices.swap(i, j);
    }
    let mut out = vec![0u8; n];
    for i in 0..n {
        out[indices[i]] = data[i];
    }
    out
}

// --- 7: XOR ---

fn xor(data: &[u8], seed: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &b)| b ^ seed[i % seed.len()])
        .collect()
}

// --- 8: Interleave ---

fn interleave(data: &[u8], prng: &mut dyn Prng) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    for &b in data {
        out.push(b);
        let idx = (prng.next() * INTERLEAVE_ALPHABET.len() as f64) as usize;
        out.push(INTERLEAVE_ALPHABET[idx.min(INTERLEAVE_ALPHABET.len() - 1)]);
    }
    out
}

fn uninterleave(data: &[u8]) -> Vec<u8> {
    data.iter().step_by(2).copied().collect()
}

// --- 9: Vigenere-additive ---

fn vigenere_obfuscate(data: &[u8], seed: &[u8]) -> Vec<u8> {
    let parts: Vec<String> = data
        .iter()
        .enumerate()
        .map(|(i, &b)| (u16::from(b) + u16::from(seed[i % seed.len()])).to_string())
        .collect();
    parts.join(",").into_bytes()
}

fn vigenere_deobfuscate(data: &[u8], seed: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let s = std::str::from_utf8(data)
        .map_err(|_| Error::MalformedBlob("vigenere: non-UTF8 payload".into()))?;
    s.split(',')
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, p)| {
            let combined: i64 = p
                .parse()
                .map_err(|_| Error::MalformedBlob(format!("vigenere: invalid value {p:?}")))?;
            let key = i64::from(seed[i % seed.len()]);
            Ok((combined - key) as u8)
        })
        .collect()
}

// --- 10: BlockReverse ---

fn block_reverse(data: &[u8], prng: &mut dyn Prng) -> Vec<u8> {
    let block_size = (prng.next() * (data.len() as f64 / 2.0)) as usize + 2;
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks(block_size) {
        out.extend(chunk.iter().rev());
    }
    out
}

// --- 11: SeededSub ---

fn permutation_256(prng: &mut dyn Prng) -> [u8; 256] {
    let mut perm: [u16; 256] = {
        let mut a = [0u16; 256];
        for (i, slot) in a.iter_mut().enumerate() {
            *slot = i as u16;
        }
        a
    };
    for i in (1..256).rev() {
        let j = (prng.next() * (i as f64 + 1.0)) as usize;
        perm.swap(i, j);
    }
    let mut out = [0u8; 256];
    for (i, v) in perm.iter().enumerate() {
        out[i] = *v as u8;
    }
    out
}

fn seeded_sub(data: &[u8], prng: &mut dyn Prng) -> Vec<u8> {
    let perm = permutation_256(prng);
    data.iter().map(|&b| perm[b as usize]).collect()
}

fn inverse_sub(data: &[u8], prng: &mut dyn Prng) -> Vec<u8> {
    let perm = permutation_256(prng);
    let mut inverse = [0u8; 256];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p as usize] = i as u8;
    }
    data.iter().map(|&b| inverse[b as usize]).collect()
}

/// A seeded transform's seed plus the means to construct a fresh PRNG from
/// an arbitrary seed string (each call gets its own generator instance,
/// matching the reference's `prng_factory` callback).
pub struct SeedContext<'a> {
    pub seed: &'a [u8],
    pub prng_factory: &'a dyn Fn(&str) -> Box<dyn Prng>,
}

impl<'a> SeedContext<'a> {
    fn prng(&self) -> Result<Box<dyn Prng>> {
        let seed_str = std::str::from_utf8(self.seed)
            .map_err(|_| Error::MalformedBlob("obfuscator seed is not valid UTF-8".into()))?;
        Ok((self.prng_factory)(seed_str))
    }
}

/// Applies obfuscator `index` to `data`. `ctx` is required for indices
/// `>= FIRST_SEEDED` and ignored otherwise.
pub fn obfuscate(index: u8, data: &[u8], ctx: Option<&SeedContext>) -> Result<Vec<u8>> {
    match index {
        0 => Ok(reverse(data)),
        1 => Ok(atbash(data)),
        2 => Ok(char_codes_obfuscate(data)),
        3 => Ok(binary_obfuscate(data)),
        4 => Ok(caesar(data)),
        5 => Ok(swap_adjacent(data)),
        6 => {
            let ctx = require_ctx(ctx)?;
            let mut prng = ctx.prng()?;
            Ok(shuffle(data, prng.as_mut()))
        }
        7 => Ok(xor(data, require_ctx(ctx)?.seed)),
        8 => {
            let ctx = require_ctx(ctx)?;
            let mut prng = ctx.prng()?;
            Ok(interleave(data, prng.as_mut()))
        }
        9 => Ok(vigenere_obfuscate(data, require_ctx(ctx)?.seed)),
        10 => {
            let ctx = require_ctx(ctx)?;
            let mut prng = ctx.prng()?;
            Ok(block_reverse(data, prng.as_mut()))
        }
        11 => {
            let ctx = require_ctx(ctx)?;
            let mut prng = ctx.prng()?;
            Ok(seeded_sub(data, prng.as_mut()))
        }
        _ => Err(Error::MalformedBlob(format!("obfuscator index {index} out of range"))),
    }
}

/// Applies deobfuscator `index` to `data`, the inverse of [`obfuscate`].
pub fn deobfuscate(index: u8, data: &[u8], ctx: Option<&SeedContext>) -> Result<Vec<u8>> {
    match index {
        0 => Ok(reverse(data)),
        1 => Ok(atbash(data)),
        2 => char_codes_deobfuscate(data),
        3 => binary_deobfuscate(data),
        4 => Ok(caesar(data)),
        5 => Ok(swap_adjacent(data)),
        6 => {
            let ctx = require_ctx(ctx)?;
            let mut prng = ctx.prng()?;
            Ok(unshuffle(data, prng.as_mut()))
        }
        7 => Ok(xor(data, require_ctx(ctx)?.seed)),
        8 => Ok(uninterleave(data)),
        9 => vigenere_deobfuscate(data, require_ctx(ctx)?.seed),
        10 => {
            let ctx = require_ctx(ctx)?;
            let mut prng = ctx.prng()?;
            Ok(block_reverse(data, prng.as_mut()))
        }
        11 => {
            let ctx = require_ctx(ctx)?;
            let mut prng = ctx.prng()?;
            Ok(inverse_sub(data, prng.as_mut()))
        }
        _ => Err(Error::MalformedBlob(format!("obfuscator index {index} out of range"))),
    }
}

fn require_ctx<'a>(ctx: Option<&'a SeedContext>) -> Result<&'a SeedContext<'a>> {
    ctx.ok_or_else(|| Error::MalformedBlob("seeded obfuscator missing seed context".into()))
}
