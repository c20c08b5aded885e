//! Deterministic PRNGs used to seed per-token obfuscation.
//!
//! Both generators expose the same contract: seed from a UTF-8 string,
//! then draw uniform floats in `[0, 1)` one `u32` division at a time. All
//! arithmetic is 32-bit wrapping; this must be reproduced bit-exactly for
//! cross-language interop, so every operation below is written with
//! `wrapping_*`/`rotate_left` rather than relying on release-mode overflow
//! behavior.

use sha2::{Digest, Sha256};

/// Shared interface so the pipeline and obfuscator table can stay
/// oblivious to which generation's PRNG backs a given seed.
pub trait Prng {
    fn next(&mut self) -> f64;
}

/// Seeds iterate UTF-16 code units of the input string, matching the
/// reference `charCodeAt` semantics. Supplementary-plane codepoints yield
/// two surrogate code units, which is what the reference does too.
fn utf16_units(s: &str) -> impl Iterator<Item = u32> + '_ {
    s.encode_utf16().map(u32::from)
}

/// V2 PRNG: a 32-bit xorshift-multiply mixer seeded by folding UTF-16 code
/// units into a single state word.
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: &str) -> Self {
        let mut state: u32 = 0;
        for c in utf16_units(seed) {
            state = (state ^ c).wrapping_mul(3432918353);
            state = state.rotate_left(13);
        }
        state = (state ^ (state >> 16)).wrapping_mul(2246822507);
        state = (state ^ (state >> 13)).wrapping_mul(3266489909);
        state ^= state >> 16;
        Mulberry32 { state }
    }
}

impl Prng for Mulberry32 {
    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B79F5);
        let mut t = self.state ^ (self.state >> 15);
        t = t.wrapping_mul(self.state | 1);
        let mut term2 = t ^ (t >> 7);
        term2 = term2.wrapping_mul(t | 61);
        t = t.wrapping_add(term2) ^ t;
        let res = t ^ (t >> 14);
        f64::from(res) / 4294967296.0
    }
}

/// V3 PRNG. Despite the name, this is not RFC 7539 ChaCha20. It's a
/// bespoke 8-lane mixer seeded from SHA-256 of the input string. Kept
/// under this name because that's what the reference implementation
/// calls it, and byte-exact interop depends on reproducing its behavior,
/// not on cryptographic correctness of the name.
pub struct ChaCha20Prng {
    state: [u32; 8],
    counter: u32,
}

impl ChaCha20Prng {
    pub fn new(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let hex = hex::encode(digest);
        let mut state = [0u32; 8];
        for (i, slot) in state.iter_mut().enumerate() {
            let chunk = &hex[i * 8..(i + 1) * 8];
            *slot = u32::from_str_radix(chunk, 16).expect("hex digest chunk is always valid");
        }
        ChaCha20Prng { state, counter: 0 }
    }

    /// Low-32 truncation is identical whether the intermediate
    /// multiplication is signed or unsigned (per spec note); plain
    /// wrapping multiplication on `u32` reproduces the reference's
    /// signed-imul semantics exactly.
    fn imul(a: u32, b: u32) -> u32 {
        a.wrapping_mul(b)
    }
}

impl Prng for ChaCha20Prng {
    fn next(&mut self) -> f64 {
        self.counter = self.counter.wrapping_add(1);
        let c = self.counter;
        let i0 = (c % 8) as usize;
        let i1 = ((c + 3) % 8) as usize;
        let i2 = ((c + 5) % 8) as usize;

        let mut x = self.state[i0];
        let mut y = self.state[i1];
        let mut z = self.state[i2];

        x = x.wrapping_add(y).wrapping_add(c);
        z = (x ^ z).rotate_left(16);
        y = y.wrapping_add(z).wrapping_add(c.wrapping_mul(3));
        x = (x ^ y).rotate_left(12);

        self.state[i0] = x;
        self.state[i1] = y;
        self.state[i2] = z;

        let mut t = x.wrapping_add(y).wrapping_add(z);
        t = Self::imul(t ^ (t >> 15), t | 1);
        let term2 = Self::imul(t ^ (t >> 7), t | 61);
        t = t.wrapping_add(term2) ^ t;
        let res = t ^ (t >> 14);
        f64::from(res) / 4294967296.0
    }
}
