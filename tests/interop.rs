//! Cross-module round-trip and fixed-acceptance-vector tests (`spec.md` §8).
//! Salt and IV are random per call, so these assert round-trip behavior,
//! never byte-equality of ciphertext across runs.

use base64::{engine::general_purpose::STANDARD, Engine};
use darkstar::{decrypt, encrypt, Version};

#[test]
fn scenario_1_basic_v3_round_trip() {
    let m = "cat dog fish bird";
    let p = "MySecre!Password123";
    let (encrypted, rk) = encrypt(m, p, Version::V3).unwrap();
    assert_eq!(decrypt(&encrypted, &rk, p).unwrap(), m);
}

#[test]
fn scenario_2_longer_mnemonic_v3_round_trip() {
    let m = "apple banana cherry date elderberry fig grape honeydew";
    let p = "Strong!Password#2026";
    let (encrypted, rk) = encrypt(m, p, Version::V3).unwrap();
    assert_eq!(decrypt(&encrypted, &rk, p).unwrap(), m);
}

#[test]
fn scenario_3_empty_password_does_not_panic() {
    for version in [Version::V1, Version::V2, Version::V3] {
        let (encrypted, rk) = encrypt("a", "", version).unwrap();
        assert_eq!(decrypt(&encrypted, &rk, "").unwrap(), "a", "version {version:?}");
    }
}

#[test]
fn scenario_4_empty_mnemonic_round_trips() {
    for version in [Version::V1, Version::V2, Version::V3] {
        let (encrypted, rk) = encrypt("", "pw", version).unwrap();
        assert_eq!(decrypt(&encrypted, &rk, "pw").unwrap(), "", "version {version:?}");
    }
}

#[test]
fn scenario_5_v2_multibyte_password_and_fixed_cycle_depth() {
    let m = "x y";
    let p = "π";
    let (encrypted, rk) = encrypt(m, p, Version::V2).unwrap();
    assert_eq!(decrypt(&encrypted, &rk, p).unwrap(), m);

    // V2's reverse key is the legacy JSON-array form: base64 of a
    // whitespace-free JSON array of per-token index arrays, each exactly
    // 12 entries deep.
    let raw = STANDARD.decode(&rk).unwrap();
    assert_eq!(raw.first(), Some(&b'['));
    let keys: Vec<Vec<u32>> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(keys.len(), 2);
    for key in &keys {
        assert_eq!(key.len(), 12);
    }
}

#[test]
fn v3_cycle_depth_stays_within_12_to_64_for_every_token() {
    let m = "one two three four five six seven eight nine ten";
    let p = "hunter2";
    let (_, rk) = encrypt(m, p, Version::V3).unwrap();

    let raw = STANDARD.decode(&rk).unwrap();
    let mut offset = 0usize;
    let mut token_count = 0usize;
    while offset < raw.len() {
        let len = raw[offset] as usize;
        assert!((12..=64).contains(&len), "reverse key length {len} out of bounds");
        offset += 1 + len.div_ceil(2);
        token_count += 1;
    }
    assert_eq!(token_count, m.split(' ').count());
}

#[test]
fn repeated_spaces_round_trip_as_empty_tokens() {
    for version in [Version::V1, Version::V2, Version::V3] {
        let (encrypted, rk) = encrypt("one  two   three", "pw", version).unwrap();
        assert_eq!(
            decrypt(&encrypted, &rk, "pw").unwrap(),
            "one  two   three",
            "version {version:?}"
        );
    }
}

#[test]
fn v1_emits_a_bare_transit_string_not_json() {
    let (encrypted, _) = encrypt("cat dog", "pw", Version::V1).unwrap();
    assert!(!encrypted.trim_start().starts_with('{'));
}

#[test]
fn wrong_password_is_rejected_for_every_version() {
    for version in [Version::V1, Version::V2, Version::V3] {
        let (encrypted, rk) = encrypt("cat dog", "right-password", version).unwrap();
        let err = decrypt(&encrypted, &rk, "wrong-password").unwrap_err();
        assert!(err.to_string().to_lowercase().contains("decrypt") || format!("{err:?}").contains("Decryption"));
    }
}

#[test]
fn tampered_reverse_key_does_not_silently_recover_the_original_mnemonic() {
    let (encrypted, mut rk) = encrypt("cat dog", "pw", Version::V3).unwrap();
    // Flip the last base64 character so the decoded reverse key changes.
    let last = rk.pop().unwrap();
    let replacement = if last == 'A' { 'B' } else { 'A' };
    rk.push(replacement);
    match decrypt(&encrypted, &rk, "pw") {
        Ok(mnemonic) => assert_ne!(mnemonic, "cat dog"),
        Err(_) => {}
    }
}
