// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Deterministic pseudorandomness derived from a transcript key.
//!
//! Both sides of the protocol expand the 32-byte Fiat-Shamir digest into
//! challenge scalars, and the signer expands its 32-byte commitment seed
//! into a full-width exponent. The expansion is an HMAC-SHA-256 DRBG
//! (SP 800-90A shape): identical keys yield identical bit streams on every
//! platform, which the verifier relies on when it re-derives challenges.

use crate::{
    arith::bit_length,
    constants::{EXPONENT_SIZE, SPRIME_PREFIX},
};
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use unknown_order::BigNumber;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

fn mac(key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    let mut m = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        m.update(part);
    }
    m.finalize().into_bytes().into()
}

/// HMAC-SHA-256 deterministic random bit generator.
pub(crate) struct HmacDrbg {
    k: [u8; 32],
    v: [u8; 32],
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.k.zeroize();
        self.v.zeroize();
    }
}

impl HmacDrbg {
    pub(crate) fn new(seed: &[u8]) -> Self {
        let mut drbg = HmacDrbg {
            k: [0x00; 32],
            v: [0x01; 32],
        };
        drbg.reseed(seed);
        drbg
    }

    fn reseed(&mut self, seed: &[u8]) {
        self.k = mac(&self.k, &[&self.v, &[0x00], seed]);
        self.v = mac(&self.k, &[&self.v]);
        if !seed.is_empty() {
            self.k = mac(&self.k, &[&self.v, &[0x01], seed]);
            self.v = mac(&self.k, &[&self.v]);
        }
    }

    pub(crate) fn generate(&mut self, out: &mut [u8]) {
        let mut filled = 0;
        while filled < out.len() {
            self.v = mac(&self.k, &[&self.v]);
            let take = (out.len() - filled).min(32);
            out[filled..filled + take].copy_from_slice(&self.v[..take]);
            filled += take;
        }
        self.reseed(&[]);
    }
}

/// Uniform big-integer draws on top of [`HmacDrbg`].
pub(crate) struct Prng {
    drbg: HmacDrbg,
}

impl Prng {
    pub(crate) fn new(key: &[u8; 32]) -> Self {
        Prng {
            drbg: HmacDrbg::new(key),
        }
    }

    /// A uniform integer in `[0, 2^bits)`.
    pub(crate) fn random_bits(&mut self, bits: usize) -> BigNumber {
        if bits == 0 {
            return BigNumber::zero();
        }
        let bytes = (bits + 7) / 8;
        let mut buf = vec![0u8; bytes];
        self.drbg.generate(&mut buf);
        buf[0] &= 0xff >> (bytes * 8 - bits);
        let out = BigNumber::from_slice(&buf);
        buf.zeroize();
        out
    }

    /// A uniform integer in `[0, max)` by rejection sampling.
    pub(crate) fn random_int(&mut self, max: &BigNumber) -> BigNumber {
        let bits = bit_length(max);
        loop {
            let candidate = self.random_bits(bits);
            if &candidate < max {
                return candidate;
            }
        }
    }
}

/// Expand a 32-byte commitment seed into an [`EXPONENT_SIZE`]-bit scalar.
///
/// The expansion is deterministic so that `challenge`, `validate` and `sign`
/// all derive the same blinding exponent from the same seed.
pub(crate) fn expand_sprime(s_prime: &[u8; 32]) -> BigNumber {
    let mut h = Sha256::new();
    h.update(SPRIME_PREFIX);
    h.update(s_prime);
    let key: [u8; 32] = h.finalize().into();
    Prng::new(&key).random_bits(EXPONENT_SIZE)
}

/// Draw a uniform integer in `[0, 2^bits)` from the ambient randomness
/// source.
pub(crate) fn random_bits_rng<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> BigNumber {
    if bits == 0 {
        return BigNumber::zero();
    }
    let bytes = (bits + 7) / 8;
    let mut buf = vec![0u8; bytes];
    rng.fill_bytes(&mut buf);
    buf[0] &= 0xff >> (bytes * 8 - bits);
    let out = BigNumber::from_slice(&buf);
    buf.zeroize();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::bn;
    use crate::testing::test_rng;

    #[test]
    fn drbg_is_deterministic() {
        let mut a = HmacDrbg::new(b"seed");
        let mut b = HmacDrbg::new(b"seed");
        let (mut x, mut y) = ([0u8; 48], [0u8; 48]);
        a.generate(&mut x);
        b.generate(&mut y);
        assert_eq!(x, y);

        let mut z = [0u8; 48];
        a.generate(&mut z);
        assert_ne!(x, z, "the stream must advance between calls");

        let mut c = HmacDrbg::new(b"other seed");
        let mut w = [0u8; 48];
        c.generate(&mut w);
        assert_ne!(x, w);
    }

    #[test]
    fn random_bits_respects_the_width() {
        let mut prng = Prng::new(&[7u8; 32]);
        for bits in [1usize, 7, 8, 9, 127, 128, 2048] {
            let v = prng.random_bits(bits);
            assert!(bit_length(&v) <= bits);
        }
        assert_eq!(prng.random_bits(0), BigNumber::zero());
    }

    #[test]
    fn random_int_stays_below_the_bound() {
        let mut prng = Prng::new(&[3u8; 32]);
        let max = bn(1_000_003);
        for _ in 0..100 {
            let v = prng.random_int(&max);
            assert!(v < max);
        }
    }

    #[test]
    fn seed_expansion_is_deterministic_and_full_width() {
        let s1 = expand_sprime(&[42u8; 32]);
        let s2 = expand_sprime(&[42u8; 32]);
        assert_eq!(s1, s2);
        assert_ne!(s1, expand_sprime(&[43u8; 32]));
        assert!(bit_length(&s1) <= EXPONENT_SIZE);
        // A 2048-bit draw is overwhelmingly unlikely to be this short.
        assert!(bit_length(&s1) > EXPONENT_SIZE - 64);
    }

    #[test]
    fn ambient_draws_fit_the_requested_width() {
        let mut rng = test_rng();
        for _ in 0..50 {
            let v = random_bits_rng(&mut rng, 333);
            assert!(bit_length(&v) <= 333);
        }
    }
}
