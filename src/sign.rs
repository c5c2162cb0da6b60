// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The prover side: commitment to an RSA modulus and signature generation.
//!
//! A signature is a zero-knowledge proof of knowledge of the factorization
//! of the committed modulus, bound to a message through the Fiat-Shamir
//! transcript. The prover is not constant-time: it branches on secret data
//! to reject bad randomness, which is acceptable because every retry
//! discards the randomness it leaked about.

use crate::{
    arith::{bit_length, bn, fdiv, fdivmod, is_odd, mod_sqrt_pq},
    constants::{
        CHAL_BITS, CRYPTOGRAPHIC_RETRY_MAX, ELL_RETRY_MAX, EXPONENT_SIZE, MAX_MSG_BYTES,
        MAX_RSA_BITS, MIN_RSA_BITS, SMALL_PRIMES,
    },
    errors::{CallerError, GuoError, Result},
    group::GuoGroup,
    prng::{expand_sprime, random_bits_rng},
    ser::pad_left,
    sig::Signature,
    transcript::{fs_chal, TranscriptInput},
};
use rand::{CryptoRng, RngCore};
use std::fmt;
use tracing::{error, instrument};
use unknown_order::BigNumber;
use zeroize::ZeroizeOnDrop;

/// The factorization of an RSA modulus, held by the prover.
#[derive(Clone, ZeroizeOnDrop)]
pub struct RsaPrivate {
    p: BigNumber,
    q: BigNumber,
}

impl fmt::Debug for RsaPrivate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RsaPrivate([redacted])")
    }
}

impl RsaPrivate {
    /// Wrap a factor pair. The product must be an odd integer of an
    /// accepted RSA width; primality is the caller's responsibility.
    pub fn new(p: BigNumber, q: BigNumber) -> Result<Self> {
        let n = &p * &q;
        let nbits = bit_length(&n);
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&nbits) || !is_odd(&n) {
            return Err(CallerError::ModulusOutOfRange.into());
        }
        Ok(RsaPrivate { p, q })
    }

    /// The public modulus `p * q`.
    pub fn public_modulus(&self) -> BigNumber {
        &self.p * &self.q
    }
}

impl GuoGroup {
    /// Draw a fresh 32-byte commitment seed.
    pub fn generate_seed<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; 32] {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        seed
    }

    /// The commitment `reduce(g^n * h^s)`.
    pub(crate) fn commit(&self, n: &BigNumber, s: &BigNumber) -> Result<BigNumber> {
        Ok(self.reduce(self.powgh(n, s)?))
    }

    /// Commit to an RSA modulus under the given seed, returning the
    /// commitment `C1` in its serialized form.
    #[instrument(skip_all, err(Debug))]
    pub fn challenge(&self, s_prime: &[u8; 32], n: &BigNumber) -> Result<Vec<u8>> {
        let nbits = bit_length(n);
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&nbits) || !is_odd(n) {
            return Err(CallerError::ModulusOutOfRange.into());
        }
        let s = expand_sprime(s_prime);
        let c1 = self.commit(n, &s)?;
        pad_left(&c1, self.element_size())
    }

    /// Check that `c1` is the commitment to this key under this seed.
    /// Returns `false` on any failure.
    pub fn validate(&self, s_prime: &[u8; 32], c1: &[u8], key: &RsaPrivate) -> bool {
        let expect = match self.challenge(s_prime, &key.public_modulus()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        expect.as_slice() == c1
    }

    /// Produce a signature on `msg`: a proof of knowledge of the
    /// factorization held in `key`, bound to the commitment derived from
    /// `s_prime`.
    #[instrument(skip_all, err(Debug))]
    pub fn sign<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        msg: &[u8],
        s_prime: &[u8; 32],
        key: &RsaPrivate,
    ) -> Result<Signature> {
        if msg.len() > MAX_MSG_BYTES {
            return Err(CallerError::MessageTooLong.into());
        }
        let n = key.public_modulus();
        let nbits = bit_length(&n);
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&nbits) || !is_odd(&n) {
            return Err(CallerError::ModulusOutOfRange.into());
        }

        let zero = BigNumber::zero();
        let s = expand_sprime(s_prime);
        let c1 = self.commit(&n, &s)?;

        // The witness: the first table prime that is a square modulo n,
        // together with one of its roots.
        let mut found = None;
        for &t in SMALL_PRIMES.iter() {
            match mod_sqrt_pq(&bn(u64::from(t)), &key.p, &key.q) {
                Ok(w) => {
                    found = Some((t, w));
                    break;
                }
                Err(GuoError::NotASquare) => continue,
                Err(e) => return Err(e),
            }
        }
        let (t, w) = found.ok_or(GuoError::NoQuadraticResidue)?;
        let t_bn = bn(u64::from(t));

        // w^2 = t + a*n over the integers.
        let (a, rem) = fdivmod(&(&(&w * &w) - &t_bn), &n)?;
        if rem != zero {
            error!("square root of t modulo n does not lift to the integers");
            return Err(GuoError::InternalInvariantFailed);
        }

        let s1 = random_bits_rng(rng, EXPONENT_SIZE);
        let s2 = random_bits_rng(rng, EXPONENT_SIZE);
        let c2 = self.reduce(self.powgh(&w, &s1)?);
        let c3 = self.reduce(self.powgh(&a, &s2)?);

        let (c1_inv, c2_inv) = self.inv2(&c1, &c2)?;

        for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
            let r_w = random_bits_rng(rng, EXPONENT_SIZE);
            let mut r_w2 = random_bits_rng(rng, EXPONENT_SIZE);
            let r_a = random_bits_rng(rng, EXPONENT_SIZE);
            let mut r_an = random_bits_rng(rng, EXPONENT_SIZE);
            let r_s1w = random_bits_rng(rng, EXPONENT_SIZE);
            let r_sa = random_bits_rng(rng, EXPONENT_SIZE);
            let r_s2 = random_bits_rng(rng, EXPONENT_SIZE);

            // E = r_w2 - r_an must be non-negative; both draws are fresh
            // uniform values, so relabeling keeps the distribution.
            if r_w2 < r_an {
                std::mem::swap(&mut r_w2, &mut r_an);
            }
            let e_int = &r_w2 - &r_an;

            let b_el = self.reduce(self.powgh(&r_a, &r_s2)?);
            let c_el = self.reduce(self.mul(
                &self.pow(&c2_inv, &c2, &r_w)?,
                &self.powgh(&r_w2, &r_s1w)?,
            ));
            let d_el = self.reduce(self.mul(
                &self.pow(&c1_inv, &c1, &r_a)?,
                &self.powgh(&r_an, &r_sa)?,
            ));

            // Redraw A until the transcript yields a full-width prime; only
            // r_s1 and A change between attempts.
            for _ in 0..ELL_RETRY_MAX {
                let r_s1 = random_bits_rng(rng, EXPONENT_SIZE);
                let a_el = self.reduce(self.powgh(&r_w, &r_s1)?);
                let input = TranscriptInput {
                    c1: &c1,
                    c2: &c2,
                    c3: &c3,
                    t,
                    a: &a_el,
                    b: &b_el,
                    c: &c_el,
                    d: &d_el,
                    e: &e_int,
                };
                let (chal, ell, _key) = match fs_chal(self, &input, msg, false) {
                    Ok(out) => out,
                    // No prime within the window: hash again.
                    Err(GuoError::CallingApplicationMistake(CallerError::RetryFailed)) => continue,
                    Err(e) => return Err(e),
                };
                if bit_length(&ell) != CHAL_BITS {
                    continue;
                }

                let z_w = (&chal * &w) + &r_w;
                let z_w2 = (&chal * &(&w * &w)) + &r_w2;
                let z_s1 = (&chal * &s1) + &r_s1;
                let z_a = (&chal * &a) + &r_a;
                let z_an = (&chal * &(&a * &n)) + &r_an;
                let z_s1w = (&chal * &(&s1 * &w)) + &r_s1w;
                let z_sa = (&chal * &(&s * &a)) + &r_sa;
                let z_s2 = (&chal * &s2) + &r_s2;

                let (q_w, res_w) = fdivmod(&z_w, &ell)?;
                let (q_w2, res_w2) = fdivmod(&z_w2, &ell)?;
                let (q_s1, res_s1) = fdivmod(&z_s1, &ell)?;
                let (q_a, res_a) = fdivmod(&z_a, &ell)?;
                let (q_an, res_an) = fdivmod(&z_an, &ell)?;
                let (q_s1w, res_s1w) = fdivmod(&z_s1w, &ell)?;
                let (q_sa, res_sa) = fdivmod(&z_sa, &ell)?;
                let (q_s2, res_s2) = fdivmod(&z_s2, &ell)?;

                let aq = self.reduce(self.powgh(&q_w, &q_s1)?);
                let bq = self.reduce(self.powgh(&q_a, &q_s2)?);
                let cq = self.reduce(self.mul(
                    &self.pow(&c2_inv, &c2, &q_w)?,
                    &self.powgh(&q_w2, &q_s1w)?,
                ));
                let dq = self.reduce(self.mul(
                    &self.pow(&c1_inv, &c1, &q_a)?,
                    &self.powgh(&q_an, &q_sa)?,
                ));
                let eq = fdiv(&(&z_w2 - &z_an), &ell)?;
                if eq < zero || bit_length(&eq) > EXPONENT_SIZE {
                    return Err(GuoError::ExponentOverflow);
                }

                return Ok(Signature {
                    c2,
                    c3,
                    t,
                    chal,
                    ell,
                    aq,
                    bq,
                    cq,
                    dq,
                    eq,
                    z_w: res_w,
                    z_w2: res_w2,
                    z_s1: res_s1,
                    z_a: res_a,
                    z_an: res_an,
                    z_s1w: res_s1w,
                    z_sa: res_sa,
                    z_s2: res_s2,
                });
            }
        }
        Err(CallerError::RetryFailed.into())
    }

    /// Sign directly to the wire format.
    pub fn sign_bytes<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        msg: &[u8],
        s_prime: &[u8; 32],
        key: &RsaPrivate,
    ) -> Result<Vec<u8>> {
        let sig = self.sign(rng, msg, s_prime, key)?;
        sig.to_bytes(self)
    }
}
