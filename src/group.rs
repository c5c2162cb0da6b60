// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The group of unknown order and its precomputed machinery.
//!
//! Elements live in `(Z/N)* / {+-1}` for an RSA modulus `N` whose
//! factorization nobody knows; the canonical representative of a class is
//! the smaller of `b` and `N - b`. A [`GuoGroup`] is built once per set of
//! public parameters: it fixes the two generators, fills the comb tables
//! sized for the exponents it will see, and is immutable (and freely
//! shareable) afterwards.

use crate::{
    arith::{self, bit_length},
    comb::{Comb, CombShape},
    constants::{CHAL_BITS, EXPONENT_SIZE, MAX_COMB_SIZE, MAX_RSA_BITS, MIN_RSA_BITS},
    errors::{CallerError, GuoError, Result},
    wnaf,
};
use unknown_order::BigNumber;

struct CombPair {
    g: Comb,
    h: Comb,
}

/// Public parameters of the signature scheme: the group modulus, the two
/// fixed generators, and the comb tables derived from them.
pub struct GuoGroup {
    modulus: BigNumber,
    /// Half the modulus; the canonical representatives are `[0, nh]`.
    nh: BigNumber,
    bits: usize,
    size: usize,
    g: u32,
    h: u32,
    combs: Vec<CombPair>,
}

impl GuoGroup {
    /// Construct a group over the modulus encoded as unsigned big-endian
    /// bytes, with small-integer generators `g` and `h`.
    ///
    /// `modbits`, when present, is the largest RSA modulus bit length this
    /// instance will be asked to commit to or sign for; it sizes the
    /// prover-side comb tables. A `None` instance can only verify.
    pub fn new(modulus_bytes: &[u8], g: u32, h: u32, modbits: Option<usize>) -> Result<Self> {
        let modulus = BigNumber::from_slice(modulus_bytes);
        if modulus < arith::bn(7) || !arith::is_odd(&modulus) {
            return Err(CallerError::BadGroupParameters.into());
        }
        if g < 2 || h < 2 || g == h {
            return Err(CallerError::BadGroupParameters.into());
        }
        let g_el = arith::bn(u64::from(g));
        let h_el = arith::bn(u64::from(h));
        if g_el >= modulus || h_el >= modulus {
            return Err(CallerError::BadGroupParameters.into());
        }
        // Both generators must be units, or commitments are not invertible.
        if arith::gcd(&(&g_el * &h_el), &modulus) != BigNumber::one() {
            return Err(CallerError::BadGroupParameters.into());
        }
        if let Some(mb) = modbits {
            if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&mb) {
                return Err(CallerError::ModulusOutOfRange.into());
            }
        }

        let bits = bit_length(&modulus);
        let size = arith::byte_length(&modulus);
        let nh = modulus.clone() >> 1;
        let rand_bits = bits - 1;

        let mut widths = Vec::new();
        match modbits {
            Some(mb) => {
                // The prover's nonces are EXPONENT_SIZE bits, which can
                // exceed rand_bits for small groups.
                let nonce_bits = rand_bits.max(EXPONENT_SIZE);
                widths.push(nonce_bits);
                widths.push((2 * mb).max(mb + nonce_bits) + CHAL_BITS + 1);
            }
            None => widths.push(CHAL_BITS),
        }

        let mut combs = Vec::with_capacity(widths.len());
        for width in widths {
            let shape = CombShape::generate(width, MAX_COMB_SIZE)?;
            combs.push(CombPair {
                g: Comb::new(&g_el, &modulus, shape),
                h: Comb::new(&h_el, &modulus, shape),
            });
        }

        Ok(GuoGroup {
            modulus,
            nh,
            bits,
            size,
            g,
            h,
            combs,
        })
    }

    /// The group modulus `N`.
    pub fn modulus(&self) -> &BigNumber {
        &self.modulus
    }

    /// Bit length of the modulus.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Byte width of a serialized group element.
    pub fn element_size(&self) -> usize {
        self.size
    }

    pub(crate) fn generator_g(&self) -> u32 {
        self.g
    }

    pub(crate) fn generator_h(&self) -> u32 {
        self.h
    }

    /// Parse a group element occupying exactly one element width.
    pub(crate) fn element_from_bytes(&self, bytes: &[u8]) -> Result<BigNumber> {
        if bytes.len() != self.size {
            return Err(CallerError::DeserializationFailed.into());
        }
        Ok(BigNumber::from_slice(bytes))
    }

    /// Map to the canonical representative of `(Z/N)/{+-1}`.
    pub(crate) fn reduce(&self, b: BigNumber) -> BigNumber {
        let b = b.nmod(&self.modulus);
        if b > self.nh {
            &self.modulus - &b
        } else {
            b
        }
    }

    pub(crate) fn is_reduced(&self, b: &BigNumber) -> bool {
        b >= &BigNumber::zero() && b <= &self.nh
    }

    pub(crate) fn mul(&self, a: &BigNumber, b: &BigNumber) -> BigNumber {
        (a * b).nmod(&self.modulus)
    }

    pub(crate) fn sqr(&self, a: &BigNumber) -> BigNumber {
        (a * a).nmod(&self.modulus)
    }

    pub(crate) fn inv(&self, b: &BigNumber) -> Result<BigNumber> {
        arith::inverse(b, &self.modulus)
    }

    /// Invert two elements with a single extended GCD.
    pub(crate) fn inv2(&self, a: &BigNumber, b: &BigNumber) -> Result<(BigNumber, BigNumber)> {
        let ab_inv = self.inv(&self.mul(a, b))?;
        Ok((self.mul(b, &ab_inv), self.mul(a, &ab_inv)))
    }

    /// Invert seven elements with a single extended GCD, peeling a product
    /// tree back down.
    pub(crate) fn inv7(&self, b: [&BigNumber; 7]) -> Result<[BigNumber; 7]> {
        let b12 = self.mul(b[0], b[1]);
        let b34 = self.mul(b[2], b[3]);
        let b56 = self.mul(b[4], b[5]);
        let b1234 = self.mul(&b12, &b34);
        let b123456 = self.mul(&b1234, &b56);
        let b1234567 = self.mul(&b123456, b[6]);

        let i1234567 = self.inv(&b1234567)?;
        let i123456 = self.mul(&i1234567, b[6]);
        let i7 = self.mul(&i1234567, &b123456);
        let i1234 = self.mul(&i123456, &b56);
        let i56 = self.mul(&i123456, &b1234);
        let i12 = self.mul(&i1234, &b34);
        let i34 = self.mul(&i1234, &b12);

        Ok([
            self.mul(&i12, b[1]),
            self.mul(&i12, b[0]),
            self.mul(&i34, b[3]),
            self.mul(&i34, b[2]),
            self.mul(&i56, b[5]),
            self.mul(&i56, b[4]),
            i7,
        ])
    }

    /// Simultaneous fixed-base exponentiation `g^e1 * h^e2` through the
    /// smallest comb pair that covers both exponents.
    pub(crate) fn powgh(&self, e1: &BigNumber, e2: &BigNumber) -> Result<BigNumber> {
        let zero = BigNumber::zero();
        if e1 < &zero || e2 < &zero {
            return Err(GuoError::Domain("fixed-base exponents must be non-negative"));
        }
        let need = bit_length(e1).max(bit_length(e2));
        let pair = self
            .combs
            .iter()
            .find(|c| c.g.shape.bits >= need)
            .ok_or(GuoError::ExponentOverflow)?;

        let wins_g = pair.g.to_comb_exp(e1)?;
        let wins_h = pair.h.to_comb_exp(e2)?;
        let shape = pair.g.shape;
        let one = BigNumber::one();
        let mut acc = one.clone();
        for j in 0..shape.shifts {
            if acc != one {
                acc = self.sqr(&acc);
            }
            for i in 0..shape.aps {
                let sg = wins_g[j][i];
                if sg != 0 {
                    acc = self.mul(&acc, pair.g.item(i, sg));
                }
                let sh = wins_h[j][i];
                if sh != 0 {
                    acc = self.mul(&acc, pair.h.item(i, sh));
                }
            }
        }
        Ok(acc)
    }

    /// Variable-base exponentiation `b^e` (signed-digit form), given the
    /// inverse of the base.
    pub(crate) fn pow(&self, b: &BigNumber, b_inv: &BigNumber, e: &BigNumber) -> Result<BigNumber> {
        wnaf::pow(&self.modulus, b, b_inv, e)
    }

    /// `b1^e1 * b2^e2` with a shared squaring chain.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn pow2(
        &self,
        b1: &BigNumber,
        b1_inv: &BigNumber,
        e1: &BigNumber,
        b2: &BigNumber,
        b2_inv: &BigNumber,
        e2: &BigNumber,
    ) -> Result<BigNumber> {
        wnaf::pow2(&self.modulus, b1, b1_inv, e1, b2, b2_inv, e2)
    }
}
