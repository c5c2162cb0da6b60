// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Variable-base exponentiation in windowed non-adjacent form.
//!
//! Exponents are rewritten with signed odd digits in
//! `[-2^(w-1)+1, 2^(w-1)-1]`, which thins out the nonzero positions and so
//! the multiplications; negative digits pull from a table of inverse
//! powers, which is why every entry point takes the base together with its
//! inverse. `pow2` runs two exponentiations in lockstep so the squaring
//! chain is paid for once.

use crate::{
    arith::{bit_length, bn, is_odd},
    constants::WINDOW_SIZE,
    errors::{GuoError, Result},
};
use unknown_order::BigNumber;

/// Signed-digit expansion of `e`, most significant digit first.
///
/// `bitlen` must exceed `bit_length(e)`; the expansion of a `b`-bit number
/// can carry into one extra digit position.
pub(crate) fn wnaf(e: &BigNumber, w: usize, bitlen: usize) -> Result<Vec<i32>> {
    if w < 2 || w > 30 {
        return Err(GuoError::Domain("window width out of range"));
    }
    if e < &BigNumber::zero() {
        return Err(GuoError::Domain("signed-digit expansion needs e >= 0"));
    }
    if bitlen <= bit_length(e) {
        return Err(GuoError::ExponentOverflow);
    }

    let full = 1i64 << w;
    let half = 1i64 << (w - 1);
    let window = bn(full as u64);

    let mut out = vec![0i32; bitlen];
    let mut e = e.clone();
    for digit in out.iter_mut().rev() {
        let mut val = 0i64;
        if is_odd(&e) {
            val = crate::arith::to_u64(&e.nmod(&window))? as i64;
            if val & half != 0 {
                val -= full;
            }
            e = if val >= 0 {
                e - bn(val as u64)
            } else {
                e + bn((-val) as u64)
            };
        }
        *digit = val as i32;
        e = e >> 1;
    }
    if e != BigNumber::zero() {
        return Err(GuoError::ExponentOverflow);
    }
    Ok(out)
}

/// Tables of odd power multiples for one base and its inverse.
struct Tables {
    pos: Vec<BigNumber>,
    neg: Vec<BigNumber>,
}

impl Tables {
    /// `pos[i] = b^(2i+1)`, `neg[i] = b^-(2i+1)`, for `i < 2^(w-2)`.
    fn precompute(b: &BigNumber, b_inv: &BigNumber, modulus: &BigNumber) -> Tables {
        let count = 1usize << (WINDOW_SIZE - 2);
        let bsq = (b * b).nmod(modulus);
        let bisq = (b_inv * b_inv).nmod(modulus);
        let mut pos = Vec::with_capacity(count);
        let mut neg = Vec::with_capacity(count);
        pos.push(b.nmod(modulus));
        neg.push(b_inv.nmod(modulus));
        for i in 1..count {
            pos.push((&pos[i - 1] * &bsq).nmod(modulus));
            neg.push((&neg[i - 1] * &bisq).nmod(modulus));
        }
        Tables { pos, neg }
    }

    fn apply(&self, acc: BigNumber, digit: i32, modulus: &BigNumber) -> BigNumber {
        if digit > 0 {
            (&acc * &self.pos[((digit - 1) >> 1) as usize]).nmod(modulus)
        } else if digit < 0 {
            (&acc * &self.neg[((-digit - 1) >> 1) as usize]).nmod(modulus)
        } else {
            acc
        }
    }
}

/// `b^e mod modulus` for `e >= 0`.
pub(crate) fn pow(
    modulus: &BigNumber,
    b: &BigNumber,
    b_inv: &BigNumber,
    e: &BigNumber,
) -> Result<BigNumber> {
    let tables = Tables::precompute(b, b_inv, modulus);
    let digits = wnaf(e, WINDOW_SIZE, bit_length(e) + 1)?;
    let one = BigNumber::one();
    let mut acc = one.clone();
    for &d in &digits {
        if acc != one {
            acc = (&acc * &acc).nmod(modulus);
        }
        acc = tables.apply(acc, d, modulus);
    }
    Ok(acc)
}

/// `b1^e1 * b2^e2 mod modulus`, sharing the squaring chain.
#[allow(clippy::too_many_arguments)]
pub(crate) fn pow2(
    modulus: &BigNumber,
    b1: &BigNumber,
    b1_inv: &BigNumber,
    e1: &BigNumber,
    b2: &BigNumber,
    b2_inv: &BigNumber,
    e2: &BigNumber,
) -> Result<BigNumber> {
    let t1 = Tables::precompute(b1, b1_inv, modulus);
    let t2 = Tables::precompute(b2, b2_inv, modulus);
    let bitlen = bit_length(e1).max(bit_length(e2)) + 1;
    let d1 = wnaf(e1, WINDOW_SIZE, bitlen)?;
    let d2 = wnaf(e2, WINDOW_SIZE, bitlen)?;
    let one = BigNumber::one();
    let mut acc = one.clone();
    for i in 0..bitlen {
        if acc != one {
            acc = (&acc * &acc).nmod(modulus);
        }
        acc = t1.apply(acc, d1[i], modulus);
        acc = t2.apply(acc, d2[i], modulus);
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::{inverse, mod_pow};
    use crate::testing::test_rng;
    use rand::Rng;

    #[test]
    fn digits_reconstruct_the_exponent() {
        let mut rng = test_rng();
        for w in 2..=8usize {
            for _ in 0..50 {
                let e = bn(rng.gen::<u64>());
                let bitlen = bit_length(&e) + 1;
                let digits = wnaf(&e, w, bitlen).unwrap();
                let mut acc = BigNumber::zero();
                let half = 1i32 << (w - 1);
                for (i, &d) in digits.iter().enumerate() {
                    if d != 0 {
                        assert_eq!(d.rem_euclid(2), 1, "digits are odd");
                        assert!(d > -half && d < half, "digit {d} out of range");
                    }
                    let weight = BigNumber::one() << (bitlen - 1 - i);
                    acc = if d >= 0 {
                        acc + &weight * &bn(d as u64)
                    } else {
                        acc - &weight * &bn((-d) as u64)
                    };
                }
                assert_eq!(acc, e);
            }
        }
    }

    #[test]
    fn zero_has_an_all_zero_expansion() {
        let digits = wnaf(&bn(0), WINDOW_SIZE, 1).unwrap();
        assert_eq!(digits, vec![0]);
    }

    #[test]
    fn short_buffers_and_negatives_are_rejected() {
        assert!(wnaf(&bn(255), 6, 8).is_err());
        assert!(wnaf(&-bn(1), 6, 8).is_err());
        assert!(wnaf(&bn(1), 1, 8).is_err());
    }

    #[test]
    fn pow_matches_modular_exponentiation() {
        let mut rng = test_rng();
        let modulus = bn(9907);
        let b = bn(123);
        let b_inv = inverse(&b, &modulus).unwrap();
        for _ in 0..50 {
            let e = bn(rng.gen::<u32>() as u64);
            assert_eq!(
                pow(&modulus, &b, &b_inv, &e).unwrap(),
                mod_pow(&b, &e, &modulus).unwrap()
            );
        }
        assert_eq!(pow(&modulus, &b, &b_inv, &bn(0)).unwrap(), BigNumber::one());
    }

    #[test]
    fn pow2_matches_the_product_of_single_exponentiations() {
        let mut rng = test_rng();
        let modulus = bn(9907);
        let b1 = bn(123);
        let b2 = bn(456);
        let b1i = inverse(&b1, &modulus).unwrap();
        let b2i = inverse(&b2, &modulus).unwrap();
        for _ in 0..50 {
            let e1 = bn(rng.gen::<u32>() as u64);
            let e2 = bn(rng.gen::<u32>() as u64);
            let expect = (&mod_pow(&b1, &e1, &modulus).unwrap()
                * &mod_pow(&b2, &e2, &modulus).unwrap())
                .nmod(&modulus);
            assert_eq!(
                pow2(&modulus, &b1, &b1i, &e1, &b2, &b2i, &e2).unwrap(),
                expect
            );
        }
    }
}
