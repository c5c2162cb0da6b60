// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Signed arbitrary-precision helpers with floor-division semantics.
//!
//! [`BigNumber`] division truncates toward zero; the protocol is specified
//! in terms of floor division (`0 <= r < |y|` for positive `y`), so every
//! quotient or remainder taken in this crate goes through [`fdivmod`] or the
//! non-negative [`BigNumber::nmod`]. The number-theoretic routines (extended
//! GCD, Jacobi symbol, integer and modular square roots) are written against
//! that convention.

use crate::errors::{GuoError, Result};
use unknown_order::BigNumber;

/// Shorthand for lifting a machine word into a [`BigNumber`].
pub(crate) fn bn(x: u64) -> BigNumber {
    BigNumber::from(x)
}

/// Number of bits in `|x|`; zero for `x = 0`.
pub(crate) fn bit_length(x: &BigNumber) -> usize {
    let bytes = x.to_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] == 0 {
        i += 1;
    }
    if i == bytes.len() {
        return 0;
    }
    (bytes.len() - i - 1) * 8 + (8 - bytes[i].leading_zeros() as usize)
}

/// Number of bytes needed to hold `|x|`; zero for `x = 0`.
pub(crate) fn byte_length(x: &BigNumber) -> usize {
    (bit_length(x) + 7) / 8
}

/// Number of trailing zero bits of `|x|`; zero for `x = 0`.
pub(crate) fn zero_bits(x: &BigNumber) -> usize {
    let bytes = x.to_bytes();
    let mut n = 0;
    for &b in bytes.iter().rev() {
        if b == 0 {
            n += 8;
        } else {
            return n + b.trailing_zeros() as usize;
        }
    }
    0
}

pub(crate) fn is_odd(x: &BigNumber) -> bool {
    x.nmod(&bn(2)) == BigNumber::one()
}

/// Interpret `|x|` as a `u64`. The caller must know the value fits.
pub(crate) fn to_u64(x: &BigNumber) -> Result<u64> {
    let bytes = x.to_bytes();
    let start = bytes.len().saturating_sub(8);
    if bytes[..start].iter().any(|&b| b != 0) {
        return Err(GuoError::Domain("value does not fit in a machine word"));
    }
    let mut out = 0u64;
    for &b in &bytes[start..] {
        out = (out << 8) | u64::from(b);
    }
    Ok(out)
}

/// Floor division with remainder: `x = q*y + r` with `0 <= r < |y|` when
/// `y > 0`, and `y < r <= 0` when `y < 0`.
pub(crate) fn fdivmod(x: &BigNumber, y: &BigNumber) -> Result<(BigNumber, BigNumber)> {
    let zero = BigNumber::zero();
    if y == &zero {
        return Err(GuoError::Domain("division by zero"));
    }
    let ya = if y < &zero { -y.clone() } else { y.clone() };
    let r0 = x.nmod(&ya);
    let r = if y < &zero && r0 != zero { &r0 - &ya } else { r0 };
    // The difference is an exact multiple of y, so truncated division is
    // already the floor quotient here.
    let q = (x - &r) / y;
    Ok((q, r))
}

pub(crate) fn fdiv(x: &BigNumber, y: &BigNumber) -> Result<BigNumber> {
    Ok(fdivmod(x, y)?.0)
}

/// Greatest common divisor via Euclid on floor-mod; always non-negative.
pub(crate) fn gcd(a: &BigNumber, b: &BigNumber) -> BigNumber {
    let zero = BigNumber::zero();
    let mut a = if a < &zero { -a.clone() } else { a.clone() };
    let mut b = if b < &zero { -b.clone() } else { b.clone() };
    while b != zero {
        let r = a.nmod(&b);
        a = b;
        b = r;
    }
    a
}

/// Extended Euclid: returns `(s, t, g)` with `s*a + t*b = g` and `g >= 0`.
/// The cofactors may be negative.
pub(crate) fn egcd(a: &BigNumber, b: &BigNumber) -> (BigNumber, BigNumber, BigNumber) {
    let zero = BigNumber::zero();
    let one = BigNumber::one();
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (one.clone(), zero.clone());
    let (mut old_t, mut t) = (zero.clone(), one);
    while r != zero {
        // r is nonzero, so the floor division cannot fail.
        let (q, rem) = fdivmod(&old_r, &r).expect("divisor is nonzero");
        old_r = r;
        r = rem;
        let ns = &old_s - &(&q * &s);
        old_s = s;
        s = ns;
        let nt = &old_t - &(&q * &t);
        old_t = t;
        t = nt;
    }
    if old_r < zero {
        (-old_s, -old_t, -old_r)
    } else {
        (old_s, old_t, old_r)
    }
}

/// Modular inverse of `a` modulo `n > 0`, as the canonical representative in
/// `[0, n)`.
pub(crate) fn inverse(a: &BigNumber, n: &BigNumber) -> Result<BigNumber> {
    if n <= &BigNumber::zero() {
        return Err(GuoError::Domain("inverse requires a positive modulus"));
    }
    let (s, _, g) = egcd(a, n);
    if g != BigNumber::one() {
        return Err(GuoError::NotInvertible);
    }
    Ok(s.nmod(n))
}

/// Jacobi symbol `(x/y)` for positive odd `y`; returns -1, 0 or +1.
pub(crate) fn jacobi(x: &BigNumber, y: &BigNumber) -> Result<i32> {
    if y <= &BigNumber::zero() || !is_odd(y) {
        return Err(GuoError::Domain("jacobi symbol requires positive odd y"));
    }
    let zero = BigNumber::zero();
    let one = BigNumber::one();
    let three = bn(3);
    let four = bn(4);
    let eight = bn(8);

    // The symbol only depends on x mod y, which also disposes of negative x.
    let mut a = x.nmod(y);
    let mut b = y.clone();
    let mut j = 1i32;
    while a != zero {
        let z = zero_bits(&a);
        if z > 0 {
            a = a >> z;
            if z % 2 == 1 {
                let m = b.nmod(&eight);
                if m == three || m == bn(5) {
                    j = -j;
                }
            }
        }
        if a.nmod(&four) == three && b.nmod(&four) == three {
            j = -j;
        }
        let next = b.nmod(&a);
        b = a;
        a = next;
    }
    if b == one {
        Ok(j)
    } else {
        Ok(0)
    }
}

/// Integer square root `floor(sqrt(x))` by Newton iteration.
pub(crate) fn sqrt(x: &BigNumber) -> Result<BigNumber> {
    let one = BigNumber::one();
    if x < &BigNumber::zero() {
        return Err(GuoError::Domain("square root of a negative value"));
    }
    if x <= &one {
        return Ok(x.clone());
    }
    let mut z = one << (bit_length(x) / 2 + 1);
    loop {
        let next = (&z + &(x / &z)) >> 1;
        if next >= z {
            return Ok(z);
        }
        z = next;
    }
}

/// Modular exponentiation `x^y mod m`, accepting negative exponents when `x`
/// is invertible. `mod_pow(_, 0, m)` is 1 for `m > 1`, and everything is 0
/// modulo 1.
pub(crate) fn mod_pow(x: &BigNumber, y: &BigNumber, m: &BigNumber) -> Result<BigNumber> {
    let zero = BigNumber::zero();
    if m <= &zero {
        return Err(GuoError::Domain("exponentiation requires a positive modulus"));
    }
    if m == &BigNumber::one() {
        return Ok(zero);
    }
    if y < &zero {
        let xi = inverse(x, m)?;
        return Ok(xi.modpow(&-y.clone(), m));
    }
    Ok(x.nmod(m).modpow(y, m))
}

/// Modular square root modulo an odd prime `p`.
///
/// Dispatches on the Jacobi symbol, takes the `p = 3 (mod 4)` and
/// `p = 5 (mod 8)` shortcuts, and falls back to Tonelli-Shanks with the
/// least non-residue as generator. Fails with `NotASquare` for non-residues.
pub(crate) fn mod_sqrt(x: &BigNumber, p: &BigNumber) -> Result<BigNumber> {
    let zero = BigNumber::zero();
    let one = BigNumber::one();
    let two = bn(2);
    if p <= &zero {
        return Err(GuoError::Domain("square root requires a positive modulus"));
    }
    let x = x.nmod(p);
    if x == zero {
        return Ok(zero);
    }
    if p == &two {
        return Ok(x);
    }
    if jacobi(&x, p)? != 1 {
        return Err(GuoError::NotASquare);
    }

    if p.nmod(&bn(4)) == bn(3) {
        let e = (p + &one) >> 2;
        return mod_pow(&x, &e, p);
    }

    if p.nmod(&bn(8)) == bn(5) {
        // x^((p+3)/8) is a root of x or of -x; in the latter case multiply
        // by a fourth root of unity, 2^((p-1)/4).
        let e = (p + &bn(3)) >> 3;
        let mut r = mod_pow(&x, &e, p)?;
        if (&r * &r).nmod(p) != x {
            let f = (p - &one) >> 2;
            let t = mod_pow(&two, &f, p)?;
            r = (&r * &t).nmod(p);
        }
        if (&r * &r).nmod(p) != x {
            return Err(GuoError::NotASquare);
        }
        return Ok(r);
    }

    // Tonelli-Shanks. Write p - 1 = q * 2^s with q odd.
    let pm1 = p - &one;
    let s = zero_bits(&pm1);
    let q = pm1.clone() >> s;

    let mut nr = two;
    while jacobi(&nr, p)? != -1 {
        nr = &nr + &one;
    }

    let mut y = mod_pow(&x, &((&q + &one) >> 1), p)?;
    let mut b = mod_pow(&x, &q, p)?;
    let mut g = mod_pow(&nr, &q, p)?;
    let mut r = s;

    loop {
        let mut t = b.clone();
        let mut m = 0usize;
        while t != one {
            t = (&t * &t).nmod(p);
            m += 1;
            if m == r {
                // p was not prime after all.
                return Err(GuoError::NotASquare);
            }
        }
        if m == 0 {
            return Ok(y);
        }
        let mut gs = g.clone();
        for _ in 0..(r - m - 1) {
            gs = (&gs * &gs).nmod(p);
        }
        y = (&y * &gs).nmod(p);
        g = (&gs * &gs).nmod(p);
        b = (&b * &g).nmod(p);
        r = m;
    }
}

/// Square root of `x` modulo `p*q`, lifted from roots modulo each prime
/// factor by the Chinese remainder theorem.
pub(crate) fn mod_sqrt_pq(x: &BigNumber, p: &BigNumber, q: &BigNumber) -> Result<BigNumber> {
    let sp = mod_sqrt(x, p)?;
    let sq = mod_sqrt(x, q)?;
    let (u, v, g) = egcd(p, q);
    if g != BigNumber::one() {
        return Err(GuoError::Domain("moduli of the CRT lift must be coprime"));
    }
    let n = p * q;
    let w = (&(&sp * &v) * q + &(&sq * &u) * p).nmod(&n);
    Ok(w)
}
