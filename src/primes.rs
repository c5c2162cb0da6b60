// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Deterministic primality testing keyed to a transcript digest.
//!
//! The verifier must reach the same accept/reject decision as the signer on
//! every platform, so the Miller-Rabin bases are not sampled from ambient
//! randomness: they are drawn from a DRBG keyed with the transcript key and
//! the candidate itself.

use crate::{
    arith::{bn, zero_bits},
    constants::{MR_ROUNDS, SMALL_PRIMES},
    prng::Prng,
};
use sha2::{Digest, Sha256};
use unknown_order::BigNumber;

/// Deterministic probable-prime check: trial division by the small-prime
/// table, then [`MR_ROUNDS`] rounds of Miller-Rabin with key-derived bases.
pub(crate) fn is_prime(x: &BigNumber, key: &[u8; 32]) -> bool {
    let two = bn(2);
    if x < &two {
        return false;
    }
    for &p in SMALL_PRIMES.iter() {
        let pb = bn(u64::from(p));
        if *x == pb {
            return true;
        }
        if x.nmod(&pb) == BigNumber::zero() {
            return false;
        }
    }
    miller_rabin(x, key)
}

/// Smallest prime in `[start, start + max_gap]`, or `None` when the window
/// contains none.
pub(crate) fn next_prime(start: &BigNumber, key: &[u8; 32], max_gap: u32) -> Option<BigNumber> {
    let mut p = start.clone();
    let mut gap = 0u32;
    loop {
        if is_prime(&p, key) {
            return Some(p);
        }
        // Step to the next odd candidate; only the starting point can be
        // even.
        let step = if crate::arith::is_odd(&p) { 2 } else { 1 };
        gap += step;
        if gap > max_gap {
            return None;
        }
        p = &p + &bn(u64::from(step));
    }
}

fn miller_rabin(x: &BigNumber, key: &[u8; 32]) -> bool {
    let one = BigNumber::one();
    let two = bn(2);
    // x is odd and larger than every table prime here.
    let xm1 = x - &one;
    let s = zero_bits(&xm1);
    let d = xm1.clone() >> s;

    let mut h = Sha256::new();
    h.update(key);
    h.update(x.to_bytes());
    let seed: [u8; 32] = h.finalize().into();
    let mut prng = Prng::new(&seed);

    let xm3 = x - &bn(3);
    'witness: for _ in 0..MR_ROUNDS {
        let a = prng.random_int(&xm3) + &two;
        let mut y = a.modpow(&d, x);
        if y == one || y == xm1 {
            continue;
        }
        for _ in 1..s {
            y = (&y * &y).nmod(x);
            if y == xm1 {
                continue 'witness;
            }
            if y == one {
                return false;
            }
        }
        return false;
    }
    true
}
