// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Canonical Fiat-Shamir transcript assembly.
//!
//! The transcript is a fixed-width byte string: every field is big-endian
//! and left-padded to a width both sides can compute from the public
//! parameters alone, so the prover and verifier hash identical bytes or
//! nothing matches at all. The SHA-256 digest of the transcript keys a DRBG
//! from which the challenge and the prime candidate are drawn.

use crate::{
    constants::{CHAL_BITS, ELLDIFF_MAX, EXPONENT_SIZE, HASH_PREFIX, MAX_MSG_BYTES},
    errors::{CallerError, GuoError, Result},
    group::GuoGroup,
    primes::next_prime,
    prng::Prng,
    ser::{pad_left, pad_left_bytes},
};
use sha2::{Digest, Sha256};
use unknown_order::BigNumber;

/// Commitments and first-move messages absorbed into the challenge hash,
/// in transcript order.
pub(crate) struct TranscriptInput<'a> {
    pub c1: &'a BigNumber,
    pub c2: &'a BigNumber,
    pub c3: &'a BigNumber,
    pub t: u32,
    pub a: &'a BigNumber,
    pub b: &'a BigNumber,
    pub c: &'a BigNumber,
    pub d: &'a BigNumber,
    pub e: &'a BigNumber,
}

/// Derive `(chal, ell, key)` from the protocol transcript.
///
/// On the prover path (`verify = false`) `ell` is the smallest prime within
/// [`ELLDIFF_MAX`] of the pseudorandom draw; the verifier gets the raw draw
/// back and checks the distance and primality itself.
pub(crate) fn fs_chal(
    group: &GuoGroup,
    input: &TranscriptInput<'_>,
    msg: &[u8],
    verify: bool,
) -> Result<(BigNumber, BigNumber, [u8; 32])> {
    if msg.len() > MAX_MSG_BYTES {
        return Err(CallerError::MessageTooLong.into());
    }
    let zero = BigNumber::zero();
    let elements = [input.c1, input.c2, input.c3, input.a, input.b, input.c, input.d];
    if elements.iter().any(|x| *x < &zero) || input.e < &zero {
        return Err(GuoError::Domain("transcript scalars must be non-negative"));
    }

    let width = group.element_size();
    let mut hasher = Sha256::new();
    hasher.update(HASH_PREFIX);
    hasher.update(pad_left(group.modulus(), width)?);
    hasher.update(group.generator_g().to_be_bytes());
    hasher.update(group.generator_h().to_be_bytes());
    for el in elements {
        hasher.update(pad_left(el, width)?);
    }
    hasher.update(input.t.to_be_bytes());
    hasher.update(pad_left(input.e, EXPONENT_SIZE / 8)?);
    hasher.update(pad_left_bytes(msg, MAX_MSG_BYTES)?);
    let key: [u8; 32] = hasher.finalize().into();

    let mut prng = Prng::new(&key);
    let chal = prng.random_bits(CHAL_BITS);
    let ell_r = prng.random_bits(CHAL_BITS);
    let ell = if verify {
        ell_r
    } else {
        next_prime(&ell_r, &key, ELLDIFF_MAX).ok_or(CallerError::RetryFailed)?
    };
    Ok((chal, ell, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::{bit_length, bn};
    use crate::primes::is_prime;

    fn group() -> GuoGroup {
        GuoGroup::new(&[143], 2, 3, None).unwrap()
    }

    fn sample_input() -> [BigNumber; 8] {
        [bn(4), bn(9), bn(25), bn(36), bn(49), bn(64), bn(16), bn(1 << 20)]
    }

    fn as_input(vals: &[BigNumber; 8]) -> TranscriptInput<'_> {
        TranscriptInput {
            c1: &vals[0],
            c2: &vals[1],
            c3: &vals[2],
            t: 2,
            a: &vals[3],
            b: &vals[4],
            c: &vals[5],
            d: &vals[6],
            e: &vals[7],
        }
    }

    #[test]
    fn identical_inputs_derive_identical_output() {
        let group = group();
        let vals = sample_input();
        let (chal1, ell1, key1) = fs_chal(&group, &as_input(&vals), b"msg", true).unwrap();
        let (chal2, ell2, key2) = fs_chal(&group, &as_input(&vals), b"msg", true).unwrap();
        assert_eq!(chal1, chal2);
        assert_eq!(ell1, ell2);
        assert_eq!(key1, key2);
        assert!(bit_length(&chal1) <= CHAL_BITS);
    }

    #[test]
    fn any_field_changes_the_digest() {
        let group = group();
        let vals = sample_input();
        let (_, _, base_key) = fs_chal(&group, &as_input(&vals), b"msg", true).unwrap();

        for idx in 0..vals.len() {
            let mut mutated = vals.clone();
            let bumped = &mutated[idx] + &bn(1);
            mutated[idx] = bumped;
            let (_, _, key) = fs_chal(&group, &as_input(&mutated), b"msg", true).unwrap();
            assert_ne!(key, base_key, "field {idx} must be bound");
        }

        let mut other_t = as_input(&vals);
        other_t.t = 3;
        let (_, _, key) = fs_chal(&group, &other_t, b"msg", true).unwrap();
        assert_ne!(key, base_key);

        let (_, _, key) = fs_chal(&group, &as_input(&vals), b"msh", true).unwrap();
        assert_ne!(key, base_key);
    }

    #[test]
    fn prover_path_returns_a_nearby_prime() {
        let group = group();
        let vals = sample_input();
        let (_, ell_r, key) = fs_chal(&group, &as_input(&vals), b"m", true).unwrap();
        let (_, ell, key2) = fs_chal(&group, &as_input(&vals), b"m", false).unwrap();
        assert_eq!(key, key2, "the digest does not depend on the path");
        assert!(is_prime(&ell, &key));
        let gap = &ell - &ell_r;
        assert!(gap >= BigNumber::zero() && gap <= bn(u64::from(ELLDIFF_MAX)));
    }

    #[test]
    fn negative_scalars_and_long_messages_are_rejected() {
        let group = group();
        let vals = sample_input();
        let mut negative = vals.clone();
        negative[7] = -bn(5);
        assert!(fs_chal(&group, &as_input(&negative), b"m", true).is_err());
        assert!(fs_chal(&group, &as_input(&vals), &[0u8; 65], true).is_err());
    }
}
