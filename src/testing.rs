// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Test utility functions.

use crate::{group::GuoGroup, sign::RsaPrivate};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use unknown_order::BigNumber;

/// A test RNG seeded fresh from the OS, with freed-bignum wiping enabled.
///
/// The seed is echoed to stderr; paste it into [`replay_test_rng`] to
/// reproduce a failing run.
pub(crate) fn test_rng() -> StdRng {
    crate::enable_memory_wiping();
    let mut seed = <StdRng as SeedableRng>::Seed::default();
    rand::rngs::OsRng.fill_bytes(&mut seed);
    eprintln!("rng seed for this run (pass to replay_test_rng): {seed:?}");
    StdRng::from_seed(seed)
}

/// Rebuild the RNG of a failed run from its printed seed, with crate-scoped
/// log output switched on.
///
/// Debugging aid only: the subscriber it installs is process-wide, and the
/// deliberately-invalid inputs many tests feed the verifier log errors that
/// read like failures next to an `ok` result. Drop the call before
/// committing.
#[allow(unused)]
pub(crate) fn replay_test_rng(seed: [u8; 32]) -> StdRng {
    crate::enable_memory_wiping();
    // RUST_LOG wins when set; otherwise show everything this crate logs.
    let ours = format!("{}=trace", env!("CARGO_PKG_NAME").replace('-', "_"));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(ours));
    // Failure here means a subscriber is already installed, which is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .pretty()
        .try_init();
    StdRng::from_seed(seed)
}

fn mersenne(exp: usize) -> BigNumber {
    (BigNumber::one() << exp) - BigNumber::one()
}

/// A sound test group: the modulus is the product of two Mersenne primes,
/// so it is an odd semiprime coprime to both generators, and nothing in the
/// test suite knows how to exploit its (public) factorization.
pub(crate) fn test_group() -> GuoGroup {
    let modulus = &mersenne(521) * &mersenne(607);
    GuoGroup::new(&modulus.to_bytes(), 2, 3, Some(3482)).expect("test parameters are valid")
}

/// A fixed RSA witness: two Mersenne primes with a 3482-bit product.
/// Deterministic, so tests need no prime generation.
pub(crate) fn test_rsa_private() -> RsaPrivate {
    RsaPrivate::new(mersenne(1279), mersenne(2203)).expect("test key is in range")
}
