// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Signatures of knowledge of an RSA factorization, over a group of
//! unknown order.
//!
//! This crate implements a Schnorr-style sigma protocol, made
//! non-interactive with Fiat-Shamir, in which a prover commits to an RSA
//! modulus `n` and later proves knowledge of its factorization while
//! binding the proof to a message. The ambient group is `(Z/N)* / {+-1}`
//! for a public RSA modulus `N` whose own factorization nobody knows: with
//! the group order unavailable, exponents cannot be reduced, which is what
//! makes the proof sound.
//!
//! The intended deployment is a privacy-preserving claim flow: the owner of
//! a legacy RSA key publishes the commitment (`challenge`), and whoever can
//! factor the committed modulus - its owner - can later `sign` messages
//! that anyone can `verify` against the commitment, without the key itself
//! ever appearing.
//!
//! # Usage
//!
//! Build a [`GuoGroup`] from the public parameters `(N, g, h)`, once. A
//! group constructed with a `modbits` bound can commit and sign; a group
//! constructed without one is verification-only and carries much smaller
//! precomputed tables. Seeds, commitments and signatures all have
//! fixed-width byte encodings, so the values exchanged between the parties
//! are plain byte strings.
//!
//! Call [`enable_memory_wiping`] at startup if prover secrets should be wiped
//! from freed bignum memory.
//!
//! The signer leaks timing about rejected randomness; the verifier holds no
//! secrets and is deterministic. Neither side is otherwise constant-time,
//! which matches the threat model of proving ownership of a public
//! commitment.

#![warn(missing_docs)]

pub mod constants;
pub mod errors;

mod arith;
mod comb;
mod gmp_zeroize;
mod group;
mod primes;
mod prng;
mod ser;
mod sig;
mod sign;
mod transcript;
mod verify;
mod wnaf;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{CallerError, GuoError, Result};
pub use gmp_zeroize::enable_memory_wiping;
pub use group::GuoGroup;
pub use sig::Signature;
pub use sign::RsaPrivate;
