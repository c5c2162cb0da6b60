// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Error types for the crate.
//!
//! Arithmetic and proof-engine failures are reported as [`GuoError`]; misuse
//! of the public API by the calling application is carried separately as
//! [`CallerError`] so that callers can distinguish "you handed us bad input"
//! from "the protocol rejected this".

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GuoError>;

/// Errors produced by the group-arithmetic and proof engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GuoError {
    /// An input violated an arithmetic precondition (negative where a
    /// non-negative value is required, even modulus in a Jacobi symbol,
    /// zero modulus in a modular exponentiation, and the like).
    #[error("arithmetic domain violation: {0}")]
    Domain(&'static str),

    /// An element shares a factor with the modulus and has no inverse.
    #[error("element is not invertible")]
    NotInvertible,

    /// A modular square root was requested for a non-residue.
    #[error("value is not a quadratic residue")]
    NotASquare,

    /// An exponent exceeded the capacity of the precomputed tables, a
    /// signed-digit buffer, or the quotient bit budget.
    #[error("exponent exceeds precomputed capacity")]
    ExponentOverflow,

    /// No entry of the small-prime table is a quadratic residue modulo the
    /// witness modulus. This cannot happen for an honestly generated RSA
    /// modulus except with negligible probability.
    #[error("no small prime is a quadratic residue modulo the witness modulus")]
    NoQuadraticResidue,

    /// A signature failed a verification predicate or carried an
    /// out-of-range field.
    #[error("signature rejected")]
    InvalidSignature,

    /// An internal consistency check failed. Seeing this error means there
    /// is a bug in this crate.
    #[error("internal invariant failed")]
    InternalInvariantFailed,

    /// The calling application passed invalid input to the public API.
    #[error("the calling application made a mistake: {0}")]
    CallingApplicationMistake(#[from] CallerError),
}

/// Errors caused by improper use of the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CallerError {
    /// Messages are absorbed into the transcript left-padded to 64 bytes
    /// and may not exceed that width.
    #[error("message exceeds the 64-byte transcript field")]
    MessageTooLong,

    /// The RSA modulus bit length is outside the accepted range.
    #[error("RSA modulus bit length out of range")]
    ModulusOutOfRange,

    /// The group parameters are malformed (even or tiny modulus, bad
    /// generators).
    #[error("invalid group parameters")]
    BadGroupParameters,

    /// A byte string could not be parsed into the expected shape.
    #[error("could not deserialize bytes")]
    DeserializationFailed,

    /// A randomized operation exhausted its retry budget.
    #[error("reached the maximum allowed number of retries")]
    RetryFailed,
}
