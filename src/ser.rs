// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Fixed-width byte encoding helpers.
//!
//! Every integer on the wire and in the transcript is big-endian and
//! left-padded with zeros to a fixed width, which is what gives the prover
//! and verifier byte-level parity.

use crate::errors::{CallerError, GuoError, Result};
use unknown_order::BigNumber;
use zeroize::Zeroize;

/// Big-endian magnitude of `x`, left-padded with zeros to `width` bytes.
///
/// Fails when the value does not fit.
pub(crate) fn pad_left(x: &BigNumber, width: usize) -> Result<Vec<u8>> {
    let bytes = x.to_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let significant = &bytes[start..];
    if significant.len() > width {
        return Err(GuoError::ExponentOverflow);
    }
    let mut out = vec![0u8; width];
    out[width - significant.len()..].copy_from_slice(significant);
    Ok(out)
}

/// Left-pad raw bytes to `width`.
pub(crate) fn pad_left_bytes(data: &[u8], width: usize) -> Result<Vec<u8>> {
    if data.len() > width {
        return Err(CallerError::MessageTooLong.into());
    }
    let mut out = vec![0u8; width];
    out[width - data.len()..].copy_from_slice(data);
    Ok(out)
}

/// Helper type for parsing a byte array into fixed-width slices.
///
/// This type implements [`Zeroize`]. When parsing secret material, call
/// `zeroize()` once parsing is complete.
#[derive(Zeroize)]
pub(crate) struct ParseBytes {
    bytes: Vec<u8>,
    offset: usize,
}

impl ParseBytes {
    pub(crate) fn new(bytes: Vec<u8>) -> ParseBytes {
        ParseBytes { bytes, offset: 0 }
    }

    /// Take the next `n` bytes.
    pub(crate) fn take_bytes(&mut self, n: usize) -> Result<&[u8]> {
        let slice = self
            .bytes
            .get(self.offset..self.offset + n)
            .ok_or(CallerError::DeserializationFailed)?;
        self.offset += n;
        Ok(slice)
    }

    /// Take the next `n` bytes as an unsigned big-endian integer.
    pub(crate) fn take_int(&mut self, n: usize) -> Result<BigNumber> {
        Ok(BigNumber::from_slice(self.take_bytes(n)?))
    }

    /// Take the next 4 bytes as a big-endian `u32`.
    pub(crate) fn take_u32(&mut self) -> Result<u32> {
        let slice = self.take_bytes(4)?;
        let arr: [u8; 4] = slice
            .try_into()
            .map_err(|_| CallerError::DeserializationFailed)?;
        Ok(u32::from_be_bytes(arr))
    }

    /// True when every byte has been consumed.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.offset == self.bytes.len()
    }
}
