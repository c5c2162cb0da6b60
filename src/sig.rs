// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The signature record and its wire format.
//!
//! All integers on the wire are big-endian and left-zero-padded to fixed
//! widths: group elements occupy one element width of the group, `t` is 4
//! bytes, and the challenge scalars are 16 bytes each. `Eq` is
//! signed-magnitude: a leading sign byte (`0x00` positive, `0x01`
//! negative) followed by the 256-byte magnitude; any other tag is rejected.

use crate::{
    constants::EXPONENT_SIZE,
    errors::{CallerError, Result},
    group::GuoGroup,
    ser::{pad_left, ParseBytes},
};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

const CHAL_BYTES: usize = 16;
const EXPONENT_BYTES: usize = EXPONENT_SIZE / 8;

/// A signature: the commitments, quotient messages and reduced responses of
/// one run of the proof of knowledge, bound to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub(crate) c2: BigNumber,
    pub(crate) c3: BigNumber,
    pub(crate) t: u32,
    pub(crate) chal: BigNumber,
    pub(crate) ell: BigNumber,
    pub(crate) aq: BigNumber,
    pub(crate) bq: BigNumber,
    pub(crate) cq: BigNumber,
    pub(crate) dq: BigNumber,
    pub(crate) eq: BigNumber,
    pub(crate) z_w: BigNumber,
    pub(crate) z_w2: BigNumber,
    pub(crate) z_s1: BigNumber,
    pub(crate) z_a: BigNumber,
    pub(crate) z_an: BigNumber,
    pub(crate) z_s1w: BigNumber,
    pub(crate) z_sa: BigNumber,
    pub(crate) z_s2: BigNumber,
}

impl Signature {
    /// Serialized width for signatures over the given group.
    pub fn encoded_size(group: &GuoGroup) -> usize {
        6 * group.element_size() + 4 + 2 * CHAL_BYTES + (1 + EXPONENT_BYTES) + 8 * CHAL_BYTES
    }

    /// Encode to the fixed-width wire format.
    pub fn to_bytes(&self, group: &GuoGroup) -> Result<Vec<u8>> {
        let el = group.element_size();
        let mut out = Vec::with_capacity(Self::encoded_size(group));
        out.extend_from_slice(&pad_left(&self.c2, el)?);
        out.extend_from_slice(&pad_left(&self.c3, el)?);
        out.extend_from_slice(&self.t.to_be_bytes());
        out.extend_from_slice(&pad_left(&self.chal, CHAL_BYTES)?);
        out.extend_from_slice(&pad_left(&self.ell, CHAL_BYTES)?);
        out.extend_from_slice(&pad_left(&self.aq, el)?);
        out.extend_from_slice(&pad_left(&self.bq, el)?);
        out.extend_from_slice(&pad_left(&self.cq, el)?);
        out.extend_from_slice(&pad_left(&self.dq, el)?);
        out.push(if self.eq < BigNumber::zero() { 0x01 } else { 0x00 });
        out.extend_from_slice(&pad_left(&self.eq, EXPONENT_BYTES)?);
        for z in [
            &self.z_w, &self.z_w2, &self.z_s1, &self.z_a, &self.z_an, &self.z_s1w, &self.z_sa,
            &self.z_s2,
        ] {
            out.extend_from_slice(&pad_left(z, CHAL_BYTES)?);
        }
        Ok(out)
    }

    /// Decode from the fixed-width wire format. This checks shape only; the
    /// semantic range checks belong to verification.
    pub fn from_bytes(group: &GuoGroup, bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != Self::encoded_size(group) {
            return Err(CallerError::DeserializationFailed.into());
        }
        let el = group.element_size();
        let mut parser = ParseBytes::new(bytes.to_vec());
        let c2 = parser.take_int(el)?;
        let c3 = parser.take_int(el)?;
        let t = parser.take_u32()?;
        let chal = parser.take_int(CHAL_BYTES)?;
        let ell = parser.take_int(CHAL_BYTES)?;
        let aq = parser.take_int(el)?;
        let bq = parser.take_int(el)?;
        let cq = parser.take_int(el)?;
        let dq = parser.take_int(el)?;
        let eq_sign = parser.take_bytes(1)?[0];
        let eq_mag = parser.take_int(EXPONENT_BYTES)?;
        let eq = match eq_sign {
            0x00 => eq_mag,
            0x01 => -eq_mag,
            _ => return Err(CallerError::DeserializationFailed.into()),
        };
        let z_w = parser.take_int(CHAL_BYTES)?;
        let z_w2 = parser.take_int(CHAL_BYTES)?;
        let z_s1 = parser.take_int(CHAL_BYTES)?;
        let z_a = parser.take_int(CHAL_BYTES)?;
        let z_an = parser.take_int(CHAL_BYTES)?;
        let z_s1w = parser.take_int(CHAL_BYTES)?;
        let z_sa = parser.take_int(CHAL_BYTES)?;
        let z_s2 = parser.take_int(CHAL_BYTES)?;
        if !parser.is_exhausted() {
            return Err(CallerError::DeserializationFailed.into());
        }
        Ok(Signature {
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
            z_w,
            z_w2,
            z_s1,
            z_a,
            z_an,
            z_s1w,
            z_sa,
            z_s2,
        })
    }
}
