// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The verifier side: deterministic signature checking.
//!
//! The verifier reconstructs the prover's first-move messages from the
//! quotient commitments and reduced responses, re-derives the Fiat-Shamir
//! challenge, and accepts only if everything matches. The public surface
//! never panics and never returns error detail beyond accept/reject: all
//! failures, malformed bytes included, collapse to `false`.

use crate::{
    arith::{bit_length, bn},
    constants::{CHAL_BITS, ELLDIFF_MAX, EXPONENT_SIZE, SMALL_PRIMES},
    errors::{GuoError, Result},
    group::GuoGroup,
    primes::is_prime,
    sig::Signature,
    transcript::{fs_chal, TranscriptInput},
};
use tracing::instrument;
use unknown_order::BigNumber;

impl GuoGroup {
    /// Verify a serialized signature on `msg` against the serialized
    /// commitment `C1`. Returns `false` on any failure.
    pub fn verify(&self, msg: &[u8], sig_bytes: &[u8], c1: &[u8]) -> bool {
        let inner = || -> Result<()> {
            let sig = Signature::from_bytes(self, sig_bytes)?;
            let c1 = self.element_from_bytes(c1)?;
            self.verify_signature(msg, &sig, &c1)
        };
        inner().is_ok()
    }

    /// Verify a decoded signature against a decoded commitment.
    #[instrument(skip_all, err(Debug))]
    pub(crate) fn verify_signature(
        &self,
        msg: &[u8],
        sig: &Signature,
        c1: &BigNumber,
    ) -> Result<()> {
        let zero = BigNumber::zero();

        // Range discipline first: scalars non-negative and of bounded
        // width, responses strictly below ell.
        let scalars = [
            &sig.chal, &sig.ell, &sig.eq, &sig.z_w, &sig.z_w2, &sig.z_s1, &sig.z_a, &sig.z_an,
            &sig.z_s1w, &sig.z_sa, &sig.z_s2,
        ];
        if scalars.iter().any(|x| *x < &zero) {
            return Err(GuoError::InvalidSignature);
        }
        if bit_length(&sig.chal) > CHAL_BITS || bit_length(&sig.ell) > CHAL_BITS {
            return Err(GuoError::InvalidSignature);
        }
        if bit_length(&sig.eq) > EXPONENT_SIZE {
            return Err(GuoError::InvalidSignature);
        }
        let responses = [
            &sig.z_w, &sig.z_w2, &sig.z_s1, &sig.z_a, &sig.z_an, &sig.z_s1w, &sig.z_sa, &sig.z_s2,
        ];
        if responses.iter().any(|z| *z >= &sig.ell) {
            return Err(GuoError::InvalidSignature);
        }

        if !SMALL_PRIMES.contains(&sig.t) {
            return Err(GuoError::InvalidSignature);
        }

        // Every group element must arrive in canonical form.
        let elements = [c1, &sig.c2, &sig.c3, &sig.aq, &sig.bq, &sig.cq, &sig.dq];
        if elements.iter().any(|el| !self.is_reduced(el)) {
            return Err(GuoError::InvalidSignature);
        }

        // One extended GCD for all seven inverses.
        let [c1_inv, c2_inv, c3_inv, aq_inv, bq_inv, cq_inv, dq_inv] =
            self.inv7([c1, &sig.c2, &sig.c3, &sig.aq, &sig.bq, &sig.cq, &sig.dq])?;

        // Reconstruct the first-move messages.
        let a_el = self.reduce(self.mul(
            &self.pow2(&sig.aq, &aq_inv, &sig.ell, &c2_inv, &sig.c2, &sig.chal)?,
            &self.powgh(&sig.z_w, &sig.z_s1)?,
        ));
        let b_el = self.reduce(self.mul(
            &self.pow2(&sig.bq, &bq_inv, &sig.ell, &c3_inv, &sig.c3, &sig.chal)?,
            &self.powgh(&sig.z_a, &sig.z_s2)?,
        ));
        let c_el = self.reduce(self.mul(
            &self.pow2(&sig.cq, &cq_inv, &sig.ell, &c2_inv, &sig.c2, &sig.z_w)?,
            &self.powgh(&sig.z_w2, &sig.z_s1w)?,
        ));
        let d_el = self.reduce(self.mul(
            &self.pow2(&sig.dq, &dq_inv, &sig.ell, &c1_inv, c1, &sig.z_a)?,
            &self.powgh(&sig.z_an, &sig.z_sa)?,
        ));

        // The integer message E, matching the signer's floor division.
        let delta = &sig.z_w2 - &sig.z_an;
        let mut e_int = &(&sig.eq * &sig.ell) + &delta - &(&bn(u64::from(sig.t)) * &sig.chal);
        if delta < zero {
            e_int = &e_int + &sig.ell;
        }
        if e_int < zero {
            return Err(GuoError::InvalidSignature);
        }

        let input = TranscriptInput {
            c1,
            c2: &sig.c2,
            c3: &sig.c3,
            t: sig.t,
            a: &a_el,
            b: &b_el,
            c: &c_el,
            d: &d_el,
            e: &e_int,
        };
        let (chal, ell_r, key) = fs_chal(self, &input, msg, true)?;

        if chal != sig.chal {
            return Err(GuoError::InvalidSignature);
        }
        let elldiff = &sig.ell - &ell_r;
        if elldiff < zero || elldiff > bn(u64::from(ELLDIFF_MAX)) {
            return Err(GuoError::InvalidSignature);
        }
        if !is_prime(&sig.ell, &key) {
            return Err(GuoError::InvalidSignature);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_group, test_rng, test_rsa_private};
    use crate::GuoGroup as Group;

    struct Fixture {
        group: Group,
        sig: Signature,
        c1: BigNumber,
    }

    fn fixture() -> Fixture {
        let mut rng = test_rng();
        let group = test_group();
        let key = test_rsa_private();
        let s_prime = Group::generate_seed(&mut rng);
        let c1_bytes = group.challenge(&s_prime, &key.public_modulus()).unwrap();
        let c1 = group.element_from_bytes(&c1_bytes).unwrap();
        let sig = group.sign(&mut rng, b"claim", &s_prime, &key).unwrap();
        Fixture { group, sig, c1 }
    }

    #[test]
    fn honest_signatures_verify() {
        let f = fixture();
        assert!(f.group.verify_signature(b"claim", &f.sig, &f.c1).is_ok());
    }

    #[test]
    fn wrong_message_is_rejected() {
        let f = fixture();
        assert!(f.group.verify_signature(b"claim2", &f.sig, &f.c1).is_err());
        assert!(f.group.verify_signature(b"", &f.sig, &f.c1).is_err());
    }

    #[test]
    fn non_canonical_elements_are_rejected() {
        let f = fixture();
        let mut sig = f.sig.clone();
        // Flip C2 to the other representative of its class.
        sig.c2 = f.group.modulus() - &sig.c2;
        assert!(f.group.verify_signature(b"claim", &sig, &f.c1).is_err());
    }

    #[test]
    fn out_of_table_t_is_rejected() {
        let f = fixture();
        let mut sig = f.sig.clone();
        sig.t = 1001;
        assert!(f.group.verify_signature(b"claim", &sig, &f.c1).is_err());
    }

    #[test]
    fn oversized_responses_are_rejected() {
        let f = fixture();
        let mut sig = f.sig.clone();
        sig.z_w = sig.ell.clone();
        assert!(f.group.verify_signature(b"claim", &sig, &f.c1).is_err());

        let mut sig = f.sig.clone();
        sig.chal = BigNumber::one() << CHAL_BITS;
        assert!(f.group.verify_signature(b"claim", &sig, &f.c1).is_err());

        let mut sig = f.sig.clone();
        sig.eq = -sig.eq;
        if sig.eq < BigNumber::zero() {
            assert!(f.group.verify_signature(b"claim", &sig, &f.c1).is_err());
        }
    }

    #[test]
    fn tampered_quotients_are_rejected() {
        let f = fixture();
        for idx in 0..4 {
            let mut sig = f.sig.clone();
            let target = match idx {
                0 => &mut sig.aq,
                1 => &mut sig.bq,
                2 => &mut sig.cq,
                _ => &mut sig.dq,
            };
            *target = f.group.reduce(&*target + &BigNumber::one());
            assert!(
                f.group.verify_signature(b"claim", &sig, &f.c1).is_err(),
                "quotient {idx} must be bound"
            );
        }
    }
}
