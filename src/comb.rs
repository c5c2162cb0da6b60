// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Precomputed fixed-base comb tables.
//!
//! A comb trades storage for multiplications in fixed-base exponentiation:
//! the exponent is split into `ppa` interleaved bit streams, and one table
//! entry holds the product of the corresponding base powers for every
//! nonzero selection pattern. Walking the streams then costs
//! `shifts * (aps + 1) - 1` group operations regardless of exponent weight.
//!
//! Table layout: entry `row * (2^ppa - 1) + sel - 1` is the bottom-row
//! product for selector `sel`, squared `row * shifts` times. Bit `k` of a
//! selector at schedule position `(shift j, add i)` stands for bit
//! `k*bpw + i*shifts + (shifts-1-j)` of the exponent.

use crate::{
    arith::{bit_length, bn, sqrt, to_u64},
    errors::{GuoError, Result},
};
use std::collections::BTreeMap;
use unknown_order::BigNumber;

/// Shape of a comb table: the 6-tuple fixed at group construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CombShape {
    /// Bases multiplied per add step.
    pub ppa: usize,
    /// Adds between successive squarings.
    pub aps: usize,
    /// Number of squaring rounds.
    pub shifts: usize,
    /// Bits per window: `shifts * aps`.
    pub bpw: usize,
    /// Maximum exponent bit length the comb supports: `bpw * ppa`.
    pub bits: usize,
    /// Number of precomputed elements: `(2^ppa - 1) * aps`.
    pub size: usize,
}

impl CombShape {
    fn of(ppa: usize, aps: usize, shifts: usize) -> CombShape {
        let bpw = aps * shifts;
        CombShape {
            ppa,
            aps,
            shifts,
            bpw,
            bits: bpw * ppa,
            size: ((1usize << ppa) - 1) * aps,
        }
    }

    /// Group operations per exponentiation.
    pub fn ops(&self) -> usize {
        self.shifts * (self.aps + 1) - 1
    }

    /// Choose the cheapest shape covering `bits`-bit exponents whose table
    /// fits in `max_size` elements.
    ///
    /// Candidates are bucketed by operation count, keeping the smallest
    /// table per bucket; walking buckets cheapest-first, a candidate is
    /// only considered if it is strictly smaller than everything already
    /// passed over, and the first one under the cap wins.
    pub fn generate(bits: usize, max_size: usize) -> Result<CombShape> {
        let bits = bits.max(1);
        let mut by_ops: BTreeMap<usize, CombShape> = BTreeMap::new();
        for ppa in 2..=17usize {
            let bpw = (bits + ppa - 1) / ppa;
            let root = to_u64(&sqrt(&bn(bpw as u64))?)? as usize;
            for div in 1..=root + 1 {
                if bpw % div != 0 {
                    continue;
                }
                let other = bpw / div;
                for (aps, shifts) in [(div, other), (other, div)] {
                    let shape = CombShape::of(ppa, aps, shifts);
                    by_ops
                        .entry(shape.ops())
                        .and_modify(|best| {
                            if shape.size < best.size {
                                *best = shape;
                            }
                        })
                        .or_insert(shape);
                }
            }
        }
        let mut smallest_seen: Option<usize> = None;
        for shape in by_ops.values() {
            if let Some(sm) = smallest_seen {
                if sm <= shape.size {
                    continue;
                }
            }
            smallest_seen = Some(shape.size);
            if shape.size <= max_size {
                return Ok(*shape);
            }
        }
        Err(GuoError::ExponentOverflow)
    }
}

/// A filled comb table for one base modulo `n`.
pub(crate) struct Comb {
    pub shape: CombShape,
    items: Vec<BigNumber>,
}

impl Comb {
    pub fn new(base: &BigNumber, modulus: &BigNumber, shape: CombShape) -> Comb {
        let mul = |a: &BigNumber, b: &BigNumber| (a * b).nmod(modulus);
        let sqr_times = |x: &BigNumber, times: usize| {
            let mut y = x.clone();
            for _ in 0..times {
                y = (&y * &y).nmod(modulus);
            }
            y
        };

        let nskip = (1usize << shape.ppa) - 1;
        let mut items = vec![BigNumber::zero(); shape.size];
        items[0] = base.nmod(modulus);

        // Bottom row: the product for every nonzero ppa-bit selector, where
        // bit k stands for base^(2^(k*bpw)).
        for i in 1..shape.ppa {
            let anchor = (1usize << i) - 1;
            items[anchor] = sqr_times(&items[(1usize << (i - 1)) - 1], shape.bpw);
            for j in (1usize << i) + 1..=(1usize << (i + 1)) - 1 {
                items[j - 1] = mul(&items[j - (1usize << i) - 1], &items[anchor]);
            }
        }

        // Shifted copies: row i is row i-1 squared `shifts` times.
        for i in 1..shape.aps {
            for j in 0..nskip {
                items[i * nskip + j] = sqr_times(&items[(i - 1) * nskip + j], shape.shifts);
            }
        }

        Comb { shape, items }
    }

    /// Table entry for a nonzero selector in the given add row.
    pub fn item(&self, row: usize, sel: usize) -> &BigNumber {
        &self.items[row * ((1usize << self.shape.ppa) - 1) + sel - 1]
    }

    /// Split an exponent into the `shifts x aps` selector schedule.
    pub fn to_comb_exp(&self, e: &BigNumber) -> Result<Vec<Vec<usize>>> {
        if bit_length(e) > self.shape.bits {
            return Err(GuoError::ExponentOverflow);
        }
        let bytes = e.to_bytes();
        let bit = |pos: usize| -> usize {
            let byte_idx = pos / 8;
            if byte_idx >= bytes.len() {
                return 0;
            }
            ((bytes[bytes.len() - 1 - byte_idx] >> (pos % 8)) & 1) as usize
        };
        let shape = &self.shape;
        let mut wins = vec![vec![0usize; shape.aps]; shape.shifts];
        for (j, row) in wins.iter_mut().enumerate() {
            for (i, sel) in row.iter_mut().enumerate() {
                let mut v = 0usize;
                for k in (0..shape.ppa).rev() {
                    v = (v << 1) | bit(k * shape.bpw + i * shape.shifts + (shape.shifts - 1 - j));
                }
                *sel = v;
            }
        }
        Ok(wins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::{bn, mod_pow};

    #[test]
    fn generated_shapes_satisfy_the_invariants() {
        for bits in [128usize, 2048, 2177, 4225, 8321] {
            let shape = CombShape::generate(bits, 512).unwrap();
            assert!(shape.bits >= bits, "must cover the requested width");
            assert_eq!(shape.bpw, shape.aps * shape.shifts);
            assert_eq!(shape.bpw % shape.aps, 0);
            assert_eq!(shape.bits, shape.bpw * shape.ppa);
            assert_eq!(shape.size, ((1 << shape.ppa) - 1) * shape.aps);
            assert!(shape.size <= 512);
        }
    }

    #[test]
    fn generation_fails_when_no_table_fits() {
        assert_eq!(
            CombShape::generate(4096, 2).unwrap_err(),
            GuoError::ExponentOverflow
        );
    }

    #[test]
    fn tighter_caps_never_get_cheaper() {
        let loose = CombShape::generate(2048, 512).unwrap();
        let tight = CombShape::generate(2048, 64).unwrap();
        assert!(tight.size <= 64);
        assert!(loose.ops() <= tight.ops());
    }

    #[test]
    fn bottom_row_holds_selector_products() {
        let modulus = bn(1009);
        let base = bn(5);
        let shape = CombShape::generate(16, 512).unwrap();
        let comb = Comb::new(&base, &modulus, shape);

        assert_eq!(comb.item(0, 1), &bn(5));
        for sel in 1..(1usize << shape.ppa) {
            let mut expect = BigNumber::one();
            for k in 0..shape.ppa {
                if (sel >> k) & 1 == 1 {
                    let pow = mod_pow(
                        &base,
                        &(BigNumber::one() << (k * shape.bpw)),
                        &modulus,
                    )
                    .unwrap();
                    expect = (&expect * &pow).nmod(&modulus);
                }
            }
            assert_eq!(comb.item(0, sel), &expect, "selector {sel}");
        }
    }

    #[test]
    fn shifted_rows_are_repeated_squarings_of_the_bottom_row() {
        let modulus = bn(9907);
        let base = bn(2);
        let shape = CombShape::generate(24, 512).unwrap();
        let comb = Comb::new(&base, &modulus, shape);
        for row in 1..shape.aps {
            for sel in 1..(1usize << shape.ppa) {
                let mut expect = comb.item(row - 1, sel).clone();
                for _ in 0..shape.shifts {
                    expect = (&expect * &expect).nmod(&modulus);
                }
                assert_eq!(comb.item(row, sel), &expect);
            }
        }
    }

    #[test]
    fn selector_schedule_reconstructs_the_exponent() {
        let modulus = bn(1009);
        let shape = CombShape::generate(20, 512).unwrap();
        let comb = Comb::new(&bn(3), &modulus, shape);
        for e in [0u64, 1, 2, 0xdead, 0xf_ffff, (1 << shape.bits.min(63)) - 1] {
            let eb = bn(e);
            if bit_length(&eb) > shape.bits {
                continue;
            }
            let wins = comb.to_comb_exp(&eb).unwrap();
            let mut rebuilt = BigNumber::zero();
            for (j, row) in wins.iter().enumerate() {
                for (i, &sel) in row.iter().enumerate() {
                    for k in 0..shape.ppa {
                        if (sel >> k) & 1 == 1 {
                            let pos = k * shape.bpw + i * shape.shifts + (shape.shifts - 1 - j);
                            rebuilt = rebuilt + (BigNumber::one() << pos);
                        }
                    }
                }
            }
            assert_eq!(rebuilt, eb, "exponent {e}");
        }
    }

    #[test]
    fn oversized_exponents_are_rejected() {
        let shape = CombShape::generate(8, 512).unwrap();
        let comb = Comb::new(&bn(2), &bn(1009), shape);
        let too_big = BigNumber::one() << shape.bits;
        assert_eq!(
            comb.to_comb_exp(&too_big).unwrap_err(),
            GuoError::ExponentOverflow
        );
    }
}
