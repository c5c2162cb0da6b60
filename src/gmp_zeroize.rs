// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Wiping of freed bignum memory.
//!
//! Prover secrets (`p`, `q`, `w`, `a`, the blinding exponents) live in GMP
//! limb buffers on the heap, which GMP allocates, moves and releases outside
//! the view of Rust code, so `zeroize` on the Rust side cannot reach them.
//! GMP's custom-allocation interface accepts replacement memory functions
//! process-wide; this module swaps in release paths that erase a buffer
//! before it goes back to the allocator, so dropped
//! [`unknown_order::BigNumber`] secrets do not linger in freed memory.

use gmp_mpfr_sys::gmp;
use std::{ffi::c_void, ptr, slice, sync::Once};
use zeroize::Zeroize;

/// The allocator GMP was using before the wiping hooks were installed.
/// Written exactly once, inside [`enable_memory_wiping`], before the hooks
/// that read it can run. The original realloc is not retained: both wrapper
/// paths are rebuilt from plain alloc and free.
#[derive(Clone, Copy)]
struct GmpAllocator {
    alloc: gmp::allocate_function,
    free: gmp::free_function,
}

static mut FALLBACK: GmpAllocator = GmpAllocator {
    alloc: None,
    free: None,
};

/// Route all GMP frees and reallocations through buffer-wiping wrappers.
/// Call at startup, before any group or key material exists. Idempotent,
/// and affects every GMP user in the process.
pub fn enable_memory_wiping() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| unsafe {
        // SAFETY: the custom-allocation API is documented at
        // https://gmplib.org/manual/Custom-Allocation; the default functions
        // are always present.
        let (mut alloc, mut realloc, mut free) = (None, None, None);
        gmp::get_memory_functions(&mut alloc, &mut realloc, &mut free);
        let _ = realloc;
        assert!(
            alloc.is_some() && free.is_some(),
            "GMP must expose its current allocator"
        );
        FALLBACK = GmpAllocator { alloc, free };
        gmp::set_memory_functions(None, Some(moving_realloc), Some(erasing_free));
    });
}

/// SAFETY: `ptr` must reference a live allocation of at least `len` bytes.
unsafe fn erase(ptr: *mut c_void, len: usize) {
    slice::from_raw_parts_mut(ptr.cast::<u8>(), len).zeroize();
}

extern "C" fn erasing_free(block: *mut c_void, size: usize) {
    // SAFETY: GMP guarantees `block` is a previous allocation of exactly
    // `size` bytes, and FALLBACK was populated before this hook existed.
    unsafe {
        let orig = FALLBACK;
        erase(block, size);
        orig.free.expect("captured before install")(block, size);
    }
}

extern "C" fn moving_realloc(block: *mut c_void, old_size: usize, new_size: usize) -> *mut c_void {
    // Growing in place would hand the old buffer back to the allocator with
    // its contents intact, so the move is done by hand: fresh allocation,
    // copy, erase, release.
    unsafe {
        let orig = FALLBACK;
        let fresh = orig.alloc.expect("captured before install")(new_size);
        // SAFETY: both blocks are live, distinct, and hold at least
        // min(old_size, new_size) bytes.
        ptr::copy_nonoverlapping(
            block.cast::<u8>(),
            fresh.cast::<u8>(),
            old_size.min(new_size),
        );
        erase(block, old_size);
        orig.free.expect("captured before install")(block, old_size);
        fresh
    }
}
