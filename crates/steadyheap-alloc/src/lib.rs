#![cfg_attr(not(test), no_std)]

//! Constant-time arena allocator core.
//!
//! A single caller-supplied contiguous region is carved into fragments
//! threaded on an address-ordered chain; free fragments are additionally
//! indexed by power-of-two size class. Every public operation completes in
//! a bounded number of steps regardless of arena size or allocation count.

mod audit;
mod bins;
mod fragment;
mod heap;

mod config {
  /// Guaranteed payload alignment: four machine words. 16 bytes on 32-bit
  /// platforms, 32 bytes on 64-bit platforms.
  pub const ALIGNMENT: usize = core::mem::size_of::<usize>() * 4;

  /// The smallest legal fragment. Large enough for the header plus both
  /// free-list links of a free fragment.
  pub const FRAGMENT_SIZE_MIN: usize = ALIGNMENT * 2;

  /// The largest legal fragment, 2^(B-1). Keeps the power-of-two rounding
  /// in the allocation path free of overflow.
  pub const FRAGMENT_SIZE_MAX: usize = (usize::MAX >> 1) + 1;

  /// One bin per bit of the occupancy word.
  pub const NUM_BINS: usize = usize::BITS as usize;
}

pub use config::{ALIGNMENT, FRAGMENT_SIZE_MAX, FRAGMENT_SIZE_MIN, NUM_BINS};
pub use heap::{Diagnostics, Heap, HeapError, HeapResult, Hooks};
