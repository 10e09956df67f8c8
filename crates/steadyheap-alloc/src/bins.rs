use core::ptr::NonNull;

use steadyheap_bits::{
  log2_floor,
  BinMask,
};

use crate::{
  fragment::Fragment,
  FRAGMENT_SIZE_MIN,
  NUM_BINS,
};

/// Bucket of a free fragment about to be indexed or removed. Bin `i` holds
/// free fragments of sizes in `[FRAGMENT_SIZE_MIN * 2^i,
/// FRAGMENT_SIZE_MIN * 2^(i+1))`, hence the floor.
pub(crate) fn bin_of(size: usize) -> usize {
  debug_assert!(size >= FRAGMENT_SIZE_MIN);
  debug_assert!(size % FRAGMENT_SIZE_MIN == 0);
  let index = log2_floor(size / FRAGMENT_SIZE_MIN);
  debug_assert!(index < NUM_BINS);
  index
}

/// The segregated free-list index: one LIFO list head per size class plus
/// the occupancy mask that turns smallest-feasible-bin lookup into a single
/// word operation.
#[repr(C)]
pub(crate) struct BinIndex {
  heads: [Option<NonNull<Fragment>>; NUM_BINS],
  mask: BinMask,
}

impl BinIndex {
  pub(crate) const fn new() -> Self {
    Self {
      heads: [None; NUM_BINS],
      mask: BinMask::new(),
    }
  }

  /// Pushes a free fragment onto the head of its bucket. The most recently
  /// freed fragment is handed back by the next matching allocation.
  pub(crate) fn insert(&mut self, mut frag: NonNull<Fragment>) {
    let index = bin_of(unsafe { frag.as_ref() }.header.size);
    let old_head = self.heads[index];
    {
      let frag_ref = unsafe { frag.as_mut() };
      frag_ref.prev_free = None;
      frag_ref.next_free = old_head;
    }
    if let Some(mut head) = old_head {
      unsafe { head.as_mut() }.prev_free = Some(frag);
    }
    self.heads[index] = Some(frag);
    self.mask.set(index);
  }

  /// Splices a fragment out of its bucket. Touches at most four pointers
  /// and one mask bit.
  pub(crate) fn remove(&mut self, mut frag: NonNull<Fragment>) {
    let index = bin_of(unsafe { frag.as_ref() }.header.size);
    let (prev, next) = {
      let frag_ref = unsafe { frag.as_mut() };
      let links = (frag_ref.prev_free, frag_ref.next_free);
      frag_ref.prev_free = None;
      frag_ref.next_free = None;
      links
    };
    if let Some(mut p) = prev {
      unsafe { p.as_mut() }.next_free = next;
    }
    if let Some(mut n) = next {
      unsafe { n.as_mut() }.prev_free = prev;
    }
    if self.heads[index] == Some(frag) {
      self.heads[index] = next;
    }
    if self.heads[index].is_none() {
      self.mask.clear(index);
    }
  }

  /// Head of the smallest non-empty bin at index `floor` or above.
  pub(crate) fn find(&self, floor: usize) -> Option<NonNull<Fragment>> {
    let index = self.mask.smallest_at_least(floor)?;
    let head = self.heads[index];
    debug_assert!(head.is_some());
    head
  }

  pub(crate) fn head(&self, index: usize) -> Option<NonNull<Fragment>> {
    self.heads[index]
  }

  pub(crate) fn mask(&self) -> BinMask {
    self.mask
  }
}
