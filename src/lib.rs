#![cfg_attr(not(test), no_std)]

//! Facade over the steadyheap allocator core.
//!
//! Re-exports the per-instance API and adds [`GlobalArena`], a spin-locked
//! adapter that lets one heap serve as the process global allocator. The
//! core itself performs no locking; this wrapper owns the only lock in the
//! tree.

use core::{
  alloc::{
    GlobalAlloc,
    Layout,
  },
  ptr::{
    self,
    NonNull,
  },
};

use spin::Mutex;

pub use steadyheap_alloc::{
  Diagnostics,
  Heap,
  HeapError,
  HeapResult,
  Hooks,
  ALIGNMENT,
  FRAGMENT_SIZE_MAX,
  FRAGMENT_SIZE_MIN,
  NUM_BINS,
};

pub mod prelude {
  pub use super::{
    Diagnostics,
    GlobalArena,
    Heap,
    HeapError,
    HeapResult,
    Hooks,
    ALIGNMENT,
  };
}

/// A heap behind a spin lock, suitable for `#[global_allocator]`.
///
/// Starts empty; [`GlobalArena::init`] installs the backing storage. Until
/// then every allocation fails with a null pointer.
pub struct GlobalArena {
  heap: Mutex<Option<&'static mut Heap>>,
}

impl GlobalArena {
  pub const fn new() -> Self {
    Self {
      heap: Mutex::new(None),
    }
  }

  /// Claims `arena` as the backing storage. Replaces any heap installed
  /// earlier; outstanding allocations from the old heap are abandoned.
  pub fn init(&self, arena: &'static mut [u8]) -> HeapResult<()> {
    let heap = Heap::init(arena, Hooks::none())?;
    *self.heap.lock() = Some(heap);
    Ok(())
  }

  /// Snapshot of the installed heap's counters, if any.
  pub fn diagnostics(&self) -> Option<Diagnostics> {
    self.heap.lock().as_ref().map(|heap| heap.diagnostics())
  }
}

impl Default for GlobalArena {
  fn default() -> Self {
    Self::new()
  }
}

unsafe impl GlobalAlloc for GlobalArena {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }
    match self.heap.lock().as_mut() {
      Some(heap) => heap
        .allocate(layout.size())
        .map_or(ptr::null_mut(), NonNull::as_ptr),
      None => ptr::null_mut(),
    }
  }

  unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
    if let Some(heap) = self.heap.lock().as_mut() {
      unsafe { heap.deallocate(ptr) };
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn leaked_arena(len: usize) -> &'static mut [u8] {
    Box::leak(vec![0u8; len].into_boxed_slice())
  }

  #[test]
  fn uninitialized_arena_returns_null() {
    let arena = GlobalArena::new();
    let layout = Layout::from_size_align(64, 8).unwrap();
    let p = unsafe { arena.alloc(layout) };
    assert!(p.is_null());
    unsafe { arena.dealloc(p, layout) };
    assert!(arena.diagnostics().is_none());
  }

  #[test]
  fn serves_and_reclaims_global_allocations() {
    let arena = GlobalArena::new();
    arena.init(leaked_arena(1 << 20)).unwrap();

    let layout = Layout::from_size_align(1000, 8).unwrap();
    let p = unsafe { arena.alloc(layout) };
    assert!(!p.is_null());
    assert_eq!(p as usize % ALIGNMENT, 0);

    let d = arena.diagnostics().unwrap();
    assert!(d.allocated() > 0);
    assert_eq!(d.peak_request_size(), 1000);

    unsafe { arena.dealloc(p, layout) };
    assert_eq!(arena.diagnostics().unwrap().allocated(), 0);
  }

  #[test]
  fn rejects_over_aligned_layouts() {
    let arena = GlobalArena::new();
    arena.init(leaked_arena(1 << 16)).unwrap();

    let layout = Layout::from_size_align(64, ALIGNMENT * 2).unwrap();
    assert!(unsafe { arena.alloc(layout) }.is_null());
  }
}
