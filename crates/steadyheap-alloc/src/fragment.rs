use core::ptr::NonNull;

use crate::{
  ALIGNMENT,
  FRAGMENT_SIZE_MIN,
};

/// Per-fragment metadata occupying the first `ALIGNMENT` bytes of the
/// fragment. The header survives across allocate and free and never moves
/// once placed; a header absorbed by a merge is retired with `size = 0`.
#[repr(C)]
#[derive(Debug)]
pub struct FragmentHeader {
  /// Physical chain, address order. `None` at the arena ends.
  pub(crate) next: Option<NonNull<Fragment>>,
  pub(crate) prev: Option<NonNull<Fragment>>,
  /// Bytes, header included. Always a multiple of `FRAGMENT_SIZE_MIN`.
  pub(crate) size: usize,
  pub(crate) used: bool,
}

/// A fragment of the arena. The free-list links sit past the header and
/// spill into the allocatable space; they are meaningful only while the
/// fragment is free.
#[repr(C)]
#[derive(Debug)]
pub struct Fragment {
  pub(crate) header: FragmentHeader,
  pub(crate) next_free: Option<NonNull<Fragment>>,
  pub(crate) prev_free: Option<NonNull<Fragment>>,
}

const _: () = assert!(core::mem::size_of::<FragmentHeader>() <= ALIGNMENT);
const _: () = assert!(core::mem::size_of::<Fragment>() <= FRAGMENT_SIZE_MIN);
const _: () = assert!(core::mem::align_of::<Fragment>() <= ALIGNMENT);

impl Fragment {
  /// Address of the allocatable payload.
  pub(crate) fn payload(frag: NonNull<Fragment>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(frag.as_ptr().cast::<u8>().add(ALIGNMENT)) }
  }

  /// Recovers the fragment whose payload a prior allocation returned.
  ///
  /// # Safety
  /// `pointer` must have passed the audit against the owning heap.
  pub(crate) unsafe fn from_payload(pointer: *mut u8) -> NonNull<Fragment> {
    unsafe { NonNull::new_unchecked(pointer.sub(ALIGNMENT).cast::<Fragment>()) }
  }

  /// Materializes a fresh free fragment at `addr`.
  ///
  /// # Safety
  /// `addr` must be `ALIGNMENT`-aligned and back at least `size` bytes
  /// owned by the allocator, with `size >= FRAGMENT_SIZE_MIN`.
  pub(crate) unsafe fn emplace(addr: *mut u8, size: usize) -> NonNull<Fragment> {
    debug_assert!(addr as usize % ALIGNMENT == 0);
    debug_assert!(size >= FRAGMENT_SIZE_MIN);
    let frag = addr.cast::<Fragment>();
    unsafe {
      frag.write(Fragment {
        header: FragmentHeader {
          next: None,
          prev: None,
          size,
          used: false,
        },
        next_free: None,
        prev_free: None,
      });
      NonNull::new_unchecked(frag)
    }
  }
}

/// Stitches `left.next = right` and `right.prev = left`, tolerating either
/// side being absent at an arena end.
pub(crate) fn interlink(left: Option<NonNull<Fragment>>, right: Option<NonNull<Fragment>>) {
  unsafe {
    if let Some(mut l) = left {
      l.as_mut().header.next = right;
    }
    if let Some(mut r) = right {
      r.as_mut().header.prev = left;
    }
  }
}
