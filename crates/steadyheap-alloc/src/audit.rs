use core::{
  mem::size_of,
  ptr::{
    addr_of,
    NonNull,
  },
};

use crate::{
  fragment::Fragment,
  heap::Heap,
  ALIGNMENT,
  FRAGMENT_SIZE_MIN,
};

/// Cheap plausibility checks over an alleged user pointer.
///
/// A pointer returned by a prior successful allocation and not yet freed
/// always passes. A pointer that demonstrably cannot have come from this
/// heap never does. The checks are heuristics: crafted garbage may still
/// slip through, and what happens then is on the caller.
///
/// Header fields are read through raw pointer projection so that no
/// reference to an unproven `Fragment` is ever materialized; the `used`
/// flag in particular is read as a raw byte.
pub(crate) fn plausible(heap: &Heap, pointer: *const u8) -> bool {
  if pointer.is_null() {
    return true;
  }

  let addr = pointer as usize;
  if addr % ALIGNMENT != 0 {
    return false;
  }
  let frag_addr = addr - ALIGNMENT;

  // Approximate arena extent: the storage begins no earlier than the end of
  // the instance and spans at most `capacity` bytes.
  let floor = heap as *const Heap as usize + size_of::<Heap>();
  let ceil = floor + heap.capacity();
  if frag_addr < floor || frag_addr > ceil {
    return false;
  }

  let frag = frag_addr as *const Fragment;
  let me = NonNull::new(frag_addr as *mut Fragment);
  unsafe {
    let used = addr_of!((*frag).header.used).cast::<u8>().read();
    if used != 1 {
      return false;
    }

    let size = addr_of!((*frag).header.size).read();
    if size < FRAGMENT_SIZE_MIN || size > heap.capacity() || size % FRAGMENT_SIZE_MIN != 0 {
      return false;
    }

    if let Some(next) = addr_of!((*frag).header.next).read() {
      if addr_of!((*next.as_ptr()).header.prev).read() != me {
        return false;
      }
    }
    if let Some(prev) = addr_of!((*frag).header.prev).read() {
      if addr_of!((*prev.as_ptr()).header.next).read() != me {
        return false;
      }
    }
  }
  true
}
