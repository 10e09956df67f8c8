use core::{
  mem::size_of,
  ptr::NonNull,
};

use getset::CloneGetters;
use steadyheap_bits::{
  align_offset,
  align_up,
  is_pow2,
  log2_ceil,
  pow2,
};

use crate::{
  audit,
  bins::BinIndex,
  fragment::{
    interlink,
    Fragment,
  },
  ALIGNMENT,
  FRAGMENT_SIZE_MAX,
  FRAGMENT_SIZE_MIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  /// The arena cannot hold the instance plus one smallest fragment.
  ArenaTooSmall,
  /// Zero bytes were requested; there is nothing to allocate.
  ZeroRequest,
  /// No free fragment can satisfy the request.
  OutOfMemory,
}

pub type HeapResult<T> = Result<T, HeapError>;

/// Caller-provided critical section callbacks. The allocator performs no
/// locking of its own; it brackets each allocate, deallocate and
/// diagnostics call with exactly one enter and one leave, in that order.
/// Either callback may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hooks {
  pub enter: Option<fn()>,
  pub leave: Option<fn()>,
}

impl Hooks {
  pub const fn none() -> Self {
    Self {
      enter: None,
      leave: None,
    }
  }

  fn section(&self) -> Section<'_> {
    if let Some(enter) = self.enter {
      enter();
    }
    Section(self)
  }
}

/// Bracket over the hook pair: enter at construction, leave on drop.
struct Section<'hooks>(&'hooks Hooks);

impl Drop for Section<'_> {
  fn drop(&mut self) {
    if let Some(leave) = self.0.leave {
      leave();
    }
  }
}

/// Point-in-time usage counters. `capacity` is fixed at initialization,
/// `allocated` tracks current usage, the remaining counters never decrease.
#[derive(CloneGetters, Debug, Clone, Copy, PartialEq, Eq)]
#[getset(get_clone = "pub")]
pub struct Diagnostics {
  /// Usable arena bytes past the instance and alignment, fixed at init.
  capacity: usize,
  /// Sum of fragment sizes currently held by the caller, headers included.
  allocated: usize,
  /// Largest `allocated` ever observed.
  peak_allocated: usize,
  /// Largest amount ever requested, satisfied or not.
  peak_request_size: usize,
  /// Number of unsatisfied non-zero requests.
  oom_count: usize,
}

/// The allocator instance. Lives at the aligned base of the arena it
/// manages; the fragment storage follows immediately after.
#[repr(C)]
pub struct Heap {
  bins: BinIndex,
  hooks: Hooks,
  diagnostics: Diagnostics,
}

// The instance owns its arena exclusively; the raw fragment pointers it
// holds never escape it.
unsafe impl Send for Heap {}

impl Heap {
  /// Claims `arena` and installs an instance at its aligned base. The
  /// remainder becomes a single free root fragment, clamped to
  /// `FRAGMENT_SIZE_MAX` and truncated to a multiple of
  /// `FRAGMENT_SIZE_MIN`. The returned handle borrows the arena for its
  /// whole lifetime. The hooks are not invoked.
  pub fn init(arena: &mut [u8], hooks: Hooks) -> HeapResult<&mut Heap> {
    let total = arena.len();
    let base = arena.as_mut_ptr();

    let lead = align_offset(base as usize, ALIGNMENT).ok_or(HeapError::ArenaTooSmall)?;
    let span = align_up(size_of::<Heap>(), ALIGNMENT).ok_or(HeapError::ArenaTooSmall)?;
    let storage_offset = lead + span;
    if total < storage_offset + FRAGMENT_SIZE_MIN {
      return Err(HeapError::ArenaTooSmall);
    }

    let mut remaining = total - storage_offset;
    if remaining > FRAGMENT_SIZE_MAX {
      remaining = FRAGMENT_SIZE_MAX;
    }
    remaining -= remaining % FRAGMENT_SIZE_MIN;
    if remaining < FRAGMENT_SIZE_MIN {
      return Err(HeapError::ArenaTooSmall);
    }

    unsafe {
      let heap = base.add(lead).cast::<Heap>();
      heap.write(Heap {
        bins: BinIndex::new(),
        hooks,
        diagnostics: Diagnostics {
          capacity: remaining,
          allocated: 0,
          peak_allocated: 0,
          peak_request_size: 0,
          oom_count: 0,
        },
      });
      let root = Fragment::emplace(base.add(storage_offset), remaining);
      (*heap).bins.insert(root);
      Ok(&mut *heap)
    }
  }

  /// Hands out at least `amount` bytes aligned to `ALIGNMENT`, not zeroed.
  /// Constant time: one bitmap probe, one list pop, at most one split.
  pub fn allocate(&mut self, amount: usize) -> HeapResult<NonNull<u8>> {
    let hooks = self.hooks;
    let _section = hooks.section();
    let result = self.grab(amount);

    // The request size peak is recorded even for requests that failed.
    if amount > self.diagnostics.peak_request_size {
      self.diagnostics.peak_request_size = amount;
    }
    if matches!(result, Err(HeapError::OutOfMemory)) {
      self.diagnostics.oom_count += 1;
    }
    result
  }

  fn grab(&mut self, amount: usize) -> HeapResult<NonNull<u8>> {
    if amount == 0 {
      return Err(HeapError::ZeroRequest);
    }
    let capacity = self.diagnostics.capacity;
    if amount > capacity - ALIGNMENT {
      // Also shields the rounding below from overflowing the word.
      return Err(HeapError::OutOfMemory);
    }

    // Round the request plus header up to a power of two. Worst case
    // external fragmentation stays bounded under this discipline at the
    // cost of internal padding (Ogasawara 1995; Herter 2014).
    let fragment_size = pow2(log2_ceil(amount + ALIGNMENT));
    debug_assert!(fragment_size >= FRAGMENT_SIZE_MIN);
    debug_assert!(fragment_size >= amount + ALIGNMENT);
    debug_assert!(fragment_size <= FRAGMENT_SIZE_MAX);
    debug_assert!(is_pow2(fragment_size));

    // The first candidate bin is the one whose smallest member suffices.
    let optimal_bin = log2_ceil(fragment_size / FRAGMENT_SIZE_MIN);
    let mut frag = self.bins.find(optimal_bin).ok_or(HeapError::OutOfMemory)?;
    debug_assert!(unsafe { frag.as_ref() }.header.size >= fragment_size);
    debug_assert!(unsafe { frag.as_ref() }.header.size % FRAGMENT_SIZE_MIN == 0);
    self.bins.remove(frag);

    // Sizes are multiples of FRAGMENT_SIZE_MIN, so the leftover is either
    // zero or a whole fragment; shrinking the head unconditionally is safe.
    let leftover = unsafe { frag.as_ref() }.header.size - fragment_size;
    debug_assert!(leftover < capacity);
    debug_assert!(leftover % FRAGMENT_SIZE_MIN == 0);
    unsafe { frag.as_mut() }.header.size = fragment_size;
    if leftover >= FRAGMENT_SIZE_MIN {
      let tail = unsafe { Fragment::emplace(frag.as_ptr().cast::<u8>().add(fragment_size), leftover) };
      interlink(Some(tail), unsafe { frag.as_ref() }.header.next);
      interlink(Some(frag), Some(tail));
      self.bins.insert(tail);
    }

    unsafe { frag.as_mut() }.header.used = true;

    self.diagnostics.allocated += fragment_size;
    if self.diagnostics.allocated > self.diagnostics.peak_allocated {
      self.diagnostics.peak_allocated = self.diagnostics.allocated;
    }

    Ok(Fragment::payload(frag))
  }

  /// Returns a fragment to the free pool, eagerly merging it with free
  /// physical neighbors. A null pointer is a silent no-op that does not
  /// touch the hooks.
  ///
  /// # Safety
  /// `pointer` must be null or a pointer obtained from `allocate` on this
  /// same instance and not deallocated since. A pointer that fails the
  /// plausibility audit is dropped without mutation (and trips a debug
  /// assertion), but the audit cannot catch everything.
  pub unsafe fn deallocate(&mut self, pointer: *mut u8) {
    if pointer.is_null() {
      return;
    }
    let ok = audit::plausible(self, pointer);
    debug_assert!(ok, "pointer was not produced by this allocator");
    if !ok {
      return;
    }

    let mut frag = unsafe { Fragment::from_payload(pointer) };
    let _section = self.hooks.section();

    // Clear the flag before anything else so a double free of the same
    // pointer fails the audit instead of corrupting the index.
    unsafe { frag.as_mut() }.header.used = false;

    let size = unsafe { frag.as_ref() }.header.size;
    debug_assert!(self.diagnostics.allocated >= size);
    self.diagnostics.allocated -= size;

    let prev = unsafe { frag.as_ref() }.header.prev;
    let next = unsafe { frag.as_ref() }.header.next;
    let left = prev.filter(|p| unsafe { !p.as_ref().header.used });
    let right = next.filter(|n| unsafe { !n.as_ref().header.used });

    match (left, right) {
      (Some(mut left), Some(mut right)) => {
        self.bins.remove(left);
        self.bins.remove(right);
        let absorbed = size + unsafe { right.as_ref() }.header.size;
        let beyond = unsafe { right.as_ref() }.header.next;
        unsafe {
          left.as_mut().header.size += absorbed;
          frag.as_mut().header.size = 0;
          right.as_mut().header.size = 0;
        }
        interlink(Some(left), beyond);
        self.bins.insert(left);
      }
      (Some(mut left), None) => {
        self.bins.remove(left);
        unsafe {
          left.as_mut().header.size += size;
          frag.as_mut().header.size = 0;
        }
        interlink(Some(left), next);
        self.bins.insert(left);
      }
      (None, Some(mut right)) => {
        self.bins.remove(right);
        let beyond = unsafe { right.as_ref() }.header.next;
        unsafe {
          frag.as_mut().header.size += right.as_ref().header.size;
          right.as_mut().header.size = 0;
        }
        interlink(Some(frag), beyond);
        self.bins.insert(frag);
      }
      (None, None) => {
        self.bins.insert(frag);
      }
    }
  }

  /// Copies out the usage counters under the critical section pair.
  pub fn diagnostics(&self) -> Diagnostics {
    let _section = self.hooks.section();
    self.diagnostics
  }

  /// Quick coherence check over the counters alone. Constant time; does
  /// not walk the arena.
  pub fn invariants_hold(&self) -> bool {
    let d = &self.diagnostics;
    let mut ok = d.capacity >= FRAGMENT_SIZE_MIN && d.capacity <= FRAGMENT_SIZE_MAX;
    ok = ok && d.capacity % FRAGMENT_SIZE_MIN == 0;
    ok = ok && d.allocated <= d.capacity;
    ok = ok && d.allocated % FRAGMENT_SIZE_MIN == 0;
    ok = ok && d.peak_allocated >= d.allocated;
    ok = ok && d.peak_allocated <= d.capacity;
    ok = ok && d.peak_allocated % FRAGMENT_SIZE_MIN == 0;
    ok = ok && (d.peak_allocated == 0 || d.peak_request_size > 0);
    ok
  }

  pub(crate) fn capacity(&self) -> usize {
    self.diagnostics.capacity
  }

  #[cfg(test)]
  pub(crate) fn bins(&self) -> &BinIndex {
    &self.bins
  }

  /// Counters without the hook bracket, for test inspection.
  #[cfg(test)]
  pub(crate) fn counters(&self) -> Diagnostics {
    self.diagnostics
  }
}
