use super::*;

#[test]
fn test_is_pow2() {
  assert!(is_pow2(0));
  assert!(is_pow2(1));
  assert!(is_pow2(2));
  assert!(is_pow2(4));
  assert!(is_pow2(1 << 20));
  assert!(is_pow2(1 << (WORD_BITS - 1)));

  assert!(!is_pow2(3));
  assert!(!is_pow2(6));
  assert!(!is_pow2(100));
  assert!(!is_pow2(usize::MAX));
}

#[test]
fn test_log2_floor() {
  assert_eq!(log2_floor(0), 0);
  assert_eq!(log2_floor(1), 0);
  assert_eq!(log2_floor(2), 1);
  assert_eq!(log2_floor(3), 1);
  assert_eq!(log2_floor(4), 2);
  assert_eq!(log2_floor(7), 2);
  assert_eq!(log2_floor(8), 3);
  assert_eq!(log2_floor(1023), 9);
  assert_eq!(log2_floor(1024), 10);
  assert_eq!(log2_floor(1025), 10);
  assert_eq!(log2_floor(usize::MAX), WORD_BITS - 1);
  assert_eq!(log2_floor(1 << (WORD_BITS - 1)), WORD_BITS - 1);
}

#[test]
fn test_log2_ceil() {
  assert_eq!(log2_ceil(0), 0);
  assert_eq!(log2_ceil(1), 0);
  assert_eq!(log2_ceil(2), 1);
  assert_eq!(log2_ceil(3), 2);
  assert_eq!(log2_ceil(4), 2);
  assert_eq!(log2_ceil(5), 3);
  assert_eq!(log2_ceil(1023), 10);
  assert_eq!(log2_ceil(1024), 10);
  assert_eq!(log2_ceil(1025), 11);
  assert_eq!(log2_ceil(1 << (WORD_BITS - 1)), WORD_BITS - 1);
}

#[test]
fn test_pow2() {
  assert_eq!(pow2(0), 1);
  assert_eq!(pow2(1), 2);
  assert_eq!(pow2(5), 32);
  assert_eq!(pow2(WORD_BITS - 1), 1 << (WORD_BITS - 1));
}

#[test]
fn test_log2_pow2_round_trip() {
  for k in 0..WORD_BITS {
    assert_eq!(log2_floor(pow2(k)), k);
    assert_eq!(log2_ceil(pow2(k)), k);
  }
}

#[test]
fn test_is_aligned() {
  assert_eq!(is_aligned(0, 16), Some(true));
  assert_eq!(is_aligned(16, 16), Some(true));
  assert_eq!(is_aligned(15, 16), Some(false));
  assert_eq!(is_aligned(17, 16), Some(false));
  assert_eq!(is_aligned(100, 3), None);
}

#[test]
fn test_align_up() {
  assert_eq!(align_up(0, 32), Some(0));
  assert_eq!(align_up(1, 32), Some(32));
  assert_eq!(align_up(31, 32), Some(32));
  assert_eq!(align_up(32, 32), Some(32));
  assert_eq!(align_up(33, 32), Some(64));
  assert_eq!(align_up(100, 6), None);
  assert_eq!(align_up(usize::MAX, 32), None);
  assert_eq!(align_up(usize::MAX - 30, 32), None);
}

#[test]
fn test_align_offset() {
  assert_eq!(align_offset(0, 32), Some(0));
  assert_eq!(align_offset(1, 32), Some(31));
  assert_eq!(align_offset(31, 32), Some(1));
  assert_eq!(align_offset(32, 32), Some(0));
  assert_eq!(align_offset(100, 3), None);
  assert_eq!(align_offset(usize::MAX, 32), None);
}

#[test]
fn test_mask_set_clear_get() {
  let mut mask = BinMask::new();
  assert!(mask.is_empty());
  assert!(!mask.get(0));

  mask.set(0);
  mask.set(5);
  mask.set(WORD_BITS - 1);
  assert!(mask.get(0));
  assert!(mask.get(5));
  assert!(mask.get(WORD_BITS - 1));
  assert!(!mask.get(4));
  assert!(!mask.is_empty());

  mask.clear(5);
  assert!(!mask.get(5));
  mask.clear(0);
  mask.clear(WORD_BITS - 1);
  assert!(mask.is_empty());
}

#[test]
fn test_mask_clear_is_idempotent() {
  let mut mask = BinMask::new();
  mask.set(7);
  mask.clear(3);
  mask.clear(3);
  assert!(mask.get(7));
  assert_eq!(mask.raw(), 1 << 7);
}

#[test]
fn test_mask_smallest_at_least() {
  let mut mask = BinMask::new();
  assert_eq!(mask.smallest_at_least(0), None);

  mask.set(5);
  assert_eq!(mask.smallest_at_least(0), Some(5));
  assert_eq!(mask.smallest_at_least(5), Some(5));
  assert_eq!(mask.smallest_at_least(6), None);

  mask.set(12);
  mask.set(WORD_BITS - 1);
  assert_eq!(mask.smallest_at_least(0), Some(5));
  assert_eq!(mask.smallest_at_least(6), Some(12));
  assert_eq!(mask.smallest_at_least(13), Some(WORD_BITS - 1));
  assert_eq!(mask.smallest_at_least(WORD_BITS - 1), Some(WORD_BITS - 1));

  mask.clear(5);
  mask.clear(12);
  mask.clear(WORD_BITS - 1);
  assert_eq!(mask.smallest_at_least(0), None);
}
