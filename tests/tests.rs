use std::ptr;

use brkalloc::{AllocError, Allocator, ArenaHeap, HEADER_SIZE, align};

fn allocator(capacity: usize) -> Allocator<ArenaHeap> {
  Allocator::new(ArenaHeap::with_capacity(capacity).unwrap())
}

/// Bytes between the heap base and the current end.
fn used(allocator: &Allocator<ArenaHeap>) -> usize {
  allocator.with_heap(|heap| heap.used())
}

#[test]
fn hello_alloc() {
  let allocator = allocator(4096);
  let name = b"Hello Alloc";

  let ptr = allocator.allocate(name.len());
  assert!(!ptr.is_null());

  unsafe {
    ptr::copy_nonoverlapping(name.as_ptr(), ptr, name.len());
    assert_eq!(std::slice::from_raw_parts(ptr, name.len()), name);
  }
}

#[test]
fn allocations_do_not_overlap() {
  let allocator = allocator(64 * 1024);
  let mut regions = Vec::new();

  for (i, size) in [1, 7, 16, 33, 100, 255, 512].into_iter().enumerate() {
    let ptr = allocator.allocate(size);
    assert!(!ptr.is_null());
    assert_eq!(ptr as usize % align::ALIGNMENT, 0);

    unsafe { ptr::write_bytes(ptr, i as u8 + 1, size) };
    regions.push((ptr, size, i as u8 + 1));
  }

  for (ptr, size, fill) in regions {
    let bytes = unsafe { std::slice::from_raw_parts(ptr, size) };
    assert!(bytes.iter().all(|&b| b == fill));
  }
}

#[test]
fn zero_size_does_not_grow() {
  let allocator = allocator(1024);

  assert!(allocator.allocate(0).is_null());
  assert_eq!(used(&allocator), 0);
  assert_eq!(allocator.check().unwrap().blocks, 0);
}

#[test]
fn trailing_free_returns_exact_footprint() {
  let allocator = allocator(4096);

  let _first = allocator.allocate(64);
  let before = used(&allocator);

  let last = allocator.allocate(10);
  let grown = used(&allocator) - before;
  assert_eq!(grown, HEADER_SIZE + 10);

  unsafe { allocator.free(last) };

  assert_eq!(used(&allocator), before);
  assert_eq!(allocator.check().unwrap().blocks, 1);
}

#[test]
fn interior_free_is_reused_first_fit() {
  let allocator = allocator(4096);

  let p = allocator.allocate(64);
  let _q = allocator.allocate(64);
  let end = allocator.heap_end();

  unsafe { allocator.free(p) };
  assert_eq!(allocator.heap_end(), end);

  // larger than the freed block: must not reuse it
  let bigger = allocator.allocate(65);
  assert_ne!(bigger, p);

  assert_eq!(allocator.allocate(64), p);
}

#[test]
fn freed_block_keeps_exact_size() {
  let allocator = allocator(4096);

  let p = allocator.allocate(10);
  let _guard = allocator.allocate(16);

  unsafe { allocator.free(p) };

  // two bytes more than the block holds
  let q = allocator.allocate(12);
  assert!(!q.is_null());
  assert_ne!(q, p);

  assert_eq!(allocator.allocate(10), p);
}

#[test]
fn earliest_free_block_wins() {
  let allocator = allocator(4096);

  let a = allocator.allocate(32);
  let b = allocator.allocate(128);
  let c = allocator.allocate(128);
  let _guard = allocator.allocate(16);

  unsafe {
    allocator.free(c);
    allocator.free(b);
    allocator.free(a);
  }

  // a is too small, b comes before c
  assert_eq!(allocator.allocate(100), b);
  assert_eq!(allocator.allocate(100), c);
  assert_eq!(allocator.allocate(1), a);
}

#[test]
fn reuse_keeps_original_usable_size() {
  let allocator = allocator(4096);

  let big = allocator.allocate(256);
  let _guard = allocator.allocate(16);

  unsafe { allocator.free(big) };

  let small = allocator.allocate(8);
  assert_eq!(small, big);

  let mut sizes = Vec::new();
  allocator.for_each_block(|info| sizes.push((info.address, info.usable_size, info.is_free)));
  assert_eq!(sizes[0], (big, 256, false));
}

#[test]
fn exhaustion_is_recoverable() {
  let allocator = allocator(512);

  let mut live = Vec::new();

  loop {
    match allocator.try_allocate(64) {
      Ok(ptr) => live.push(ptr.as_ptr()),
      Err(err) => {
        assert_eq!(err, AllocError::Exhausted);
        break;
      }
    }
  }

  assert!(!live.is_empty());

  let last = live.pop().unwrap();
  unsafe { allocator.free(last) };

  assert_eq!(allocator.allocate(64), last);
  allocator.check().unwrap();
}

#[test]
fn zero_allocate_is_zeroed() {
  let allocator = allocator(4096);

  let dirty = allocator.allocate(512);
  unsafe { ptr::write_bytes(dirty, 0xFF, 512) };
  let _guard = allocator.allocate(16);
  unsafe { allocator.free(dirty) };

  let zeroed = allocator.zero_allocate(16, 32) as *mut u32;
  assert_eq!(zeroed as *mut u8, dirty);

  let words = unsafe { std::slice::from_raw_parts(zeroed, 128) };
  assert!(words.iter().all(|&w| w == 0));
}

#[test]
fn zero_allocate_overflow_is_null() {
  let allocator = allocator(4096);

  assert!(allocator.zero_allocate(usize::MAX / 2 + 1, 2).is_null());
  assert_eq!(used(&allocator), 0);
}

#[test]
fn resize_preserves_contents() {
  let allocator = allocator(4096);

  let p = allocator.allocate(32);

  unsafe {
    for i in 0..32 {
      p.add(i).write(i as u8 * 3);
    }

    assert_eq!(allocator.resize(p, 32), p);
    assert_eq!(allocator.resize(p, 1), p);

    let q = allocator.resize(p, 1000);
    assert!(!q.is_null());

    for i in 0..32 {
      assert_eq!(q.add(i).read(), i as u8 * 3);
    }

    allocator.free(q);
  }

  allocator.check().unwrap();
}

#[test]
fn free_null_is_noop() {
  let allocator = allocator(256);
  let _p = allocator.allocate(16);
  let before = allocator.check().unwrap();

  unsafe { allocator.free(ptr::null_mut()) };

  assert_eq!(allocator.check().unwrap(), before);
}

#[test]
fn independent_allocators() {
  let first = allocator(1024);
  let second = allocator(1024);

  let a = first.allocate(64);
  let b = second.allocate(64);

  assert_ne!(a, b);
  assert_eq!(first.check().unwrap().blocks, 1);
  assert_eq!(second.check().unwrap().blocks, 1);

  unsafe { first.free(a) };

  assert_eq!(first.check().unwrap().blocks, 0);
  assert_eq!(second.check().unwrap().blocks, 1);
}
