use std::alloc::{GlobalAlloc, Layout};
use std::ptr::{self, NonNull};

use spin::Mutex;

use crate::align::{self, ALIGNMENT};
use crate::block::{Block, HEADER_SIZE};
use crate::error::AllocError;
use crate::heap::HeapExtension;
use crate::list::{BlockInfo, BlockList, ListStats};

/// Everything the lock guards: the block list and the heap it lives in.
struct State<H> {
  list: BlockList,
  heap: H,
}

impl<H: HeapExtension> State<H> {
  /// Grows the heap by exactly `total` bytes starting at an aligned address.
  ///
  /// Block sizes are not rounded, so the previous block may leave the end
  /// unaligned; the gap is padded first and never handed back.
  fn grow_aligned(
    &mut self,
    total: isize,
  ) -> Result<NonNull<u8>, AllocError> {
    let end = self.heap.end()?.as_ptr() as usize;
    let padding = align::align_up(end).ok_or(AllocError::Overflow)? - end;

    if padding != 0 {
      self.heap.grow(padding as isize)?;
      log::trace!("padded heap end by {} bytes", padding);
    }

    self.heap.grow(total)
  }
}

/// First-fit allocator over a growable heap.
///
/// Every block ever carved from the heap stays on a creation-ordered list.
/// Freed blocks are marked and reused by later requests that fit; only a
/// block sitting at the very end of the heap is handed back to `H`. Adjacent
/// free blocks are never merged.
///
/// One lock serializes [`allocate`](Self::allocate) and
/// [`free`](Self::free). [`zero_allocate`](Self::zero_allocate) and
/// [`resize`](Self::resize) are built from those two and do not hold the lock
/// in between, so other threads may run between a resize's allocate and free.
pub struct Allocator<H> {
  state: Mutex<State<H>>,
}

impl<H: HeapExtension> Allocator<H> {
  pub const fn new(heap: H) -> Self {
    Self {
      state: Mutex::new(State {
        list: BlockList::new(),
        heap,
      }),
    }
  }

  /// Allocates at least `size` bytes, or returns null.
  ///
  /// Null comes back for `size == 0`, for sizes that overflow once the
  /// header is added, and when the heap cannot grow.
  pub fn allocate(
    &self,
    size: usize,
  ) -> *mut u8 {
    match self.try_allocate(size) {
      Ok(address) => address.as_ptr(),
      Err(_) => ptr::null_mut(),
    }
  }

  /// Same as [`allocate`](Self::allocate), but says why it failed.
  pub fn try_allocate(
    &self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let total = isize::try_from(HEADER_SIZE.checked_add(size).ok_or(AllocError::Overflow)?)
      .map_err(|_| AllocError::Overflow)?;

    let mut state = self.state.lock();

    if let Some(mut block) = state.list.find_fit(size) {
      // SAFETY: the block is linked, so it is a live header, and the lock
      // gives us exclusive access to list metadata.
      unsafe { block.as_mut().is_free = false };

      let address = Block::client(block);
      log::trace!("allocate({}) reused {:p}", size, address);

      return Ok(address);
    }

    let address = match state.grow_aligned(total) {
      Ok(address) => address,
      Err(err) => {
        log::warn!("allocate({}) failed to grow heap: {}", size, err);
        return Err(err);
      }
    };

    let block = address.cast::<Block>();

    // SAFETY: the heap just handed us `total` writable bytes at `address`,
    // which `grow_aligned` placed on an ALIGNMENT boundary.
    unsafe {
      block.as_ptr().write(Block::new(size));
      state.list.push_back(block);
    }

    let address = Block::client(block);
    log::debug!("allocate({}) grew heap by {} at {:p}", size, total, address);

    Ok(address)
  }

  /// Releases a block from [`allocate`](Self::allocate).
  ///
  /// A block that ends exactly at the heap end is unlinked and its bytes are
  /// returned to the heap. Any other block is marked free and kept for reuse.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a live pointer returned by this allocator. Double
  /// frees and foreign pointers are not detected and corrupt the block list.
  pub unsafe fn free(
    &self,
    ptr: *mut u8,
  ) {
    let Some(address) = NonNull::new(ptr) else {
      return;
    };

    let mut state = self.state.lock();

    // SAFETY: caller guarantees `address` came from `Block::client`.
    let mut block = unsafe { Block::from_client(address) };
    // SAFETY: the header is live until we release it below.
    let usable_size = unsafe { block.as_ref().usable_size };

    let end = state.heap.end().ok();
    let trailing = end.is_some_and(|end| address.as_ptr().wrapping_add(usable_size) == end.as_ptr());

    if !trailing {
      // SAFETY: live header, exclusive access under the lock.
      unsafe { block.as_mut().is_free = true };
      log::trace!("free({:p}) marked {} bytes free", address, usable_size);
      return;
    }

    debug_assert_eq!(state.list.tail(), Some(block), "trailing block is not the list tail");

    let footprint = HEADER_SIZE + usable_size;

    // footprint came from a successful grow, so it fits in isize.
    match state.heap.grow(-(footprint as isize)) {
      Ok(_) => {
        state.list.pop_back();
        log::debug!("free({:p}) released {} bytes to the heap", address, footprint);
      }
      Err(err) => {
        // still linked, so it stays reusable
        // SAFETY: live header, exclusive access under the lock.
        unsafe { block.as_mut().is_free = true };
        log::warn!("free({:p}) could not shrink heap: {}", address, err);
      }
    }
  }

  /// Allocates `count * element_size` zeroed bytes, or returns null.
  ///
  /// Null also comes back when either factor is zero or the product
  /// overflows.
  pub fn zero_allocate(
    &self,
    count: usize,
    element_size: usize,
  ) -> *mut u8 {
    if count == 0 || element_size == 0 {
      return ptr::null_mut();
    }

    let Some(total) = count.checked_mul(element_size) else {
      log::trace!("zero_allocate({}, {}) overflows", count, element_size);
      return ptr::null_mut();
    };

    let address = self.allocate(total);

    if !address.is_null() {
      // SAFETY: allocate returned at least `total` writable bytes.
      unsafe { ptr::write_bytes(address, 0, total) };
    }

    address
  }

  /// Grows the region behind `ptr` to at least `new_size` bytes.
  ///
  /// A null `ptr` or a `new_size` of zero is handed straight to
  /// [`allocate`](Self::allocate); in the second case the old block stays
  /// allocated. Blocks are never shrunk: when the block already holds
  /// `new_size` bytes, `ptr` comes back unchanged. Otherwise the contents move
  /// to a new block and the old one is freed. On failure null is returned and
  /// `ptr` is left untouched.
  ///
  /// # Safety
  ///
  /// Same contract as [`free`](Self::free).
  pub unsafe fn resize(
    &self,
    ptr: *mut u8,
    new_size: usize,
  ) -> *mut u8 {
    let Some(address) = NonNull::new(ptr) else {
      return self.allocate(new_size);
    };

    if new_size == 0 {
      return self.allocate(new_size);
    }

    // SAFETY: caller guarantees `address` came from this allocator and is
    // still live. Only `usable_size` is read: another thread may be linking a
    // successor through `next` without us holding the lock.
    let usable_size = unsafe { (*Block::from_client(address).as_ptr()).usable_size };

    if usable_size >= new_size {
      log::trace!("resize({:p}, {}) fits in place", address, new_size);
      return ptr;
    }

    let fresh = self.allocate(new_size);

    if fresh.is_null() {
      return fresh;
    }

    // SAFETY: distinct live blocks never overlap, the old one holds
    // `usable_size` bytes and the new one at least `new_size > usable_size`.
    unsafe {
      ptr::copy_nonoverlapping(ptr, fresh, usable_size);
      self.free(ptr);
    }

    log::trace!("resize({:p}, {}) moved to {:p}", address, new_size, fresh);

    fresh
  }

  /// Current end of the underlying heap, or null if it cannot be queried.
  pub fn heap_end(&self) -> *mut u8 {
    self
      .state
      .lock()
      .heap
      .end()
      .map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  /// Calls `f` for every block, oldest first, while holding the lock.
  ///
  /// `f` must not call back into this allocator.
  pub fn for_each_block<F>(
    &self,
    mut f: F,
  ) where
    F: FnMut(BlockInfo),
  {
    let state = self.state.lock();

    state.list.for_each(|block, header| {
      f(BlockInfo {
        address: Block::client(block).as_ptr(),
        usable_size: header.usable_size,
        is_free: header.is_free,
      })
    });
  }

  /// Validates the block list against the current heap end.
  pub fn check(&self) -> Result<ListStats, AllocError> {
    let mut state = self.state.lock();
    let end = state.heap.end()?;

    state.list.check(end.as_ptr())
  }

  /// Runs `f` with exclusive access to the heap provider.
  pub fn with_heap<R>(
    &self,
    f: impl FnOnce(&mut H) -> R,
  ) -> R {
    f(&mut self.state.lock().heap)
  }
}

// SAFETY: blocks are aligned to ALIGNMENT and larger alignments are refused;
// every method upholds the allocate/free contract above.
unsafe impl<H: HeapExtension + Send> GlobalAlloc for Allocator<H> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }

    self.allocate(layout.size())
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    // SAFETY: GlobalAlloc callers only pass pointers from `alloc`.
    unsafe { self.free(ptr) }
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }

    self.zero_allocate(1, layout.size())
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }

    // SAFETY: GlobalAlloc callers only pass live pointers from `alloc`, and
    // new_size is non-zero per the GlobalAlloc contract.
    unsafe { self.resize(ptr, new_size) }
  }
}
