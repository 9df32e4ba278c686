use std::alloc::{self, Layout};
use std::ptr::NonNull;

use libc::{c_void, intptr_t, sbrk};

use crate::{align, error::AllocError};

/// A contiguous heap whose high-water mark can be moved up and down.
///
/// # Safety
///
/// Implementors must guarantee that:
///
/// - `grow(delta)` with `delta > 0` returns the previous end, and the `delta`
///   bytes starting there are readable and writable until released;
/// - successive growths are contiguous (each returns the end the previous one
///   produced, unless someone else moved the mark in between);
/// - `grow(0)` returns the current end without changing anything;
/// - `grow(delta)` with `delta < 0` releases the trailing `-delta` bytes.
pub unsafe trait HeapExtension {
  /// Moves the end of the heap by `delta` bytes and returns the previous end.
  fn grow(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, AllocError>;

  /// Current end of the heap.
  fn end(&mut self) -> Result<NonNull<u8>, AllocError> {
    self.grow(0)
  }
}

/// The process program break, moved with `sbrk(2)`.
///
/// The break is shared with anything else in the process that calls `brk` or
/// `sbrk`, including the platform `malloc`. Blocks handed out by an allocator
/// over `Sbrk` are only released when nothing has moved the break past them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

unsafe impl HeapExtension for Sbrk {
  fn grow(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, AllocError> {
    // SAFETY: sbrk has no memory-safety preconditions; a negative delta is only
    // passed for a trailing region this allocator owns.
    let address = unsafe { sbrk(delta as intptr_t) };

    if address == usize::MAX as *mut c_void {
      return Err(if delta < 0 { AllocError::InvalidShrink } else { AllocError::Exhausted });
    }

    NonNull::new(address as *mut u8).ok_or(AllocError::Exhausted)
  }
}

/// A fixed-capacity region with its own high-water mark.
///
/// Behaves like a private program break: growth bumps the mark, shrinking
/// lowers it, and growth past `capacity` fails with
/// [`AllocError::Exhausted`]. Each allocator over an `ArenaHeap` is fully
/// independent of the process break and of every other arena.
#[derive(Debug)]
pub struct ArenaHeap {
  base: NonNull<u8>,
  capacity: usize,
  brk: usize,
}

// SAFETY: the arena exclusively owns its region; moving it to another thread
// moves that ownership along.
unsafe impl Send for ArenaHeap {}

impl ArenaHeap {
  /// Reserves `capacity` bytes, aligned to [`align::ALIGNMENT`].
  pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
    if capacity == 0 {
      return Err(AllocError::ZeroSize);
    }

    let layout = Layout::from_size_align(capacity, align::ALIGNMENT)?;

    // SAFETY: layout has non-zero size.
    let base = unsafe { alloc::alloc(layout) };
    let base = NonNull::new(base).ok_or(AllocError::Exhausted)?;

    Ok(Self { base, capacity, brk: 0 })
  }

  /// First byte of the arena.
  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes between the base and the current mark.
  pub fn used(&self) -> usize {
    self.brk
  }

  fn layout(&self) -> Layout {
    // SAFETY: the same size and alignment were validated in `with_capacity`.
    unsafe { Layout::from_size_align_unchecked(self.capacity, align::ALIGNMENT) }
  }
}

unsafe impl HeapExtension for ArenaHeap {
  fn grow(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, AllocError> {
    let brk = self.brk.checked_add_signed(delta).ok_or(if delta < 0 {
      AllocError::InvalidShrink
    } else {
      AllocError::Exhausted
    })?;

    if brk > self.capacity {
      return Err(AllocError::Exhausted);
    }

    // SAFETY: self.brk <= capacity, so the result is within or one past the
    // end of the arena allocation.
    let previous = unsafe { self.base.add(self.brk) };
    self.brk = brk;

    Ok(previous)
  }
}

impl Drop for ArenaHeap {
  fn drop(&mut self) {
    // SAFETY: base was allocated in `with_capacity` with this exact layout.
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout()) }
  }
}
