use std::mem;
use std::ptr::NonNull;

use crate::align;

/// Header written in front of every region carved from the heap.
///
/// `align(16)` must match [`crate::align::ALIGNMENT`] so the client bytes
/// right after the header are aligned for any fundamental type.
#[repr(C, align(16))]
pub(crate) struct Block {
  pub usable_size: usize,
  pub is_free: bool,
  pub next: Option<NonNull<Block>>,
}

/// Bytes of metadata in front of every client region.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const _: () = assert!(mem::align_of::<Block>() == align::ALIGNMENT);
const _: () = assert!(align!(HEADER_SIZE) == HEADER_SIZE);

impl Block {
  pub fn new(usable_size: usize) -> Self {
    Self {
      usable_size,
      is_free: false,
      next: None,
    }
  }

  /// Address handed to the client for this header.
  #[inline]
  pub fn client(block: NonNull<Block>) -> NonNull<u8> {
    // SAFETY: every header is followed by its client region inside the same
    // heap allocation, so one header past it is in bounds (or one past the end
    // for a zero-sized region, which allocate never creates).
    unsafe { block.cast::<u8>().add(HEADER_SIZE) }
  }

  /// Recovers the header sitting in front of a client address.
  ///
  /// # Safety
  ///
  /// `ptr` must have been returned by [`Block::client`] for a block that is
  /// still backed by heap memory.
  #[inline]
  pub unsafe fn from_client(ptr: NonNull<u8>) -> NonNull<Block> {
    // SAFETY: caller guarantees a header precedes `ptr` in the same region.
    unsafe { ptr.sub(HEADER_SIZE) }.cast::<Block>()
  }

  /// Bytes this block occupies in the heap, header included.
  #[inline]
  pub fn footprint(&self) -> usize {
    HEADER_SIZE + self.usable_size
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_layout() {
    assert_eq!(HEADER_SIZE % align::ALIGNMENT, 0);
    assert!(HEADER_SIZE >= mem::size_of::<usize>() * 2 + 1);
  }

  #[test]
  fn test_client_round_trip() {
    let mut header = Block::new(64);
    let block = NonNull::from(&mut header);

    let client = Block::client(block);
    assert_eq!(client.as_ptr() as usize - block.as_ptr() as usize, HEADER_SIZE);

    let recovered = unsafe { Block::from_client(client) };
    assert_eq!(recovered, block);
    assert_eq!(unsafe { recovered.as_ref() }.footprint(), HEADER_SIZE + 64);
  }
}
