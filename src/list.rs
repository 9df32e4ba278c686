use std::ptr::NonNull;

use crate::block::Block;
use crate::error::AllocError;

/// Snapshot of one block, as seen by [`crate::Allocator::for_each_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Client address of the block.
  pub address: *mut u8,
  pub usable_size: usize,
  pub is_free: bool,
}

/// Totals gathered while validating the list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListStats {
  pub blocks: usize,
  pub free_blocks: usize,
  pub free_bytes: usize,
  pub used_bytes: usize,
}

/// Every block carved from the heap, oldest first.
///
/// Nodes live inside the heap itself; the list only holds the two ends.
pub(crate) struct BlockList {
  head: Option<NonNull<Block>>,
  tail: Option<NonNull<Block>>,
}

// SAFETY: the list is only reachable through the allocator's mutex, and the
// nodes it points at are owned by the heap that mutex also guards.
unsafe impl Send for BlockList {}

impl BlockList {
  pub const fn new() -> Self {
    Self { head: None, tail: None }
  }

  pub fn tail(&self) -> Option<NonNull<Block>> {
    self.tail
  }

  /// First free block, in creation order, with at least `size` usable bytes.
  pub fn find_fit(
    &self,
    size: usize,
  ) -> Option<NonNull<Block>> {
    let mut current = self.head;

    while let Some(block) = current {
      // SAFETY: linked nodes are live headers inside the heap.
      let header = unsafe { block.as_ref() };

      if header.is_free && header.usable_size >= size {
        return Some(block);
      }

      current = header.next;
    }

    None
  }

  /// Links a freshly written header after the current tail.
  ///
  /// # Safety
  ///
  /// `block` must point at an initialised header with `next == None` that is
  /// not already linked.
  pub unsafe fn push_back(
    &mut self,
    block: NonNull<Block>,
  ) {
    match self.tail {
      // SAFETY: the tail is a live header. Only `next` is written; its owner
      // may be reading `usable_size` concurrently.
      Some(tail) => unsafe { (*tail.as_ptr()).next = Some(block) },
      None => self.head = Some(block),
    }

    self.tail = Some(block);
  }

  /// Unlinks the tail and returns it.
  ///
  /// The new tail is found by walking from the head: nodes have no back link.
  pub fn pop_back(&mut self) -> Option<NonNull<Block>> {
    let tail = self.tail?;

    if self.head == Some(tail) {
      self.head = None;
      self.tail = None;
      return Some(tail);
    }

    let mut current = self.head?;

    loop {
      // SAFETY: linked nodes are live headers inside the heap. Only `next` is
      // touched, as in `push_back`.
      let next = unsafe { (*current.as_ptr()).next };

      if next == Some(tail) {
        unsafe { (*current.as_ptr()).next = None };
        self.tail = Some(current);
        return Some(tail);
      }

      current = next?;
    }
  }

  /// Visits every block from head to tail.
  pub fn for_each<F>(
    &self,
    mut f: F,
  ) where
    F: FnMut(NonNull<Block>, &Block),
  {
    let mut current = self.head;

    while let Some(block) = current {
      // SAFETY: linked nodes are live headers inside the heap.
      let header = unsafe { block.as_ref() };
      f(block, header);
      current = header.next;
    }
  }

  /// Checks the head/tail and ordering invariants.
  ///
  /// Blocks are carved from an upward-growing heap, so creation order must
  /// also be address order, and no two blocks may overlap. `end` is the
  /// current heap end; no block may reach past it.
  pub fn check(
    &self,
    end: *mut u8,
  ) -> Result<ListStats, AllocError> {
    match (self.head, self.tail) {
      (None, None) => return Ok(ListStats::default()),
      (Some(_), None) => return Err(AllocError::Corrupted("head set without tail")),
      (None, Some(_)) => return Err(AllocError::Corrupted("tail set without head")),
      (Some(_), Some(_)) => {}
    }

    let mut stats = ListStats::default();
    let mut last: Option<NonNull<Block>> = None;
    let mut floor = 0usize;
    let mut current = self.head;

    while let Some(block) = current {
      // SAFETY: linked nodes are live headers inside the heap.
      let header = unsafe { block.as_ref() };
      let start = block.as_ptr() as usize;

      if start < floor {
        return Err(AllocError::Corrupted("blocks out of address order or overlapping"));
      }

      floor = start
        .checked_add(header.footprint())
        .ok_or(AllocError::Corrupted("block size wraps the address space"))?;

      if floor > end as usize {
        return Err(AllocError::Corrupted("block extends past the heap end"));
      }

      stats.blocks += 1;

      if header.is_free {
        stats.free_blocks += 1;
        stats.free_bytes += header.usable_size;
      } else {
        stats.used_bytes += header.usable_size;
      }

      last = Some(block);
      current = header.next;
    }

    if last != self.tail {
      return Err(AllocError::Corrupted("walk does not end at tail"));
    }

    Ok(stats)
  }
}
