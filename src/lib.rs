//! # brkalloc - A First-Fit `malloc` Replacement
//!
//! This crate provides a small, thread-safe **first-fit allocator** that
//! carves variably sized blocks out of a single growable heap, such as the
//! process program break managed with `sbrk(2)`.
//!
//! ## Overview
//!
//! Every block carries a header and stays on a linked list in the order it
//! was created:
//!
//! ```text
//!   Heap Layout:
//!
//!   heap base                                                   heap end
//!   ▼                                                                  ▼
//!   ┌────────┬──────────┬────────┬──────────────┬────────┬─────────────┐
//!   │ header │  used    │ header │    free      │ header │    used     │
//!   └────────┴──────────┴────────┴──────────────┴────────┴─────────────┘
//!   head ───────next──────▶ ──────────next──────────▶ tail
//!
//!   allocate(n): first free block with usable_size >= n, else grow the heap.
//!   free(p):     trailing block → shrink the heap, otherwise mark it free.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - ALIGNMENT, align! and align_up
//!   ├── allocator  - Allocator: allocate, free, zero_allocate, resize
//!   ├── block      - Block header layout (internal)
//!   ├── cabi       - malloc/free/calloc/realloc exports (feature "cabi")
//!   ├── error      - AllocError
//!   ├── heap       - HeapExtension trait, Sbrk and ArenaHeap providers
//!   └── list       - Creation-ordered block list (internal)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brkalloc::{Allocator, ArenaHeap};
//!
//! let allocator = Allocator::new(ArenaHeap::with_capacity(64 * 1024).unwrap());
//!
//! let ptr = allocator.allocate(8) as *mut u64;
//! assert!(!ptr.is_null());
//!
//! unsafe {
//!     *ptr = 42;
//!     assert_eq!(*ptr, 42);
//!     allocator.free(ptr as *mut u8);
//! }
//! ```
//!
//! `Allocator::new` is a `const fn`, so an allocator over the program break
//! can back a `static` and serve as the global allocator:
//!
//! ```rust,ignore
//! use brkalloc::{Allocator, Sbrk};
//!
//! #[global_allocator]
//! static GLOBAL: Allocator<Sbrk> = Allocator::new(Sbrk);
//! ```
//!
//! ## Single Allocation
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         Client Data            │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ usable_size: N  │  │  ┌──────────────────────────┐  │
//!   │  │ is_free: false  │  │  │   exactly N bytes        │  │
//!   │  │ next: block/-   │  │  │                          │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │  multiple of 16 bytes │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to the client
//! ```
//!
//! Before the heap grows, its end is padded up to [`align::ALIGNMENT`] so the
//! next header is aligned. Padding is never handed back.
//!
//! ## Limitations
//!
//! - **First fit only**: the search is linear in the number of blocks, and a
//!   reused block is never split, so large blocks can serve small requests.
//! - **No coalescing**: adjacent free blocks are never merged.
//! - **Trailing release only**: memory goes back to the heap only when the
//!   freed block is the last one; interior blocks are kept for reuse.
//! - **Alignment**: at most [`align::ALIGNMENT`] bytes.
//!
//! ## Safety
//!
//! Freeing or resizing a pointer that did not come from the same allocator,
//! freeing twice, or writing past a block's usable size is undefined
//! behaviour. None of it is detected.
//!
//! ## Logging
//!
//! Decisions are reported through the [`log`] facade. When the allocator is
//! the global allocator, any installed logger must not allocate.

pub mod align;
mod allocator;
mod block;
#[cfg(feature = "cabi")]
pub mod cabi;
mod error;
mod heap;
mod list;

pub use allocator::Allocator;
pub use block::HEADER_SIZE;
pub use error::AllocError;
pub use heap::{ArenaHeap, HeapExtension, Sbrk};
pub use list::{BlockInfo, ListStats};
