//! C entry points over a process-wide allocator on the program break.
//!
//! Build with `--features cabi` and preload the resulting `cdylib` to replace
//! the platform `malloc` family. Nothing else in the process may move the
//! break while these are in use.

use libc::{c_void, size_t};

use crate::{Allocator, Sbrk};

static ALLOCATOR: Allocator<Sbrk> = Allocator::new(Sbrk);

#[unsafe(no_mangle)]
pub extern "C" fn malloc(size: size_t) -> *mut c_void {
  ALLOCATOR.allocate(size) as *mut c_void
}

/// # Safety
///
/// `ptr` must be null or a live pointer from this module's `malloc`,
/// `calloc` or `realloc`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  // SAFETY: forwarded caller contract.
  unsafe { ALLOCATOR.free(ptr as *mut u8) }
}

#[unsafe(no_mangle)]
pub extern "C" fn calloc(
  count: size_t,
  size: size_t,
) -> *mut c_void {
  ALLOCATOR.zero_allocate(count, size) as *mut c_void
}

/// # Safety
///
/// Same contract as [`free`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(
  ptr: *mut c_void,
  size: size_t,
) -> *mut c_void {
  // SAFETY: forwarded caller contract.
  unsafe { ALLOCATOR.resize(ptr as *mut u8, size) as *mut c_void }
}
