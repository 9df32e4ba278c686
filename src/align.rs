/// Alignment of every block header and therefore of every client region.
///
/// Must be at least `align_of::<max_align_t>()`.
pub const ALIGNMENT: usize = 16;

#[cfg(target_os = "linux")]
const _: () = assert!(ALIGNMENT >= std::mem::align_of::<libc::max_align_t>());
const _: () = assert!(ALIGNMENT.is_power_of_two());

/// Rounds `$value` up to the next multiple of [`ALIGNMENT`].
///
/// Unchecked: only use it where the value is known not to overflow, such as
/// compile-time sizes. Runtime request sizes go through [`align_up`].
///
/// # Examples
///
/// ```rust
/// use brkalloc::align;
///
/// assert_eq!(align!(1), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(17), 32);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Rounds `value` up to a multiple of [`ALIGNMENT`], or `None` on overflow.
#[inline]
pub const fn align_up(value: usize) -> Option<usize> {
  match value.checked_add(ALIGNMENT - 1) {
    Some(bumped) => Some(bumped & !(ALIGNMENT - 1)),
    None => None,
  }
}
