use std::alloc::LayoutError;
use std::fmt;

impl From<LayoutError> for AllocError {
  fn from(_: LayoutError) -> Self {
    Self::Layout
  }
}

/// Why an allocation (or a heap or list operation) did not succeed.
///
/// The pointer-returning operations collapse all of these into null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  /// Zero-byte request.
  ZeroSize,
  /// Size arithmetic wrapped.
  Overflow,
  /// The heap provider could not grow.
  Exhausted,
  /// The heap provider was asked to move its mark below its base.
  InvalidShrink,
  /// Arena capacity is not a valid layout.
  Layout,
  /// A block list invariant does not hold.
  Corrupted(&'static str),
}

impl fmt::Display for AllocError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Self::ZeroSize => write!(f, "zero-sized allocation"),
      Self::Overflow => write!(f, "allocation size overflows"),
      Self::Exhausted => write!(f, "heap exhausted"),
      Self::InvalidShrink => write!(f, "heap shrink below its base"),
      Self::Layout => write!(f, "invalid heap layout"),
      Self::Corrupted(what) => write!(f, "block list corrupted: {what}"),
    }
  }
}

impl std::error::Error for AllocError {}
