use core::fmt::Display;
use core::ops::Deref;

use tinyvec::ArrayVec;

/// Fixed-capacity byte buffer implementing [`core::fmt::Write`]
///
/// This allows alloc-less format strings:
/// ```
/// use core::fmt::Write;
///
/// use newt_common::Writable;
///
/// let mut stringish = Writable::<32>::default();
///
/// write!(stringish, "Your number is: {}", 123).ok();
/// assert_eq!(stringish.as_str(), "Your number is: 123");
/// ```
///
/// Writes that would overflow the buffer fail with [`core::fmt::Error`]
/// and leave the buffer unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Writable<const N: usize>(ArrayVec<[u8; N]>);

impl<const N: usize> Writable<N> {
  /// Read the data in the buffer as a UTF8 string slice.
  ///
  /// Only `write_str` appends to the buffer, so the contents
  /// are always valid UTF8.
  pub fn as_str(&self) -> &str {
    core::str::from_utf8(&self.0).unwrap_or_default()
  }

  /// Get a slice of the byte buffer
  pub fn as_slice(&self) -> &[u8] {
    &self.0
  }

  /// Empty the buffer
  pub fn clear(&mut self) {
    self.0.clear()
  }
}

impl<const N: usize> Display for Writable<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl<const N: usize> Deref for Writable<N> {
  type Target = [u8];

  fn deref(&self) -> &[u8] {
    &self.0
  }
}

impl<const N: usize> AsRef<str> for Writable<N> {
  fn as_ref(&self) -> &str {
    self.as_str()
  }
}

impl<const N: usize> core::fmt::Write for Writable<N> {
  fn write_str(&mut self, s: &str) -> core::fmt::Result {
    if self.0.len() + s.len() > N {
      Err(core::fmt::Error)
    } else {
      self.0.extend_from_slice(s.as_bytes());
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use core::fmt::Write;

  use super::*;

  #[test]
  fn refuses_overflow() {
    let mut w = Writable::<4>::default();
    write!(w, "abc").unwrap();
    assert!(write!(w, "de").is_err());
    assert_eq!(w.as_str(), "abc");
  }
}
