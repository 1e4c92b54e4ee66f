/// A write past the end of a [`Writer`]'s buffer was attempted.
///
/// Nothing is written when this is returned; the writer keeps
/// the bytes it had before the failing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow {
  /// Size of the buffer being written to
  pub capacity: usize,
  /// Total number of bytes the buffer would have needed
  pub needed: usize,
}

/// The write half of [`crate::Cursor`]: appends bytes to a borrowed
/// buffer, refusing any write that does not fit.
#[derive(Debug)]
pub struct Writer<'a> {
  buf: &'a mut [u8],
  pos: usize,
}

impl<'a> Writer<'a> {
  /// Start writing at the beginning of `buf`
  pub fn new(buf: &'a mut [u8]) -> Self {
    Self { buf, pos: 0 }
  }

  /// Append a single byte
  pub fn push(&mut self, b: u8) -> Result<(), Overflow> {
    self.extend(&[b])
  }

  /// Append all of `bytes`, or nothing at all
  pub fn extend(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
    let needed = self.pos + bytes.len();
    if needed > self.buf.len() {
      return Err(Overflow { capacity: self.buf.len(),
                            needed });
    }

    self.buf[self.pos..needed].copy_from_slice(bytes);
    self.pos = needed;
    Ok(())
  }

  /// Number of bytes written so far
  pub fn position(&self) -> usize {
    self.pos
  }

  /// Size of the underlying buffer
  pub fn capacity(&self) -> usize {
    self.buf.len()
  }

  /// The bytes written so far
  pub fn written(&self) -> &[u8] {
    &self.buf[..self.pos]
  }

  /// Forget everything written, starting over at the beginning of the buffer
  pub fn rewind(&mut self) {
    self.pos = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn writes_until_full() {
    let mut buf = [0u8; 3];
    let mut w = Writer::new(&mut buf);
    w.push(1).unwrap();
    w.extend(&[2, 3]).unwrap();
    assert_eq!(w.push(4),
               Err(Overflow { capacity: 3,
                              needed: 4 }));
    assert_eq!(w.written(), &[1, 2, 3]);
  }

  #[test]
  fn rewind() {
    let mut buf = [0u8; 2];
    let mut w = Writer::new(&mut buf);
    w.extend(&[1, 2]).unwrap();
    w.rewind();
    w.push(3).unwrap();
    assert_eq!(w.written(), &[3]);
    assert_eq!(w.position(), 1);
  }

  #[test]
  fn failed_extend_writes_nothing() {
    let mut buf = [0u8; 4];
    let mut w = Writer::new(&mut buf);
    w.push(1).unwrap();
    assert!(w.extend(&[2, 3, 4, 5]).is_err());
    assert_eq!(w.position(), 1);
    assert_eq!(buf, [1, 0, 0, 0]);
  }
}
