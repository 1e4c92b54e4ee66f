/// A read cursor over a borrowed byte slice.
///
/// Unlike [`std::io::Cursor`], slices handed out by the cursor
/// borrow from the underlying buffer (`'a`) rather than the cursor
/// itself, so parsed structures may keep them after the cursor is dropped.
///
/// Reads never go past the end of the buffer; the `_exact` flavors
/// return `None` instead of a short slice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor<'a> {
  buf: &'a [u8],
  pos: usize,
}

impl<'a> Cursor<'a> {
  /// Creates a new cursor
  pub fn new(buf: &'a [u8]) -> Cursor<'a> {
    Cursor { buf, pos: 0 }
  }

  /// Unwraps the cursor, discarding its internal position
  pub fn into_inner(self) -> &'a [u8] {
    self.buf
  }

  fn peek_(&self, n: usize) -> Option<&'a [u8]> {
    if n > self.remaining() {
      None
    } else {
      Some(&self.buf[self.pos..self.pos + n])
    }
  }

  /// Take the next byte in the cursor, returning None
  /// if the cursor is exhausted.
  ///
  /// Runs in O(1) time.
  pub fn next(&mut self) -> Option<u8> {
    self.take_exact(1).map(|a| a[0])
  }

  /// Take `n` bytes from the cursor, stopping early if
  /// the end of the buffer is encountered.
  ///
  /// Runs in O(1) time.
  pub fn take(&mut self, n: usize) -> &'a [u8] {
    match self.take_exact(n) {
      | Some(a) => a,
      | None => self.take_until_end(),
    }
  }

  /// Take `n` bytes from the cursor, returning None if
  /// the end of the buffer is encountered.
  ///
  /// Runs in O(1) time.
  pub fn take_exact(&mut self, n: usize) -> Option<&'a [u8]> {
    self.peek_(n).map(|a| {
                   self.pos += n;
                   a
                 })
  }

  /// Consume and return everything after the current position.
  pub fn take_until_end(&mut self) -> &'a [u8] {
    let rest = self.until_end();
    self.pos = self.buf.len();
    rest
  }

  /// Without advancing the position, look at the next
  /// `n` bytes, or until the end if there are less than `n` bytes
  /// remaining.
  ///
  /// Runs in O(1) time.
  pub fn peek(&self, n: usize) -> &'a [u8] {
    self.peek_(n).unwrap_or_else(|| self.until_end())
  }

  /// Without advancing the position, look at the next
  /// `n` bytes, returning None if there are less than `n` bytes
  /// remaining.
  ///
  /// Runs in O(1) time.
  pub fn peek_exact(&self, n: usize) -> Option<&'a [u8]> {
    self.peek_(n)
  }

  /// Whether the cursor has reached the end
  /// of the buffer.
  pub fn is_exhausted(&self) -> bool {
    self.pos >= self.buf.len()
  }

  /// Number of bytes left to read
  pub fn remaining(&self) -> usize {
    self.buf.len() - self.pos
  }

  /// Get the bytes remaining in the buffer
  /// without advancing.
  pub fn until_end(&self) -> &'a [u8] {
    &self.buf[self.pos..]
  }

  /// Get the position the cursor points to within
  /// the buffer
  pub fn position(&self) -> usize {
    self.pos
  }
}
