use core::fmt;

use tinyvec::ArrayVec;

/// Maximum number of occurrences stored for one repeatable option
pub const MAX_SEGMENTS: usize = 8;

/// A repeatable string option (Uri-Path, Uri-Query, Location-Path,
/// Location-Query) held as its individual occurrences.
///
/// Each occurrence borrows from the message it was parsed from;
/// `"sensor/temp"` travels as two Uri-Path options, `"sensor"` and `"temp"`.
///
/// ```
/// use newt_msg::Segments;
///
/// let path = Segments::from_joined("/sensor/temp", '/').unwrap();
/// assert_eq!(path.len(), 2);
/// assert!(path.matches("sensor/temp", '/'));
/// assert!(!path.matches("sensor", '/'));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Segments<'a>(ArrayVec<[&'a str; MAX_SEGMENTS]>);

/// A [`Segments`] already held [`MAX_SEGMENTS`] occurrences
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SegmentsFull;

impl<'a> Segments<'a> {
  /// Append an occurrence
  pub fn push(&mut self, s: &'a str) -> Result<(), SegmentsFull> {
    self.0.try_push(s).map_or(Ok(()), |_| Err(SegmentsFull))
  }

  /// Split `joined` on `sep`, ignoring leading separators
  pub fn from_joined(joined: &'a str, sep: char) -> Result<Self, SegmentsFull> {
    let joined = joined.trim_start_matches(sep);
    let mut segs = Self::default();

    if !joined.is_empty() {
      joined.split(sep).try_for_each(|s| segs.push(s))?;
    }

    Ok(segs)
  }

  /// Iterate over the occurrences in wire order
  pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
    self.0.iter().copied()
  }

  /// Number of occurrences
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Whether the option is absent
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Whether these segments, joined with `sep`, equal `joined`
  /// (ignoring leading separators in `joined`).
  pub fn matches(&self, joined: &str, sep: char) -> bool {
    let joined = joined.trim_start_matches(sep);
    if joined.is_empty() {
      return self.is_empty();
    }

    let mut theirs = joined.split(sep);
    self.iter().all(|s| theirs.next() == Some(s)) && theirs.next().is_none()
  }

  /// Value of the first `name=value` occurrence; a bare `name`
  /// has an empty value.
  ///
  /// ```
  /// use newt_msg::Segments;
  ///
  /// let query = Segments::from_joined("unit=C&verbose&unit=F", '&').unwrap();
  /// assert_eq!(query.value("unit"), Some("C"));
  /// assert_eq!(query.value("verbose"), Some(""));
  /// assert_eq!(query.value("un"), None);
  /// ```
  pub fn value(&self, name: &str) -> Option<&'a str> {
    self.iter().find_map(|s| match s.split_once('=') {
                 | Some((n, v)) if n == name => Some(v),
                 | None if s == name => Some(""),
                 | _ => None,
               })
  }

  /// Write the segments to `f`, separated by `sep`
  pub fn write_joined(&self, f: &mut impl fmt::Write, sep: char) -> fmt::Result {
    self.iter().enumerate().try_for_each(|(ix, s)| {
                             if ix > 0 {
                               f.write_char(sep)?;
                             }
                             f.write_str(s)
                           })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matches() {
    let segs = Segments::from_joined("a/b/c", '/').unwrap();
    assert!(segs.matches("a/b/c", '/'));
    assert!(segs.matches("/a/b/c", '/'));
    assert!(!segs.matches("a/b", '/'));
    assert!(!segs.matches("a/b/c/d", '/'));
    assert!(Segments::default().matches("", '/'));
    assert!(!Segments::default().matches("a", '/'));
  }

  #[test]
  fn write_joined() {
    let segs = Segments::from_joined("x=1&y=2", '&').unwrap();
    let mut s = String::new();
    segs.write_joined(&mut s, '&').unwrap();
    assert_eq!(s, "x=1&y=2");
  }

  #[test]
  fn value() {
    let segs = Segments::from_joined("a=1&b=&c&a=2&d=x=y", '&').unwrap();
    assert_eq!(segs.value("a"), Some("1"));
    assert_eq!(segs.value("b"), Some(""));
    assert_eq!(segs.value("c"), Some(""));
    assert_eq!(segs.value("d"), Some("x=y"));
    assert_eq!(segs.value("e"), None);
    assert_eq!(Segments::default().value("a"), None);
  }

  #[test]
  fn capacity() {
    assert!(Segments::from_joined("1/2/3/4/5/6/7/8", '/').is_ok());
    assert_eq!(Segments::from_joined("1/2/3/4/5/6/7/8/9", '/'), Err(SegmentsFull));
  }
}
