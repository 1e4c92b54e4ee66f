use newt_common::{Cursor, Overflow, Writer};
use tinyvec::ArrayVec;

/// Option parsing errors
pub mod parse_error;
pub use parse_error::*;

/// Known options
pub mod known;
pub use known::*;

/// Repeatable string options
pub mod segments;
pub use segments::*;

use crate::MessageParseError;

/// # Option Number
///
/// The running sum of option deltas; identifies which option
/// a value belongs to. Numbers understood by this crate are in [`no`].
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptNumber(pub u32);

impl OptNumber {
  /// Whether this option is critical (odd-numbered) and must be
  /// understood by the recipient, or elective (even-numbered) and may
  /// be ignored.
  ///
  /// ```
  /// use newt_msg::no;
  ///
  /// assert!(no::URI_PATH.must_be_processed());
  /// assert!(!no::ETAG.must_be_processed());
  /// ```
  pub fn must_be_processed(&self) -> bool {
    self.0 & 1 == 1
  }
}

/// Read an option delta or length from its header nibble and any
/// extension bytes that follow.
pub(crate) fn parse_opt_len_or_delta(head: u8,
                                     bytes: &mut Cursor<'_>,
                                     reserved_err: OptParseError)
                                     -> Result<u32, OptParseError> {
  match head {
    | 13 => {
      let n = bytes.next().ok_or_else(OptParseError::eof)?;
      Ok(u32::from(n) + 13)
    },
    | 14 => match bytes.take_exact(2) {
      | Some(&[a, b]) => Ok(u32::from(u16::from_be_bytes([a, b])) + 269),
      | _ => Err(OptParseError::eof()),
    },
    | 15 => Err(reserved_err),
    | _ => Ok(u32::from(head)),
  }
}

/// Entity tag, also used as the value of If-Match
///
/// See [RFC7252 - ETag](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.6)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Hash, Debug, Default)]
pub struct ETag(pub ArrayVec<[u8; 8]>);

impl ETag {
  /// Copy up to 8 bytes into an entity tag
  pub fn from_slice(bytes: &[u8]) -> Option<ETag> {
    crate::Token::from_slice(bytes).map(|t| ETag(t.0))
  }
}

/// A borrowed option value about to be written to the wire
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum OptValue<'v> {
  Bytes(&'v [u8]),
  Uint(u32),
}

impl<'v> OptValue<'v> {
  pub(crate) fn len(&self) -> usize {
    match self {
      | OptValue::Bytes(b) => b.len(),
      | OptValue::Uint(n) => uint_len(*n),
    }
  }

  pub(crate) fn write(&self, w: &mut Writer<'_>) -> Result<(), Overflow> {
    match self {
      | OptValue::Bytes(b) => w.extend(b),
      | OptValue::Uint(n) => w.extend(&n.to_be_bytes()[4 - uint_len(*n)..]),
    }
  }
}

/// Length of the minimal big-endian encoding of `n`; zero is encoded as no bytes.
pub(crate) fn uint_len(n: u32) -> usize {
  4 - (n.leading_zeros() / 8) as usize
}

/// Decode a minimal-length big-endian unsigned integer of at most `max` bytes
pub(crate) fn parse_uint(number: OptNumber, bytes: &[u8], max: usize) -> Result<u32, OptParseError> {
  if bytes.len() > max {
    return Err(OptParseError::OptionValueTooLong { number,
                                                   capacity: max,
                                                   actual: bytes.len() });
  }

  Ok(bytes.iter().fold(0u32, |n, b| n << 8 | u32::from(*b)))
}

fn parse_str(number: OptNumber, bytes: &[u8], min: usize, max: usize) -> Result<&str, OptParseError> {
  if bytes.len() < min {
    return Err(OptParseError::OptionValueTooShort(number));
  }

  if bytes.len() > max {
    return Err(OptParseError::OptionValueTooLong { number,
                                                   capacity: max,
                                                   actual: bytes.len() });
  }

  core::str::from_utf8(bytes).map_err(|_| OptParseError::NotUtf8(number))
}

fn parse_opaque(number: OptNumber, bytes: &[u8], min: usize) -> Result<ETag, OptParseError> {
  if bytes.len() < min {
    return Err(OptParseError::OptionValueTooShort(number));
  }

  ETag::from_slice(bytes).ok_or(OptParseError::OptionValueTooLong { number,
                                                                    capacity: 8,
                                                                    actual: bytes.len() })
}

fn parse_block(number: OptNumber, bytes: &[u8]) -> Result<Block, OptParseError> {
  parse_uint(number, bytes, 3).and_then(|n| {
                                Block::from_value(n).ok_or(OptParseError::InvalidBlockSize(number))
                              })
}

/// # Message Options
///
/// One field per option understood by this crate; `None`
/// (or an empty [`Segments`] / `false`) means the option is absent,
/// which is distinct from an option present with a zero value.
///
/// Fields are declared in ascending option-number order, the
/// order they are serialized in.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Opts<'a> {
  /// If-Match (1)
  pub if_match: Option<ETag>,
  /// Uri-Host (3)
  pub uri_host: Option<&'a str>,
  /// ETag (4)
  pub etag: Option<ETag>,
  /// If-None-Match (5)
  pub if_none_match: bool,
  /// Observe (6); registration on requests, sequence number on notifications
  pub observe: Option<u32>,
  /// Uri-Port (7)
  pub uri_port: Option<u16>,
  /// Location-Path (8)
  pub location_path: Segments<'a>,
  /// Uri-Path (11)
  pub uri_path: Segments<'a>,
  /// Content-Format (12)
  pub content_format: Option<ContentFormat>,
  /// Max-Age (14), in seconds
  pub max_age: Option<u32>,
  /// Uri-Query (15)
  pub uri_query: Segments<'a>,
  /// Accept (17)
  pub accept: Option<ContentFormat>,
  /// Location-Query (20)
  pub location_query: Segments<'a>,
  /// Block2 (23)
  pub block2: Option<Block>,
  /// Block1 (27)
  pub block1: Option<Block>,
  /// Size2 (28)
  pub size2: Option<u32>,
  /// Size1 (60)
  pub size1: Option<u32>,
}

/// Store `value` in `slot` unless an earlier occurrence already did.
///
/// A non-repeatable option occurring twice is treated like an
/// unrecognized option: an error if critical, otherwise ignored.
fn set_once<T>(slot: &mut Option<T>, number: OptNumber, value: T) -> Result<(), MessageParseError> {
  match slot {
    | Some(_) if number.must_be_processed() => Err(MessageParseError::UnknownCriticalOption(number)),
    | Some(_) => Ok(()),
    | None => {
      *slot = Some(value);
      Ok(())
    },
  }
}

impl<'a> Opts<'a> {
  /// Store a freshly parsed option in the corresponding field
  pub(crate) fn insert(&mut self, number: OptNumber, value: &'a [u8]) -> Result<(), MessageParseError> {
    let push = |segs: &mut Segments<'a>| {
      let s = parse_str(number, value, 0, 255)?;
      segs.push(s).map_err(|_| OptParseError::TooManyRepetitions(number))
    };

    match number {
      | no::IF_MATCH => set_once(&mut self.if_match, number, parse_opaque(number, value, 0)?),
      | no::URI_HOST => set_once(&mut self.uri_host, number, parse_str(number, value, 1, 255)?),
      | no::ETAG => set_once(&mut self.etag, number, parse_opaque(number, value, 1)?),
      | no::IF_NONE_MATCH if !value.is_empty() => {
        Err(OptParseError::OptionValueTooLong { number,
                                                capacity: 0,
                                                actual: value.len() }.into())
      },
      | no::IF_NONE_MATCH => {
        self.if_none_match = true;
        Ok(())
      },
      | no::OBSERVE => set_once(&mut self.observe, number, parse_uint(number, value, 3)?),
      | no::URI_PORT => set_once(&mut self.uri_port, number, parse_uint(number, value, 2)? as u16),
      | no::LOCATION_PATH => Ok(push(&mut self.location_path)?),
      | no::URI_PATH => Ok(push(&mut self.uri_path)?),
      | no::CONTENT_FORMAT => {
        let f = parse_uint(number, value, 2)? as u16;
        set_once(&mut self.content_format, number, f.into())
      },
      | no::MAX_AGE => set_once(&mut self.max_age, number, parse_uint(number, value, 4)?),
      | no::URI_QUERY => Ok(push(&mut self.uri_query)?),
      | no::ACCEPT => {
        let f = parse_uint(number, value, 2)? as u16;
        set_once(&mut self.accept, number, f.into())
      },
      | no::LOCATION_QUERY => Ok(push(&mut self.location_query)?),
      | no::BLOCK2 => set_once(&mut self.block2, number, parse_block(number, value)?),
      | no::BLOCK1 => set_once(&mut self.block1, number, parse_block(number, value)?),
      | no::SIZE2 => set_once(&mut self.size2, number, parse_uint(number, value, 4)?),
      | no::SIZE1 => set_once(&mut self.size1, number, parse_uint(number, value, 4)?),
      | n if n.must_be_processed() => Err(MessageParseError::UnknownCriticalOption(n)),
      | _ => Ok(()),
    }
  }

  /// Invoke `f` with every present option, in ascending option-number order.
  pub(crate) fn visit<E>(&self, mut f: impl FnMut(OptNumber, OptValue<'_>) -> Result<(), E>) -> Result<(), E> {
    use OptValue::{Bytes, Uint};

    fn uint<'v, N: Into<u32>>(n: Option<N>) -> Option<OptValue<'v>> {
      n.map(|n| Uint(n.into()))
    }

    fn segs<'v, E>(f: &mut impl FnMut(OptNumber, OptValue<'_>) -> Result<(), E>,
                   number: OptNumber,
                   list: &Segments<'v>)
                   -> Result<(), E> {
      list.iter().try_for_each(|s| f(number, Bytes(s.as_bytes())))
    }

    fn one<E>(f: &mut impl FnMut(OptNumber, OptValue<'_>) -> Result<(), E>,
              number: OptNumber,
              v: Option<OptValue<'_>>)
              -> Result<(), E> {
      v.map(|v| f(number, v)).unwrap_or(Ok(()))
    }

    let format = |c: Option<ContentFormat>| c.map(|c| Uint(u16::from(c).into()));

    one(&mut f, no::IF_MATCH, self.if_match.as_ref().map(|e| Bytes(e.0.as_slice())))?;
    // zero-length Uri-Host and ETag are not valid on the wire; leave them out
    one(&mut f,
        no::URI_HOST,
        self.uri_host.filter(|h| !h.is_empty()).map(|h| Bytes(h.as_bytes())))?;
    one(&mut f,
        no::ETAG,
        self.etag.as_ref().filter(|e| !e.0.is_empty()).map(|e| Bytes(e.0.as_slice())))?;
    one(&mut f,
        no::IF_NONE_MATCH,
        Some(Bytes(&[])).filter(|_| self.if_none_match))?;
    one(&mut f, no::OBSERVE, uint(self.observe))?;
    one(&mut f, no::URI_PORT, uint(self.uri_port))?;
    segs(&mut f, no::LOCATION_PATH, &self.location_path)?;
    segs(&mut f, no::URI_PATH, &self.uri_path)?;
    one(&mut f, no::CONTENT_FORMAT, format(self.content_format))?;
    one(&mut f, no::MAX_AGE, uint(self.max_age))?;
    segs(&mut f, no::URI_QUERY, &self.uri_query)?;
    one(&mut f, no::ACCEPT, format(self.accept))?;
    segs(&mut f, no::LOCATION_QUERY, &self.location_query)?;
    one(&mut f, no::BLOCK2, uint(self.block2.map(u32::from)))?;
    one(&mut f, no::BLOCK1, uint(self.block1.map(u32::from)))?;
    one(&mut f, no::SIZE2, uint(self.size2))?;
    one(&mut f, no::SIZE1, uint(self.size1))
  }
}
