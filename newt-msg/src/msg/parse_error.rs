use super::opt::parse_error::OptParseError;
use super::OptNumber;

/// Errors encounterable while parsing a message from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum MessageParseError {
  /// The datagram was shorter than the fixed 4-byte header,
  /// or declared a protocol version other than 1.
  MalformedHeader,

  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// Token length was > 8
  InvalidTokenLength(u8),

  /// Error parsing option
  OptParseError(OptParseError),

  /// The message carried a critical (odd-numbered) option
  /// that this crate does not understand.
  ///
  /// A server answers such a request with 4.02 Bad Option.
  UnknownCriticalOption(OptNumber),

  /// The payload marker `0xFF` was the last byte of the datagram
  PayloadMarkerWithoutPayload,
}

impl MessageParseError {
  /// Shorthand for [`MessageParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}

impl From<OptParseError> for MessageParseError {
  fn from(e: OptParseError) -> Self {
    match e {
      | OptParseError::UnexpectedEndOfStream => Self::UnexpectedEndOfStream,
      | e => Self::OptParseError(e),
    }
  }
}
