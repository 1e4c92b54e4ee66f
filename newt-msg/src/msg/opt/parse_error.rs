use super::OptNumber;

/// Errors encounterable while parsing an option from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum OptParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// Option value was longer than its format allows
  #[allow(missing_docs)]
  OptionValueTooLong { number: OptNumber, capacity: usize, actual: usize },

  /// Option value was shorter than its format allows
  /// (e.g. an empty Uri-Host or ETag)
  OptionValueTooShort(OptNumber),

  /// A repeatable option occurred more often than there
  /// is room to store
  TooManyRepetitions(OptNumber),

  /// A string option was not valid UTF-8
  NotUtf8(OptNumber),

  /// A Block option used the reserved size exponent 7
  InvalidBlockSize(OptNumber),

  /// Option Delta was set to 15, which is invalid.
  OptionDeltaReservedValue(u8),

  /// Value Length was set to 15, which is invalid.
  ValueLengthReservedValue(u8),
}

impl OptParseError {
  /// Shorthand for [`OptParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}
