use newt_msg::MessageToBytesError;

use crate::time::TimeError;
use crate::PoolExhausted;

/// An error encountered by an [`Endpoint`](super::Endpoint)
///
/// `E` is the socket's error type.
///
/// Malformed datagrams are not errors: they are answered
/// (or dropped) and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
  /// A message did not fit the buffer it was serialized into
  ToBytes(MessageToBytesError),
  /// No free transaction (or pending response) slot
  PoolExhausted(PoolExhausted),
  /// The socket failed
  Socket(E),
  /// The clock failed
  Clock(TimeError),
}

impl<E> From<MessageToBytesError> for Error<E> {
  fn from(e: MessageToBytesError) -> Self {
    Self::ToBytes(e)
  }
}

impl<E> From<PoolExhausted> for Error<E> {
  fn from(e: PoolExhausted) -> Self {
    Self::PoolExhausted(e)
  }
}

impl<E> From<TimeError> for Error<E> {
  fn from(e: TimeError) -> Self {
    Self::Clock(e)
  }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Self::ToBytes(e) => write!(f, "message could not be serialized: {:?}", e),
      | Self::PoolExhausted(_) => write!(f, "no free slot to hold the message"),
      | Self::Socket(e) => write!(f, "socket error: {:?}", e),
      | Self::Clock(e) => write!(f, "clock error: {:?}", e),
    }
  }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for Error<E> {}
