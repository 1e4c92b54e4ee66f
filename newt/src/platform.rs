use crate::net::Socket;
use crate::time::Clock;

/// The types an [`Endpoint`](crate::endpoint::Endpoint) needs
/// from the device it runs on.
///
/// With `std` enabled, [`crate::std::Platform`] is an implementor
/// backed by [`std::net::UdpSocket`] and [`std::time::Instant`].
///
/// ```
/// use newt::platform::Platform;
///
/// #[derive(Debug)]
/// struct Board;
///
/// impl Platform for Board {
///   type Clock = newt::std::Clock;
///   type Socket = std::net::UdpSocket;
/// }
/// ```
pub trait Platform {
  /// Monotonic clock with (at least) millisecond resolution
  type Clock: Clock;

  /// Datagram socket
  type Socket: Socket;
}
