use no_std_net::SocketAddr;

/// Data that came from (or is headed to) a network socket
#[derive(PartialEq, PartialOrd, Eq, Ord, Hash, Debug, Clone, Copy)]
pub struct Addrd<T>(pub T, pub SocketAddr);

impl<T> Addrd<T> {
  /// Borrow the contents of this Addressed
  pub fn as_ref(&self) -> Addrd<&T> {
    Addrd(self.data(), self.addr())
  }

  /// Map the data contained in this Addressed
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Addrd<R> {
    Addrd(f(self.0), self.1)
  }

  /// Borrow the contents of the addressed item
  pub fn data(&self) -> &T {
    &self.0
  }

  /// Copy the socket address for the data
  pub fn addr(&self) -> SocketAddr {
    self.1
  }

  /// Turn the entire structure into something else
  pub fn fold<R>(self, f: impl FnOnce(T, SocketAddr) -> R) -> R {
    f(self.0, self.1)
  }
}

/// A datagram socket the engine can send and receive with.
///
/// This mirrors the Udp socket traits in embedded-nal, but allows us to
/// implement them for foreign types (like `std::net::UdpSocket`).
///
/// Both operations are non-blocking; the engine
/// treats `WouldBlock` from [`Socket::recv`] as "nothing to do"
/// and blocks on [`Socket::send`] until the datagram is handed off.
pub trait Socket {
  /// The error yielded by socket operations
  type Error: core::fmt::Debug;

  /// Send a datagram to a remote address
  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error>;

  /// Pull a buffered datagram from the socket, along with the address to the sender.
  ///
  /// It is expected that (like [`std::net::UdpSocket`]) if the message is larger
  /// than the buffer, those bytes are dropped and not considered an error condition.
  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error>;
}

#[cfg(test)]
mod tests {
  use no_std_net::{Ipv4Addr, SocketAddrV4};

  use super::*;

  #[test]
  fn addrd() {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 5683));
    let a = Addrd(3u8, addr);

    assert_eq!(a.as_ref().data(), &&3);
    assert_eq!(a.map(|n| n * 2), Addrd(6, addr));
    assert_eq!(a.fold(|n, addr| (n, addr.port())), (3, 5683));
  }
}
