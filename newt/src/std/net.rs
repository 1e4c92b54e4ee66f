use std::io;
use std::net::UdpSocket;

use crate::net::{Addrd, Socket};

pub(crate) fn io_to_nb(err: io::Error) -> nb::Error<io::Error> {
  match err.kind() {
    | io::ErrorKind::WouldBlock => nb::Error::WouldBlock,
    | _ => nb::Error::Other(err),
  }
}

/// Convert a [`std::net::SocketAddr`] to a [`no_std_net::SocketAddr`]
pub fn addr_from_std(addr: std::net::SocketAddr) -> no_std_net::SocketAddr {
  use no_std_net::{SocketAddrV4, SocketAddrV6};

  match addr {
    | std::net::SocketAddr::V4(v4) => {
      let [a, b, c, d] = v4.ip().octets();
      no_std_net::SocketAddr::V4(SocketAddrV4::new(no_std_net::Ipv4Addr::new(a, b, c, d),
                                                   v4.port()))
    },
    | std::net::SocketAddr::V6(v6) => {
      let [a, b, c, d, e, f, g, h] = v6.ip().segments();
      no_std_net::SocketAddr::V6(SocketAddrV6::new(no_std_net::Ipv6Addr::new(a, b, c, d, e, f, g, h),
                                                   v6.port(),
                                                   v6.flowinfo(),
                                                   v6.scope_id()))
    },
  }
}

/// Convert a [`no_std_net::SocketAddr`] to a [`std::net::SocketAddr`]
pub fn addr_to_std(addr: no_std_net::SocketAddr) -> std::net::SocketAddr {
  use std::net::{SocketAddrV4, SocketAddrV6};

  match addr {
    | no_std_net::SocketAddr::V4(v4) => {
      let [a, b, c, d] = v4.ip().octets();
      std::net::SocketAddr::V4(SocketAddrV4::new(std::net::Ipv4Addr::new(a, b, c, d), v4.port()))
    },
    | no_std_net::SocketAddr::V6(v6) => {
      let [a, b, c, d, e, f, g, h] = v6.ip().segments();
      std::net::SocketAddr::V6(SocketAddrV6::new(std::net::Ipv6Addr::new(a, b, c, d, e, f, g, h),
                                                 v6.port(),
                                                 v6.flowinfo(),
                                                 v6.scope_id()))
    },
  }
}

/// Expects the socket to have been put in non-blocking mode
/// with [`UdpSocket::set_nonblocking`].
impl Socket for UdpSocket {
  type Error = io::Error;

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    self.send_to(msg.data(), addr_to_std(msg.addr()))
        .map(|_| ())
        .map_err(io_to_nb)
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    self.recv_from(buffer)
        .map(|(n, addr)| Addrd(n, addr_from_std(addr)))
        .map_err(io_to_nb)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn addr_conversion() {
    let v4: std::net::SocketAddr = "10.1.2.3:5683".parse().unwrap();
    let v6: std::net::SocketAddr = "[fe80::1]:5684".parse().unwrap();

    [v4, v6].into_iter()
            .for_each(|addr| assert_eq!(addr_to_std(addr_from_std(addr)), addr));

    assert_eq!(addr_from_std(v4).port(), 5683);
  }

  #[test]
  fn would_block_is_not_an_error() {
    assert!(matches!(io_to_nb(io::Error::from(io::ErrorKind::WouldBlock)),
                     nb::Error::WouldBlock));
    assert!(matches!(io_to_nb(io::Error::from(io::ErrorKind::Other)),
                     nb::Error::Other(_)));
  }

  #[test]
  fn loopback() {
    let a = UdpSocket::bind("127.0.0.1:0").unwrap();
    let b = UdpSocket::bind("127.0.0.1:0").unwrap();
    b.set_nonblocking(true).unwrap();

    let mut buf = [0u8; 8];
    assert!(matches!(Socket::recv(&b, &mut buf), Err(nb::Error::WouldBlock)));

    let to = addr_from_std(b.local_addr().unwrap());
    nb::block!(Socket::send(&a, Addrd(&[1, 2, 3][..], to))).unwrap();

    b.set_nonblocking(false).unwrap();
    let Addrd(n, from) = Socket::recv(&b, &mut buf).unwrap();
    assert_eq!(&buf[..n], &[1, 2, 3]);
    assert_eq!(from, addr_from_std(a.local_addr().unwrap()));
  }
}
