#![allow(dead_code)]

use ::std::sync::{Arc, Mutex};
use ::std::vec::Vec;

use embedded_time::rate::Fraction;
use embedded_time::Instant;
use newt_msg::{Message, TryIntoBytes};
use no_std_net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::net::{Addrd, Socket};

/// Start logging to stdout, ignoring repeat initialization
/// from other tests in the same process.
pub fn init_logging() {
  simple_logger::init_with_level(log::Level::Trace).ok();
}

/// Address of a fake remote peer
pub fn peer(n: u8) -> SocketAddr {
  SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(192, 168, 0, n), 5683))
}

/// Serialize a message for feeding to a [`SockMock`]
pub fn bytes(msg: &Message<'_>) -> Vec<u8> {
  let mut buf = [0u8; crate::MAX_PACKET_SIZE];
  let n = msg.try_into_bytes(&mut buf).unwrap();
  buf[..n].to_vec()
}

/// A clock whose ticks are milliseconds and that only
/// moves when told to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ClockMock(pub ::core::cell::Cell<u64>);

impl ClockMock {
  pub fn new() -> Self {
    Self(::core::cell::Cell::new(0))
  }

  pub fn set(&self, to: u64) {
    self.0.set(to);
  }

  pub fn advance(&self, by: u64) {
    self.0.set(self.0.get() + by);
  }
}

impl embedded_time::Clock for ClockMock {
  type T = u64;

  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

  fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
    Ok(Instant::new(self.0.get()))
  }
}

pub type Dgrams = Arc<Mutex<Vec<Addrd<Vec<u8>>>>>;

/// A mocked socket
#[derive(Debug, Default)]
pub struct SockMock {
  /// Inbound bytes from remote sockets. Address represents the sender
  pub rx: Dgrams,
  /// Outbound bytes to remote sockets. Address represents the destination
  pub tx: Dgrams,
  /// Destinations that sends fail for
  pub unreachable: Arc<Mutex<Vec<SocketAddr>>>,
}

impl SockMock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drain everything sent so far
  pub fn take_sent(&self) -> Vec<Addrd<Vec<u8>>> {
    self.tx.lock().unwrap().drain(..).collect()
  }
}

impl Socket for SockMock {
  type Error = ();

  fn recv(&self, buf: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    let mut rx = self.rx.lock().unwrap();

    if rx.is_empty() {
      return Err(nb::Error::WouldBlock);
    }

    let dgram = rx.remove(0);
    let n = dgram.data().len().min(buf.len());
    buf[..n].copy_from_slice(&dgram.data()[..n]);

    Ok(dgram.map(|_| n))
  }

  fn send(&self, buf: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    if self.unreachable.lock().unwrap().contains(&buf.addr()) {
      return Err(nb::Error::Other(()));
    }

    self.tx.lock().unwrap().push(buf.map(Vec::from));
    Ok(())
  }
}

/// [`crate::platform::Platform`] made of mocks
#[derive(Debug, Clone, Copy)]
pub struct Mock;

impl crate::platform::Platform for Mock {
  type Clock = ClockMock;
  type Socket = SockMock;
}
