use embedded_time::rate::Fraction;

/// Networking! woohoo!
pub mod net;

/// implementor of [`crate::platform::Platform`] for platforms that support `std`.
///
/// ```no_run
/// use newt::config::Config;
/// use newt::endpoint::Endpoint;
///
/// let sock = std::net::UdpSocket::bind("0.0.0.0:5683").unwrap();
/// sock.set_nonblocking(true).unwrap();
///
/// let mut ep = Endpoint::<newt::std::Platform>::new(Config::default(),
///                                                   newt::std::Clock::new(),
///                                                   sock);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Platform;

impl crate::platform::Platform for Platform {
  type Clock = Clock;
  type Socket = std::net::UdpSocket;
}

/// Implement [`embedded_time::Clock`] using [`std::time`] primitives
#[derive(Debug, Clone, Copy)]
pub struct Clock(std::time::Instant);

impl Default for Clock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock {
  /// Create a new clock whose epoch is now
  pub fn new() -> Self {
    Self(std::time::Instant::now())
  }
}

impl embedded_time::Clock for Clock {
  type T = u64;

  // microseconds
  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

  fn try_now(&self) -> Result<embedded_time::Instant<Self>, embedded_time::clock::Error> {
    let elapsed = std::time::Instant::now().duration_since(self.0);
    Ok(embedded_time::Instant::new(elapsed.as_micros() as u64))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clock_counts_up_from_creation() {
    let clock = Clock::new();
    let a = crate::time::now(&clock).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let b = crate::time::now(&clock).unwrap();

    assert!(b.0 >= a.0 + 5);
  }
}
