use core::ops::RangeInclusive;

use embedded_time::duration::Milliseconds;
use rand::{Rng, SeedableRng};

use crate::time::{self, Millis};

/// A non-blocking timer that allows a fixed-delay or exponential-backoff retry,
/// that lives alongside some operation to retry.
///
/// It does not _contain_ the work to be done (e.g. `Box<fn()>`) because
/// we don't have the luxury of a memory allocator :)
///
/// Timestamps are milliseconds since the clock's epoch,
/// see [`crate::time::now`].
///
/// ```
/// use embedded_time::duration::Milliseconds;
/// use newt::retry::{Attempts, RetryTimer, Strategy, YouShould};
///
/// let strategy = Strategy::Exponential { init_min: Milliseconds(100),
///                                        init_max: Milliseconds(100) };
/// let mut retry = RetryTimer::new(Milliseconds(0), strategy, Attempts(2));
///
/// assert_eq!(retry.what_should_i_do(Milliseconds(99)), Err(nb::Error::WouldBlock));
/// assert_eq!(retry.what_should_i_do(Milliseconds(100)), Ok(YouShould::Retry));
///
/// // the second wait is twice as long as the first
/// assert_eq!(retry.what_should_i_do(Milliseconds(299)), Err(nb::Error::WouldBlock));
/// assert_eq!(retry.what_should_i_do(Milliseconds(300)), Ok(YouShould::Retry));
///
/// assert_eq!(retry.what_should_i_do(Milliseconds(700)), Ok(YouShould::Cry));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTimer {
  next_at: Millis,
  timeout: Millis,
  strategy: Strategy,
  attempts: Attempts,
  max_attempts: Attempts,
}

/// A number of attempts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attempts(pub u16);

/// Result of [`RetryTimer.what_should_i_do`].
///
/// This tells you if a retry should be attempted or not.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum YouShould {
  /// Attempts have been exhausted and the work that is
  /// being retried should be considered poisoned.
  Cry,
  /// A retry should be performed
  Retry,
}

impl RetryTimer {
  /// Create a new retrier for work that was first attempted at `start`.
  ///
  /// `max_attempts` is the number of _re_-tries allowed after the first attempt.
  pub fn new(start: Millis, strategy: Strategy, max_attempts: Attempts) -> Self {
    let timeout = if strategy.has_jitter() {
      let mut rand = rand_chacha::ChaCha8Rng::seed_from_u64(start.0);
      Milliseconds(rand.gen_range(strategy.range()))
    } else {
      Milliseconds(*strategy.range().start())
    };

    Self { next_at: time::after(start, timeout),
           timeout,
           strategy,
           max_attempts,
           attempts: Attempts(0) }
  }

  /// When the thing we keep trying fails, invoke this to
  /// tell the retrytimer "it failed again! what do I do??"
  ///
  /// Returns `nb::Error::WouldBlock` when we have not yet
  /// waited the appropriate amount of time to retry.
  pub fn what_should_i_do(&mut self,
                          now: Millis)
                          -> nb::Result<YouShould, core::convert::Infallible> {
    if now < self.next_at {
      return Err(nb::Error::WouldBlock);
    }

    if self.attempts >= self.max_attempts {
      return Ok(YouShould::Cry);
    }

    self.attempts.0 += 1;
    if let Strategy::Exponential { .. } = self.strategy {
      self.timeout = Milliseconds(self.timeout.0.saturating_mul(2));
    }
    self.next_at = time::after(now, self.timeout);

    Ok(YouShould::Retry)
  }

  /// Number of retries performed so far
  pub fn attempts(&self) -> Attempts {
    self.attempts
  }

  /// The instant at which [`RetryTimer::what_should_i_do`] stops blocking
  pub fn next_at(&self) -> Millis {
    self.next_at
  }
}

/// Strategy to employ when retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Generate a random delay between `min` and `max`,
  /// and wait until this delay has passed between attempts.
  ///
  /// After each failed attempt, double the delay before retrying again.
  Exponential {
    /// Minimum (inclusive) delay for second attempt
    init_min: Milliseconds<u64>,
    /// Maximum (inclusive) delay for second attempt
    init_max: Milliseconds<u64>,
  },
  /// Generate a random delay between `min` and `max`,
  /// and wait until this delay has passed between attempts.
  Delay {
    /// Minimum (inclusive) delay for attempts
    min: Milliseconds<u64>,
    /// Maximum (inclusive) delay for attempts
    max: Milliseconds<u64>,
  },
}

impl Strategy {
  /// Are min & max delays the same? if so, we should probably skip the random number generation.
  pub fn has_jitter(&self) -> bool {
    let rng = self.range();
    rng.start() != rng.end()
  }

  /// Get the min & max durations as an inclusive range
  pub fn range(&self) -> RangeInclusive<u64> {
    match self {
      | &Self::Delay { min: Milliseconds(min),
                       max: Milliseconds(max), } => (min..=max),

      | &Self::Exponential { init_min: Milliseconds(min),
                             init_max: Milliseconds(max), } => (min..=max),
    }
  }

  /// Longest time this strategy can wait from the first attempt
  /// until giving up, if all attempts fail
  pub fn max_time(&self, max_attempts: Attempts) -> Milliseconds<u64> {
    Milliseconds(match self {
                   | Self::Exponential { init_max: Milliseconds(max),
                                         .. } => {
                     // init + init*2 + ... + init*2^n
                     max * (2u64.pow(max_attempts.0 as u32 + 1) - 1)
                   },
                   | Self::Delay { max: Milliseconds(max),
                                   .. } => max * (max_attempts.0 as u64 + 1),
                 })
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn ms(n: u64) -> Millis {
    Milliseconds(n)
  }

  #[test]
  fn delay_retrier() {
    let mut retry = RetryTimer::new(ms(0),
                                    Strategy::Delay { min: ms(1000),
                                                      max: ms(1000) },
                                    Attempts(3));

    assert_eq!(retry.what_should_i_do(ms(999)), Err(nb::Error::WouldBlock));
    assert_eq!(retry.what_should_i_do(ms(1000)), Ok(YouShould::Retry));

    assert_eq!(retry.what_should_i_do(ms(1999)), Err(nb::Error::WouldBlock));
    assert_eq!(retry.what_should_i_do(ms(2000)), Ok(YouShould::Retry));

    // late; the next wait is measured from when we actually retried
    assert_eq!(retry.what_should_i_do(ms(10_000)), Ok(YouShould::Retry));
    assert_eq!(retry.what_should_i_do(ms(10_999)), Err(nb::Error::WouldBlock));

    assert_eq!(retry.what_should_i_do(ms(11_000)), Ok(YouShould::Cry));
    assert_eq!(retry.attempts(), Attempts(3));
  }

  #[test]
  fn exponential_retrier() {
    let mut retry = RetryTimer::new(ms(0),
                                    Strategy::Exponential { init_min: ms(1000),
                                                            init_max: ms(1000) },
                                    Attempts(4));

    let mut waits = [0u64; 4];
    let mut last = 0;
    let mut now;
    for wait in waits.iter_mut() {
      now = retry.next_at().0;
      assert_eq!(retry.what_should_i_do(ms(now - 1)), Err(nb::Error::WouldBlock));
      assert_eq!(retry.what_should_i_do(ms(now)), Ok(YouShould::Retry));
      *wait = now - last;
      last = now;
    }

    assert_eq!(waits, [1000, 2000, 4000, 8000]);

    now = retry.next_at().0;
    assert_eq!(now, 31_000);
    assert_eq!(retry.what_should_i_do(ms(now)), Ok(YouShould::Cry));
  }

  #[test]
  fn jittered_timeout_is_in_range() {
    let strategy = Strategy::Exponential { init_min: ms(2000),
                                           init_max: ms(3000) };

    (0..50u64).for_each(|start| {
                let retry = RetryTimer::new(ms(start), strategy, Attempts(4));
                let first = retry.next_at().0 - start;
                assert!((2000..=3000).contains(&first), "{}", first);
              });
  }

  #[test]
  fn max_time() {
    let exp = Strategy::Exponential { init_min: ms(100),
                                      init_max: ms(200) };
    assert_eq!(exp.max_time(Attempts(0)), ms(200));
    assert_eq!(exp.max_time(Attempts(2)), ms(200 + 400 + 800));

    let delay = Strategy::Delay { min: ms(100),
                                  max: ms(200) };
    assert_eq!(delay.max_time(Attempts(2)), ms(600));
  }
}
