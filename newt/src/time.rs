use embedded_time::duration::Milliseconds;

/// A duration, in milliseconds
pub type Millis = Milliseconds<u64>;

/// Supertrait of [`embedded_time::Clock`] pinning the
/// type of "ticks" to u64
pub trait Clock: embedded_time::Clock<T = u64> {}
impl<C: embedded_time::Clock<T = u64>> Clock for C {}

/// The clock could not tell us what time it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
  /// [`embedded_time::Clock::try_now`] failed
  Clock,
  /// The current instant does not fit in a millisecond count
  Conversion,
}

/// Read the clock, yielding the number of milliseconds
/// since its epoch.
///
/// Every timestamp the engine stores is one of these, so
/// nothing downstream needs to be generic over the clock.
pub fn now<C: Clock>(clock: &C) -> Result<Millis, TimeError> {
  let instant = clock.try_now().map_err(|_| TimeError::Clock)?;
  Millis::try_from(instant.duration_since_epoch()).map_err(|_| TimeError::Conversion)
}

/// `now + dur`, saturating at `u64::MAX`
pub fn after(Milliseconds(now): Millis, Milliseconds(dur): Millis) -> Millis {
  Milliseconds(now.saturating_add(dur))
}
