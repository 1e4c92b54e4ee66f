/// Block1 / Block2 values
pub mod block;
pub use block::*;

/// Content-Format values
pub mod content_format;
pub use content_format::*;

/// Option numbers understood by this crate, in ascending order.
///
/// Odd numbers are critical: a recipient that does not understand
/// one of them must reject the message.
pub mod no {
  use crate::OptNumber;

  /// [If-Match](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.8.1)
  pub const IF_MATCH: OptNumber = OptNumber(1);
  /// [Uri-Host](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.1)
  pub const URI_HOST: OptNumber = OptNumber(3);
  /// [ETag](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.6)
  pub const ETAG: OptNumber = OptNumber(4);
  /// [If-None-Match](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.8.2)
  pub const IF_NONE_MATCH: OptNumber = OptNumber(5);
  /// [Observe](https://datatracker.ietf.org/doc/html/rfc7641#section-2)
  pub const OBSERVE: OptNumber = OptNumber(6);
  /// [Uri-Port](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.1)
  pub const URI_PORT: OptNumber = OptNumber(7);
  /// [Location-Path](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.7)
  pub const LOCATION_PATH: OptNumber = OptNumber(8);
  /// [Uri-Path](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.1)
  pub const URI_PATH: OptNumber = OptNumber(11);
  /// [Content-Format](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.3)
  pub const CONTENT_FORMAT: OptNumber = OptNumber(12);
  /// [Max-Age](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.5)
  pub const MAX_AGE: OptNumber = OptNumber(14);
  /// [Uri-Query](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.1)
  pub const URI_QUERY: OptNumber = OptNumber(15);
  /// [Accept](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.4)
  pub const ACCEPT: OptNumber = OptNumber(17);
  /// [Location-Query](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.7)
  pub const LOCATION_QUERY: OptNumber = OptNumber(20);
  /// [Block2](https://datatracker.ietf.org/doc/html/rfc7959#section-2.1)
  pub const BLOCK2: OptNumber = OptNumber(23);
  /// [Block1](https://datatracker.ietf.org/doc/html/rfc7959#section-2.1)
  pub const BLOCK1: OptNumber = OptNumber(27);
  /// [Size2](https://datatracker.ietf.org/doc/html/rfc7959#section-4)
  pub const SIZE2: OptNumber = OptNumber(28);
  /// [Size1](https://datatracker.ietf.org/doc/html/rfc7252#section-5.10.9)
  pub const SIZE1: OptNumber = OptNumber(60);
}
