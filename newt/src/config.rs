use embedded_time::duration::Milliseconds;
use newt_msg::ContentFormat;

use crate::retry::{Attempts, Strategy};
use crate::time::Millis;

/// Configuration options related to outbound CON messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Con {
  /// Retry strategy for CON messages that
  /// have not yet been ACKed.
  ///
  /// The initial timeout is picked at random from
  /// `init_min..=init_max` and doubles with every retransmission.
  ///
  /// Defaults to an exponential retry strategy:
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use newt::config::Con;
  /// use newt::retry::Strategy;
  ///
  /// assert_eq!(Con::default().retry_strategy,
  ///            Strategy::Exponential { init_min: Milliseconds(2_000),
  ///                                    init_max: Milliseconds(3_000) });
  /// ```
  pub retry_strategy: Strategy,
  /// Number of times we are allowed to resend a CON message
  /// before giving up on the exchange.
  ///
  /// Defaults to 4 retransmissions.
  /// ```
  /// use newt::config::Con;
  /// use newt::retry::Attempts;
  ///
  /// assert_eq!(Con::default().max_retransmits, Attempts(4));
  /// ```
  pub max_retransmits: Attempts,
}

/// Configuration options related to NON requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Non {
  /// Whether a NON request is answered with a NON response.
  ///
  /// When `false`, resource handlers are invoked for NON
  /// requests without a response to fill in.
  ///
  /// ```
  /// use newt::config::Non;
  ///
  /// assert!(Non::default().respond);
  /// ```
  pub respond: bool,
}

/// Configuration options related to parsing & handling messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msg {
  /// Seed mixed into generated message ids and
  /// [`Token`](newt_msg::Token)s.
  ///
  /// Defaults to 0. Endpoints sharing a network should each
  /// use a different seed (a random integer or machine identifier).
  ///
  /// ```
  /// use newt::config::Msg;
  ///
  /// assert_eq!(Msg::default().token_seed, 0);
  /// ```
  pub token_seed: u16,

  /// How long a received message id is remembered for
  /// duplicate detection, and how long we wait for a
  /// separate response to one of our requests.
  ///
  /// Defaults to EXCHANGE_LIFETIME from RFC7252, 247 seconds.
  ///
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use newt::config::Msg;
  ///
  /// assert_eq!(Msg::default().exchange_lifetime, Milliseconds(247_000u64));
  /// ```
  pub exchange_lifetime: Millis,

  /// See [`Con`]
  pub con: Con,

  /// See [`Non`]
  pub non: Non,
}

/// Configuration options related to Block2 transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  /// Largest block we will send.
  ///
  /// Larger requested blocks are answered with blocks of this size,
  /// and responses larger than this are split into blocks
  /// even when the client did not ask for it.
  ///
  /// Defaults to 512 bytes.
  /// ```
  /// use newt::config::Block;
  ///
  /// assert_eq!(Block::default().max_chunk, 512);
  /// ```
  pub max_chunk: u16,
}

/// Configuration options related to Observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observe {
  /// Notifications are sent NON, except that at least once per
  /// `refresh_interval` a subscriber gets a CON notification
  /// so that subscribers that went away are noticed and dropped.
  ///
  /// Defaults to 60 seconds.
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use newt::config::Observe;
  ///
  /// assert_eq!(Observe::default().refresh_interval, Milliseconds(60_000u64));
  /// ```
  pub refresh_interval: Millis,

  /// Content-Format added to every notification, if any.
  ///
  /// Defaults to `None`.
  pub content_format: Option<ContentFormat>,
}

impl Default for Con {
  fn default() -> Self {
    Con { retry_strategy: Strategy::Exponential { init_min: Milliseconds(2_000),
                                                  init_max: Milliseconds(3_000) },
          max_retransmits: Attempts(4) }
  }
}

impl Default for Non {
  fn default() -> Self {
    Non { respond: true }
  }
}

impl Default for Msg {
  fn default() -> Self {
    Msg { token_seed: 0,
          exchange_lifetime: Milliseconds(247_000),
          con: Con::default(),
          non: Non::default() }
  }
}

impl Default for Block {
  fn default() -> Self {
    Block { max_chunk: 512 }
  }
}

impl Default for Observe {
  fn default() -> Self {
    Observe { refresh_interval: Milliseconds(60_000),
              content_format: None }
  }
}

/// Runtime config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
  /// See [`Msg`]
  pub msg: Msg,
  /// See [`Block`]
  pub block: Block,
  /// See [`Observe`]
  pub observe: Observe,
}

impl Config {
  /// Time from the first transmission of a CON message
  /// until we give up on it, if it is never acknowledged.
  ///
  /// ```
  /// use newt::config::Config;
  ///
  /// // 3s + 6s + 12s + 24s + 48s
  /// assert_eq!(Config::default().max_transmit_wait_millis(), 93_000);
  /// ```
  pub fn max_transmit_wait_millis(&self) -> u64 {
    self.msg
        .con
        .retry_strategy
        .max_time(self.msg.con.max_retransmits)
        .0
  }
}
