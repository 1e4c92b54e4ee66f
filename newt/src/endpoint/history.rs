use core::fmt;

use newt_msg::Id;
use no_std_net::SocketAddr;

use crate::time::{self, Millis};
use crate::MAX_PACKET_SIZE;

/// Number of received message ids remembered for duplicate detection
pub(super) const HISTORY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seen {
  addr: SocketAddr,
  id: Id,
  at: Millis,
}

/// Number of replies kept for answering retransmitted requests
pub(super) const REPLIES: usize = 4;

struct Reply {
  to: Option<(SocketAddr, Id)>,
  bytes: [u8; MAX_PACKET_SIZE],
  len: usize,
}

/// Recently received requests and the replies to the latest few,
/// so a retransmitted request can be answered without running
/// its handler again.
pub(super) struct History {
  seen: [Option<Seen>; HISTORY],
  next: usize,
  replies: [Reply; REPLIES],
  next_reply: usize,
}

impl fmt::Debug for History {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("History")
     .field("seen", &self.seen)
     .field("replies", &self.replies.iter().filter(|r| r.to.is_some()).count())
     .finish()
  }
}

impl History {
  pub(super) fn new() -> Self {
    Self { seen: [None; HISTORY],
           next: 0,
           replies: core::array::from_fn(|_| Reply { to: None,
                                                     bytes: [0; MAX_PACKET_SIZE],
                                                     len: 0 }),
           next_reply: 0 }
  }

  /// Was a message with this id received from `addr` less than `lifetime` ago?
  pub(super) fn is_duplicate(&self, addr: SocketAddr, id: Id, now: Millis, lifetime: Millis) -> bool {
    self.seen.iter().flatten().any(|s| {
                                s.addr == addr && s.id == id && now < time::after(s.at, lifetime)
                              })
  }

  /// Remember a received message, forgetting the oldest one if full
  pub(super) fn record(&mut self, addr: SocketAddr, id: Id, now: Millis) {
    self.seen[self.next] = Some(Seen { addr, id, at: now });
    self.next = (self.next + 1) % HISTORY;
  }

  /// Keep a copy of the reply to the request `id` from `addr`,
  /// overwriting the oldest reply kept.
  pub(super) fn cache_reply(&mut self, addr: SocketAddr, id: Id, bytes: &[u8]) {
    let ix = self.replies
                 .iter()
                 .position(|r| r.to == Some((addr, id)))
                 .unwrap_or_else(|| {
                   let ix = self.next_reply;
                   self.next_reply = (ix + 1) % REPLIES;
                   ix
                 });

    let reply = &mut self.replies[ix];
    let n = bytes.len().min(MAX_PACKET_SIZE);
    reply.bytes[..n].copy_from_slice(&bytes[..n]);
    reply.len = n;
    reply.to = Some((addr, id));
  }

  /// The reply to request `id` from `addr`, unless it has been
  /// pushed out by more recent ones
  pub(super) fn cached_reply(&self, addr: SocketAddr, id: Id) -> Option<&[u8]> {
    self.replies
        .iter()
        .find(|r| r.to == Some((addr, id)))
        .map(|r| &r.bytes[..r.len])
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::duration::Milliseconds;

  use super::*;
  use crate::test::peer;

  #[test]
  fn duplicates_expire() {
    let mut h = History::new();
    h.record(peer(1), Id(1), Milliseconds(0));

    let life = Milliseconds(1_000);
    assert!(h.is_duplicate(peer(1), Id(1), Milliseconds(999), life));
    assert!(!h.is_duplicate(peer(1), Id(1), Milliseconds(1_000), life));
    assert!(!h.is_duplicate(peer(2), Id(1), Milliseconds(0), life));
    assert!(!h.is_duplicate(peer(1), Id(2), Milliseconds(0), life));
  }

  #[test]
  fn oldest_is_forgotten() {
    let mut h = History::new();
    let life = Milliseconds(1_000);

    (0..=HISTORY as u16).for_each(|n| h.record(peer(1), Id(n), Milliseconds(0)));

    assert!(!h.is_duplicate(peer(1), Id(0), Milliseconds(0), life));
    assert!((1..=HISTORY as u16).all(|n| h.is_duplicate(peer(1), Id(n), Milliseconds(0), life)));
  }

  #[test]
  fn recent_replies_are_cached() {
    let mut h = History::new();
    assert_eq!(h.cached_reply(peer(1), Id(1)), None);

    h.cache_reply(peer(1), Id(1), &[1, 2]);
    h.cache_reply(peer(2), Id(1), &[3]);
    assert_eq!(h.cached_reply(peer(1), Id(1)), Some(&[1u8, 2][..]));
    assert_eq!(h.cached_reply(peer(2), Id(1)), Some(&[3u8][..]));

    // replacing a reply does not take a new slot
    h.cache_reply(peer(1), Id(1), &[4]);
    assert_eq!(h.cached_reply(peer(1), Id(1)), Some(&[4u8][..]));

    (2..=REPLIES as u16).for_each(|n| h.cache_reply(peer(3), Id(n), &[0]));
    assert_eq!(h.cached_reply(peer(1), Id(1)), None);
    assert_eq!(h.cached_reply(peer(2), Id(1)), Some(&[3u8][..]));
  }
}
