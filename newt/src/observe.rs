use newt_msg::{Id, Token, Type};
use no_std_net::SocketAddr;
use tinyvec::ArrayVec;

use crate::time::{self, Millis};
use crate::PoolExhausted;

/// Identifies an observable resource.
///
/// Resources are compared by equality of this value, so the
/// same resource must always be observed using the same handle.
pub type ResourceHandle = &'static str;

/// A peer subscribed to changes of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observer {
  /// The observed resource
  pub resource: ResourceHandle,
  /// The subscriber
  pub addr: SocketAddr,
  /// Token of the registering request, echoed in every notification
  pub token: Token,
  /// The next notification at or after this instant is sent Confirmable
  pub refresh_at: Millis,
  /// Id of the most recent notification, so that a Reset answering it
  /// can be traced back to this subscription
  pub last_id: Option<Id>,
}

/// Handle to an occupied slot in [`Observers`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObsRef(usize);

/// A fixed pool of `N` subscriptions.
///
/// ```
/// use embedded_time::duration::Milliseconds;
/// use newt::msg::Token;
/// use newt::observe::Observers;
/// use no_std_net::{Ipv4Addr, SocketAddr, SocketAddrV4};
///
/// let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 5683));
/// let mut obs = Observers::<2>::new(Milliseconds(60_000));
///
/// obs.add_observer("temp", addr, Token::opaque(b"a"), Milliseconds(0)).unwrap();
/// // same peer, same resource: refreshed rather than duplicated
/// obs.add_observer("temp", addr, Token::opaque(b"b"), Milliseconds(0)).unwrap();
/// assert_eq!(obs.len(), 1);
///
/// assert_eq!(obs.remove_by_client(addr), 1);
/// assert!(obs.is_empty());
/// ```
#[derive(Debug)]
pub struct Observers<const N: usize> {
  slots: [Option<Observer>; N],
  refresh_interval: Millis,
}

impl<const N: usize> Observers<N> {
  /// Create an empty pool whose subscribers are sent a Confirmable
  /// notification at least once every `refresh_interval`
  pub fn new(refresh_interval: Millis) -> Self {
    Self { slots: [None; N],
           refresh_interval }
  }

  /// Subscribe `addr` to `resource`.
  ///
  /// A peer that already observes `resource` keeps its slot and
  /// takes on the new token.
  pub fn add_observer(&mut self,
                      resource: ResourceHandle,
                      addr: SocketAddr,
                      token: Token,
                      now: Millis)
                      -> Result<ObsRef, PoolExhausted> {
    let existing = self.slots.iter_mut().enumerate().find_map(|(ix, s)| match s {
                                                      | Some(o)
                                                        if o.addr == addr && o.resource == resource =>
                                                      {
                                                        Some((ix, o))
                                                      },
                                                      | _ => None,
                                                    });

    if let Some((ix, o)) = existing {
      o.token = token;
      log::debug!(target: "newt", "{} refreshed its observation of {}", addr, resource);
      return Ok(ObsRef(ix));
    }

    match self.slots.iter().position(Option::is_none) {
      | Some(ix) => {
        self.slots[ix] = Some(Observer { resource,
                                         addr,
                                         token,
                                         refresh_at: time::after(now, self.refresh_interval),
                                         last_id: None });
        log::debug!(target: "newt", "{} now observes {}", addr, resource);
        Ok(ObsRef(ix))
      },
      | None => {
        log::warn!(target: "newt", "{} cannot observe {}: all {} observer slots in use", addr, resource, N);
        Err(PoolExhausted)
      },
    }
  }

  fn remove_where(&mut self, mut f: impl FnMut(&Observer) -> bool) -> usize {
    let mut n = 0;
    self.slots.iter_mut().for_each(|slot| {
                           if let Some(o) = slot.filter(|o| f(o)) {
                             log::debug!(target: "newt", "{} no longer observes {}", o.addr, o.resource);
                             *slot = None;
                             n += 1;
                           }
                         });
    n
  }

  /// Free a slot, yielding the subscription it held
  pub fn remove_observer(&mut self, r: ObsRef) -> Option<Observer> {
    self.slots.get_mut(r.0).and_then(Option::take)
  }

  /// Drop every subscription held by `addr`
  pub fn remove_by_client(&mut self, addr: SocketAddr) -> usize {
    self.remove_where(|o| o.addr == addr)
  }

  /// Drop `addr`'s subscriptions registered with `token`
  pub fn remove_by_token(&mut self, addr: SocketAddr, token: Token) -> usize {
    self.remove_where(|o| o.addr == addr && o.token == token)
  }

  /// Drop the subscription whose latest notification to `addr` had id `id`
  pub fn remove_by_notification(&mut self, addr: SocketAddr, id: Id) -> usize {
    self.remove_where(|o| o.addr == addr && o.last_id == Some(id))
  }

  /// Drop `addr`'s subscriptions to `resource`
  pub fn remove_by_resource(&mut self, addr: SocketAddr, resource: ResourceHandle) -> usize {
    self.remove_where(|o| o.addr == addr && o.resource == resource)
  }

  /// Handles to every subscription to `resource`
  pub fn matching(&self, resource: ResourceHandle) -> ArrayVec<[ObsRef; N]> {
    self.slots
        .iter()
        .enumerate()
        .filter(|(_, s)| matches!(s, Some(o) if o.resource == resource))
        .map(|(ix, _)| ObsRef(ix))
        .collect()
  }

  /// Borrow the subscription behind a handle
  pub fn get(&self, r: ObsRef) -> Option<&Observer> {
    self.slots.get(r.0).and_then(Option::as_ref)
  }

  /// Mutably borrow the subscription behind a handle
  pub fn get_mut(&mut self, r: ObsRef) -> Option<&mut Observer> {
    self.slots.get_mut(r.0).and_then(Option::as_mut)
  }

  /// Decide how the next notification to a subscriber is sent.
  ///
  /// Notifications are Non-confirmable, except the first one after
  /// the refresh deadline which is Confirmable and starts a new interval.
  pub fn delivery(&mut self, r: ObsRef, now: Millis) -> Option<Type> {
    let interval = self.refresh_interval;
    self.get_mut(r).map(|o| {
                     if now >= o.refresh_at {
                       o.refresh_at = time::after(now, interval);
                       Type::Con
                     } else {
                       Type::Non
                     }
                   })
  }

  /// Every subscription
  pub fn iter(&self) -> impl Iterator<Item = &Observer> {
    self.slots.iter().flatten()
  }

  /// Number of subscriptions
  pub fn len(&self) -> usize {
    self.iter().count()
  }

  /// Whether there are no subscriptions
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::duration::Milliseconds;

  use super::*;
  use crate::test::peer;

  fn ms(n: u64) -> Millis {
    Milliseconds(n)
  }

  fn tok(n: u8) -> Token {
    Token::from_slice(&[n]).unwrap()
  }

  #[test]
  fn pool_full() {
    let mut obs = Observers::<2>::new(ms(60_000));
    obs.add_observer("a", peer(1), tok(1), ms(0)).unwrap();
    obs.add_observer("a", peer(2), tok(2), ms(0)).unwrap();

    assert_eq!(obs.add_observer("a", peer(3), tok(3), ms(0)),
               Err(PoolExhausted));

    // existing subscriptions untouched, and refreshing one still works
    assert_eq!(obs.len(), 2);
    assert!(obs.add_observer("a", peer(2), tok(9), ms(0)).is_ok());
    assert_eq!(obs.iter().map(|o| o.token).collect::<Vec<_>>(),
               vec![tok(1), tok(9)]);
  }

  #[test]
  fn refresh_keeps_slot() {
    let mut obs = Observers::<4>::new(ms(60_000));
    let a = obs.add_observer("a", peer(1), tok(1), ms(0)).unwrap();
    let b = obs.add_observer("a", peer(1), tok(2), ms(5)).unwrap();

    assert_eq!(a, b);
    assert_eq!(obs.get(a).map(|o| o.token), Some(tok(2)));

    // other resource from the same peer is a separate subscription
    let c = obs.add_observer("b", peer(1), tok(1), ms(5)).unwrap();
    assert_ne!(a, c);
    assert_eq!(obs.len(), 2);
  }

  #[test]
  fn removals() {
    let mut obs = Observers::<4>::new(ms(60_000));
    obs.add_observer("a", peer(1), tok(1), ms(0)).unwrap();
    obs.add_observer("b", peer(1), tok(2), ms(0)).unwrap();
    let c = obs.add_observer("a", peer(2), tok(1), ms(0)).unwrap();
    obs.add_observer("b", peer(2), tok(3), ms(0)).unwrap();

    obs.get_mut(c).unwrap().last_id = Some(Id(40));

    assert_eq!(obs.remove_by_notification(peer(1), Id(40)), 0);
    assert_eq!(obs.remove_by_notification(peer(2), Id(40)), 1);
    assert_eq!(obs.remove_by_token(peer(2), tok(1)), 0);
    assert_eq!(obs.remove_by_token(peer(1), tok(2)), 1);
    assert_eq!(obs.remove_by_resource(peer(2), "a"), 0);
    assert_eq!(obs.remove_by_resource(peer(2), "b"), 1);
    assert_eq!(obs.remove_by_client(peer(1)), 1);
    assert!(obs.is_empty());
  }

  #[test]
  fn matching() {
    let mut obs = Observers::<4>::new(ms(60_000));
    let a = obs.add_observer("a", peer(1), tok(1), ms(0)).unwrap();
    obs.add_observer("b", peer(1), tok(1), ms(0)).unwrap();
    let c = obs.add_observer("a", peer(2), tok(1), ms(0)).unwrap();

    assert_eq!(obs.matching("a").as_slice(), &[a, c]);
    assert!(obs.matching("c").is_empty());

    assert_eq!(obs.remove_observer(a).map(|o| o.addr), Some(peer(1)));
    assert_eq!(obs.matching("a").as_slice(), &[c]);
  }

  #[test]
  fn con_once_per_refresh_interval() {
    let mut obs = Observers::<1>::new(ms(60_000));
    let r = obs.add_observer("a", peer(1), tok(1), ms(1_000)).unwrap();

    assert_eq!(obs.delivery(r, ms(1_000)), Some(Type::Non));
    assert_eq!(obs.delivery(r, ms(60_999)), Some(Type::Non));
    assert_eq!(obs.delivery(r, ms(61_000)), Some(Type::Con));
    assert_eq!(obs.delivery(r, ms(61_001)), Some(Type::Non));
    assert_eq!(obs.delivery(r, ms(121_000)), Some(Type::Con));

    obs.remove_observer(r);
    assert_eq!(obs.delivery(r, ms(200_000)), None);
  }
}
