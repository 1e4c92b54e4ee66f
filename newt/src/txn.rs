use core::fmt;

use newt_msg::{Id, Message, MessageToBytesError, Token, TryIntoBytes, Type};
use no_std_net::SocketAddr;

use crate::config::Con;
use crate::net::{Addrd, Socket};
use crate::retry::{RetryTimer, YouShould};
use crate::time::Millis;
use crate::{PoolExhausted, MAX_PACKET_SIZE};

/// One outbound message and the state needed to see it delivered:
/// its serialized bytes, the retransmission timer (Confirmable only)
/// and an optional callback to run when the peer answers.
pub struct Transaction<Cb> {
  id: Id,
  addr: SocketAddr,
  ty: Type,
  token: Token,
  retry: Option<RetryTimer>,
  packet: [u8; MAX_PACKET_SIZE],
  len: usize,
  callback: Option<(Cb, usize)>,
}

impl<Cb> fmt::Debug for Transaction<Cb> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Transaction")
     .field("id", &self.id)
     .field("addr", &self.addr)
     .field("ty", &self.ty)
     .field("token", &self.token)
     .field("retry", &self.retry)
     .field("len", &self.len)
     .field("callback", &self.callback.as_ref().map(|(_, ctx)| ctx))
     .finish()
  }
}

impl<Cb> Transaction<Cb> {
  fn new(id: Id, addr: SocketAddr) -> Self {
    Self { id,
           addr,
           ty: Type::Non,
           token: Token::default(),
           retry: None,
           packet: [0; MAX_PACKET_SIZE],
           len: 0,
           callback: None }
  }

  /// Serialize `msg` into this transaction's buffer,
  /// replacing whatever was there.
  pub fn write(&mut self, msg: &Message<'_>) -> Result<usize, MessageToBytesError> {
    let n = msg.try_into_bytes(&mut self.packet)?;
    self.len = n;
    self.ty = msg.ty;
    self.token = msg.token;
    Ok(n)
  }

  /// Run `cb` with the context value `ctx` when a
  /// response to this message arrives
  pub fn set_callback(&mut self, cb: Cb, ctx: usize) {
    self.callback = Some((cb, ctx));
  }

  /// Take the callback out of this transaction
  pub fn take_callback(&mut self) -> Option<(Cb, usize)> {
    self.callback.take()
  }

  /// The message id
  pub fn id(&self) -> Id {
    self.id
  }

  /// The peer this message is addressed to
  pub fn addr(&self) -> SocketAddr {
    self.addr
  }

  /// Type of the buffered message
  pub fn ty(&self) -> Type {
    self.ty
  }

  /// Token of the buffered message
  pub fn token(&self) -> Token {
    self.token
  }

  /// The serialized message
  pub fn bytes(&self) -> &[u8] {
    &self.packet[..self.len]
  }

  /// Retransmission state, present once a Confirmable message has been sent
  pub fn retry(&self) -> Option<&RetryTimer> {
    self.retry.as_ref()
  }
}

/// Handle to an occupied slot in [`Transactions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxnRef(usize);

/// A Confirmable message that was retransmitted
/// as many times as allowed without being acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abandoned {
  /// Message id of the abandoned message
  pub id: Id,
  /// Peer that never answered
  pub addr: SocketAddr,
}

/// What [`Transactions::check_transactions`] did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
  /// Messages sent again
  pub retransmitted: usize,
  /// Messages given up on
  pub abandoned: usize,
  /// Retransmissions the socket refused; these are tried
  /// again at their next deadline
  pub failed: usize,
}

/// A fixed pool of `N` transactions.
///
/// ```
/// use newt::txn::Transactions;
/// use newt::msg::Id;
/// use no_std_net::{Ipv4Addr, SocketAddr, SocketAddrV4};
///
/// let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 5683));
/// let mut txns = Transactions::<(), 2>::new();
///
/// let a = txns.new_transaction(Id(1), addr).unwrap();
/// txns.new_transaction(Id(2), addr).unwrap();
/// assert!(txns.new_transaction(Id(3), addr).is_err());
///
/// txns.clear(a);
/// assert!(txns.new_transaction(Id(3), addr).is_ok());
/// ```
pub struct Transactions<Cb, const N: usize> {
  slots: [Option<Transaction<Cb>>; N],
}

impl<Cb, const N: usize> fmt::Debug for Transactions<Cb, N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.slots.iter().flatten()).finish()
  }
}

impl<Cb, const N: usize> Default for Transactions<Cb, N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<Cb, const N: usize> Transactions<Cb, N> {
  /// Create an empty pool
  pub fn new() -> Self {
    Self { slots: core::array::from_fn(|_| None) }
  }

  /// Claim a free slot for a message with id `id` addressed to `addr`
  pub fn new_transaction(&mut self, id: Id, addr: SocketAddr) -> Result<TxnRef, PoolExhausted> {
    match self.slots.iter().position(Option::is_none) {
      | Some(ix) => {
        self.slots[ix] = Some(Transaction::new(id, addr));
        log::trace!(target: "newt", "txn {} allocated for {:?} -> {}", ix, id, addr);
        Ok(TxnRef(ix))
      },
      | None => {
        log::warn!(target: "newt", "all {} transactions in use, cannot send {:?} to {}", N, id, addr);
        Err(PoolExhausted)
      },
    }
  }

  /// Borrow the transaction behind a handle
  pub fn get(&self, r: TxnRef) -> Option<&Transaction<Cb>> {
    self.slots.get(r.0).and_then(Option::as_ref)
  }

  /// Mutably borrow the transaction behind a handle
  pub fn get_mut(&mut self, r: TxnRef) -> Option<&mut Transaction<Cb>> {
    self.slots.get_mut(r.0).and_then(Option::as_mut)
  }

  /// Number of occupied slots
  pub fn len(&self) -> usize {
    self.slots.iter().flatten().count()
  }

  /// Whether every slot is free
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Hand the buffered message to the socket.
  ///
  /// A Confirmable message stays in its slot and is scheduled for
  /// retransmission; anything else is forgotten as soon as it is sent.
  /// The slot is also freed when the socket fails.
  pub fn send<S: Socket>(&mut self,
                         r: TxnRef,
                         sock: &S,
                         now: Millis,
                         con: &Con)
                         -> Result<(), S::Error> {
    let slot = match self.slots.get_mut(r.0) {
      | Some(slot) => slot,
      | None => return Ok(()),
    };

    let sent = match slot.as_ref() {
      | Some(txn) => nb::block!(sock.send(Addrd(txn.bytes(), txn.addr))).map(|_| {
                       log::trace!(target: "newt", "txn {} sent {:?} {:?} to {}", r.0, txn.ty, txn.id, txn.addr);
                       txn.ty == Type::Con
                     }),
      | None => return Ok(()),
    };

    let is_con = match sent {
      | Ok(is_con) => is_con,
      | Err(e) => {
        *slot = None;
        return Err(e);
      },
    };

    if is_con {
      if let Some(txn) = slot.as_mut() {
        txn.retry = Some(RetryTimer::new(now, con.retry_strategy, con.max_retransmits));
      }
    } else {
      *slot = None;
    }

    Ok(())
  }

  /// Retransmit every Confirmable message whose deadline has passed,
  /// and free the slots of those that ran out of retransmissions.
  ///
  /// `on_abandon` is invoked after the slot has been freed.
  /// A retransmission the socket refuses is counted in [`Sweep::failed`]
  /// and does not stop the sweep.
  pub fn check_transactions<S: Socket>(&mut self,
                                       now: Millis,
                                       sock: &S,
                                       mut on_abandon: impl FnMut(Abandoned))
                                       -> Result<Sweep, S::Error> {
    let mut sweep = Sweep::default();

    for slot in self.slots.iter_mut() {
      let txn = match slot {
        | Some(txn) => txn,
        | None => continue,
      };

      let should = match txn.retry.as_mut() {
        | Some(retry) => retry.what_should_i_do(now),
        | None => continue,
      };

      match should {
        | Ok(YouShould::Retry) => {
          if let Err(e) = nb::block!(sock.send(Addrd(txn.bytes(), txn.addr))) {
            sweep.failed += 1;
            log::warn!(target: "newt", "retransmitting {:?} to {} failed: {:?}", txn.id, txn.addr, e);
            continue;
          }
          sweep.retransmitted += 1;
          log::debug!(target: "newt",
                      "retransmitted {:?} to {} ({:?})",
                      txn.id,
                      txn.addr,
                      txn.retry.map(|r| r.attempts()));
        },
        | Ok(YouShould::Cry) => {
          let abandoned = Abandoned { id: txn.id,
                                      addr: txn.addr };
          *slot = None;
          sweep.abandoned += 1;
          log::warn!(target: "newt",
                     "{:?} to {} was never acknowledged, giving up",
                     abandoned.id,
                     abandoned.addr);
          on_abandon(abandoned);
        },
        | Err(nb::Error::WouldBlock) => (),
        | Err(nb::Error::Other(never)) => match never {},
      }
    }

    Ok(sweep)
  }

  /// Find the transaction for the message with id `id`
  pub fn get_by_message_id(&self, id: Id) -> Option<TxnRef> {
    self.slots
        .iter()
        .position(|s| matches!(s, Some(txn) if txn.id == id))
        .map(TxnRef)
  }

  /// Find the transaction for the message with id `id` sent to `addr`
  pub fn find(&self, addr: SocketAddr, id: Id) -> Option<TxnRef> {
    self.slots
        .iter()
        .position(|s| matches!(s, Some(txn) if txn.id == id && txn.addr == addr))
        .map(TxnRef)
  }

  /// Find the transaction for a message with token `token` sent to `addr`
  pub fn find_by_token(&self, addr: SocketAddr, token: Token) -> Option<TxnRef> {
    self.slots
        .iter()
        .position(|s| matches!(s, Some(txn) if txn.token == token && txn.addr == addr))
        .map(TxnRef)
  }

  /// Free a slot, yielding what it held
  pub fn clear(&mut self, r: TxnRef) -> Option<Transaction<Cb>> {
    self.slots.get_mut(r.0).and_then(Option::take)
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::duration::Milliseconds;
  use newt_msg::{Code, TryFromBytes};

  use super::*;
  use crate::retry::{Attempts, Strategy};
  use crate::test::{peer, SockMock};

  fn ms(n: u64) -> Millis {
    Milliseconds(n)
  }

  fn fixed_con() -> Con {
    Con { retry_strategy: Strategy::Exponential { init_min: ms(2_000),
                                                  init_max: ms(2_000) },
          max_retransmits: Attempts(4) }
  }

  fn con_msg(id: u16) -> Message<'static> {
    Message::new(Type::Con, Code::GET, Id(id), Token::from_slice(&[1]).unwrap())
  }

  #[test]
  fn pool_is_bounded() {
    let mut txns = Transactions::<(), 4>::new();
    let refs = (0..4u16).map(|n| txns.new_transaction(Id(n), peer(1)).unwrap())
                        .collect::<Vec<_>>();

    assert_eq!(txns.new_transaction(Id(4), peer(1)), Err(PoolExhausted));
    assert_eq!(txns.len(), 4);

    txns.clear(refs[2]).unwrap();
    let r = txns.new_transaction(Id(4), peer(1)).unwrap();
    assert_eq!(r, refs[2]);
  }

  #[test]
  fn non_is_freed_after_send() {
    let sock = SockMock::new();
    let mut txns = Transactions::<(), 4>::new();

    let r = txns.new_transaction(Id(1), peer(1)).unwrap();
    let msg = Message::new(Type::Non, Code::CONTENT, Id(1), Token::default());
    txns.get_mut(r).unwrap().write(&msg).unwrap();
    txns.send(r, &sock, ms(0), &fixed_con()).unwrap();

    assert!(txns.is_empty());
    let sent = sock.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(Message::try_from_bytes(sent[0].data()).unwrap(), msg);
  }

  #[test]
  fn con_backs_off_then_is_abandoned() {
    crate::test::init_logging();

    let sock = SockMock::new();
    let mut txns = Transactions::<(), 4>::new();

    let r = txns.new_transaction(Id(7), peer(1)).unwrap();
    txns.get_mut(r).unwrap().write(&con_msg(7)).unwrap();
    txns.send(r, &sock, ms(0), &fixed_con()).unwrap();
    assert_eq!(txns.len(), 1);

    let mut abandoned = Vec::new();
    let mut sent_at = vec![0u64];
    let mut now = 0;
    while now < 200_000 && abandoned.is_empty() {
      now += 100;
      let sweep = txns.check_transactions(ms(now), &sock, |a| abandoned.push(a))
                      .unwrap();
      if sweep.retransmitted > 0 {
        sent_at.push(now);
      }
    }

    // original + 4 retransmissions, byte-for-byte identical
    let sent = sock.take_sent();
    assert_eq!(sent.len(), 5);
    assert!(sent.iter().all(|d| d.data() == sent[0].data()));

    let intervals = sent_at.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
    assert_eq!(intervals, vec![2_000, 4_000, 8_000, 16_000]);
    assert!(intervals.windows(2).all(|w| w[1] > w[0]));

    assert_eq!(abandoned,
               vec![Abandoned { id: Id(7),
                                addr: peer(1) }]);
    assert_eq!(now, 62_000);
    assert!(txns.is_empty());
  }

  #[test]
  fn clear_stops_retransmission() {
    let sock = SockMock::new();
    let mut txns = Transactions::<fn(), 4>::new();

    let r = txns.new_transaction(Id(9), peer(2)).unwrap();
    {
      let txn = txns.get_mut(r).unwrap();
      txn.write(&con_msg(9)).unwrap();
      txn.set_callback(|| (), 42);
    }
    txns.send(r, &sock, ms(0), &fixed_con()).unwrap();
    sock.take_sent();

    assert_eq!(txns.get_by_message_id(Id(9)), Some(r));
    assert_eq!(txns.find(peer(2), Id(9)), Some(r));
    assert_eq!(txns.find(peer(3), Id(9)), None);
    assert_eq!(txns.find_by_token(peer(2), Token::from_slice(&[1]).unwrap()), Some(r));
    assert_eq!(txns.find_by_token(peer(2), Token::default()), None);

    let mut txn = txns.clear(r).unwrap();
    assert_eq!(txn.take_callback().map(|(_, ctx)| ctx), Some(42));
    assert!(txns.clear(r).is_none());

    let sweep = txns.check_transactions(ms(100_000), &sock, |_| panic!()).unwrap();
    assert_eq!(sweep, Sweep::default());
    assert!(sock.take_sent().is_empty());
  }

  #[test]
  fn sweep_survives_socket_errors() {
    let sock = SockMock::new();
    let mut txns = Transactions::<(), 4>::new();

    for (id, to) in [(1u16, peer(1)), (2, peer(2)), (3, peer(3))] {
      let r = txns.new_transaction(Id(id), to).unwrap();
      txns.get_mut(r).unwrap().write(&con_msg(id)).unwrap();
      txns.send(r, &sock, ms(0), &fixed_con()).unwrap();
    }
    sock.take_sent();

    sock.unreachable.lock().unwrap().push(peer(1));
    let sweep = txns.check_transactions(ms(2_000), &sock, |_| panic!()).unwrap();
    assert_eq!(sweep,
               Sweep { retransmitted: 2,
                       abandoned: 0,
                       failed: 1 });

    let to = sock.take_sent().iter().map(|d| d.addr()).collect::<Vec<_>>();
    assert_eq!(to, vec![peer(2), peer(3)]);
    assert_eq!(txns.len(), 3);

    // the refused message is retried at its next deadline
    sock.unreachable.lock().unwrap().clear();
    let sweep = txns.check_transactions(ms(6_000), &sock, |_| panic!()).unwrap();
    assert_eq!(sweep.retransmitted, 3);
  }

  #[test]
  fn write_too_large_propagates() {
    let mut txns = Transactions::<(), 1>::new();
    let r = txns.new_transaction(Id(1), peer(1)).unwrap();

    let payload = [0u8; MAX_PACKET_SIZE];
    let mut msg = con_msg(1);
    msg.payload = newt_msg::Payload(&payload);

    assert!(matches!(txns.get_mut(r).unwrap().write(&msg),
                     Err(MessageToBytesError::PayloadTooLarge { .. })));
  }
}
