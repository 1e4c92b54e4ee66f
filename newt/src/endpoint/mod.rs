use core::fmt;

use newt_msg::{Code, CodeKind, Head, Id, Message, MessageParseError, Payload, Token, TryFromBytes,
               TryIntoBytes, Type};
use no_std_net::SocketAddr;
use rand::{Rng, SeedableRng};

mod error;
mod fetch;
mod history;

#[doc(inline)]
pub use error::*;
use fetch::Fetch;
use history::History;

use crate::block::{self, BlockError, Negotiated};
use crate::config::Config;
use crate::logging::msg_summary;
use crate::net::{Addrd, Socket};
use crate::observe::{Observers, ResourceHandle};
use crate::platform::Platform;
use crate::resource::{Dispatch, Exchange, Response, Separate};
use crate::time::{self, Millis};
use crate::txn::{Sweep, Transaction, Transactions};
use crate::{MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE};

/// The error type of a platform's socket
pub type SocketError<P> = <<P as Platform>::Socket as Socket>::Error;

/// Invoked with the response to a request sent with [`Endpoint::request`],
/// and the context value given alongside it.
///
/// The transaction that carried the request has already been freed,
/// so the callback may send new messages.
pub type Callback<P, const T: usize, const O: usize> =
  fn(&mut Endpoint<P, T, O>, usize, Addrd<&Message<'_>>);

/// A request whose response will arrive separately (or, for Non requests,
/// at all) and whose callback is waiting for it
struct Pending<Cb> {
  addr: SocketAddr,
  token: Token,
  callback: Cb,
  ctx: usize,
  expires_at: Millis,
}

/// A CoAP endpoint.
///
/// Owns the socket, the clock and every piece of protocol state: in-flight
/// transactions, observers, the duplicate history and the buffer resource
/// handlers write responses into. Nothing is allocated; capacities are
/// `TXNS` transactions and `OBS` observers.
///
/// The endpoint does nothing on its own. Drive it by calling
/// [`Endpoint::poll`] (or [`Endpoint::handle_datagram`]) whenever a datagram
/// may have arrived and [`Endpoint::tick`] often enough to retransmit on time.
///
/// ```no_run
/// use newt::config::Config;
/// use newt::endpoint::Endpoint;
/// use newt::resource::handler;
///
/// let sock = std::net::UdpSocket::bind("0.0.0.0:5683").unwrap();
/// sock.set_nonblocking(true).unwrap();
///
/// let mut ep = Endpoint::<newt::std::Platform>::new(Config::default(),
///                                                   newt::std::Clock::new(),
///                                                   sock);
///
/// let mut hello = handler::<_, 4>(|ex| {
///   if let Some(resp) = ex.resp() {
///     resp.set_payload(b"hello!").ok();
///   }
/// });
///
/// loop {
///   match ep.poll(&mut hello) {
///     | Ok(()) | Err(nb::Error::WouldBlock) => (),
///     | Err(nb::Error::Other(e)) => eprintln!("{}", e),
///   }
///   ep.tick().ok();
/// }
/// ```
pub struct Endpoint<P: Platform, const TXNS: usize = 4, const OBS: usize = 4> {
  config: Config,
  clock: P::Clock,
  sock: P::Socket,
  txns: Transactions<Callback<P, TXNS, OBS>, TXNS>,
  pending: [Option<Pending<Callback<P, TXNS, OBS>>>; TXNS],
  observers: Observers<OBS>,
  history: History,
  fetch: Option<Fetch<Callback<P, TXNS, OBS>>>,
  next_id: Id,
  rand: rand_chacha::ChaCha8Rng,
  scratch: [u8; MAX_PAYLOAD_SIZE],
}

impl<P: Platform, const TXNS: usize, const OBS: usize> fmt::Debug for Endpoint<P, TXNS, OBS> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Endpoint")
     .field("config", &self.config)
     .field("txns", &self.txns)
     .field("pending", &self.pending.iter().flatten().count())
     .field("observers", &self.observers)
     .field("history", &self.history)
     .field("fetching", &self.fetch.as_ref().map(|f| f.addr))
     .field("next_id", &self.next_id)
     .finish()
  }
}

impl<P: Platform, const TXNS: usize, const OBS: usize> Endpoint<P, TXNS, OBS> {
  /// Create an endpoint that sends and receives with `sock`
  pub fn new(config: Config, clock: P::Clock, sock: P::Socket) -> Self {
    let now = time::now(&clock).map(|ms| ms.0).unwrap_or(0);
    let mut rand =
      rand_chacha::ChaCha8Rng::seed_from_u64(u64::from(config.msg.token_seed) << 48 ^ now);

    Self { next_id: Id(rand.gen()),
           rand,
           observers: Observers::new(config.observe.refresh_interval),
           config,
           clock,
           sock,
           txns: Transactions::new(),
           pending: core::array::from_fn(|_| None),
           history: History::new(),
           fetch: None,
           scratch: [0; MAX_PAYLOAD_SIZE] }
  }

  /// The runtime config
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// The clock
  pub fn clock(&self) -> &P::Clock {
    &self.clock
  }

  /// The socket
  pub fn socket(&self) -> &P::Socket {
    &self.sock
  }

  /// Current subscriptions
  pub fn observers(&self) -> &Observers<OBS> {
    &self.observers
  }

  /// Messages in flight
  pub fn transactions(&self) -> &Transactions<Callback<P, TXNS, OBS>, TXNS> {
    &self.txns
  }

  fn now(&self) -> Result<Millis, Error<SocketError<P>>> {
    Ok(time::now(&self.clock)?)
  }

  fn next_id(&mut self) -> Id {
    let id = self.next_id;
    self.next_id = id.next();
    id
  }

  fn next_token(&mut self, now: Millis) -> Token {
    #[allow(clippy::many_single_char_names)]
    let bytes = {
      let ([a, b], [c, d, e, f, g, h, i, j], [k, l, m, n]) =
        (self.config.msg.token_seed.to_be_bytes(),
         now.0.to_be_bytes(),
         self.rand.gen::<u32>().to_be_bytes());
      [a, b, c, d, e, f, g, h, i, j, k, l, m, n]
    };

    Token::opaque(&bytes)
  }

  /// Serialize and send a message that needs no transaction
  /// (empty Acks, Resets, errors sent when the pool is full)
  fn send_now(&self, msg: &Message<'_>, addr: SocketAddr) -> Result<(), Error<SocketError<P>>> {
    let mut buf = [0u8; MAX_PACKET_SIZE];
    let n = msg.try_into_bytes(&mut buf)?;

    log::trace!(target: "newt", "-> {}", msg_summary(msg, addr));
    nb::block!(self.sock.send(Addrd(&buf[..n], addr))).map_err(Error::Socket)
  }

  /// Like [`Endpoint::send_now`], also keeping the reply for answering
  /// retransmissions of the Confirmable request `req` from `addr`
  fn reply_now(&mut self, msg: &Message<'_>, req: Id, addr: SocketAddr) -> Result<(), Error<SocketError<P>>> {
    let mut buf = [0u8; MAX_PACKET_SIZE];
    let n = msg.try_into_bytes(&mut buf)?;
    self.history.cache_reply(addr, req, &buf[..n]);

    log::trace!(target: "newt", "-> {}", msg_summary(msg, addr));
    nb::block!(self.sock.send(Addrd(&buf[..n], addr))).map_err(Error::Socket)
  }

  /// Serialize `msg` into a transaction, falling back to a
  /// `5.00` carrying the same id and token if it does not fit.
  fn write_or_500(txn: &mut Transaction<Callback<P, TXNS, OBS>>,
                  msg: &Message<'_>)
                  -> Result<(), Error<SocketError<P>>> {
    match txn.write(msg) {
      | Ok(_) => Ok(()),
      | Err(e) => {
        log::warn!(target: "newt", "{:?} {:?} could not be serialized: {:?}", msg.ty, msg.id, e);

        let mut err = Message::new(msg.ty, Code::INTERNAL_SERVER_ERROR, msg.id, msg.token);
        err.payload = Payload(b"Packet could not be serialized");
        txn.write(&err)?;
        Ok(())
      },
    }
  }

  /// Wait for `poll` to yield a datagram, then handle it with
  /// [`Endpoint::handle_datagram`].
  pub fn poll<D: Dispatch<OBS>>(&mut self, dispatch: &mut D) -> nb::Result<(), Error<SocketError<P>>> {
    let mut buf = [0u8; MAX_PACKET_SIZE];
    let Addrd(n, addr) = self.sock
                             .recv(&mut buf)
                             .map_err(|e| e.map(Error::Socket))?;

    self.handle_datagram(Addrd(&buf[..n], addr), dispatch)
        .map_err(nb::Error::Other)
  }

  /// Process one received datagram: parse it, weed out duplicates,
  /// pass requests to `dispatch` and send whatever needs sending.
  pub fn handle_datagram<D: Dispatch<OBS>>(&mut self,
                                           dgram: Addrd<&[u8]>,
                                           dispatch: &mut D)
                                           -> Result<(), Error<SocketError<P>>> {
    let now = self.now()?;
    let Addrd(bytes, addr) = dgram;

    let msg = match Message::try_from_bytes(bytes) {
      | Ok(msg) => msg,
      | Err(e) => return self.on_parse_error(bytes, addr, e),
    };

    log::trace!(target: "newt", "<- {}", msg_summary(&msg, addr));

    match (msg.ty, msg.code.kind()) {
      | (Type::Ack, _) => self.on_ack(&msg, addr, now),
      | (Type::Reset, _) => {
        self.on_reset(&msg, addr);
        Ok(())
      },
      | (Type::Con, CodeKind::Empty) => {
        log::debug!(target: "newt", "ping from {}", addr);
        self.send_now(&Message::reset(msg.id), addr)
      },
      | (_, CodeKind::Empty) => Ok(()),
      | (_, CodeKind::Request) => self.on_request(&msg, addr, dispatch, now),
      | (_, CodeKind::Response) => self.on_response(&msg, addr, now),
    }
  }

  fn on_parse_error(&mut self,
                    bytes: &[u8],
                    addr: SocketAddr,
                    e: MessageParseError)
                    -> Result<(), Error<SocketError<P>>> {
    let head = match Head::try_from_bytes(bytes) {
      | Ok(head) => head,
      | Err(_) => {
        log::warn!(target: "newt", "dropping unreadable datagram from {}: {:?}", addr, e);
        return Ok(());
      },
    };

    log::warn!(target: "newt", "{:?} {:?} from {} is malformed: {:?}", head.ty, head.id, addr, e);

    let (code, diagnostic) = match e {
      | MessageParseError::UnknownCriticalOption(_) => {
        (Code::BAD_OPTION, &b"Request has unknown critical option"[..])
      },
      | _ => (Code::BAD_REQUEST, &b"Malformed message"[..]),
    };

    let (ty, id) = match (head.ty, head.code.kind()) {
      | (Type::Con, _) => (Type::Ack, head.id),
      | (Type::Non, CodeKind::Request) if self.config.msg.non.respond => (Type::Non, self.next_id()),
      | _ => return Ok(()),
    };

    let mut resp = Message::new(ty, code, id, head.token);
    resp.payload = Payload(diagnostic);
    self.send_now(&resp, addr)
  }

  fn on_ack(&mut self, msg: &Message<'_>, addr: SocketAddr, now: Millis) -> Result<(), Error<SocketError<P>>> {
    let mut txn = match self.txns.find(addr, msg.id).and_then(|r| self.txns.clear(r)) {
      | Some(txn) => txn,
      | None => {
        log::debug!(target: "newt", "{:?} from {} acknowledges nothing we sent", msg.id, addr);
        return Ok(());
      },
    };

    match txn.take_callback() {
      | Some((callback, ctx)) if msg.code == Code::EMPTY => {
        // the response will come separately
        self.await_response(addr, txn.token(), callback, ctx, now)
      },
      | Some((callback, ctx)) => {
        callback(self, ctx, Addrd(msg, addr));
        Ok(())
      },
      | None => Ok(()),
    }
  }

  fn await_response(&mut self,
                    addr: SocketAddr,
                    token: Token,
                    callback: Callback<P, TXNS, OBS>,
                    ctx: usize,
                    now: Millis)
                    -> Result<(), Error<SocketError<P>>> {
    let expires_at = time::after(now, self.config.msg.exchange_lifetime);

    match self.pending.iter_mut().find(|p| p.is_none()) {
      | Some(slot) => {
        *slot = Some(Pending { addr,
                               token,
                               callback,
                               ctx,
                               expires_at });
        Ok(())
      },
      | None => {
        log::warn!(target: "newt", "no room to wait for a response from {}", addr);
        Err(Error::PoolExhausted(crate::PoolExhausted))
      },
    }
  }

  fn on_reset(&mut self, msg: &Message<'_>, addr: SocketAddr) {
    if let Some(r) = self.txns.find(addr, msg.id) {
      self.txns.clear(r);
    }

    let mut n = self.observers.remove_by_notification(addr, msg.id);
    if !msg.token.is_empty() {
      n += self.observers.remove_by_token(addr, msg.token);
    }

    log::debug!(target: "newt", "{} reset {:?}, {} observers removed", addr, msg.id, n);
  }

  fn on_response(&mut self, msg: &Message<'_>, addr: SocketAddr, now: Millis) -> Result<(), Error<SocketError<P>>> {
    let pending = self.pending
                      .iter()
                      .position(|p| matches!(p, Some(p) if p.addr == addr && p.token == msg.token));

    let callback = match pending {
      | Some(ix) if msg.opts.observe.is_some() => {
        // notifications keep coming on the same token
        let lifetime = self.config.msg.exchange_lifetime;
        self.pending[ix].as_mut().map(|p| {
                                   p.expires_at = time::after(now, lifetime);
                                   (p.callback, p.ctx)
                                 })
      },
      | Some(ix) => self.pending[ix].take().map(|p| (p.callback, p.ctx)),
      | None => None,
    };

    let callback = match callback {
      | Some(cb) => Some(cb),
      | None => {
        // a Non response to our Con request
        let txn = self.txns.find_by_token(addr, msg.token);
        txn.and_then(|r| self.txns.clear(r))
           .and_then(|mut txn| txn.take_callback())
      },
    };

    match (msg.ty, callback) {
      | (Type::Con, None) => {
        log::debug!(target: "newt", "rejecting response from {} to a request we did not send", addr);
        self.send_now(&Message::reset(msg.id), addr)
      },
      | (ty, Some((callback, ctx))) => {
        if ty == Type::Con {
          self.send_now(&Message::ack(msg.id), addr)?;
        }

        callback(self, ctx, Addrd(msg, addr));
        Ok(())
      },
      | (_, None) => Ok(()),
    }
  }

  fn on_request<D: Dispatch<OBS>>(&mut self,
                                  req: &Message<'_>,
                                  addr: SocketAddr,
                                  dispatch: &mut D,
                                  now: Millis)
                                  -> Result<(), Error<SocketError<P>>> {
    if self.history
           .is_duplicate(addr, req.id, now, self.config.msg.exchange_lifetime)
    {
      return self.on_duplicate(req, addr);
    }

    self.history.record(addr, req.id, now);

    let respond = req.ty == Type::Con || self.config.msg.non.respond;
    let (ty, id) = match req.ty {
      | Type::Con => (Type::Ack, req.id),
      | _ => (Type::Non, self.next_id()),
    };

    let r = match respond {
      | false => None,
      | true => match self.txns.new_transaction(id, addr) {
        | Ok(r) => Some(r),
        | Err(_) => {
          let mut resp = Message::new(ty, Code::SERVICE_UNAVAILABLE, id, req.token);
          resp.payload = Payload(b"Transaction buffer allocation failed");
          return match req.ty {
            | Type::Con => self.reply_now(&resp, req.id, addr),
            | _ => self.send_now(&resp, addr),
          };
        },
      },
    };

    let neg = Negotiated::from_request(req, &self.config.block);
    let mut resp = Response::new(&mut self.scratch);

    let (deferred, cursor) = {
      let mut ex = Exchange::new(Addrd(req, addr),
                                 if respond { Some(&mut resp) } else { None },
                                 neg.size,
                                 neg.cursor(),
                                 &mut self.observers,
                                 now);
      dispatch.dispatch(&mut ex);
      (ex.deferred(), ex.cursor())
    };

    if deferred {
      if let Some(r) = r {
        self.txns.clear(r);
      }

      if req.ty == Type::Con {
        return self.reply_now(&Message::ack(req.id), req.id, addr);
      }

      return Ok(());
    }

    let r = match r {
      | Some(r) => r,
      | None => return Ok(()),
    };

    let mut msg = Message::new(ty, resp.code, id, req.token);
    msg.opts = resp.opts;

    let payload = match resp.code.is_success() {
      | true => match block::reconcile(&neg, cursor, resp.payload()) {
        | Ok((block2, chunk)) => {
          msg.opts.block2 = block2.or(msg.opts.block2);
          chunk
        },
        | Err(BlockError::OutOfScope) => {
          msg.code = Code::BAD_REQUEST;
          msg.opts = Default::default();
          &b"Block out of scope"[..]
        },
      },
      | false => resp.payload(),
    };
    msg.payload = Payload(payload);

    log::trace!(target: "newt", "-> {}", msg_summary(&msg, addr));

    let txn = match self.txns.get_mut(r) {
      | Some(txn) => txn,
      | None => return Ok(()),
    };

    if let Err(e) = Self::write_or_500(txn, &msg) {
      self.txns.clear(r);
      return Err(e);
    }

    if req.ty == Type::Con {
      self.history.cache_reply(addr, req.id, txn.bytes());
    }

    self.txns
        .send(r, &self.sock, now, &self.config.msg.con)
        .map_err(Error::Socket)
  }

  fn on_duplicate(&mut self, req: &Message<'_>, addr: SocketAddr) -> Result<(), Error<SocketError<P>>> {
    log::debug!(target: "newt", "{:?} {:?} from {} is a duplicate", req.ty, req.id, addr);

    if req.ty != Type::Con {
      return Ok(());
    }

    match self.history.cached_reply(addr, req.id) {
      | Some(reply) => nb::block!(self.sock.send(Addrd(reply, addr))).map_err(Error::Socket),
      | None => {
        log::debug!(target: "newt", "reply to {:?} from {} is no longer cached, dropping", req.id, addr);
        Ok(())
      },
    }
  }

  /// Retransmit unacknowledged Confirmable messages that are due,
  /// give up on those that were retransmitted too often
  /// and forget responses we stopped waiting for.
  ///
  /// Observers of a peer that stopped acknowledging are removed,
  /// as is a [`fetch`](Endpoint::fetch) the peer stopped answering.
  pub fn tick(&mut self) -> Result<Sweep, Error<SocketError<P>>> {
    let now = self.now()?;

    let observers = &mut self.observers;
    let fetch = &mut self.fetch;
    let sweep = self.txns
                    .check_transactions(now, &self.sock, |abandoned| {
                      observers.remove_by_client(abandoned.addr);
                      if matches!(fetch, Some(f) if f.id == abandoned.id && f.addr == abandoned.addr) {
                        *fetch = None;
                      }
                    })
                    .map_err(Error::Socket)?;

    let fetch = &mut self.fetch;
    self.pending.iter_mut().for_each(|slot| {
                             if matches!(slot, Some(p) if p.expires_at <= now) {
                               log::warn!(target: "newt", "gave up waiting for a response");
                               let fetching = matches!((slot.as_ref(), fetch.as_ref()),
                                                       (Some(p), Some(f)) if p.addr == f.addr && p.token == f.token);
                               if fetching {
                                 *fetch = None;
                               }
                               *slot = None;
                             }
                           });

    Ok(sweep)
  }

  /// Send the response to a request that was [deferred](Exchange::defer).
  ///
  /// The response is Confirmable if the request was, and carries
  /// the request's token.
  pub fn resume(&mut self,
                sep: Separate,
                code: Code,
                build: impl FnOnce(&mut Response<'_>))
                -> Result<Id, Error<SocketError<P>>> {
    let now = self.now()?;
    let id = self.next_id();
    let ty = match sep.ty {
      | Type::Con => Type::Con,
      | _ => Type::Non,
    };

    let r = self.txns.new_transaction(id, sep.addr)?;

    let mut resp = Response::new(&mut self.scratch);
    resp.code = code;
    build(&mut resp);

    let mut msg = Message::new(ty, resp.code, id, sep.token);
    msg.opts = resp.opts;
    msg.payload = Payload(resp.payload());

    log::trace!(target: "newt", "-> {}", msg_summary(&msg, sep.addr));

    let written = match self.txns.get_mut(r) {
      | Some(txn) => Self::write_or_500(txn, &msg),
      | None => Ok(()),
    };

    if let Err(e) = written {
      self.txns.clear(r);
      return Err(e);
    }

    self.txns
        .send(r, &self.sock, now, &self.config.msg.con)
        .map_err(Error::Socket)?;

    Ok(id)
  }

  /// Send a request to `addr`.
  ///
  /// `build` may add options and a payload to the request; its id and
  /// token are chosen by the endpoint. When a `callback` is given it is
  /// invoked with the response (piggybacked or separate), but never
  /// if the request is abandoned.
  pub fn request<'m>(&mut self,
                     addr: SocketAddr,
                     ty: Type,
                     code: Code,
                     build: impl FnOnce(&mut Message<'m>),
                     callback: Option<(Callback<P, TXNS, OBS>, usize)>)
                     -> Result<Id, Error<SocketError<P>>> {
    let now = self.now()?;
    let id = self.next_id();
    let token = self.next_token(now);

    let mut msg = Message::new(ty, code, id, token);
    build(&mut msg);
    msg.id = id;
    msg.token = token;

    let r = self.txns.new_transaction(id, addr)?;

    let written = match self.txns.get_mut(r) {
      | Some(txn) => {
        let written = txn.write(&msg);
        if let (Ok(_), Some((cb, ctx)), Type::Con) = (&written, callback, ty) {
          txn.set_callback(cb, ctx);
        }
        written
      },
      | None => return Ok(id),
    };

    if let Err(e) = written {
      self.txns.clear(r);
      return Err(e.into());
    }

    if let (Some((cb, ctx)), false) = (callback, ty == Type::Con) {
      if let Err(e) = self.await_response(addr, token, cb, ctx, now) {
        self.txns.clear(r);
        return Err(e);
      }
    }

    log::trace!(target: "newt", "-> {}", msg_summary(&msg, addr));

    self.txns
        .send(r, &self.sock, now, &self.config.msg.con)
        .map_err(Error::Socket)?;

    Ok(id)
  }

  /// Send a notification to every observer of `resource`.
  ///
  /// Each notification is a `2.05 Content` with Observe: `sequence`,
  /// the observer's token and `payload` (only its first block, if larger
  /// than the configured block size). Observers whose notification
  /// cannot be given a transaction, or whose notification the socket
  /// refuses, are skipped and keep their refresh deadline.
  ///
  /// Yields the number of notifications sent.
  pub fn notify_observers(&mut self,
                          resource: ResourceHandle,
                          sequence: u32,
                          payload: &[u8])
                          -> Result<usize, Error<SocketError<P>>> {
    let now = self.now()?;
    let mut sent = 0;

    for o in self.observers.matching(resource) {
      let (addr, token, refresh_at) = match self.observers.get(o) {
        | Some(obs) => (obs.addr, obs.token, obs.refresh_at),
        | None => continue,
      };

      let id = self.next_id();
      let r = match self.txns.new_transaction(id, addr) {
        | Ok(r) => r,
        | Err(_) => {
          log::warn!(target: "newt", "skipped notifying {} of {}", addr, resource);
          continue;
        },
      };

      let ty = match self.observers.delivery(o, now) {
        | Some(ty) => ty,
        | None => {
          self.txns.clear(r);
          continue;
        },
      };

      let mut msg = Message::new(ty, Code::CONTENT, id, token);
      msg.opts.observe = Some(sequence & 0xFF_FFFF);
      msg.opts.content_format = self.config.observe.content_format;

      let neg = Negotiated::from_request(&msg, &self.config.block);
      let (block2, chunk) = block::reconcile(&neg, neg.cursor(), payload).unwrap_or((None, payload));
      msg.opts.block2 = block2;
      msg.payload = Payload(chunk);

      let written: Result<(), Error<SocketError<P>>> = match self.txns.get_mut(r) {
        | Some(txn) => txn.write(&msg).map(|_| ()).map_err(Error::from),
        | None => continue,
      };

      log::trace!(target: "newt", "-> {}", msg_summary(&msg, addr));

      let sent_ok = match written {
        | Ok(()) => self.txns
                        .send(r, &self.sock, now, &self.config.msg.con)
                        .map_err(Error::Socket),
        | Err(e) => Err(e),
      };

      if let Err(e) = sent_ok {
        log::warn!(target: "newt", "notifying {} of {} failed: {:?}", addr, resource, e);
        self.txns.clear(r);
        // the next notification gets another go at being Confirmable
        if let Some(obs) = self.observers.get_mut(o) {
          obs.refresh_at = refresh_at;
        }
        continue;
      }

      if let Some(obs) = self.observers.get_mut(o) {
        obs.last_id = Some(id);
      }

      sent += 1;
    }

    Ok(sent)
  }
}
