use newt_msg::{Block, Code, Id, Message, Token, Type};
use no_std_net::SocketAddr;

use super::{Callback, Endpoint, Error, SocketError};
use crate::net::Addrd;
use crate::platform::Platform;

/// A GET whose response is being pulled in one block at a time
pub(super) struct Fetch<Cb> {
  pub(super) addr: SocketAddr,
  build: fn(&mut Message<'static>),
  next: Block,
  callback: Cb,
  ctx: usize,
  pub(super) id: Id,
  pub(super) token: Token,
}

impl<P: Platform, const TXNS: usize, const OBS: usize> Endpoint<P, TXNS, OBS> {
  /// Retrieve a resource from `addr` block by block (RFC7959 Block2).
  ///
  /// `build` adds the path and options to the Confirmable GET sent for
  /// every block; the first asks for block 0 in `config.block.max_chunk`
  /// sized blocks, later ones follow the block size the server chose.
  ///
  /// `callback` sees every response in order. The one without Block2,
  /// with a failure code or whose Block2 says nothing more follows is
  /// the last. If the server stops answering the transfer is dropped
  /// without a final callback.
  ///
  /// Only one transfer is in progress at a time; starting another
  /// yields [`Error::PoolExhausted`].
  pub fn fetch(&mut self,
               addr: SocketAddr,
               build: fn(&mut Message<'static>),
               callback: (Callback<P, TXNS, OBS>, usize))
               -> Result<Id, Error<SocketError<P>>> {
    if self.fetch.is_some() {
      log::warn!(target: "newt", "already fetching, cannot fetch from {}", addr);
      return Err(Error::PoolExhausted(crate::PoolExhausted));
    }

    let (callback, ctx) = callback;
    self.request_block(Fetch { addr,
                               build,
                               next: Block::new(self.config.block.max_chunk, 0, false),
                               callback,
                               ctx,
                               id: Id(0),
                               token: Token::default() })
  }

  fn request_block(&mut self, mut fetch: Fetch<Callback<P, TXNS, OBS>>) -> Result<Id, Error<SocketError<P>>> {
    let (build, block) = (fetch.build, fetch.next);
    let id = self.request(fetch.addr,
                          Type::Con,
                          Code::GET,
                          |msg| {
                            build(msg);
                            msg.code = Code::GET;
                            msg.opts.block2 = Some(block);
                          },
                          Some((Self::on_block as Callback<P, TXNS, OBS>, 0)))?;

    log::debug!(target: "newt", "fetching block {} from {}", block.num(), fetch.addr);

    fetch.id = id;
    fetch.token = self.txns
                      .find(fetch.addr, id)
                      .and_then(|r| self.txns.get(r))
                      .map(|txn| txn.token())
                      .unwrap_or_default();
    self.fetch = Some(fetch);
    Ok(id)
  }

  fn on_block(ep: &mut Self, _: usize, resp: Addrd<&Message<'_>>) {
    let fetch = match ep.fetch.take() {
      | Some(f) if f.addr == resp.addr() => f,
      | other => {
        ep.fetch = other;
        return;
      },
    };

    let msg = resp.data();
    let expected = fetch.next.num();

    let next = match msg.opts.block2 {
      | Some(b) if b.num() != expected => {
        log::warn!(target: "newt",
                   "{} sent block {} when asked for {}, giving up",
                   resp.addr(),
                   b.num(),
                   expected);
        return;
      },
      | Some(b) if b.more() && msg.code.is_success() => Some(Block::new(b.size(), b.num() + 1, false)),
      | _ => None,
    };

    (fetch.callback)(ep, fetch.ctx, resp);

    match (next, ep.fetch.is_some()) {
      | (Some(next), false) => {
        if let Err(e) = ep.request_block(Fetch { next, ..fetch }) {
          log::warn!(target: "newt", "could not ask for block {}: {:?}", next.num(), e);
        }
      },
      | (Some(_), true) => {
        log::warn!(target: "newt", "another fetch began, abandoning the one from {}", fetch.addr)
      },
      | (None, _) => log::debug!(target: "newt", "fetch from {} complete", fetch.addr),
    }
  }
}
