use core::fmt;

use newt_common::{Overflow, Writer};
use newt_msg::{Block, Code, Message, Opts, Token, Type};
use no_std_net::SocketAddr;

use crate::block::Offset;
use crate::net::Addrd;
use crate::observe::{Observers, ResourceHandle};
use crate::time::Millis;

/// The response a resource handler fills in.
///
/// The payload is written into a buffer owned by the
/// [`Endpoint`](crate::endpoint::Endpoint), either all at once with
/// [`Response::set_payload`] or piece by piece with [`core::fmt::Write`].
#[derive(Debug)]
pub struct Response<'b> {
  /// Response code, `2.05 Content` unless changed
  pub code: Code,
  /// Response options. Block2 is managed by the engine.
  pub opts: Opts<'b>,
  payload: Writer<'b>,
}

impl<'b> Response<'b> {
  pub(crate) fn new(buf: &'b mut [u8]) -> Self {
    Self { code: Code::CONTENT,
           opts: Opts::default(),
           payload: Writer::new(buf) }
  }

  /// Replace the payload
  pub fn set_payload(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
    self.payload.rewind();
    self.payload.extend(bytes)
  }

  /// Add to the end of the payload
  pub fn append(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
    self.payload.extend(bytes)
  }

  /// The payload written so far
  pub fn payload(&self) -> &[u8] {
    self.payload.written()
  }

  /// Most bytes the payload can hold
  pub fn capacity(&self) -> usize {
    self.payload.capacity()
  }

  /// Turn this into an error response, discarding options and payload
  /// and carrying a short diagnostic message instead.
  pub fn fail(&mut self, code: Code, diagnostic: &str) {
    self.code = code;
    self.opts = Opts::default();
    self.set_payload(diagnostic.as_bytes()).ok();
  }
}

impl<'b> fmt::Write for Response<'b> {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    self.append(s.as_bytes()).map_err(|_| fmt::Error)
  }
}

/// A request whose response will be sent later,
/// see [`Exchange::defer`] and [`Endpoint::resume`](crate::endpoint::Endpoint::resume).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separate {
  /// The requester
  pub addr: SocketAddr,
  /// Token of the request
  pub token: Token,
  /// Type of the request
  pub ty: Type,
}

/// Everything a resource handler gets to see and touch
/// while handling one request.
#[derive(Debug)]
pub struct Exchange<'a, 'b, const O: usize> {
  req: Addrd<&'a Message<'a>>,
  resp: Option<&'a mut Response<'b>>,
  preferred_size: u16,
  offset: Offset,
  deferred: bool,
  observers: &'a mut Observers<O>,
  now: Millis,
}

impl<'a, 'b, const O: usize> Exchange<'a, 'b, O> {
  pub(crate) fn new(req: Addrd<&'a Message<'a>>,
                    resp: Option<&'a mut Response<'b>>,
                    preferred_size: u16,
                    offset: Offset,
                    observers: &'a mut Observers<O>,
                    now: Millis)
                    -> Self {
    Self { req,
           resp,
           preferred_size,
           offset,
           deferred: false,
           observers,
           now }
  }

  /// The request and its sender
  pub fn req(&self) -> Addrd<&'a Message<'a>> {
    self.req
  }

  /// The response, or `None` when the request will not be answered
  /// (a Non-confirmable request and an endpoint configured not to
  /// respond to those).
  pub fn resp(&mut self) -> Option<&mut Response<'b>> {
    self.resp.as_deref_mut()
  }

  /// Largest payload chunk that will be sent in one response
  pub fn preferred_size(&self) -> u16 {
    self.preferred_size
  }

  /// Position in the representation the requester asked for.
  ///
  /// Handlers that serve their whole representation every time
  /// may ignore this; the engine will slice out the requested block.
  /// Handlers that only write the requested part must advance it
  /// by the number of bytes written, or set it to [`Offset::End`].
  pub fn offset(&mut self) -> &mut Offset {
    &mut self.offset
  }

  /// The request's Block1 option, for handlers accepting large request bodies
  pub fn block1(&self) -> Option<Block> {
    self.req.data().opts.block1
  }

  /// Let the requester observe `resource`, according to the request's
  /// Observe option.
  ///
  /// Call this after writing a response; only successful responses
  /// to GET requests register an observer.
  ///
  /// |Observe option|effect|
  /// |---|---|
  /// |0|requester is (re-)registered and Observe: 0 is added to the response|
  /// |1|the registration with this request's token is cancelled|
  /// |absent|requester's registrations for `resource` are cancelled|
  pub fn observe(&mut self, resource: ResourceHandle) {
    let Addrd(req, addr) = self.req;

    let resp = match self.resp.as_deref_mut() {
      | Some(resp) if resp.code.is_success() && req.code == Code::GET => resp,
      | _ => return,
    };

    match req.opts.observe {
      | Some(0) if req.token.is_empty() => {
        resp.fail(Code::BAD_REQUEST, "Observing requires token");
      },
      | Some(0) => match self.observers
                             .add_observer(resource, addr, req.token, self.now)
      {
        | Ok(_) => resp.opts.observe = Some(0),
        | Err(_) => resp.fail(Code::SERVICE_UNAVAILABLE, "Too many observers"),
      },
      | Some(1) => {
        self.observers.remove_by_token(addr, req.token);
      },
      | Some(_) => (),
      | None => {
        self.observers.remove_by_resource(addr, resource);
      },
    }
  }

  /// Answer this request later.
  ///
  /// A Confirmable request is acknowledged right away with an empty
  /// Acknowledgement, and anything written to [`Exchange::resp`] is discarded.
  /// Pass the returned [`Separate`] to
  /// [`Endpoint::resume`](crate::endpoint::Endpoint::resume) once the response is ready.
  pub fn defer(&mut self) -> Separate {
    self.deferred = true;
    Separate { addr: self.req.addr(),
               token: self.req.data().token,
               ty: self.req.data().ty }
  }

  pub(crate) fn deferred(&self) -> bool {
    self.deferred
  }

  pub(crate) fn cursor(&self) -> Offset {
    self.offset
  }
}

/// A resource handler: sees every request the endpoint accepts.
///
/// Routing is up to the implementor; see [`newt_msg::Message::path_matches`].
///
/// Closures implement this trait; [`handler`] helps the compiler
/// infer their signature.
pub trait Dispatch<const O: usize> {
  /// Handle one request
  fn dispatch(&mut self, ex: &mut Exchange<'_, '_, O>);
}

impl<F, const O: usize> Dispatch<O> for F where F: FnMut(&mut Exchange<'_, '_, O>)
{
  fn dispatch(&mut self, ex: &mut Exchange<'_, '_, O>) {
    self(ex)
  }
}

/// Use a closure as a [`Dispatch`]
///
/// ```
/// use newt::msg::Code;
/// use newt::resource::{handler, Dispatch};
///
/// let mut hello = handler::<_, 4>(|ex| {
///   if !ex.req().data().path_matches("hello") {
///     if let Some(resp) = ex.resp() {
///       resp.code = Code::NOT_FOUND;
///     }
///     return;
///   }
///
///   if let Some(resp) = ex.resp() {
///     resp.set_payload(b"hi!").ok();
///   }
/// });
/// # fn is_dispatch(_: &mut impl Dispatch<4>) {}
/// # is_dispatch(&mut hello);
/// ```
pub fn handler<F, const O: usize>(f: F) -> F
  where F: FnMut(&mut Exchange<'_, '_, O>)
{
  f
}
