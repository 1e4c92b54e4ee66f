use core::fmt::{self, Write};

use newt_msg::{Code, ContentFormat};

use crate::block::Offset;
use crate::resource::{Exchange, Response};

/// Path of the resource discovery resource
pub const WELL_KNOWN_CORE: &str = ".well-known/core";

/// One entry in the `.well-known/core` listing: a resource path
/// and its link-format attributes (e.g. `rt="temperature";obs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
  /// Path of the resource, without a leading `/`
  pub path: &'a str,
  /// Attributes, without a leading `;`. May be empty.
  pub attrs: &'a str,
}

/// Writes the bytes of a document that fall into the window
/// `[skip, skip + room)` and counts the document's total length
struct Window<'r, 'b> {
  out: &'r mut Response<'b>,
  skip: usize,
  room: usize,
  pos: usize,
}

impl<'r, 'b> Write for Window<'r, 'b> {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    let bytes = s.as_bytes();
    let start = self.pos;
    let end = start + bytes.len();
    self.pos = end;

    let lo = self.skip.max(start);
    let hi = (self.skip + self.room).min(end);
    if lo < hi {
      self.out
          .append(&bytes[lo - start..hi - start])
          .map_err(|_| fmt::Error)?;
    }

    Ok(())
  }
}

fn write_links(f: &mut impl Write, links: &[Link<'_>]) -> fmt::Result {
  links.iter().enumerate().try_for_each(|(ix, link)| {
                            if ix > 0 {
                              f.write_char(',')?;
                            }

                            write!(f, "</{}>", link.path.trim_start_matches('/'))?;

                            if !link.attrs.is_empty() {
                              write!(f, ";{}", link.attrs)?;
                            }

                            Ok(())
                          })
}

/// Serve `.well-known/core` (RFC6690) listing `links`.
///
/// Only the requested block of the listing is written, so the
/// listing may be far larger than the response buffer.
///
/// Call this from a [`Dispatch`](crate::resource::Dispatch)
/// for requests matching [`WELL_KNOWN_CORE`]:
/// ```
/// use newt::discovery::{well_known_core, Link, WELL_KNOWN_CORE};
/// use newt::resource::handler;
///
/// const LINKS: &[Link<'static>] = &[Link { path: "sensor/temp",
///                                           attrs: "rt=\"temperature\";obs" }];
///
/// let mut dispatch = handler::<_, 4>(|ex| {
///   if ex.req().data().path_matches(WELL_KNOWN_CORE) {
///     well_known_core(ex, LINKS);
///   }
/// });
/// # let _ = &mut dispatch;
/// ```
pub fn well_known_core<const O: usize>(ex: &mut Exchange<'_, '_, O>, links: &[Link<'_>]) {
  let skip = match *ex.offset() {
    | Offset::At(n) => n as usize,
    | Offset::End => return,
  };
  let room = usize::from(ex.preferred_size());

  let resp = match ex.resp() {
    | Some(resp) => resp,
    | None => return,
  };

  resp.code = Code::CONTENT;
  resp.opts.content_format = Some(ContentFormat::LinkFormat);

  let mut window = Window { out: resp,
                            skip,
                            room,
                            pos: 0 };

  if write_links(&mut window, links).is_err() {
    window.out
          .fail(Code::INTERNAL_SERVER_ERROR, "Link listing does not fit");
    return;
  }

  let total = window.pos;
  let written = window.out.payload().len();

  if skip > 0 && skip >= total {
    window.out.fail(Code::BAD_REQUEST, "Block out of scope");
    return;
  }

  *ex.offset() = if skip + written >= total {
    Offset::End
  } else {
    Offset::At((skip + written) as u32)
  };
}

#[cfg(test)]
mod tests {
  use embedded_time::duration::Milliseconds;
  use newt_msg::{Id, Message, Token, Type};

  use super::*;
  use crate::net::Addrd;
  use crate::observe::Observers;
  use crate::test::peer;

  const LINKS: &[Link<'static>] = &[Link { path: "sensor/temp",
                                           attrs: "rt=\"temperature\";obs" },
                                    Link { path: "/hello",
                                           attrs: "" }];

  const DOC: &str = "</sensor/temp>;rt=\"temperature\";obs,</hello>";

  fn serve(offset: Offset, size: u16) -> (Code, Offset, Vec<u8>) {
    let req = Message::new(Type::Con, Code::GET, Id(1), Token::default());
    let mut obs = Observers::<1>::new(Milliseconds(0));
    let mut buf = [0u8; 128];
    let mut resp = Response::new(&mut buf);

    let after = {
      let mut ex = Exchange::new(Addrd(&req, peer(1)),
                                 Some(&mut resp),
                                 size,
                                 offset,
                                 &mut obs,
                                 Milliseconds(0));
      well_known_core(&mut ex, LINKS);
      *ex.offset()
    };

    (resp.code, after, resp.payload().to_vec())
  }

  #[test]
  fn whole_listing() {
    let (code, after, payload) = serve(Offset::At(0), 128);
    assert_eq!(code, Code::CONTENT);
    assert_eq!(after, Offset::End);
    assert_eq!(payload, DOC.as_bytes());
  }

  #[test]
  fn listing_in_blocks() {
    let mut got = Vec::new();
    let mut offset = Offset::At(0);

    while let Offset::At(n) = offset {
      let (code, after, payload) = serve(offset, 16);
      assert_eq!(code, Code::CONTENT);
      assert!(payload.len() <= 16);
      assert_eq!(got.len(), n as usize);

      got.extend(payload);
      offset = after;
    }

    assert_eq!(got, DOC.as_bytes());
  }

  #[test]
  fn past_the_end() {
    let (code, _, payload) = serve(Offset::At(1024), 16);
    assert_eq!(code, Code::BAD_REQUEST);
    assert_eq!(payload, b"Block out of scope");
  }
}
