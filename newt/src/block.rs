use newt_msg::{Block, Message};

use crate::config;

/// Where in a resource's representation a handler should
/// (or did) produce output.
///
/// Handlers that know nothing about blockwise transfer ignore it and
/// write their whole representation; handlers that stream large
/// representations write from `At(n)` onward and advance it, or set it
/// to `End` once the last byte has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
  /// Byte offset into the representation
  At(u32),
  /// The representation has been written completely
  End,
}

/// A request's Block2 option, bounded by what we are willing to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
  /// Block2 option in the request, if any
  pub requested: Option<Block>,
  /// Size of the block we will respond with
  pub size: u16,
  /// Byte offset of the block we will respond with
  pub offset: u32,
}

/// Round down to a block size we can put on the wire
fn block_size(n: u16) -> u16 {
  let n = n.clamp(Block::MIN_SIZE, Block::MAX_SIZE);
  1 << (u16::BITS - 1 - n.leading_zeros())
}

impl Negotiated {
  /// Decode the Block2 option of a request.
  ///
  /// A requested block larger than `cfg.max_chunk` is answered with a
  /// smaller block that starts at the same offset (RFC7959 2.4).
  ///
  /// ```
  /// use newt::block::Negotiated;
  /// use newt::config;
  /// use newt::msg::*;
  ///
  /// let mut req = Message::new(Type::Con, Code::GET, Id(1), Token::default());
  /// req.opts.block2 = Some(Block::new(1024, 1, false));
  ///
  /// let neg = Negotiated::from_request(&req, &config::Block { max_chunk: 256 });
  /// assert_eq!((neg.size, neg.offset), (256, 1024));
  /// ```
  pub fn from_request(req: &Message<'_>, cfg: &config::Block) -> Self {
    let max = block_size(cfg.max_chunk);

    match req.opts.block2 {
      | Some(b) => Negotiated { requested: Some(b),
                                size: b.size().min(max),
                                offset: b.offset() },
      | None => Negotiated { requested: None,
                             size: max,
                             offset: 0 },
    }
  }

  /// The offset handed to the resource handler
  pub fn cursor(&self) -> Offset {
    Offset::At(self.offset)
  }

  fn num(&self) -> u32 {
    self.offset / u32::from(self.size)
  }
}

/// The requested block lies beyond the end of the representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
  /// see [`BlockError`]
  OutOfScope,
}

/// Cut a handler's output down to the negotiated block.
///
/// `after` is the handler's cursor after it ran; if the handler left it
/// where it was, `payload` is taken to be the whole representation
/// and the block is sliced out of it. Otherwise `payload` already
/// starts at the requested offset.
///
/// Yields the Block2 option to put on the response (if any)
/// and the bytes to send.
///
/// ```
/// use newt::block::{reconcile, Negotiated, Offset};
/// use newt::msg::Block;
///
/// let body = [7u8; 300];
/// let neg = Negotiated { requested: Some(Block::new(128, 2, false)),
///                        size: 128,
///                        offset: 256 };
///
/// let (block, chunk) = reconcile(&neg, neg.cursor(), &body).unwrap();
/// assert_eq!(chunk.len(), 44);
/// assert_eq!(block, Some(Block::new(128, 2, false)));
/// ```
pub fn reconcile<'p>(neg: &Negotiated,
                     after: Offset,
                     payload: &'p [u8])
                     -> Result<(Option<Block>, &'p [u8]), BlockError> {
  let size = usize::from(neg.size);
  let len = payload.len();

  if after != neg.cursor() {
    let more = after != Offset::End || len > size;
    let chunk = &payload[..len.min(size)];
    return match (neg.requested, more) {
      | (None, false) => Ok((None, chunk)),
      | _ => Ok((Some(Block::new(neg.size, neg.num(), more)), chunk)),
    };
  }

  let offset = neg.offset as usize;

  match neg.requested {
    | None if len <= size => return Ok((None, payload)),
    | _ if offset > 0 && offset >= len => return Err(BlockError::OutOfScope),
    | _ => (),
  }

  let end = len.min(offset + size);
  let more = len - offset > size;
  Ok((Some(Block::new(neg.size, neg.num(), more)), &payload[offset..end]))
}

#[cfg(test)]
mod tests {
  use newt_msg::{Code, Id, Token, Type};

  use super::*;

  fn req(block2: Option<Block>) -> Message<'static> {
    let mut req = Message::new(Type::Con, Code::GET, Id(1), Token::default());
    req.opts.block2 = block2;
    req
  }

  fn cfg(max_chunk: u16) -> config::Block {
    config::Block { max_chunk }
  }

  #[test]
  fn block_sizes() {
    assert_eq!(block_size(512), 512);
    assert_eq!(block_size(600), 512);
    assert_eq!(block_size(1), 16);
    assert_eq!(block_size(u16::MAX), 1024);
  }

  #[test]
  fn small_unaware_response_is_untouched() {
    let neg = Negotiated::from_request(&req(None), &cfg(512));
    let body = [1u8; 100];

    assert_eq!(reconcile(&neg, neg.cursor(), &body), Ok((None, &body[..])));
  }

  #[test]
  fn large_unaware_response_is_split() {
    let body = (0..300u16).map(|n| n as u8).collect::<Vec<_>>();
    let mut got = Vec::new();

    let neg = Negotiated::from_request(&req(None), &cfg(128));
    let (block, chunk) = reconcile(&neg, neg.cursor(), &body).unwrap();
    assert_eq!(block, Some(Block::new(128, 0, true)));
    got.extend_from_slice(chunk);

    let mut num = 1;
    loop {
      let neg = Negotiated::from_request(&req(Some(Block::new(128, num, false))), &cfg(128));
      let (block, chunk) = reconcile(&neg, neg.cursor(), &body).unwrap();
      got.extend_from_slice(chunk);

      let block = block.unwrap();
      assert_eq!(block.num(), num);
      if !block.more() {
        break;
      }
      num += 1;
    }

    assert_eq!(num, 2);
    assert_eq!(got, body);
  }

  #[test]
  fn out_of_scope() {
    let body = [0u8; 300];
    let neg = Negotiated::from_request(&req(Some(Block::new(128, 3, false))), &cfg(512));
    assert_eq!(reconcile(&neg, neg.cursor(), &body), Err(BlockError::OutOfScope));

    // block 0 of an empty representation is an empty block, not an error
    let neg = Negotiated::from_request(&req(Some(Block::new(128, 0, false))), &cfg(512));
    assert_eq!(reconcile(&neg, neg.cursor(), &[]),
               Ok((Some(Block::new(128, 0, false)), &[][..])));
  }

  #[test]
  fn oversized_request_is_clamped() {
    let neg = Negotiated::from_request(&req(Some(Block::new(1024, 1, false))), &cfg(256));
    assert_eq!(neg.size, 256);
    assert_eq!(neg.offset, 1024);
    assert_eq!(neg.num(), 4);
  }

  #[test]
  fn aware_handler() {
    let neg = Negotiated::from_request(&req(Some(Block::new(64, 1, false))), &cfg(512));

    // handler wrote 64 bytes starting at offset 64 and has more to go
    let (block, chunk) = reconcile(&neg, Offset::At(128), &[1u8; 64]).unwrap();
    assert_eq!(block, Some(Block::new(64, 1, true)));
    assert_eq!(chunk.len(), 64);

    // handler wrote its last bytes
    let (block, chunk) = reconcile(&neg, Offset::End, &[1u8; 10]).unwrap();
    assert_eq!(block, Some(Block::new(64, 1, false)));
    assert_eq!(chunk.len(), 10);

    // handler wrote too much; the rest is left for the next block
    let (block, chunk) = reconcile(&neg, Offset::End, &[1u8; 100]).unwrap();
    assert_eq!(block, Some(Block::new(64, 1, true)));
    assert_eq!(chunk.len(), 64);
  }

  #[test]
  fn aware_handler_without_block2() {
    let neg = Negotiated::from_request(&req(None), &cfg(128));

    let (block, chunk) = reconcile(&neg, Offset::At(128), &[1u8; 128]).unwrap();
    assert_eq!(block, Some(Block::new(128, 0, true)));
    assert_eq!(chunk.len(), 128);

    // everything fit in one go
    let (block, chunk) = reconcile(&neg, Offset::End, &[1u8; 10]).unwrap();
    assert_eq!(block, None);
    assert_eq!(chunk.len(), 10);
  }
}
