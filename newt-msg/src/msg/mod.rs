use core::convert::Infallible;

use newt_common::Cursor;

/// Message Code
pub mod code;

/// Message parsing errors
pub mod parse_error;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message Type
pub mod ty;

/// Message Token
pub mod token;

/// Message Version
pub mod ver;

pub use code::*;
pub use id::*;
pub use opt::*;
pub use parse_error::*;
pub use token::*;
pub use ty::*;
pub use ver::*;

use crate::to_bytes::opt_len_or_delta;
use crate::TryFromBytes;

/// # Payload
///
/// The request/response body, borrowed from the datagram (when parsed)
/// or from whatever buffer the sender built it in.
///
/// An empty payload is "no payload": no payload marker is sent for it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd)]
pub struct Payload<'a>(pub &'a [u8]);

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (request, response, empty)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

impl From<u8> for Byte1 {
  fn from(b: u8) -> Self {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let tkl = b & 0b1111u8; // last 4 bits

    Byte1 { ver: Version(ver),
            ty: Type::from(ty),
            tkl }
  }
}

/// The fixed-layout start of a message: header and token.
///
/// A datagram whose options fail to parse may still have a readable
/// `Head`, which is enough to address an error response to its sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Head {
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Token`] for details
  pub token: Token,
}

impl Head {
  fn parse(bytes: &mut Cursor<'_>) -> Result<Self, MessageParseError> {
    let (b1, code, id) = match bytes.take_exact(4) {
      | Some(&[b1, code, id_a, id_b]) => (Byte1::from(b1), Code::from(code), Id::from_be_bytes([id_a, id_b])),
      | _ => return Err(MessageParseError::MalformedHeader),
    };

    if b1.ver != Version::default() {
      return Err(MessageParseError::MalformedHeader);
    }

    if b1.tkl > 8 {
      return Err(MessageParseError::InvalidTokenLength(b1.tkl));
    }

    let token = bytes.take_exact(b1.tkl as usize)
                     .and_then(Token::from_slice)
                     .ok_or_else(MessageParseError::eof)?;

    Ok(Head { ty: b1.ty,
              code,
              id,
              token })
  }
}

impl<'a> TryFromBytes<'a> for Head {
  type Error = MessageParseError;

  fn try_from_bytes(bytes: &'a [u8]) -> Result<Self, Self::Error> {
    Head::parse(&mut Cursor::new(bytes))
  }
}

/// # `Message` struct
/// Low-level representation of a message that has been parsed from the raw binary format.
///
/// Messages support both serializing to bytes and from bytes, by using the provided [`TryFromBytes`] and [`TryIntoBytes`](crate::TryIntoBytes) traits.
///
/// ```
/// use newt_msg::*;
///
/// let mut msg = Message::new(Type::Con, Code::CONTENT, Id(1), Token::from_slice(&[254]).unwrap());
/// msg.opts.content_format = Some(ContentFormat::Json);
/// msg.payload = Payload(br#"{"hello": "world"}"#);
///
/// let mut buf = [0u8; 32];
/// let n = msg.try_into_bytes(&mut buf).unwrap();
/// assert_eq!(Message::try_from_bytes(&buf[..n]).unwrap(), msg);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Message<'a> {
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Opts`] for details
  pub opts: Opts<'a>,
  /// see [`Payload`] for details
  pub payload: Payload<'a>,
}

impl<'a> Message<'a> {
  /// Create a message with no options and no payload
  pub fn new(ty: Type, code: Code, id: Id, token: Token) -> Self {
    Self { ver: Version::default(),
           ty,
           code,
           id,
           token,
           opts: Opts::default(),
           payload: Payload::default() }
  }

  /// An empty Acknowledgement for the message with id `id`
  pub fn ack(id: Id) -> Self {
    Self::new(Type::Ack, Code::EMPTY, id, Token::default())
  }

  /// An empty Reset for the message with id `id`
  pub fn reset(id: Id) -> Self {
    Self::new(Type::Reset, Code::EMPTY, id, Token::default())
  }

  /// The message's header and token
  pub fn head(&self) -> Head {
    Head { ty: self.ty,
           code: self.code,
           id: self.id,
           token: self.token }
  }

  /// Set Uri-Path from a `/`-separated path
  pub fn set_path(&mut self, path: &'a str) -> Result<(), SegmentsFull> {
    self.opts.uri_path = Segments::from_joined(path, '/')?;
    Ok(())
  }

  /// Whether Uri-Path equals the `/`-separated `path`
  ///
  /// ```
  /// use newt_msg::*;
  ///
  /// let mut msg = Message::new(Type::Con, Code::GET, Id(1), Token::default());
  /// msg.set_path("sensor/temp").unwrap();
  ///
  /// assert!(msg.path_matches("sensor/temp"));
  /// assert!(msg.path_matches("/sensor/temp"));
  /// ```
  pub fn path_matches(&self, path: &str) -> bool {
    self.opts.uri_path.matches(path, '/')
  }

  /// Value of the Uri-Query variable `name` (`?name=value`)
  pub fn query_value(&self, name: &str) -> Option<&'a str> {
    self.opts.uri_query.value(name)
  }

  /// Value of the variable `name` in an `&`-separated
  /// `name=value` form carried as the payload
  ///
  /// ```
  /// use newt_msg::*;
  ///
  /// let mut msg = Message::new(Type::Con, Code::POST, Id(1), Token::default());
  /// msg.payload = Payload(b"led=on&level=3");
  ///
  /// assert_eq!(msg.form_value("level"), Some(&b"3"[..]));
  /// assert_eq!(msg.form_value("mode"), None);
  /// ```
  pub fn form_value(&self, name: &str) -> Option<&'a [u8]> {
    let payload: &'a [u8] = self.payload.0;
    payload.split(|b| *b == b'&').find_map(|pair| {
                                   let (n, v) = match pair.iter().position(|b| *b == b'=') {
                                     | Some(ix) => (&pair[..ix], &pair[ix + 1..]),
                                     | None => (pair, &pair[pair.len()..]),
                                   };
                                   (n == name.as_bytes()).then_some(v)
                                 })
  }

  /// Number of bytes this message serializes to
  pub fn size(&self) -> usize {
    let ext = |n: u32| opt_len_or_delta(n).1.len();

    let mut size = 4 + self.token.0.len();
    let mut prev = 0u32;
    self.opts
        .visit(|OptNumber(n), v| {
          size += 1 + ext(n - prev) + ext(v.len() as u32) + v.len();
          prev = n;
          Ok::<_, Infallible>(())
        })
        .unwrap_or_else(|never| match never {});

    if !self.payload.0.is_empty() {
      size += 1 + self.payload.0.len();
    }

    size
  }
}

impl<'a> TryFromBytes<'a> for Message<'a> {
  type Error = MessageParseError;

  fn try_from_bytes(bytes: &'a [u8]) -> Result<Self, Self::Error> {
    let mut bytes = Cursor::new(bytes);
    let head = Head::parse(&mut bytes)?;

    let mut opts = Opts::default();
    let mut number = 0u32;

    let payload = loop {
      match bytes.next() {
        | None => break &[][..],
        | Some(0xFF) => match bytes.take_until_end() {
          | [] => return Err(MessageParseError::PayloadMarkerWithoutPayload),
          | p => break p,
        },
        | Some(b) => {
          let delta = parse_opt_len_or_delta(b >> 4,
                                             &mut bytes,
                                             OptParseError::OptionDeltaReservedValue(15))?;
          let len = parse_opt_len_or_delta(b & 0b1111,
                                           &mut bytes,
                                           OptParseError::ValueLengthReservedValue(15))?;

          number += delta;
          let value = bytes.take_exact(len as usize)
                           .ok_or_else(MessageParseError::eof)?;
          opts.insert(OptNumber(number), value)?;
        },
      }
    };

    Ok(Message { ver: Version::default(),
                 ty: head.ty,
                 code: head.code,
                 id: head.id,
                 token: head.token,
                 opts,
                 payload: Payload(payload) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::TryIntoBytes;

  #[test]
  fn parse_msg() {
    let (expect, bytes) = crate::test_msg();
    assert_eq!(Message::try_from_bytes(bytes).unwrap(), expect)
  }

  #[test]
  fn variables() {
    let mut msg = Message::new(Type::Con, Code::PUT, Id(1), Token::default());
    msg.opts.uri_query = Segments::from_joined("color=red&on", '&').unwrap();
    msg.payload = Payload(b"name=lamp&&brightness=");

    assert_eq!(msg.query_value("color"), Some("red"));
    assert_eq!(msg.query_value("on"), Some(""));
    assert_eq!(msg.query_value("name"), None);

    assert_eq!(msg.form_value("name"), Some(&b"lamp"[..]));
    assert_eq!(msg.form_value("brightness"), Some(&b""[..]));
    assert_eq!(msg.form_value("color"), None);
    assert_eq!(Message::new(Type::Con, Code::PUT, Id(1), Token::default()).form_value("name"), None);
  }

  #[test]
  fn parse_byte1() {
    let byte = 0b_01_10_0011u8;
    let byte = Byte1::from(byte);
    assert_eq!(byte,
               Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       tkl: 3 })
  }

  #[test]
  fn parse_id() {
    let mut id_bytes = Cursor::new(&[0x40, 0, 0, 1]);
    let id = Head::parse(&mut id_bytes).unwrap().id;
    assert_eq!(id, Id(1))
  }

  #[test]
  fn sensor_temp_get() {
    // CON GET, tkl 0, id 0x1234, Uri-Path "sensor", Uri-Path "temp"
    let bytes = [0x40, 0x01, 0x12, 0x34, 0xB6, b's', b'e', b'n', b's', b'o', b'r', 0x04, b't', b'e',
                 b'm', b'p'];

    let msg = Message::try_from_bytes(&bytes).unwrap();
    assert_eq!(msg.code, Code::GET);
    assert_eq!(msg.ty, Type::Con);
    assert_eq!(msg.id, Id(0x1234));
    assert!(msg.path_matches("sensor/temp"));
    assert_eq!(msg.opts.uri_path.iter().collect::<Vec<_>>(), vec!["sensor", "temp"]);
    assert_eq!(msg.opts.content_format, None);
    assert!(msg.payload.0.is_empty());
  }

  #[test]
  fn bad_headers() {
    assert_eq!(Message::try_from_bytes(&[0x40, 0x01, 0x00]),
               Err(MessageParseError::MalformedHeader));
    assert_eq!(Message::try_from_bytes(&[0x80, 0x01, 0x00, 0x00]),
               Err(MessageParseError::MalformedHeader));
    assert_eq!(Message::try_from_bytes(&[0x49, 0x01, 0x00, 0x00]),
               Err(MessageParseError::InvalidTokenLength(9)));
    assert_eq!(Message::try_from_bytes(&[0x42, 0x01, 0x00, 0x00, 0xAA]),
               Err(MessageParseError::UnexpectedEndOfStream));
  }

  #[test]
  fn unknown_critical_option() {
    // option 9 (critical, unassigned), empty value
    let bytes = [0x41, 0x01, 0x00, 0x07, 0xAB, 0x90];
    assert_eq!(Message::try_from_bytes(&bytes),
               Err(MessageParseError::UnknownCriticalOption(OptNumber(9))));

    // the head is still readable for an error response
    let head = Head::try_from_bytes(&bytes).unwrap();
    assert_eq!(head.id, Id(7));
    assert_eq!(head.token.as_bytes(), &[0xAB]);
  }

  #[test]
  fn unknown_elective_option_is_skipped() {
    // option 10 (elective, unassigned) "x", then payload
    let bytes = [0x50, 0x45, 0x00, 0x01, 0xA1, b'x', 0xFF, b'!'];
    let msg = Message::try_from_bytes(&bytes).unwrap();
    assert_eq!(msg.opts, Opts::default());
    assert_eq!(msg.payload.0, b"!");
  }

  #[test]
  fn payload_marker_without_payload() {
    assert_eq!(Message::try_from_bytes(&[0x50, 0x45, 0x00, 0x01, 0xFF]),
               Err(MessageParseError::PayloadMarkerWithoutPayload));
  }

  #[test]
  fn reserved_nibbles() {
    assert_eq!(Message::try_from_bytes(&[0x50, 0x45, 0x00, 0x01, 0xF1, 0]),
               Err(MessageParseError::OptParseError(OptParseError::OptionDeltaReservedValue(15))));
    assert_eq!(Message::try_from_bytes(&[0x50, 0x45, 0x00, 0x01, 0x1F]),
               Err(MessageParseError::OptParseError(OptParseError::ValueLengthReservedValue(15))));
  }

  #[test]
  fn round_trip_all_options() {
    let mut msg = Message::new(Type::Non,
                               Code::CONTENT,
                               Id(0xBEEF),
                               Token::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap());
    msg.opts.if_match = ETag::from_slice(&[]);
    msg.opts.uri_host = Some("example.com");
    msg.opts.etag = ETag::from_slice(&[9, 9]);
    msg.opts.if_none_match = true;
    msg.opts.observe = Some(0);
    msg.opts.uri_port = Some(5683);
    msg.opts.location_path = Segments::from_joined("new/thing", '/').unwrap();
    msg.set_path("a/much/longer/path/than/usual").unwrap();
    msg.opts.content_format = Some(ContentFormat::LinkFormat);
    msg.opts.max_age = Some(60);
    msg.opts.uri_query = Segments::from_joined("rt=temp&if=sensor", '&').unwrap();
    msg.opts.accept = Some(ContentFormat::Other(11542));
    msg.opts.location_query = Segments::from_joined("v=1", '&').unwrap();
    msg.opts.block2 = Some(Block::new(1024, 4000, true));
    msg.opts.block1 = Some(Block::new(16, 0, false));
    msg.opts.size2 = Some(70_000);
    msg.opts.size1 = Some(0);
    msg.payload = Payload(&[0u8; 300]);

    let mut buf = [0u8; 512];
    let n = msg.try_into_bytes(&mut buf).unwrap();
    assert_eq!(n, msg.size());
    assert_eq!(Message::try_from_bytes(&buf[..n]).unwrap(), msg);
  }

  #[test]
  fn insertion_order_does_not_matter() {
    let mut a = Message::new(Type::Con, Code::PUT, Id(1), Token::default());
    a.opts.size1 = Some(10);
    a.opts.content_format = Some(ContentFormat::Text);
    a.set_path("x").unwrap();

    let mut b = Message::new(Type::Con, Code::PUT, Id(1), Token::default());
    b.set_path("x").unwrap();
    b.opts.content_format = Some(ContentFormat::Text);
    b.opts.size1 = Some(10);

    let (mut buf_a, mut buf_b) = ([0u8; 32], [0u8; 32]);
    let n_a = a.try_into_bytes(&mut buf_a).unwrap();
    let n_b = b.try_into_bytes(&mut buf_b).unwrap();
    assert_eq!(&buf_a[..n_a], &buf_b[..n_b]);
  }

  #[test]
  fn agrees_with_coap_lite() {
    let (msg, _) = crate::test_msg();
    let mut buf = [0u8; 64];
    let n = msg.try_into_bytes(&mut buf).unwrap();

    let packet = coap_lite::Packet::from_bytes(&buf[..n]).unwrap();
    assert_eq!(packet.header.message_id, 1);
    assert_eq!(packet.payload, b"hi".to_vec());
  }
}
