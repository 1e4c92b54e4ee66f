//! Low-level representation of CoAP messages.
//!
//! The most notable item in `newt_msg` is [`Message`];
//! a CoAP message very close to the actual byte layout.
//!
//! ## Allocation
//! `Message` never allocates. Variable-length parts of a parsed message
//! (Uri-Path segments, string and opaque options, the payload) are
//! slices borrowed from the datagram they were parsed from, and
//! fixed-size parts (token, ETag) are stored inline.
//!
//! The flip side is that the datagram must outlive the `Message`:
//!
//! ```rust
//! use newt_msg::{Code, Id, Message, TryFromBytes, TryIntoBytes, Type};
//!
//! let mut req = Message::new(Type::Con, Code::GET, Id(0x1234), Default::default());
//! req.set_path("sensor/temp").unwrap();
//!
//! let mut dgram = [0u8; 64];
//! let n = req.try_into_bytes(&mut dgram).unwrap();
//!
//! let parsed = Message::try_from_bytes(&dgram[..n]).unwrap();
//! assert!(parsed.path_matches("sensor/temp"));
//! assert_eq!(parsed, req);
//! ```
//!
//! ## Options
//! Options are not stored as a list: [`Opts`] has one typed field per
//! option this crate understands, `None` meaning "absent". Serializing
//! walks those fields in ascending option-number order, so an
//! out-of-order option sequence cannot be produced.

#![doc(html_root_url = "https://docs.rs/newt-msg/0.1.0")]
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
#![deny(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc as std_alloc;

#[doc(hidden)]
pub mod from_bytes;

/// Message structs
pub mod msg;

#[doc(hidden)]
pub mod to_bytes;

#[doc(inline)]
pub use from_bytes::TryFromBytes;
#[doc(inline)]
pub use msg::*;
#[doc(inline)]
pub use to_bytes::{MessageToBytesError, TryIntoBytes};

#[cfg(test)]
pub(crate) fn test_msg() -> (Message<'static>, &'static [u8]) {
  //                     ver  con  tkl=1     2.05         id=1
  const BYTES: &[u8] = &[0b0100_0001, 0b010_00101, 0x00, 0x01,
                         // token
                         254,
                         // Observe (6) = 3
                         0x61, 3,
                         // Uri-Path (11, delta 5) "a"
                         0x51, b'a',
                         // Uri-Path (11, delta 0) "bc"
                         0x02, b'b', b'c',
                         // Content-Format (12, delta 1) = 50 (json)
                         0x11, 50,
                         // payload
                         0xFF, b'h', b'i'];

  let mut msg = Message::new(Type::Con,
                             Code::new(2, 5),
                             Id(1),
                             Token::from_slice(&[254]).unwrap());
  msg.opts.observe = Some(3);
  msg.opts.uri_path = Segments::from_joined("a/bc", '/').unwrap();
  msg.opts.content_format = Some(ContentFormat::Json);
  msg.payload = Payload(b"hi");

  (msg, BYTES)
}
