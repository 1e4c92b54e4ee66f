use newt_common::{Overflow, Writer};
use tinyvec::ArrayVec;

use crate::*;

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to write `self` into the start of `buf`, yielding
  /// the number of bytes written.
  ///
  /// ```
  /// use newt_msg::{Code, Id, Message, Token, TryIntoBytes, Type};
  ///
  /// let msg = Message::new(Type::Con, Code::GET, Id(1), Token::default());
  ///
  /// let mut buf = [0u8; 16];
  /// let len = msg.try_into_bytes(&mut buf).unwrap();
  /// assert_eq!(&buf[..len], &[0b0100_0000, 0x01, 0x00, 0x01]);
  /// ```
  fn try_into_bytes(&self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageToBytesError {
  /// The serialized message would not fit in the destination buffer.
  ///
  /// Nothing is promised about the contents of the buffer
  /// after this is returned; the message is never truncated to fit.
  PayloadTooLarge {
    /// Size of the destination buffer
    capacity: usize,
    /// Number of bytes the message serializes to
    size: usize,
  },
}

impl From<Overflow> for MessageToBytesError {
  fn from(Overflow { capacity, needed }: Overflow) -> Self {
    Self::PayloadTooLarge { capacity,
                            size: needed }
  }
}

impl<'a> TryIntoBytes for Message<'a> {
  type Error = MessageToBytesError;

  fn try_into_bytes(&self, buf: &mut [u8]) -> Result<usize, Self::Error> {
    let size = self.size();
    if size > buf.len() {
      return Err(MessageToBytesError::PayloadTooLarge { capacity: buf.len(),
                                                        size });
    }

    let mut w = Writer::new(buf);

    let byte1: u8 = Byte1 { tkl: self.token.0.len() as u8,
                            ver: self.ver,
                            ty: self.ty }.into();

    w.push(byte1)?;
    w.push(self.code.into())?;
    w.extend(&self.id.0.to_be_bytes())?;
    w.extend(&self.token.0)?;

    let mut prev = 0u32;
    self.opts.visit(|OptNumber(num), value| {
               write_opt_header(&mut w, num - prev, value.len())?;
               value.write(&mut w)?;
               prev = num;
               Ok::<_, Overflow>(())
             })?;

    if !self.payload.0.is_empty() {
      w.push(0xFF)?;
      w.extend(self.payload.0)?;
    }

    Ok(w.position())
  }
}

/// Split an option delta or length into its header nibble
/// and 0-2 extension bytes
pub(crate) fn opt_len_or_delta(val: u32) -> (u8, ArrayVec<[u8; 2]>) {
  let mut ext = ArrayVec::new();
  match val {
    | n if n >= 269 => {
      ext.extend_from_slice(&((n - 269) as u16).to_be_bytes());
      (14, ext)
    },
    | n if n >= 13 => {
      ext.push((n - 13) as u8);
      (13, ext)
    },
    | n => (n as u8, ext),
  }
}

fn write_opt_header(w: &mut Writer<'_>, delta: u32, len: usize) -> Result<(), Overflow> {
  let (del_nib, del_ext) = opt_len_or_delta(delta);
  let (len_nib, len_ext) = opt_len_or_delta(len as u32);

  w.push(del_nib << 4 | len_nib)?;
  w.extend(&del_ext)?;
  w.extend(&len_ext)
}

impl From<Type> for u8 {
  fn from(t: Type) -> u8 {
    use Type::*;
    match t {
      | Con => 0,
      | Non => 1,
      | Ack => 2,
      | Reset => 3,
    }
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl;

    ver | ty | tkl
  }
}
