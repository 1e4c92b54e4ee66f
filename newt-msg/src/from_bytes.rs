/// Trait for converting a sequence of bytes into some data structure
/// that may borrow from those bytes.
pub trait TryFromBytes<'a>: Sized {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to convert from some sequence of bytes `'a`
  /// into `Self`
  ///
  /// ```
  /// use newt_msg::{Code, Id, Message, TryFromBytes, Type};
  /// # //                       version  token len  code (2.05 Content)
  /// # //                       |        |          /
  /// # //                       |  type  |         /  message ID
  /// # //                       |  |     |        |   |
  /// # //                       vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
  /// # let header: [u8; 4] = 0b_01_01_0000_01000101_0000000000000001u32.to_be_bytes();
  /// # let packet = [header.as_ref(), &[0xFF], b"hello, world!"].concat();
  ///
  /// let msg = Message::try_from_bytes(&packet).unwrap();
  /// assert_eq!(msg.ty, Type::Non);
  /// assert_eq!(msg.code, Code::CONTENT);
  /// assert_eq!(msg.id, Id(1));
  /// assert_eq!(msg.payload.0, b"hello, world!");
  /// ```
  fn try_from_bytes(bytes: &'a [u8]) -> Result<Self, Self::Error>;
}
