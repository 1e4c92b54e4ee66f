use tinyvec::ArrayVec;

/// # Token
///
/// 0 to 8 opaque bytes chosen by the requester and echoed unchanged
/// in every response to that request.
///
/// Message [`Id`](crate::Id)s match an Acknowledgement to the
/// Confirmable message it acknowledges, and only live as long as one
/// exchange. Tokens match a *response* to its *request*, which matters
/// when the response arrives separately from the Acknowledgement or,
/// with Observe, arrives many times.
///
/// See [RFC7252 - Token](https://datatracker.ietf.org/doc/html/rfc7252#section-5.3.1) for context
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Hash, Debug, Default)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// Copy up to 8 bytes into a token, yielding `None` if `bytes`
  /// is longer than that.
  ///
  /// ```
  /// use newt_msg::Token;
  ///
  /// assert!(Token::from_slice(&[1, 2, 3]).is_some());
  /// assert!(Token::from_slice(&[0; 9]).is_none());
  /// ```
  pub fn from_slice(bytes: &[u8]) -> Option<Token> {
    if bytes.len() > 8 {
      return None;
    }

    let mut t = ArrayVec::new();
    t.extend_from_slice(bytes);
    Some(Token(t))
  }

  /// Take an arbitrary-length sequence of bytes and turn it into an opaque 8-byte token
  ///
  /// Currently uses the BLAKE2 hashing algorithm, but this may change in the future.
  ///
  /// ```
  /// use newt_msg::Token;
  ///
  /// let my_token = Token::opaque(&[0, 1, 2]);
  /// assert_eq!(my_token.as_bytes().len(), 8);
  /// assert_eq!(my_token, Token::opaque(&[0, 1, 2]));
  /// ```
  pub fn opaque(data: &[u8]) -> Token {
    use blake2::digest::consts::U8;
    use blake2::{Blake2b, Digest};

    let mut digest = Blake2b::<U8>::new();
    digest.update(data);
    Token(Into::<[u8; 8]>::into(digest.finalize()).into())
  }

  /// The token's bytes
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  /// Whether this is the zero-length token
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
