/// # Message Code
///
/// 8-bit unsigned integer, split into a 3-bit class (most
/// significant bits) and a 5-bit detail (least significant bits),
/// documented as "c.dd" where "c" is a digit from 0 to 7 for the
/// 3-bit subfield and "dd" are two digits from 00 to 31 for the 5-bit
/// subfield.
///
/// The class can indicate a request (0), a success response (2), a
/// client error response (4), or a server error response (5).
///
/// ```
/// use newt_msg::Code;
///
/// assert_eq!(Code { class: 2, detail: 5 }.to_human(), ['2', '.', '0', '5']);
/// assert_eq!(u8::from(Code::CONTENT), 0x45);
/// assert_eq!(Code::from(0x45), Code::CONTENT);
/// ```
#[derive(Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug, Default)]
pub struct Code {
  /// The "class" of message codes identify it as a request or response, and provides the class of response status:
  ///
  /// |class|meaning|
  /// |---|---|
  /// |`0`|Message is a request|
  /// |`2`|Message is a success response|
  /// |`4`|Message is a client error response|
  /// |`5`|Message is a server error response|
  pub class: u8,

  /// 2-digit integer (range `[0, 32)`) that provides granular information about the response status.
  ///
  /// Will always be `0` for requests.
  pub detail: u8,
}

/// Whether a code is for a request, response, or empty message
#[derive(Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug)]
pub enum CodeKind {
  /// A request code (0.xx)
  Request,
  /// A response code ([2-5].xx)
  Response,
  /// EMPTY (0.00)
  Empty,
}

macro_rules! code {
  ($doc:literal $name:ident = $c:literal * $d:literal) => {
    #[doc = $doc]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: Code = Code::new($c, $d);
  };
}

impl Code {
  /// Create a new Code
  ///
  /// ```
  /// use newt_msg::Code;
  ///
  /// let content = Code::new(2, 05);
  /// ```
  pub const fn new(class: u8, detail: u8) -> Self {
    Self { class, detail }
  }

  /// Get the human string representation of a message code
  ///
  /// # Returns
  /// A `char` array
  ///
  /// This is to avoid unnecessary heap allocation,
  /// you can create a `String` with `FromIterator::<String>::from_iter`,
  /// or if the `alloc` feature of `newt` is enabled there is a `to_string` method provided.
  /// ```
  /// use newt_msg::Code;
  ///
  /// let code = Code { class: 2,
  ///                   detail: 5 };
  /// let chars = code.to_human();
  /// let string = String::from_iter(chars);
  /// assert_eq!(string, "2.05".to_string());
  /// ```
  pub fn to_human(&self) -> [char; 4] {
    let to_char = |d: u8| char::from_digit(d.into(), 10).unwrap_or('?');
    [to_char(self.class),
     '.',
     to_char(self.detail / 10),
     to_char(self.detail % 10)]
  }

  /// Get whether this code is for a request, response, or empty message
  ///
  /// ```
  /// use newt_msg::{Code, CodeKind};
  ///
  /// assert_eq!(Code::EMPTY.kind(), CodeKind::Empty);
  /// assert_eq!(Code::GET.kind(), CodeKind::Request);
  /// assert_eq!(Code::CONTENT.kind(), CodeKind::Response);
  /// ```
  pub fn kind(&self) -> CodeKind {
    match (self.class, self.detail) {
      | (0, 0) => CodeKind::Empty,
      | (0, _) => CodeKind::Request,
      | _ => CodeKind::Response,
    }
  }

  /// Whether this is a 2.xx code
  pub fn is_success(&self) -> bool {
    self.class == 2
  }

  /// Whether this is a 4.xx or 5.xx code
  pub fn is_error(&self) -> bool {
    self.class >= 4
  }

  code!("0.00 Empty message" EMPTY = 0 * 00);

  code!("0.01 GET" GET = 0 * 01);
  code!("0.02 POST" POST = 0 * 02);
  code!("0.03 PUT" PUT = 0 * 03);
  code!("0.04 DELETE" DELETE = 0 * 04);

  code!("2.01 Created" CREATED = 2 * 01);
  code!("2.02 Deleted" DELETED = 2 * 02);
  code!("2.03 Valid" VALID = 2 * 03);
  code!("2.04 Changed" CHANGED = 2 * 04);
  code!("2.05 Content" CONTENT = 2 * 05);
  code!("2.31 Continue (RFC7959): this block of a request body was received, send the next one"
        CONTINUE = 2 * 31);

  code!("4.00 Bad Request" BAD_REQUEST = 4 * 00);
  code!("4.01 Unauthorized" UNAUTHORIZED = 4 * 01);
  code!("4.02 Bad Option: the request carried a critical option the server does not understand"
        BAD_OPTION = 4 * 02);
  code!("4.04 Not Found" NOT_FOUND = 4 * 04);
  code!("4.05 Method Not Allowed" METHOD_NOT_ALLOWED = 4 * 05);
  code!("4.06 Not Acceptable" NOT_ACCEPTABLE = 4 * 06);
  code!("4.08 Request Entity Incomplete (RFC7959)" REQUEST_ENTITY_INCOMPLETE = 4 * 08);
  code!("4.13 Request Entity Too Large" REQUEST_ENTITY_TOO_LARGE = 4 * 13);
  code!("4.15 Unsupported Content-Format" UNSUPPORTED_CONTENT_FORMAT = 4 * 15);

  code!("5.00 Internal Server Error" INTERNAL_SERVER_ERROR = 5 * 00);
  code!("5.01 Not Implemented" NOT_IMPLEMENTED = 5 * 01);
  code!("5.03 Service Unavailable" SERVICE_UNAVAILABLE = 5 * 03);
}

impl From<u8> for Code {
  fn from(b: u8) -> Self {
    // xxx.....
    let class = b >> 5;

    // ...xxxxx
    let detail = b & 0b0011111;

    Code { class, detail }
  }
}

impl From<Code> for u8 {
  fn from(code: Code) -> u8 {
    let class = code.class << 5;
    let detail = code.detail;

    class | detail
  }
}
