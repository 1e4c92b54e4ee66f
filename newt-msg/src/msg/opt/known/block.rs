/// Three items of information may need to be transferred in a
/// Block (Block1 or Block2) option:
/// * the size of the block ([`Block::size`])
/// * whether more blocks are following ([`Block::more`])
/// * the relative number of the block ([`Block::num`]) within a sequence of blocks with the given size.
///
/// On the wire this is a single unsigned integer
/// `num << 4 | more << 3 | szx`, with `size = 2^(szx + 4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block(u32);

impl Block {
  /// Largest block size expressible (`szx = 6`)
  pub const MAX_SIZE: u16 = 1024;

  /// Smallest block size expressible (`szx = 0`)
  pub const MIN_SIZE: u16 = 16;

  /// Create a block descriptor.
  ///
  /// `size` is clamped to `16..=1024` and rounded down to a power of two.
  pub fn new(size: u16, num: u32, more: bool) -> Self {
    let size = size.clamp(Self::MIN_SIZE, Self::MAX_SIZE);
    let szx = (u16::BITS - 1 - size.leading_zeros()) - 4;
    let num = num << 4;
    let more = u32::from(more) << 3;

    Self(num | more | szx)
  }

  /// Interpret the integer value of a Block option,
  /// yielding `None` for the reserved size exponent 7.
  pub fn from_value(n: u32) -> Option<Self> {
    match n & 0b111 {
      | 7 => None,
      | _ => Some(Block(n)),
    }
  }

  /// The integer value of this Block option
  pub fn value(&self) -> u32 {
    self.0
  }

  /// Size of each block, in bytes
  pub fn size(&self) -> u16 {
    let szx = (self.0 & 0b111).min(6);
    2u16.pow(szx + 4)
  }

  /// Whether more blocks follow this one
  pub fn more(&self) -> bool {
    (self.0 & 0b1000) >> 3 == 1
  }

  /// Number of this block in the sequence
  pub fn num(&self) -> u32 {
    self.0 >> 4
  }

  /// Byte offset of this block within the whole body
  pub fn offset(&self) -> u32 {
    self.num() * u32::from(self.size())
  }
}

impl From<Block> for u32 {
  fn from(b: Block) -> Self {
    b.0
  }
}
