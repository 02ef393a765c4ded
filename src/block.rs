use crate::{LITERAL_BITS, MAX_RUN, MIN_RUN};
use std::fmt::{self, Debug};

const MODE_MASK: u8 = 0xC0;
const MODE_ZEROS: u8 = 0x80;
const MODE_ONES: u8 = 0xC0;
const LITERAL_MASK: u8 = (1 << LITERAL_BITS) - 1;
const COUNT_MASK: u8 = 0x3F;

/// One byte of the encoded stream.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Block {
    /// Seven raw bits, bit 0 first.
    Literal(u8),
    /// A run of `count` zero bits, `count` in `[8, 71]`.
    Zeros(u8),
    /// A run of `count` one bits, `count` in `[8, 71]`.
    Ones(u8),
}

impl Block {
    /// Packs the low seven bits of `bits`.
    #[inline(always)]
    pub(crate) fn literal(bits: u128) -> Self {
        Block::Literal(bits as u8 & LITERAL_MASK)
    }

    #[inline(always)]
    pub(crate) fn zeros(count: u32) -> Self {
        debug_assert!((MIN_RUN..=MAX_RUN).contains(&count));
        Block::Zeros(count as u8)
    }

    #[inline(always)]
    pub(crate) fn ones(count: u32) -> Self {
        debug_assert!((MIN_RUN..=MAX_RUN).contains(&count));
        Block::Ones(count as u8)
    }

    /// Length of the run, `None` for a literal.
    pub fn run_len(self) -> Option<u32> {
        match self {
            Block::Literal(_) => None,
            Block::Zeros(count) | Block::Ones(count) => Some(count as u32),
        }
    }

    /// Whether the run carries an implicit opposite bit after it.
    pub fn is_terminated(self) -> bool {
        matches!(self.run_len(), Some(count) if count < MAX_RUN)
    }
}

impl From<u8> for Block {
    #[inline(always)]
    fn from(byte: u8) -> Self {
        let count = (byte & COUNT_MASK) + MIN_RUN as u8;
        match byte & MODE_MASK {
            MODE_ZEROS => Block::Zeros(count),
            MODE_ONES => Block::Ones(count),
            _ => Block::Literal(byte & LITERAL_MASK),
        }
    }
}

impl From<Block> for u8 {
    #[inline(always)]
    fn from(block: Block) -> Self {
        match block {
            Block::Literal(bits) => bits & LITERAL_MASK,
            Block::Zeros(count) => MODE_ZEROS | (count - MIN_RUN as u8),
            Block::Ones(count) => MODE_ONES | (count - MIN_RUN as u8),
        }
    }
}

impl Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Literal(bits) => f
                .debug_tuple("Literal")
                .field(&format!("{bits:07b}"))
                .finish(),
            Block::Zeros(count) => f.debug_tuple("Zeros").field(count).finish(),
            Block::Ones(count) => f.debug_tuple("Ones").field(count).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Block;

    #[test]
    fn test_block_tags() {
        assert_eq!(Block::from(0x00), Block::Literal(0));
        assert_eq!(Block::from(0x7F), Block::Literal(0x7F));
        assert_eq!(Block::from(0x2A), Block::Literal(0x2A));
        assert_eq!(Block::from(0x80), Block::Zeros(8));
        assert_eq!(Block::from(0x9C), Block::Zeros(36));
        assert_eq!(Block::from(0xBF), Block::Zeros(71));
        assert_eq!(Block::from(0xC0), Block::Ones(8));
        assert_eq!(Block::from(0xCC), Block::Ones(20));
        assert_eq!(Block::from(0xFF), Block::Ones(71));
    }

    #[test]
    fn test_block_bytes() {
        assert_eq!(u8::from(Block::literal(0xFFAA)), 0x2A);
        assert_eq!(u8::from(Block::zeros(8)), 0x80);
        assert_eq!(u8::from(Block::zeros(71)), 0xBF);
        assert_eq!(u8::from(Block::ones(20)), 0xCC);
        assert_eq!(u8::from(Block::ones(71)), 0xFF);
    }

    #[test]
    fn test_block_runs() {
        assert_eq!(Block::Literal(3).run_len(), None);
        assert_eq!(Block::Ones(9).run_len(), Some(9));
        assert!(!Block::Literal(0).is_terminated());
        assert!(Block::Zeros(70).is_terminated());
        assert!(!Block::Zeros(71).is_terminated());
        assert!(!Block::Ones(71).is_terminated());
    }

    #[test]
    fn test_block_debug() {
        assert_eq!(format!("{:?}", Block::Literal(0x05)), "Literal(\"0000101\")");
        assert_eq!(format!("{:?}", Block::Ones(12)), "Ones(12)");
    }
}
