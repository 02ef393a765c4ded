//! # Binary RLE Encoding Scheme
//!
//! A stream of fixed-width unsigned words is read as one sequence of bits,
//! least significant bit of each word first, and encoded into one byte per
//! block.
//!
//! ```text
//!         MSB   LSB
//!          │     │
//!          ▼     ▼
//!         0XXX XXXX
//!         ▲
//! LITERAL─┘
//! ```
//!
//! A literal carries the next 7 bits as they are, bit 0 first.
//!
//! ```text
//!         MSB   LSB
//!          │     │
//!          ▼     ▼
//!         1XNN NNNN
//!         ▲▲
//!  IS_RLE─┘│
//!         0/1
//! ```
//!
//! A run block carries a run of zeros (`10`) or ones (`11`). The low 6 bits are
//! an unsigned integer N and the run length is N + 8, so a block covers 8 to
//! 71 bits.
//!
//! A run shorter than 71 always ends with one bit of the opposite value. That
//! bit is implied by the block: the encoder swallows it and the decoder puts
//! it back. A run of 71 has no such bit, the run may continue in the next
//! block.
//!
//! In the worst case, with no run of 8 or more bits anywhere, every 7 bits of
//! input cost one byte, see [`max_encoded_len`].
//!
//! The encoding does not include the size. The last block is padded, the
//! decoder drops the padding since it never fills a whole word.
//!
//! # Byte order
//!
//! Bit order within a block is fixed. For words wider than a byte, only the
//! bit order of the word value is defined, so encoder and decoder must agree
//! on the byte order of the words they exchange. Only `u8` streams are
//! portable across architectures.
//!
//! # Example
//!
//! ```
//! let data = [0xFFu8, 0xFF, 0x0F, 0x00, 0x00, 0x00, 0x00, 0xAA];
//! let blocks = brle::encode(&data);
//! assert_eq!(blocks, [0xCC, 0x9C, 0x2A]);
//!
//! assert_eq!(brle::decode::<u8>(&blocks), data);
//! assert_eq!(brle::decode::<u16>(&blocks).len(), 4);
//! ```
//!
//! # Streaming
//!
//! ```
//! use brle::{Decoder, Encoder};
//!
//! let mut blocks = vec![];
//! let mut encoder = Encoder::<_, u32>::new(&mut blocks);
//! for word in [0u32, 0, 0xDEAD_BEEF, u32::MAX] {
//!     encoder.push(word).unwrap();
//! }
//! encoder.flush().unwrap();
//! drop(encoder);
//!
//! let words: Vec<u32> = Decoder::new(blocks).collect();
//! assert_eq!(words, [0, 0, 0xDEAD_BEEF, u32::MAX]);
//! ```

#[macro_use]
extern crate log;

mod block;
mod derle;
mod rle;
pub mod sink;
mod word;

pub use block::Block;
pub use derle::Decoder;
pub use rle::Encoder;
pub use sink::{BlockSink, IoSink, SinkFull, SliceSink};
pub use word::{count_trailing_ones, count_trailing_zeros, UnsupportedWidth, Width, Word};

/// how many bits a literal carries
const LITERAL_BITS: u32 = 7;
const MIN_RUN: u32 = LITERAL_BITS + 1;
const MAX_RUN: u32 = 0b111111 + MIN_RUN;

/// Upper bound on the number of blocks for `words` words of type `T`.
pub fn max_encoded_len<T: Word>(words: usize) -> usize {
    (words * T::BITS as usize + LITERAL_BITS as usize - 1) / LITERAL_BITS as usize
}

/// Encodes a whole slice of words.
pub fn encode<T: Word>(words: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(max_encoded_len::<T>(words.len()));
    match encode_into(words, &mut out) {
        Ok(()) => out,
        Err(never) => match never {},
    }
}

/// Encodes a whole slice of words into `sink` and finalizes the stream.
pub fn encode_into<T: Word, S: BlockSink>(words: &[T], sink: S) -> Result<(), S::Error> {
    let mut encoder = Encoder::<S, T>::new(sink);
    encoder.push_slice(words)?;
    encoder.flush()
}

/// Decodes a whole block stream.
pub fn decode<T: Word>(blocks: &[u8]) -> Vec<T> {
    Decoder::new(blocks.iter().copied()).collect()
}
