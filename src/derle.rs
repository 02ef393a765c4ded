use crate::block::Block;
use crate::word::Word;
use crate::{LITERAL_BITS, MAX_RUN};
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Incremental decoder, blocks in, words out.
///
/// Pulls blocks from any byte iterator on demand and yields complete words.
/// Bits left over once the source is exhausted are padding and never
/// surface as a word. Malformed input is not detected; a stream cut short
/// yields the words that were completed before the cut.
pub struct Decoder<I, T = u8> {
    blocks: I,
    buf: u128,
    bit_count: u32,
    state: DeRleState,
    _word: PhantomData<T>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DeRleState {
    Read,
    /// A run of zeros followed by a one bit.
    Zeros { rlen: u32 },
    ZerosMax { rlen: u32 },
    /// A run of ones followed by a zero bit.
    Ones { rlen: u32 },
    OnesMax { rlen: u32 },
}

impl<I: Iterator<Item = u8>, T: Word> Decoder<I, T> {
    pub fn new<B: IntoIterator<IntoIter = I>>(blocks: B) -> Self {
        Decoder {
            blocks: blocks.into_iter(),
            buf: 0,
            bit_count: 0,
            state: DeRleState::Read,
            _word: PhantomData,
        }
    }

    /// Number of decoded bits not yet returned as a word.
    pub fn pending_bits(&self) -> u32 {
        self.bit_count
    }

    /// Returns the next word, or `None` once the source is exhausted.
    pub fn pull(&mut self) -> Option<T> {
        loop {
            let word = match self.state {
                DeRleState::Read => {
                    let Some(byte) = self.blocks.next() else {
                        debug!("end of blocks, {} padding bits", self.bit_count);
                        return None;
                    };
                    self.read(Block::from(byte))
                }
                DeRleState::Zeros { rlen } => self.fill(rlen, false, true),
                DeRleState::ZerosMax { rlen } => self.fill(rlen, false, false),
                DeRleState::Ones { rlen } => self.fill(rlen, true, true),
                DeRleState::OnesMax { rlen } => self.fill(rlen, true, false),
            };
            if word.is_some() {
                trace!("decode {word:?}");
                return word;
            }
        }
    }

    #[inline(always)]
    fn read(&mut self, block: Block) -> Option<T> {
        trace!("read {block:?}, bit_count: {}", self.bit_count);
        match block {
            Block::Literal(bits) => {
                self.buf |= (bits as u128) << self.bit_count;
                self.bit_count += LITERAL_BITS;
                self.take_word()
            }
            Block::Zeros(count) => {
                let rlen = count as u32;
                self.transit(if rlen < MAX_RUN {
                    DeRleState::Zeros { rlen }
                } else {
                    DeRleState::ZerosMax { rlen }
                });
                None
            }
            Block::Ones(count) => {
                let rlen = count as u32;
                self.transit(if rlen < MAX_RUN {
                    DeRleState::Ones { rlen }
                } else {
                    DeRleState::OnesMax { rlen }
                });
                None
            }
        }
    }

    /// Moves the pending run bits (plus the terminator when `terminated`)
    /// into the buffer, as many as fit before a word completes.
    #[inline(always)]
    fn fill(&mut self, rlen: u32, is_one: bool, terminated: bool) -> Option<T> {
        let room = T::BITS - self.bit_count;
        let pending = rlen + terminated as u32;

        if room < pending {
            // room <= rlen here, so only run bits go in
            self.put_run(room, is_one);
            let rlen = rlen - room;
            self.state = match (is_one, terminated) {
                (false, true) => DeRleState::Zeros { rlen },
                (false, false) => DeRleState::ZerosMax { rlen },
                (true, true) => DeRleState::Ones { rlen },
                (true, false) => DeRleState::OnesMax { rlen },
            };
            return self.take_word();
        }

        self.put_run(rlen, is_one);
        if terminated {
            self.put_run(1, !is_one);
        }
        self.transit(DeRleState::Read);
        self.take_word()
    }

    #[inline(always)]
    fn put_run(&mut self, len: u32, is_one: bool) {
        if is_one {
            self.buf |= ((1u128 << len) - 1) << self.bit_count;
        }
        self.bit_count += len;
    }

    #[inline(always)]
    fn take_word(&mut self) -> Option<T> {
        if self.bit_count < T::BITS {
            return None;
        }
        let word = T::truncate(self.buf);
        self.buf >>= T::BITS;
        self.bit_count -= T::BITS;
        Some(word)
    }

    #[inline(always)]
    fn transit(&mut self, state: DeRleState) {
        self.state = state;
        trace!("transit to {:?}", self.state);
    }
}

impl<I: Iterator<Item = u8>, T: Word> Iterator for Decoder<I, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pull()
    }
}

impl<I: FusedIterator<Item = u8>, T: Word> FusedIterator for Decoder<I, T> {}

#[cfg(test)]
mod tests {
    use super::Decoder;
    use std::sync::Once;

    const TEST_VECTOR: [(&str, &str); 8] = [
        ("", ""),
        ("cc9c2a", "ffff0f00000000aa"),
        ("80", "00"),
        ("8080", "0001"),
        ("bf81", "00000000000000000000"),
        ("bf00", "000000000000000000"),
        ("ff01", "ffffffffffffffffff"),
        ("2a5502", "aaaa"),
    ];

    static INIT: Once = Once::new();

    /// Setup function that is only run once, even if called multiple times.
    fn setup() {
        INIT.call_once(|| {
            let _ = pretty_env_logger::try_init();
        });
    }

    #[test]
    fn test_derle_decode() {
        setup();
        for (input, expected) in TEST_VECTOR.into_iter() {
            let input = hex::decode(input).unwrap();
            let expected = hex::decode(expected).unwrap();
            let out: Vec<u8> = Decoder::new(input.iter().copied()).collect();
            assert_eq!(expected, out, "input {}", hex::encode(&input));
        }
    }

    #[test]
    fn test_derle_decode_u16() {
        setup();
        let out: Vec<u16> = Decoder::new([0xCC, 0x9C, 0x2A]).collect();
        assert_eq!(out, [0xFFFF, 0x000F, 0x0000, 0xAA00]);
    }

    #[test]
    fn test_zeros_terminator() {
        setup();
        // 8 zeros, the stuffed one, then a literal of 7 zeros
        let out: Vec<u16> = Decoder::new([0x80, 0x00]).collect();
        assert_eq!(out, [0x0100]);

        // a max run has no terminator
        let mut dec = Decoder::<_, u64>::new([0xBF, 0x00]);
        assert_eq!(dec.pull(), Some(0));
        assert_eq!(dec.pull(), None);
        assert_eq!(dec.pending_bits(), 71 + 7 - 64);
    }

    #[test]
    fn test_ones_terminator() {
        setup();
        let out: Vec<u16> = Decoder::new([0xC0, 0x7F]).collect();
        assert_eq!(out, [0xFEFF]);

        let mut dec = Decoder::<_, u8>::new([0xC1, 0x7F]);
        assert_eq!(dec.pull(), Some(0xFF));
        assert_eq!(dec.pull(), Some(0xFD));
        assert_eq!(dec.pull(), None);
        assert_eq!(dec.pending_bits(), 1);
    }

    #[test]
    fn test_pull_after_done() {
        setup();
        let mut dec = Decoder::<_, u32>::new(vec![0xC0]);
        assert_eq!(dec.pull(), None);
        assert_eq!(dec.pull(), None);
        assert_eq!(dec.pending_bits(), 9);
    }
}
