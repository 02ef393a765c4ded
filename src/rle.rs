use crate::block::Block;
use crate::sink::BlockSink;
use crate::word::{count_trailing_ones, count_trailing_zeros, Word};
use crate::{LITERAL_BITS, MAX_RUN};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::{fmt, mem};

/// Incremental encoder, words in, blocks out.
///
/// Each [`push`](Encoder::push) emits zero or more blocks into the sink. The
/// stream must be finalized with [`flush`](Encoder::flush); an encoder
/// dropped with pending bits flushes itself and logs any sink error.
pub struct Encoder<S: BlockSink, T: Word = u8> {
    sink: S,
    buf: u128,
    bit_count: u32,
    status: RleStatus,
    _word: PhantomData<T>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum RleStatus {
    Init,
    Zeros { rlen: u32 },
    Ones { rlen: u32 },
}

impl<S: BlockSink, T: Word> Encoder<S, T> {
    pub fn new(sink: S) -> Self {
        Encoder {
            sink,
            buf: 0,
            bit_count: 0,
            status: RleStatus::Init,
            _word: PhantomData,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Whether [`flush`](Encoder::flush) would write anything.
    pub fn is_pending(&self) -> bool {
        self.bit_count != 0 || self.status != RleStatus::Init
    }

    #[inline(always)]
    pub fn push(&mut self, word: T) -> Result<(), S::Error> {
        trace!("push word {word:?}");
        self.buf |= word.widen() << self.bit_count;
        self.bit_count += T::BITS;
        while self.bit_count >= T::BITS {
            self.step()?;
        }
        Ok(())
    }

    pub fn push_slice(&mut self, words: &[T]) -> Result<(), S::Error> {
        for word in words {
            self.push(*word)?;
        }
        Ok(())
    }

    /// Ends the stream: drains the buffered bits, closes any open run and
    /// resets the encoder. A no-op when nothing is pending.
    pub fn flush(&mut self) -> Result<(), S::Error> {
        if !self.is_pending() {
            return Ok(());
        }
        debug!(
            "flush: {} buffered bits, status {:?}",
            self.bit_count, self.status
        );
        while self.bit_count > 0 {
            self.step()?;
        }
        match mem::replace(&mut self.status, RleStatus::Init) {
            RleStatus::Init => {}
            RleStatus::Zeros { rlen } => self.emit(Block::zeros(rlen))?,
            RleStatus::Ones { rlen } => self.emit(Block::ones(rlen))?,
        }
        self.buf = 0;
        Ok(())
    }

    /// Consumes the next block's worth of buffered bits.
    ///
    /// Run lengths are counted on the low `T::BITS` bits only, capped by the
    /// number of buffered bits.
    fn step(&mut self) -> Result<(), S::Error> {
        let window = T::truncate(self.buf);
        let zeros = count_trailing_zeros(window).min(self.bit_count);
        let ones = count_trailing_ones(window).min(self.bit_count);
        trace!(
            "status {:?}, bit_count: {}, zeros: {zeros}, ones: {ones}",
            self.status,
            self.bit_count
        );

        let count = match self.status {
            RleStatus::Init => {
                if zeros > LITERAL_BITS {
                    self.transit(RleStatus::Zeros { rlen: zeros });
                    zeros
                } else if ones > LITERAL_BITS {
                    self.transit(RleStatus::Ones { rlen: ones });
                    ones
                } else {
                    self.emit(Block::literal(self.buf))?;
                    LITERAL_BITS.min(self.bit_count)
                }
            }
            RleStatus::Zeros { rlen } => {
                self.extend(rlen, zeros, Block::zeros, |rlen| RleStatus::Zeros { rlen })?
            }
            RleStatus::Ones { rlen } => {
                self.extend(rlen, ones, Block::ones, |rlen| RleStatus::Ones { rlen })?
            }
        };

        debug_assert!(count > 0 && count <= self.bit_count);
        self.buf >>= count;
        self.bit_count -= count;
        Ok(())
    }

    /// Grows the open run by `repeats` bits, or closes it when the next bit
    /// differs. Returns the number of bits consumed.
    #[inline(always)]
    fn extend(
        &mut self,
        rlen: u32,
        repeats: u32,
        make: fn(u32) -> Block,
        status: fn(u32) -> RleStatus,
    ) -> Result<u32, S::Error> {
        if repeats == 0 {
            // the differing bit is implied by the run block
            self.emit(make(rlen))?;
            self.transit(RleStatus::Init);
            return Ok(1);
        }

        let count = repeats.min(MAX_RUN - rlen);
        let rlen = rlen + count;
        debug_assert!(rlen <= MAX_RUN);
        if rlen == MAX_RUN {
            self.emit(make(MAX_RUN))?;
            self.transit(RleStatus::Init);
        } else {
            self.status = status(rlen);
        }
        Ok(count)
    }

    #[inline(always)]
    fn transit(&mut self, status: RleStatus) {
        self.status = status;
        trace!("transit to {:?}", self.status);
    }

    #[inline(always)]
    fn emit(&mut self, block: Block) -> Result<(), S::Error> {
        trace!("emit {block:?}");
        self.sink.put(block.into())
    }
}

impl<S: BlockSink, T: Word> Drop for Encoder<S, T> {
    fn drop(&mut self) {
        if !self.is_pending() {
            return;
        }
        debug!("encoder dropped with pending bits, flushing");
        if let Err(e) = self.flush() {
            error!("failed to flush encoder on drop: {e}");
        }
    }
}

impl Debug for RleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RleStatus::Init => f.write_str("Init"),
            RleStatus::Zeros { rlen } => f.debug_struct("Zeros").field("rlen", rlen).finish(),
            RleStatus::Ones { rlen } => f.debug_struct("Ones").field("rlen", rlen).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Encoder;
    use crate::sink::{SinkFull, SliceSink};
    use std::sync::Once;

    const TEST_VECTOR: [(&str, &str); 12] = [
        ("", ""),
        ("ffff0f00000000aa", "cc9c2a"),
        ("00", "80"),
        ("ff", "c0"),
        ("7f", "7f00"),
        ("0000", "88"),
        ("00ff", "807f"),
        ("ff00", "c000"),
        ("aaaa", "2a5502"),
        ("000000000000000000", "bf00"),
        ("00000000000000000000", "bf81"),
        ("ffffffffffffffffff", "ff01"),
    ];

    static INIT: Once = Once::new();

    /// Setup function that is only run once, even if called multiple times.
    fn setup() {
        INIT.call_once(|| {
            let _ = pretty_env_logger::try_init();
        });
    }

    #[test]
    fn test_rle_encode() {
        setup();
        for (input, expected) in TEST_VECTOR.into_iter() {
            let input = hex::decode(input).unwrap();
            let expected = hex::decode(expected).unwrap();
            let mut out = vec![];
            let mut rle = Encoder::<_, u8>::new(&mut out);
            rle.push_slice(&input).unwrap();
            rle.flush().unwrap();
            drop(rle);
            assert_eq!(expected, out, "input {}", hex::encode(&input));
        }
    }

    #[test]
    fn test_rle_encode_wide_words() {
        setup();
        let mut out = vec![];
        let mut rle = Encoder::<_, u16>::new(&mut out);
        rle.push(0xFFFF).unwrap();
        rle.push(0x000F).unwrap();
        rle.push(0x0000).unwrap();
        rle.push(0xAA00).unwrap();
        rle.flush().unwrap();
        drop(rle);
        assert_eq!(out, [0xCC, 0x9C, 0x2A]);
    }

    #[test]
    fn test_flush_without_input_writes_nothing() {
        setup();
        let mut out = vec![];
        let mut rle = Encoder::<_, u32>::new(&mut out);
        assert!(!rle.is_pending());
        rle.flush().unwrap();
        rle.flush().unwrap();
        drop(rle);
        assert!(out.is_empty());
    }

    #[test]
    fn test_flush_resets() {
        setup();
        let mut out = vec![];
        let mut rle = Encoder::<_, u8>::new(&mut out);
        rle.push(0x00).unwrap();
        assert!(rle.is_pending());
        rle.flush().unwrap();
        assert!(!rle.is_pending());
        rle.push(0xFF).unwrap();
        rle.flush().unwrap();
        drop(rle);
        assert_eq!(out, [0x80, 0xC0]);
    }

    #[test]
    fn test_drop_flushes() {
        setup();
        let mut flushed = vec![];
        let mut rle = Encoder::<_, u8>::new(&mut flushed);
        rle.push_slice(&[0xFF, 0xFF, 0x0F, 0x00, 0x00]).unwrap();
        rle.flush().unwrap();
        drop(rle);

        let mut dropped = vec![];
        {
            let mut rle = Encoder::<_, u8>::new(&mut dropped);
            rle.push_slice(&[0xFF, 0xFF, 0x0F, 0x00, 0x00]).unwrap();
        }
        assert_eq!(flushed, dropped);
        assert_eq!(dropped, [0xCC, 0x8B]);
    }

    #[test]
    fn test_sink_full() {
        setup();
        let mut region = [0u8; 1];
        let mut rle = Encoder::<_, u8>::new(SliceSink::new(&mut region));
        assert_eq!(rle.push(0xAA), Ok(()));
        assert_eq!(rle.get_ref().written(), 1);
        assert_eq!(rle.push(0xAA), Err(SinkFull { capacity: 1 }));
        assert_eq!(rle.get_ref().written(), 1);
    }
}
