//! Destinations for encoded blocks.
//!
//! An [`Encoder`](crate::Encoder) only ever appends to its sink, one block at a
//! time, and never seeks back.

use std::convert::Infallible;
use std::io;

pub trait BlockSink {
    type Error: std::error::Error;

    fn put(&mut self, block: u8) -> Result<(), Self::Error>;
}

impl BlockSink for Vec<u8> {
    type Error = Infallible;

    #[inline(always)]
    fn put(&mut self, block: u8) -> Result<(), Self::Error> {
        self.push(block);
        Ok(())
    }
}

impl<S: BlockSink + ?Sized> BlockSink for &mut S {
    type Error = S::Error;

    #[inline(always)]
    fn put(&mut self, block: u8) -> Result<(), Self::Error> {
        (**self).put(block)
    }
}

/// Returned by [`SliceSink`] when the region has no room left.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("block sink is full after {capacity} blocks")]
pub struct SinkFull {
    pub capacity: usize,
}

/// A fixed memory region filled from the front.
///
/// Size it with [`max_encoded_len`](crate::max_encoded_len) to never see
/// [`SinkFull`].
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceSink { buf, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// The filled prefix of the region.
    pub fn into_written(self) -> &'a mut [u8] {
        &mut self.buf[..self.written]
    }
}

impl BlockSink for SliceSink<'_> {
    type Error = SinkFull;

    #[inline(always)]
    fn put(&mut self, block: u8) -> Result<(), Self::Error> {
        match self.buf.get_mut(self.written) {
            Some(slot) => {
                *slot = block;
                self.written += 1;
                Ok(())
            }
            None => Err(SinkFull {
                capacity: self.buf.len(),
            }),
        }
    }
}

/// Forwards every block to an [`io::Write`].
///
/// Blocks are written one byte at a time, wrap unbuffered writers in a
/// [`io::BufWriter`].
pub struct IoSink<W> {
    writer: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        IoSink { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> BlockSink for IoSink<W> {
    type Error = io::Error;

    #[inline(always)]
    fn put(&mut self, block: u8) -> Result<(), Self::Error> {
        self.writer.write_all(&[block])
    }
}
