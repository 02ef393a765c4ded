use std::fmt::{self, Debug};
use std::str::FromStr;

mod sealed {
    pub trait Sealed {}
}

/// An unsigned integer usable as the uncompressed unit of a stream.
///
/// Implemented for `u8`, `u16`, `u32` and `u64` only. Bits of a word enter the
/// stream least significant bit first.
pub trait Word: Copy + Default + Eq + Debug + sealed::Sealed {
    const BITS: u32;

    /// Number of trailing 0 bits, `BITS` for zero.
    fn trailing_zeros(self) -> u32;

    /// Number of trailing 1 bits, `BITS` for all ones.
    fn trailing_ones(self) -> u32;

    /// Zero-extends into the codec's carry buffer. Internal, not part of the
    /// stable API.
    #[doc(hidden)]
    fn widen(self) -> u128;

    /// Takes the low `BITS` bits of the codec's carry buffer. Internal, not
    /// part of the stable API.
    #[doc(hidden)]
    fn truncate(carry: u128) -> Self;
}

macro_rules! impl_word {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Word for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline(always)]
                fn trailing_zeros(self) -> u32 {
                    <$ty>::trailing_zeros(self)
                }

                #[inline(always)]
                fn trailing_ones(self) -> u32 {
                    <$ty>::trailing_ones(self)
                }

                #[inline(always)]
                fn widen(self) -> u128 {
                    self as u128
                }

                #[inline(always)]
                fn truncate(carry: u128) -> Self {
                    carry as $ty
                }
            }
        )*
    };
}

impl_word!(u8, u16, u32, u64);

/// Number of trailing 0 bits in `bits`, in `[0, T::BITS]`.
#[inline(always)]
pub fn count_trailing_zeros<T: Word>(bits: T) -> u32 {
    bits.trailing_zeros()
}

/// Number of trailing 1 bits in `bits`, in `[0, T::BITS]`.
#[inline(always)]
pub fn count_trailing_ones<T: Word>(bits: T) -> u32 {
    bits.trailing_ones()
}

/// The closed set of supported word widths, for picking a codec at runtime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Width {
    #[default]
    W8,
    W16,
    W32,
    W64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported word width {0}, expected one of 8, 16, 32 or 64")]
pub struct UnsupportedWidth(pub String);

impl Width {
    pub const fn bits(self) -> u32 {
        match self {
            Width::W8 => u8::BITS,
            Width::W16 => u16::BITS,
            Width::W32 => u32::BITS,
            Width::W64 => u64::BITS,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

impl TryFrom<u32> for Width {
    type Error = UnsupportedWidth;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Width::W8),
            16 => Ok(Width::W16),
            32 => Ok(Width::W32),
            64 => Ok(Width::W64),
            _ => Err(UnsupportedWidth(bits.to_string())),
        }
    }
}

impl FromStr for Width {
    type Err = UnsupportedWidth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| UnsupportedWidth(s.to_owned()))
            .and_then(Width::try_from)
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}
