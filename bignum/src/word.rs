//! Limb abstraction.
//!
//! Big numbers are stored as little-endian arrays of machine words. The
//! [`Word`] trait pairs each limb type with a double-width accumulator so
//! that carry-chain arithmetic can be written once and instantiated at any
//! of the supported widths. [`Limb`] selects the natural width for the
//! current target.

use core::fmt::Debug;
use core::ops::{Add, BitAnd, BitOr, BitOrAssign, BitXor, BitXorAssign, Mul, Not, Shl, Shr};
use subtle::{ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// An unsigned machine word usable as a big-number limb.
///
/// Implemented for `u8`, `u16`, `u32` and `u64`. The associated
/// [`Wide`][Word::Wide] type is twice as wide and absorbs the carry (or
/// borrow, or product high half) of a single limb operation without
/// overflow.
pub trait Word:
    sealed::Sealed
    + Copy
    + Clone
    + Debug
    + Default
    + Eq
    + Ord
    + Not<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + BitOrAssign
    + BitXorAssign
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + ConditionallySelectable
    + ConstantTimeEq
    + Zeroize
{
    /// Double-width accumulator for this limb type.
    type Wide: Copy
        + Clone
        + Debug
        + Default
        + Eq
        + Add<Output = Self::Wide>
        + Mul<Output = Self::Wide>
        + BitAnd<Output = Self::Wide>
        + BitOr<Output = Self::Wide>
        + Shl<u32, Output = Self::Wide>
        + Shr<u32, Output = Self::Wide>;

    /// Number of bits in this limb type.
    const BITS: u32;

    /// Number of bytes in this limb type.
    const BYTES: usize;

    /// The value `0`.
    const ZERO: Self;

    /// The value `1`.
    const ONE: Self;

    /// All bits set.
    const MAX: Self;

    /// Zero-extend a byte into a limb.
    fn from_u8(byte: u8) -> Self;

    /// Truncate a limb to its least significant byte.
    fn low_u8(self) -> u8;

    /// Zero-extend a limb into the wide accumulator.
    fn widen(self) -> Self::Wide;

    /// Truncate a wide accumulator to a single limb.
    fn truncate(wide: Self::Wide) -> Self;

    /// Wrapping subtraction on the wide accumulator.
    ///
    /// Used by borrow chains, where the high half of the result going
    /// negative (i.e. becoming all-ones under two's complement wraparound)
    /// signals the borrow out of the limb.
    fn wide_wrapping_sub(a: Self::Wide, b: Self::Wide) -> Self::Wide;
}

macro_rules! impl_word {
    ($limb:ty, $wide:ty, $bits:expr) => {
        impl Word for $limb {
            type Wide = $wide;

            const BITS: u32 = $bits;
            const BYTES: usize = $bits / 8;
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MAX: Self = <$limb>::MAX;

            #[inline(always)]
            fn from_u8(byte: u8) -> Self {
                byte as $limb
            }

            #[inline(always)]
            fn low_u8(self) -> u8 {
                self as u8
            }

            #[inline(always)]
            fn widen(self) -> $wide {
                self as $wide
            }

            #[inline(always)]
            fn truncate(wide: $wide) -> Self {
                wide as $limb
            }

            #[inline(always)]
            fn wide_wrapping_sub(a: $wide, b: $wide) -> $wide {
                a.wrapping_sub(b)
            }
        }
    };
}

impl_word!(u8, u16, 8);
impl_word!(u16, u32, 16);
impl_word!(u32, u64, 32);
impl_word!(u64, u128, 64);

/// Preferred limb type for the current target.
#[cfg(all(target_pointer_width = "64", not(feature = "force-32-bit")))]
pub type Limb = u64;

/// Preferred limb type for the current target.
#[cfg(any(not(target_pointer_width = "64"), feature = "force-32-bit"))]
pub type Limb = u32;
