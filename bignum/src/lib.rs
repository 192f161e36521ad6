#![no_std]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

mod ops;
mod word;

pub use crate::ops::{
    add, conditional_assign, conditional_swap, is_zero, mul, pack_be, pack_le, reduce_quick,
    shr_bits, sub, unpack_be, unpack_le,
};
pub use crate::word::{Limb, Word};

pub use subtle;
pub use zeroize;
