#![no_std]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod ecdh;
pub mod ecdsa;

mod arithmetic;

pub use crate::arithmetic::point::evaluate;

pub use rand_core;
pub use sha2;
pub use subtle;
pub use zeroize;

/// Length of a serialized field element or scalar in bytes.
pub const FIELD_SIZE: usize = 66;

/// Length of a serialized curve point (x then y) in bytes.
pub const POINT_SIZE: usize = 132;
