#![no_std]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod ed25519;
pub mod x25519;

mod field;

pub use rand_core;
pub use subtle;
pub use zeroize;
