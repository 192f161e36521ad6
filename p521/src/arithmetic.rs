//! Field, scalar and point arithmetic for the P-521 curve.

pub(crate) mod field;
pub(crate) mod point;
pub(crate) mod scalar;
