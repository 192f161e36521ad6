//! Limb-width agreement tests.
//!
//! The curve layers rely on every kernel producing identical byte-level
//! results at 8-, 16-, 32- and 64-bit limb widths. These properties pin
//! that down by running the same computation at two widths and comparing
//! the packed output.

use bignum::Word;
use proptest::prelude::*;

/// `x + y mod 2^256` computed at limb width `W`.
fn add_bytes<W: Word>(x: &[u8; 32], y: &[u8; 32]) -> [u8; 32] {
    let mut xl = vec![W::ZERO; 32 / W::BYTES];
    let mut yl = vec![W::ZERO; 32 / W::BYTES];
    bignum::unpack_le(&mut xl, x);
    bignum::unpack_le(&mut yl, y);
    let mut rl = vec![W::ZERO; 32 / W::BYTES];
    bignum::add(&mut rl, &xl, &yl);
    let mut out = [0u8; 32];
    bignum::pack_le(&mut out, &rl);
    out
}

/// `x - y mod 2^256` computed at limb width `W`, plus the borrow.
fn sub_bytes<W: Word>(x: &[u8; 32], y: &[u8; 32]) -> ([u8; 32], u8) {
    let mut xl = vec![W::ZERO; 32 / W::BYTES];
    let mut yl = vec![W::ZERO; 32 / W::BYTES];
    bignum::unpack_le(&mut xl, x);
    bignum::unpack_le(&mut yl, y);
    let mut rl = vec![W::ZERO; 32 / W::BYTES];
    let borrow = bignum::sub(&mut rl, &xl, &yl);
    let mut out = [0u8; 32];
    bignum::pack_le(&mut out, &rl);
    (out, borrow.low_u8())
}

/// Full 512-bit product computed at limb width `W`.
fn mul_bytes<W: Word>(x: &[u8; 32], y: &[u8; 32]) -> [u8; 64] {
    let mut xl = vec![W::ZERO; 32 / W::BYTES];
    let mut yl = vec![W::ZERO; 32 / W::BYTES];
    bignum::unpack_le(&mut xl, x);
    bignum::unpack_le(&mut yl, y);
    let mut rl = vec![W::ZERO; 64 / W::BYTES];
    bignum::mul(&mut rl, &xl, &yl);
    let mut out = [0u8; 64];
    bignum::pack_le(&mut out, &rl);
    out
}

fn shr_bytes<W: Word>(x: &[u8; 32], shift: u32) -> [u8; 32] {
    let mut xl = vec![W::ZERO; 32 / W::BYTES];
    bignum::unpack_le(&mut xl, x);
    let mut rl = vec![W::ZERO; 32 / W::BYTES];
    bignum::shr_bits(&mut rl, &xl, shift);
    let mut out = [0u8; 32];
    bignum::pack_le(&mut out, &rl);
    out
}

proptest! {
    #[test]
    fn add_agrees_across_widths(x in any::<[u8; 32]>(), y in any::<[u8; 32]>()) {
        let r64 = add_bytes::<u64>(&x, &y);
        prop_assert_eq!(add_bytes::<u8>(&x, &y), r64);
        prop_assert_eq!(add_bytes::<u16>(&x, &y), r64);
        prop_assert_eq!(add_bytes::<u32>(&x, &y), r64);
    }

    #[test]
    fn sub_agrees_across_widths(x in any::<[u8; 32]>(), y in any::<[u8; 32]>()) {
        let r64 = sub_bytes::<u64>(&x, &y);
        prop_assert_eq!(sub_bytes::<u8>(&x, &y), r64);
        prop_assert_eq!(sub_bytes::<u16>(&x, &y), r64);
        prop_assert_eq!(sub_bytes::<u32>(&x, &y), r64);
    }

    #[test]
    fn mul_agrees_across_widths(x in any::<[u8; 32]>(), y in any::<[u8; 32]>()) {
        let r64 = mul_bytes::<u64>(&x, &y);
        prop_assert_eq!(mul_bytes::<u8>(&x, &y), r64);
        prop_assert_eq!(mul_bytes::<u16>(&x, &y), r64);
        prop_assert_eq!(mul_bytes::<u32>(&x, &y), r64);
    }

    #[test]
    fn shr_agrees_across_widths(x in any::<[u8; 32]>(), shift in 0u32..256) {
        let r64 = shr_bytes::<u64>(&x, shift);
        prop_assert_eq!(shr_bytes::<u8>(&x, shift), r64);
        prop_assert_eq!(shr_bytes::<u16>(&x, shift), r64);
        prop_assert_eq!(shr_bytes::<u32>(&x, shift), r64);
    }

    #[test]
    fn add_sub_round_trip(x in any::<[u8; 32]>(), y in any::<[u8; 32]>()) {
        let sum = add_bytes::<u32>(&x, &y);
        let (back, _) = sub_bytes::<u32>(&sum, &y);
        prop_assert_eq!(back, x);
    }

    #[test]
    fn be_le_unpack_agree(bytes in any::<[u8; 32]>()) {
        let mut reversed = bytes;
        reversed.reverse();
        let mut le = [0u32; 8];
        let mut be = [0u32; 8];
        bignum::unpack_le(&mut le, &bytes);
        bignum::unpack_be(&mut be, &reversed);
        prop_assert_eq!(le, be);
    }
}
