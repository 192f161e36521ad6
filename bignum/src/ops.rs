//! Big-number kernels over limb slices.
//!
//! Numbers are little-endian limb slices. Operand sizes are public values;
//! every kernel performs the same sequence of limb operations for a given
//! size regardless of the data, so callers can use them on secret values.

use crate::word::Word;
use subtle::Choice;

/// Unpack a little-endian byte string into a limb slice.
///
/// Excess bytes are ignored and missing bytes read as zero, so the limbs
/// always end up holding `bytes` truncated or zero-extended to the slice's
/// capacity.
pub fn unpack_le<W: Word>(limbs: &mut [W], bytes: &[u8]) {
    for (i, limb) in limbs.iter_mut().enumerate() {
        let mut word = W::ZERO;
        for j in 0..W::BYTES {
            let byte = bytes.get(i * W::BYTES + j).copied().unwrap_or(0);
            word = word | (W::from_u8(byte) << (8 * j as u32));
        }
        *limb = word;
    }
}

/// Unpack a big-endian byte string into a limb slice.
///
/// Truncation and zero-extension behave as in [`unpack_le`], applied to
/// the most significant end of the value.
pub fn unpack_be<W: Word>(limbs: &mut [W], bytes: &[u8]) {
    let len = bytes.len();
    for (i, limb) in limbs.iter_mut().enumerate() {
        let mut word = W::ZERO;
        for j in 0..W::BYTES {
            let pos = i * W::BYTES + j;
            let byte = if pos < len { bytes[len - 1 - pos] } else { 0 };
            word = word | (W::from_u8(byte) << (8 * j as u32));
        }
        *limb = word;
    }
}

/// Pack a limb slice into a little-endian byte string.
///
/// The output is `limbs` truncated or zero-extended to `bytes.len()`.
pub fn pack_le<W: Word>(bytes: &mut [u8], limbs: &[W]) {
    for (pos, byte) in bytes.iter_mut().enumerate() {
        let i = pos / W::BYTES;
        let j = (pos % W::BYTES) as u32;
        *byte = limbs.get(i).map_or(0, |limb| (*limb >> (8 * j)).low_u8());
    }
}

/// Pack a limb slice into a big-endian byte string.
pub fn pack_be<W: Word>(bytes: &mut [u8], limbs: &[W]) {
    let len = bytes.len();
    for pos in 0..len {
        let i = pos / W::BYTES;
        let j = (pos % W::BYTES) as u32;
        bytes[len - 1 - pos] = limbs.get(i).map_or(0, |limb| (*limb >> (8 * j)).low_u8());
    }
}

/// `result = x + y`, returning the carry out of the top limb.
///
/// All three slices must have the same length.
pub fn add<W: Word>(result: &mut [W], x: &[W], y: &[W]) -> W {
    debug_assert_eq!(result.len(), x.len());
    debug_assert_eq!(result.len(), y.len());
    let mut carry = W::ZERO.widen();
    for (i, limb) in result.iter_mut().enumerate() {
        carry = carry + x[i].widen() + y[i].widen();
        *limb = W::truncate(carry);
        carry = carry >> W::BITS;
    }
    W::truncate(carry)
}

/// `result = x - y`, returning the borrow out of the top limb (0 or 1).
///
/// All three slices must have the same length.
pub fn sub<W: Word>(result: &mut [W], x: &[W], y: &[W]) -> W {
    debug_assert_eq!(result.len(), x.len());
    debug_assert_eq!(result.len(), y.len());
    let mut borrow = W::ZERO.widen();
    for (i, limb) in result.iter_mut().enumerate() {
        let diff = W::wide_wrapping_sub(
            W::wide_wrapping_sub(x[i].widen(), y[i].widen()),
            (borrow >> W::BITS) & W::ONE.widen(),
        );
        *limb = W::truncate(diff);
        borrow = diff;
    }
    W::truncate(borrow >> W::BITS) & W::ONE
}

/// Schoolbook multiplication: `result = x * y`.
///
/// `result` must be exactly `x.len() + y.len()` limbs and must not alias
/// either operand.
pub fn mul<W: Word>(result: &mut [W], x: &[W], y: &[W]) {
    debug_assert_eq!(result.len(), x.len() + y.len());
    for limb in result.iter_mut() {
        *limb = W::ZERO;
    }
    for (i, xi) in x.iter().enumerate() {
        let word = xi.widen();
        let mut carry = W::ZERO.widen();
        for (j, yj) in y.iter().enumerate() {
            carry = carry + yj.widen() * word + result[i + j].widen();
            result[i + j] = W::truncate(carry);
            carry = carry >> W::BITS;
        }
        result[i + y.len()] = W::truncate(carry);
    }
}

/// `result = x mod m` under the assumption `x < 2 * m`.
///
/// Computes `x - m` and keeps it unless the subtraction borrowed, in which
/// case `x` is kept instead. The selection is constant time.
pub fn reduce_quick<W: Word>(result: &mut [W], x: &[W], modulus: &[W]) {
    let borrow = sub(result, x, modulus);
    let underflow = Choice::from(borrow.low_u8());
    conditional_assign(result, x, underflow);
}

/// Constant-time test for zero over the whole slice.
pub fn is_zero<W: Word>(x: &[W]) -> Choice {
    let mut acc = W::ZERO;
    for limb in x {
        acc |= *limb;
    }
    acc.ct_eq(&W::ZERO)
}

/// Conditionally copy `src` into `dst` without revealing `choice`.
pub fn conditional_assign<W: Word>(dst: &mut [W], src: &[W], choice: Choice) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        d.conditional_assign(s, choice);
    }
}

/// Conditionally swap `x` and `y` without revealing `choice`.
pub fn conditional_swap<W: Word>(x: &mut [W], y: &mut [W], choice: Choice) {
    debug_assert_eq!(x.len(), y.len());
    for (a, b) in x.iter_mut().zip(y.iter_mut()) {
        W::conditional_swap(a, b, choice);
    }
}

/// `result = x >> shift` for an arbitrary public bit count.
///
/// Limbs of `x` beyond the top of the slice read as zero, so `result` may
/// be shorter than the full shifted value when the caller knows the high
/// limbs are not needed.
pub fn shr_bits<W: Word>(result: &mut [W], x: &[W], shift: u32) {
    let offset = (shift / W::BITS) as usize;
    let bits = shift % W::BITS;
    for (i, limb) in result.iter_mut().enumerate() {
        let lo = x.get(offset + i).copied().unwrap_or(W::ZERO);
        if bits == 0 {
            *limb = lo;
        } else {
            let hi = x.get(offset + i + 1).copied().unwrap_or(W::ZERO);
            *limb = (lo >> bits) | (hi << (W::BITS - bits));
        }
    }
}
