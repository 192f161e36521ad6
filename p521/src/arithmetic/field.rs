//! Arithmetic modulo the Mersenne prime p = 2^521 - 1.
//!
//! Elements are little-endian limb arrays with nine live bits in the top
//! limb, always kept fully reduced. Because 2^521 = 1 (mod p), reducing a
//! product just adds the bits above position 521 back into the low 521
//! bits. Trial subtractions of p are written as "add one, drop 2^521" so
//! the outcome can be read off bit 521 without a separate comparison.
//! Everything here runs in constant time.

use bignum::{Limb, Word};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// Limbs per 521-bit value.
pub(crate) const LIMBS: usize = (521 + Limb::BITS as usize - 1) / Limb::BITS as usize;

/// Limbs per 1042-bit product.
pub(crate) const WIDE_LIMBS: usize = 2 * LIMBS;

type Wide = <Limb as Word>::Wide;

/// Live bits in the top limb.
const TOP_BITS: u32 = 521 - (LIMBS as u32 - 1) * Limb::BITS;

/// Mask keeping the live bits of the top limb.
const TOP_MASK: Limb = ((1 as Limb) << TOP_BITS) - 1;

/// An element of the field modulo 2^521 - 1.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FieldElement(pub(crate) [Limb; LIMBS]);

impl FieldElement {
    pub const ZERO: Self = Self([Limb::MIN; LIMBS]);

    pub const ONE: Self = {
        let mut limbs = [Limb::MIN; LIMBS];
        limbs[0] = 1;
        Self(limbs)
    };

    /// Interprets 66 big-endian bytes as an element.
    ///
    /// The value is used as-is; [`in_range`][Self::in_range] reports
    /// whether it was canonical.
    pub fn from_bytes(bytes: &[u8; 66]) -> Self {
        let mut limbs = [Limb::MIN; LIMBS];
        bignum::unpack_be(&mut limbs, bytes);
        Self(limbs)
    }

    pub fn to_bytes(self) -> [u8; 66] {
        let mut bytes = [0u8; 66];
        bignum::pack_be(&mut bytes, &self.0);
        bytes
    }

    /// Whether the element is in `[0, p - 1]`, in constant time.
    pub fn in_range(&self) -> Choice {
        // Trial subtraction of p as "add one, drop 2^521": the value is
        // in range exactly when nothing survives above bit 520.
        let mut carry: Wide = Limb::ONE.widen();
        let mut word = Limb::MIN;
        for limb in &self.0 {
            carry = carry + limb.widen();
            word = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }
        let excess = (carry << (Limb::BITS - TOP_BITS)) + (word >> TOP_BITS).widen();
        let folded = Limb::truncate(excess) | Limb::truncate(excess >> Limb::BITS);
        folded.ct_eq(&Limb::MIN)
    }

    /// Conditionally subtracts p from a raw limb array, bringing values
    /// in `[0, 2p)` into canonical form.
    pub fn reduce_quick(limbs: &mut [Limb; LIMBS]) {
        let mut carry: Wide = Limb::ONE.widen();
        for limb in limbs.iter_mut() {
            carry = carry + (*limb).widen();
            *limb = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }
        Self::fixup(limbs);
    }

    /// Undoes the provisional `+ 1` of a trial reduction when bit 521 did
    /// not come out set, then masks the result to 521 bits.
    fn fixup(limbs: &mut [Limb; LIMBS]) {
        let borrow = ((limbs[LIMBS - 1] >> TOP_BITS) ^ Limb::ONE) & Limb::ONE;
        Self::decrement(limbs, borrow);
    }

    /// Subtracts a 0/1 borrow from the low limb, propagates it, and masks
    /// the result to 521 bits, which folds a multiple of p back in.
    fn decrement(limbs: &mut [Limb; LIMBS], borrow: Limb) {
        let mut borrow: Wide = borrow.widen();
        for limb in limbs.iter_mut() {
            let diff = Limb::wide_wrapping_sub((*limb).widen(), borrow);
            *limb = Limb::truncate(diff);
            borrow = (diff >> Limb::BITS) & Limb::ONE.widen();
        }
        limbs[LIMBS - 1] &= TOP_MASK;
    }

    pub fn add(&self, rhs: &Self) -> Self {
        let mut sum = [Limb::MIN; LIMBS];
        bignum::add(&mut sum, &self.0, &rhs.0);
        Self::reduce_quick(&mut sum);
        Self(sum)
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        let mut diff = [Limb::MIN; LIMBS];
        let borrow = bignum::sub(&mut diff, &self.0, &rhs.0);
        // A borrow means the result went negative; subtracting the borrow
        // again and masking to 521 bits adds p back in.
        Self::decrement(&mut diff, borrow);
        Self(diff)
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        let mut wide = [Limb::MIN; WIDE_LIMBS];
        bignum::mul(&mut wide, &self.0, &rhs.0);
        Self::reduce_wide(&wide)
    }

    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Reduces a 1042-bit product modulo p.
    ///
    /// Adds the bits above position 521 into the low 521 bits with the
    /// trial subtraction of p folded into the same carry chain: the
    /// initial `+ 1` and the final fixup together perform it.
    fn reduce_wide(wide: &[Limb; WIDE_LIMBS]) -> Self {
        let mut result = [Limb::MIN; LIMBS];
        let split = wide[LIMBS - 1];
        let mut carry: Wide = (split >> TOP_BITS).widen() + Limb::ONE.widen();
        let low = split & TOP_MASK;
        for i in 0..LIMBS - 1 {
            carry = carry + wide[i].widen() + (wide[LIMBS + i].widen() << (Limb::BITS - TOP_BITS));
            result[i] = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }
        carry = carry + low.widen() + (wide[WIDE_LIMBS - 1].widen() << (Limb::BITS - TOP_BITS));
        result[LIMBS - 1] = Limb::truncate(carry);
        Self::fixup(&mut result);
        Self(result)
    }

    /// Multiplies by a small public literal (at most 127).
    ///
    /// The product spills into the top limb only, so the general fold
    /// collapses to a single extra carry chain.
    pub fn mul_small(&self, value: u32) -> Self {
        let factor = (value as Limb).widen();
        let mut result = [Limb::MIN; LIMBS];
        let mut carry: Wide = Limb::MIN.widen();
        for i in 0..LIMBS {
            carry = carry + self.0[i].widen() * factor;
            result[i] = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }

        let split = result[LIMBS - 1];
        let mut carry: Wide = (split >> TOP_BITS).widen() + Limb::ONE.widen();
        let low = split & TOP_MASK;
        for i in 0..LIMBS - 1 {
            carry = carry + result[i].widen();
            result[i] = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }
        carry = carry + low.widen();
        result[LIMBS - 1] = Limb::truncate(carry);
        Self::fixup(&mut result);
        Self(result)
    }

    /// Constant-time inversion via Fermat: self^(p - 2).
    pub fn invert(&self) -> Self {
        // p - 2 is 512 ones followed by the nine bits 111111101. Build a
        // 4-bit run of ones, double the run length up to 512, then walk
        // the tail bits explicitly.
        let mut result = self.square();
        result = result.mul(self);
        result = result.square();
        result = result.mul(self);
        result = result.square();
        result = result.mul(self);

        let mut power = 4;
        while power <= 256 {
            let mut t = result.square();
            for _ in 1..power {
                t = t.square();
            }
            result = result.mul(&t);
            power <<= 1;
        }

        for _ in 0..7 {
            result = result.square();
            result = result.mul(self);
        }
        result = result.square();
        result = result.square();
        result.mul(self)
    }

    pub fn is_zero(&self) -> Choice {
        bignum::is_zero(&self.0)
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        // Elements are always fully reduced, so limb equality suffices.
        self.0.ct_eq(&other.0)
    }
}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut limbs = [Limb::MIN; LIMBS];
        for (i, limb) in limbs.iter_mut().enumerate() {
            *limb = Limb::conditional_select(&a.0[i], &b.0[i], choice);
        }
        Self(limbs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(n: u8) -> FieldElement {
        let mut bytes = [0u8; 66];
        bytes[65] = n;
        FieldElement::from_bytes(&bytes)
    }

    fn modulus_bytes() -> [u8; 66] {
        let mut bytes = [0xffu8; 66];
        bytes[0] = 0x01;
        bytes
    }

    #[test]
    fn small_arithmetic() {
        assert_eq!(elem(2).add(&elem(3)).to_bytes(), elem(5).to_bytes());
        assert_eq!(elem(7).mul(&elem(6)).to_bytes(), elem(42).to_bytes());
        assert_eq!(elem(9).sub(&elem(4)).to_bytes(), elem(5).to_bytes());
        assert_eq!(elem(5).mul_small(8).to_bytes(), elem(40).to_bytes());
    }

    #[test]
    fn sub_wraps_through_modulus() {
        // 0 - 1 = p - 1 = 2^521 - 2
        let minus_one = FieldElement::ZERO.sub(&FieldElement::ONE);
        let mut expected = modulus_bytes();
        expected[65] = 0xfe;
        assert_eq!(minus_one.to_bytes(), expected);
    }

    #[test]
    fn minus_one_squares_to_one() {
        let minus_one = FieldElement::ZERO.sub(&FieldElement::ONE);
        assert_eq!(minus_one.square().to_bytes(), FieldElement::ONE.to_bytes());
    }

    #[test]
    fn reduce_quick_canonicalizes() {
        // p itself reduces to zero.
        let mut p = FieldElement::from_bytes(&modulus_bytes()).0;
        FieldElement::reduce_quick(&mut p);
        assert_eq!(p, FieldElement::ZERO.0);

        let mut small = FieldElement::ONE.0;
        FieldElement::reduce_quick(&mut small);
        assert_eq!(small, FieldElement::ONE.0);
    }

    #[test]
    fn in_range_boundaries() {
        let p = FieldElement::from_bytes(&modulus_bytes());
        assert!(!bool::from(p.in_range()));

        let p_minus_one = FieldElement::ZERO.sub(&FieldElement::ONE);
        assert!(bool::from(p_minus_one.in_range()));
        assert!(bool::from(FieldElement::ZERO.in_range()));
    }

    #[test]
    fn invert_round_trips() {
        let x = elem(123);
        let product = x.mul(&x.invert());
        assert_eq!(product.to_bytes(), FieldElement::ONE.to_bytes());
    }
}
