//! Arithmetic modulo p = 2^255 - 19.
//!
//! Elements are little-endian limb arrays, always kept fully reduced.
//! Multiplication reduces its double-width product with two folding passes
//! that rewrite the high 256 bits using 2^255 = 19 (mod p), followed by a
//! single trial subtraction. Everything except [`FieldElement::sqrt`] runs
//! in constant time.

use bignum::{Limb, Word};
use hex_literal::hex;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// Limbs per 256-bit value.
pub(crate) const LIMBS: usize = 256 / Limb::BITS as usize;

/// Limbs per 512-bit product.
pub(crate) const WIDE_LIMBS: usize = 2 * LIMBS;

type Wide = <Limb as Word>::Wide;

/// Bit position of bit 255 within the top limb.
const TOP_BIT: u32 = Limb::BITS - 1;

/// Mask that clears bit 255 of the top limb.
const TOP_MASK: Limb = Limb::MAX >> 1;

/// p = 2^255 - 19 as limbs.
const MODULUS: [Limb; LIMBS] = {
    let mut limbs = [Limb::MAX; LIMBS];
    limbs[0] = Limb::MAX - 18;
    limbs[LIMBS - 1] = Limb::MAX >> 1;
    limbs
};

/// sqrt(-1) mod p, used to fix up square root candidates.
const SQRT_M1: [u8; 32] = hex!("b0a00e4a271beec478e42fad0618432fa7d7fb3d99004d2b0bdfc14f8024832b");

/// An element of the field modulo 2^255 - 19.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FieldElement(pub(crate) [Limb; LIMBS]);

impl FieldElement {
    pub const ZERO: Self = Self([Limb::MIN; LIMBS]);

    pub const ONE: Self = {
        let mut limbs = [Limb::MIN; LIMBS];
        limbs[0] = 1;
        Self(limbs)
    };

    /// Interprets 32 little-endian bytes as an element.
    ///
    /// The value is used as-is; callers that need bit 255 masked off or a
    /// range check perform those themselves.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [Limb::MIN; LIMBS];
        bignum::unpack_le(&mut limbs, bytes);
        Self(limbs)
    }

    pub fn to_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bignum::pack_le(&mut bytes, &self.0);
        bytes
    }

    /// Conditionally subtracts p from a raw limb array, bringing values in
    /// `[0, 2p)` into canonical form.
    ///
    /// Returns 1 if the value was already below p. The subtraction is a
    /// trial "add 19, drop 2^255" so the borrow can be read off the top
    /// bit without a separate comparison.
    pub fn reduce_quick(limbs: &mut [Limb; LIMBS]) -> Choice {
        let mut carry: Wide = Limb::from_u8(19).widen();
        let mut trial = [Limb::MIN; LIMBS];
        for (i, t) in trial.iter_mut().enumerate() {
            carry = carry + limbs[i].widen();
            *t = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }
        // Top bit set means no borrow occurred, so the subtracted value is
        // the canonical one.
        let subtracted = Choice::from((trial[LIMBS - 1] >> TOP_BIT).low_u8());
        trial[LIMBS - 1] &= TOP_MASK;
        bignum::conditional_assign(limbs, &trial, subtracted);
        !subtracted
    }

    pub fn add(&self, rhs: &Self) -> Self {
        // Both inputs are below 2^255, so the sum cannot carry out of the
        // top limb and a single trial subtraction finishes the job.
        let mut sum = [Limb::MIN; LIMBS];
        bignum::add(&mut sum, &self.0, &rhs.0);
        Self::reduce_quick(&mut sum);
        Self(sum)
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        let mut diff = [Limb::MIN; LIMBS];
        let borrow = bignum::sub(&mut diff, &self.0, &rhs.0);
        // A borrow means the result went negative; add p back. Both sums
        // are computed so timing does not depend on the borrow.
        let mut fixed = [Limb::MIN; LIMBS];
        bignum::add(&mut fixed, &diff, &MODULUS);
        bignum::conditional_assign(&mut diff, &fixed, Choice::from(borrow.low_u8()));
        Self(diff)
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        let mut wide = [Limb::MIN; WIDE_LIMBS];
        bignum::mul(&mut wide, &self.0, &rhs.0);
        Self::reduce_wide(&mut wide)
    }

    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Multiplies by a small public constant such as a24 = 121665.
    pub fn mul_small(&self, value: u32) -> Self {
        let factor = [value as Limb];
        let mut wide = [Limb::MIN; WIDE_LIMBS];
        bignum::mul(&mut wide[..LIMBS + 1], &self.0, &factor);
        Self::reduce_wide(&mut wide)
    }

    /// Reduces a 512-bit product modulo p.
    ///
    /// Folds the high half back into the low half twice using
    /// 2^255 = 19 (mod p), then performs one constant-time trial
    /// subtraction.
    fn reduce_wide(wide: &mut [Limb; WIDE_LIMBS]) -> Self {
        let nineteen = Limb::from_u8(19).widen();
        let thirty_eight = Limb::from_u8(38).widen();

        // First pass: (x mod 2^255) + (x >> 255) * 19. Limbs above bit 256
        // contribute with weight 2^256 = 38 (mod p).
        let mut carry: Wide = (wide[LIMBS - 1] >> TOP_BIT).widen() * nineteen;
        wide[LIMBS - 1] &= TOP_MASK;
        for i in 0..LIMBS {
            carry = carry + wide[i].widen() + wide[LIMBS + i].widen() * thirty_eight;
            wide[i] = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }

        // Second pass absorbs the carry out of the first. It may be a
        // no-op but always runs to keep the timing fixed.
        carry = carry * thirty_eight + (wide[LIMBS - 1] >> TOP_BIT).widen() * nineteen;
        wide[LIMBS - 1] &= TOP_MASK;
        for i in 0..LIMBS {
            carry = carry + wide[i].widen();
            wide[i] = Limb::truncate(carry);
            carry = carry >> Limb::BITS;
        }

        let mut result = [Limb::MIN; LIMBS];
        result.copy_from_slice(&wide[..LIMBS]);
        Self::reduce_quick(&mut result);
        Self(result)
    }

    /// Computes self^(2^250 - 1), the shared prefix of the inversion and
    /// square root exponents.
    ///
    /// Builds the all-ones run from a repeated 0000000001 bit pattern,
    /// which needs roughly 1.1 multiplications per set bit instead of 2.
    fn pow250(&self) -> Self {
        const GROUP: usize = 10;

        // t = self^(2^10), result = self^(2^10 + 1): two set bits spaced
        // ten apart.
        let mut t = self.square();
        for _ in 0..GROUP - 1 {
            t = t.square();
        }
        let mut result = t.mul(self);

        // Extend the pattern to 25 set bits covering all 250 positions.
        for _ in 0..(250 / GROUP) - 2 {
            for _ in 0..GROUP {
                t = t.square();
            }
            result = result.mul(&t);
        }

        // Shift-and-multiply the pattern into itself to fill the gaps.
        t = result.square();
        result = result.mul(&t);
        for _ in 0..GROUP - 2 {
            t = t.square();
            result = result.mul(&t);
        }
        result
    }

    /// Constant-time inversion via Fermat: self^(p - 2).
    pub fn invert(&self) -> Self {
        // p - 2 ends in the bits 01011 after 250 leading ones.
        let mut result = self.pow250();
        result = result.square();
        result = result.square();
        result = result.mul(self);
        result = result.square();
        result = result.square();
        result = result.mul(self);
        result = result.square();
        result = result.mul(self);
        result
    }

    /// Computes a square root of `self`, if one exists.
    ///
    /// Either root may be returned; callers pick the sign they need.
    /// Not constant time, for use on public values only.
    pub fn sqrt(&self) -> Option<Self> {
        // Candidate root: self^((p + 3) / 8) = self^(2^252 - 2).
        let mut candidate = self.pow250();
        candidate = candidate.square();
        candidate = candidate.mul(self);
        candidate = candidate.square();

        if bool::from(candidate.square().ct_eq(self)) {
            return Some(candidate);
        }

        // Wrong sign of the internal exponentiation: multiply by sqrt(-1).
        let candidate = candidate.mul(&Self::from_bytes(&SQRT_M1));
        if bool::from(candidate.square().ct_eq(self)) {
            return Some(candidate);
        }

        None
    }

    pub fn is_zero(&self) -> Choice {
        bignum::is_zero(&self.0)
    }

    pub fn conditional_swap(a: &mut Self, b: &mut Self, choice: Choice) {
        bignum::conditional_swap(&mut a.0, &mut b.0, choice);
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
