//! Arithmetic modulo the group order q.
//!
//! Products are reduced with Barrett's method: with m = floor(4^521 / q)
//! precomputed, `r - q * floor(m * r / 4^521)` is at most one subtraction
//! of q away from `r mod q`. Inversion is Fermat exponentiation by the
//! public constant q - 2.

use bignum::{Limb, Word};
use hex_literal::hex;
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::arithmetic::field::{LIMBS, WIDE_LIMBS};

/// The group order q from FIPS 186-4, big-endian.
pub(crate) const ORDER: [u8; 66] = hex!(
    "01"
    "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
    "fa"
    "51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e91386409"
);

/// floor(4^521 / q), the 522-bit Barrett constant, big-endian.
const BARRETT_M: [u8; 66] = hex!(
    "0200"
    "00000000000000000000000000000000000000000000000000000000"
    "00000005"
    "ae79787c40d069948033feb708f65a2fc44a36477663b851449048e16ec79bf7"
);

/// Low 265 bits of q - 2, little-endian; the high 256 bits are all ones.
const ORDER_M2_LOW: [u8; 34] =
    hex!("076438911eb76fbbae479c89b8c9b53bd0a509f74801cc7f6b962fbf83878651fa01");

/// An integer modulo the group order q.
#[derive(Clone, Copy, Debug, Zeroize)]
pub(crate) struct Scalar(pub(crate) [Limb; LIMBS]);

impl Scalar {
    fn order() -> [Limb; LIMBS] {
        let mut limbs = [Limb::MIN; LIMBS];
        bignum::unpack_be(&mut limbs, &ORDER);
        limbs
    }

    /// Interprets 66 big-endian bytes as a scalar.
    ///
    /// The value is used as-is; callers that accept untrusted input
    /// check [`is_valid`][Self::is_valid] first.
    pub fn from_bytes(bytes: &[u8; 66]) -> Self {
        let mut limbs = [Limb::MIN; LIMBS];
        bignum::unpack_be(&mut limbs, bytes);
        Self(limbs)
    }

    pub fn to_bytes(&self) -> [u8; 66] {
        let mut bytes = [0u8; 66];
        bignum::pack_be(&mut bytes, &self.0);
        bytes
    }

    /// Whether the value is in `[1, q - 1]`. Variable time, for public
    /// inputs such as signature components.
    pub fn is_valid(&self) -> bool {
        let mut diff = [Limb::MIN; LIMBS];
        let borrow = bignum::sub(&mut diff, &self.0, &Self::order());
        borrow == Limb::ONE && !bool::from(self.is_zero())
    }

    /// Brings a raw 521-bit value below q with one trial subtraction.
    pub fn reduce_once(limbs: &[Limb; LIMBS]) -> Self {
        let mut result = [Limb::MIN; LIMBS];
        bignum::reduce_quick(&mut result, limbs, &Self::order());
        Self(result)
    }

    /// Adds two scalars, at least one of which is below q, so a single
    /// trial subtraction reduces the sum.
    pub fn add(&self, rhs: &Self) -> Self {
        let mut sum = [Limb::MIN; LIMBS];
        bignum::add(&mut sum, &self.0, &rhs.0);
        Self::reduce_once(&sum)
    }

    /// Barrett reduction of a 1042-bit value modulo q.
    pub fn reduce_wide(wide: &[Limb; WIDE_LIMBS]) -> Self {
        let mut m = [Limb::MIN; LIMBS];
        bignum::unpack_be(&mut m, &BARRETT_M);

        // Quotient estimate floor(wide * m / 2^1042), off by at most one.
        let mut product = [Limb::MIN; WIDE_LIMBS + LIMBS];
        bignum::mul(&mut product, wide, &m);
        let mut estimate = [Limb::MIN; LIMBS];
        bignum::shr_bits(&mut estimate, &product, 1042);

        // Subtract estimate * q from the input. Only the low limbs of
        // either side can differ, so the high limbs are never formed.
        let mut correction = [Limb::MIN; WIDE_LIMBS];
        bignum::mul(&mut correction, &estimate, &Self::order());
        let mut remainder = [Limb::MIN; LIMBS];
        bignum::sub(&mut remainder, &wide[..LIMBS], &correction[..LIMBS]);
        let result = Self::reduce_once(&remainder);

        product.zeroize();
        estimate.zeroize();
        correction.zeroize();
        remainder.zeroize();
        result
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        let mut wide = [Limb::MIN; WIDE_LIMBS];
        bignum::mul(&mut wide, &self.0, &rhs.0);
        let result = Self::reduce_wide(&wide);
        wide.zeroize();
        result
    }

    /// Inversion via Fermat: self^(q - 2). The exponent is public, so
    /// the low-bit scan may branch on it.
    pub fn invert(&self) -> Self {
        // The high 256 bits of q - 2 are all ones: build a 4-bit run of
        // ones and double the run length up to 256.
        let mut result = self.mul(self);
        result = result.mul(self);
        result = result.mul(&result);
        result = result.mul(self);
        result = result.mul(&result);
        result = result.mul(self);

        let mut power = 4;
        while power <= 128 {
            let mut t = result.mul(&result);
            for _ in 1..power {
                t = t.mul(&t);
            }
            result = result.mul(&t);
            power <<= 1;
        }

        // Square-and-multiply over the irregular low 265 bits.
        let mut bit = 265;
        while bit > 0 {
            bit -= 1;
            result = result.mul(&result);
            if (ORDER_M2_LOW[bit / 8] >> (bit % 8)) & 1 != 0 {
                result = result.mul(self);
            }
        }
        result
    }

    pub fn is_zero(&self) -> Choice {
        bignum::is_zero(&self.0)
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(n: u8) -> Scalar {
        let mut bytes = [0u8; 66];
        bytes[65] = n;
        Scalar::from_bytes(&bytes)
    }

    #[test]
    fn order_reduces_to_zero() {
        let mut wide = [Limb::MIN; WIDE_LIMBS];
        bignum::unpack_be(&mut wide, &ORDER);
        let reduced = Scalar::reduce_wide(&wide);
        assert!(bool::from(reduced.is_zero()));

        let reduced = Scalar::reduce_once(&Scalar::from_bytes(&ORDER).0);
        assert!(bool::from(reduced.is_zero()));
    }

    #[test]
    fn small_values_survive_reduction() {
        let x = scalar(42);
        assert_eq!(Scalar::reduce_once(&x.0).to_bytes(), x.to_bytes());
        assert_eq!(x.mul(&scalar(1)).to_bytes(), x.to_bytes());
    }

    #[test]
    fn add_wraps_through_order() {
        // (q - 1) + 2 = 1 mod q
        let mut q_minus_one = ORDER;
        q_minus_one[65] -= 1;
        let sum = Scalar::from_bytes(&q_minus_one).add(&scalar(2));
        assert_eq!(sum.to_bytes(), scalar(1).to_bytes());
    }

    #[test]
    fn invert_round_trips() {
        let x = scalar(0x39);
        let product = x.mul(&x.invert());
        assert_eq!(product.to_bytes(), scalar(1).to_bytes());
    }

    #[test]
    fn validity_bounds() {
        assert!(scalar(1).is_valid());
        assert!(!scalar(0).is_valid());
        assert!(!Scalar::from_bytes(&ORDER).is_valid());

        let mut q_minus_one = ORDER;
        q_minus_one[65] -= 1;
        assert!(Scalar::from_bytes(&q_minus_one).is_valid());
    }
}
