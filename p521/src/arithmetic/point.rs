//! Jacobian point arithmetic on the P-521 curve.
//!
//! A point (x, y, z) corresponds to the affine point (x / z^2, y / z^3);
//! z = 0 encodes the identity. Scalar multiplication walks all 521 bits
//! with a double-and-add-always ladder, conditionally keeping the sum,
//! so the sequence of field operations never depends on the scalar.

use hex_literal::hex;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::arithmetic::field::FieldElement;

/// Coefficient b of y^2 = x^3 - 3x + b (FIPS 186-4), big-endian.
const COEFF_B: [u8; 66] = hex!(
    "0051953eb9618e1c9a1f929a21a0b68540eea2da725b99b315f3b8b489918ef1"
    "09e156193951ec7e937b1652c0bd3bb1bf073573df883d2c34f1ef451fd46b50"
    "3f00"
);

/// Generator x co-ordinate (FIPS 186-4), big-endian.
const GENERATOR_X: [u8; 66] = hex!(
    "00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d"
    "3dbaa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5"
    "bd66"
);

/// Generator y co-ordinate (FIPS 186-4), big-endian.
const GENERATOR_Y: [u8; 66] = hex!(
    "011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e"
    "662c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd1"
    "6650"
);

/// A point in Jacobian co-ordinates.
#[derive(Clone, Copy, Debug)]
struct ProjectivePoint {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl ProjectivePoint {
    const IDENTITY: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ZERO,
        z: FieldElement::ZERO,
    };

    /// Jacobian doubling (dbl-2001-b). The identity doubles to itself
    /// with no special handling, since z stays zero throughout.
    fn double(&self) -> Self {
        let delta = self.z.square();
        let gamma = self.y.square();
        let beta = self.x.mul(&gamma);
        let alpha = self.x.sub(&delta).mul_small(3).mul(&self.x.add(&delta));
        let x = alpha.square().sub(&beta.mul_small(8));
        let z = self.y.add(&self.z).square().sub(&gamma).sub(&delta);
        let y = beta.mul_small(4).sub(&x).mul(&alpha).sub(&gamma.square().mul_small(8));
        Self { x, y, z }
    }

    /// Mixed Jacobian + affine addition (add-2007-bl with z2 = 1).
    ///
    /// When `self` is the identity the affine operand is selected as the
    /// result instead, without branching on z.
    fn add_mixed(&self, x2: &FieldElement, y2: &FieldElement) -> Self {
        let identity = self.z.is_zero();

        let z1z1 = self.z.square();
        let u2 = x2.mul(&z1z1);
        let s2 = y2.mul(&self.z).mul(&z1z1);
        let h = u2.sub(&self.x);
        let i = h.mul_small(2).square();
        let r = s2.sub(&self.y);
        let r = r.add(&r);
        let j = h.mul(&i);
        let v = self.x.mul(&i);

        let mut x = r.square().sub(&j).sub(&v).sub(&v);
        let mut y = r.mul(&v.sub(&x));
        let yj = self.y.mul(&j);
        y = y.sub(&yj).sub(&yj);
        let mut z = self.z.mul(&h);
        z = z.add(&z);

        x.conditional_assign(x2, identity);
        y.conditional_assign(y2, identity);
        z.conditional_assign(&FieldElement::ONE, identity);
        Self { x, y, z }
    }

    fn to_affine(&self) -> (FieldElement, FieldElement) {
        let z_inv = self.z.invert();
        let z_inv2 = z_inv.square();
        (self.x.mul(&z_inv2), self.y.mul(&z_inv2.mul(&z_inv)))
    }
}

impl ConditionallySelectable for ProjectivePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

/// The generator point G in affine co-ordinates.
pub(crate) fn generator() -> (FieldElement, FieldElement) {
    (
        FieldElement::from_bytes(&GENERATOR_X),
        FieldElement::from_bytes(&GENERATOR_Y),
    )
}

/// Splits a 132-byte point into its affine co-ordinates.
pub(crate) fn unpack(bytes: &[u8; 132]) -> (FieldElement, FieldElement) {
    let mut half = [0u8; 66];
    half.copy_from_slice(&bytes[..66]);
    let x = FieldElement::from_bytes(&half);
    half.copy_from_slice(&bytes[66..]);
    let y = FieldElement::from_bytes(&half);
    (x, y)
}

/// Serializes affine co-ordinates as x then y, 66 big-endian bytes each.
pub(crate) fn pack(result: &mut [u8; 132], x: &FieldElement, y: &FieldElement) {
    result[..66].copy_from_slice(&x.to_bytes());
    result[66..].copy_from_slice(&y.to_bytes());
}

/// Multiplies the affine point (x, y) by a 521-bit big-endian scalar in
/// place, in constant time.
pub(crate) fn scalar_mul(x: &mut FieldElement, y: &mut FieldElement, f: &[u8; 66]) {
    let mut acc = ProjectivePoint::IDENTITY;

    // Bit 520 lives in the low bit of the first byte; it needs no
    // doubling, only a conditional load of the input point.
    let select = Choice::from(f[0] & 0x01);
    acc.x.conditional_assign(x, select);
    acc.y.conditional_assign(y, select);
    acc.z.conditional_assign(&FieldElement::ONE, select);

    for t in (0..520).rev() {
        acc = acc.double();
        // The sum is always formed; the bit only decides whether to keep
        // it.
        let sum = acc.add_mixed(x, y);
        let bit = (f[65 - t / 8] >> (t % 8)) & 1;
        acc.conditional_assign(&sum, Choice::from(bit));
    }

    let (ax, ay) = acc.to_affine();
    *x = ax;
    *y = ay;
}

/// Adds two affine points, writing the result over the first.
///
/// The points must be distinct; the composite is only used on public
/// verification values.
pub(crate) fn add_affine(
    x1: &mut FieldElement,
    y1: &mut FieldElement,
    x2: &FieldElement,
    y2: &FieldElement,
) {
    let p = ProjectivePoint {
        x: *x1,
        y: *y1,
        z: FieldElement::ONE,
    };
    let (ax, ay) = p.add_mixed(x2, y2).to_affine();
    *x1 = ax;
    *y1 = ay;
}

/// Whether (x, y) is a point on the curve.
///
/// Out-of-range co-ordinates fail, but the curve equation is still
/// evaluated so both rejection paths look alike.
pub(crate) fn validate(x: &FieldElement, y: &FieldElement) -> bool {
    let mut ok = x.in_range() & y.in_range();
    let b = FieldElement::from_bytes(&COEFF_B);
    let rhs = x.square().mul(x).sub(&x.mul_small(3)).add(&b);
    ok &= rhs.ct_eq(&y.square());
    bool::from(ok)
}

/// Evaluates the raw curve function f * P.
///
/// `f` is a 521-bit scalar in 66 big-endian bytes. `point` is an
/// uncompressed curve point, x then y; `None` selects the generator.
/// The affine product is written to `result` as x then y.
///
/// Returns `false` when `point` is not on the curve. The multiplication
/// still runs in that case, so acceptance and rejection take similar
/// time; the result bytes are meaningless on failure.
///
/// Protocol layers normally use [`ecdh`][crate::ecdh] or
/// [`ecdsa`][crate::ecdsa] instead of calling this directly.
pub fn evaluate(result: &mut [u8; 132], f: &[u8; 66], point: Option<&[u8; 132]>) -> bool {
    let (mut x, mut y, ok) = match point {
        Some(bytes) => {
            let (x, y) = unpack(bytes);
            let ok = validate(&x, &y);
            (x, y, ok)
        }
        None => {
            let (x, y) = generator();
            (x, y, true)
        }
    };

    scalar_mul(&mut x, &mut y, f);
    pack(result, &x, &y);
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_bytes(n: u8) -> [u8; 66] {
        let mut bytes = [0u8; 66];
        bytes[65] = n;
        bytes
    }

    #[test]
    fn generator_is_on_the_curve() {
        let (x, y) = generator();
        assert!(validate(&x, &y));
    }

    #[test]
    fn off_curve_point_is_rejected() {
        let (x, y) = generator();
        let bumped = y.add(&FieldElement::ONE);
        assert!(!validate(&x, &bumped));
    }

    #[test]
    fn multiplying_by_one_returns_the_point() {
        let (gx, gy) = generator();
        let (mut x, mut y) = generator();
        scalar_mul(&mut x, &mut y, &scalar_bytes(1));
        assert_eq!(x.to_bytes(), gx.to_bytes());
        assert_eq!(y.to_bytes(), gy.to_bytes());
    }

    #[test]
    fn ladder_agrees_with_plain_doubling() {
        let (gx, gy) = generator();
        let doubled = ProjectivePoint {
            x: gx,
            y: gy,
            z: FieldElement::ONE,
        }
        .double()
        .to_affine();

        let (mut x, mut y) = generator();
        scalar_mul(&mut x, &mut y, &scalar_bytes(2));
        assert_eq!(x.to_bytes(), doubled.0.to_bytes());
        assert_eq!(y.to_bytes(), doubled.1.to_bytes());
        assert!(validate(&x, &y));
    }

    #[test]
    fn ladder_distributes_over_addition() {
        // 5G computed directly matches 2G + 3G via the affine composite.
        let (mut x5, mut y5) = generator();
        scalar_mul(&mut x5, &mut y5, &scalar_bytes(5));

        let (mut x2, mut y2) = generator();
        scalar_mul(&mut x2, &mut y2, &scalar_bytes(2));
        let (mut x3, mut y3) = generator();
        scalar_mul(&mut x3, &mut y3, &scalar_bytes(3));
        add_affine(&mut x2, &mut y2, &x3, &y3);

        assert_eq!(x2.to_bytes(), x5.to_bytes());
        assert_eq!(y2.to_bytes(), y5.to_bytes());
    }

    #[test]
    fn evaluate_reports_validity() {
        let mut result = [0u8; 132];
        assert!(evaluate(&mut result, &scalar_bytes(1), None));

        let (x, y) = generator();
        let mut point = [0u8; 132];
        pack(&mut point, &x, &y);
        assert_eq!(result, point);

        point[70] ^= 0x01;
        assert!(!evaluate(&mut result, &scalar_bytes(1), Some(&point)));
    }
}
