//! Ed25519 digital signatures ([RFC 8032]).
//!
//! Signing is deterministic: the nonce is derived from the private key
//! and the message through SHA-512, so no random number generator is
//! needed at signing time and repeating a signature never leaks the key.
//! Curve points use extended homogeneous coordinates (x, y, z, t) with
//! x * y = z * t, which gives a complete addition law with no special
//! cases for doubling or the identity.
//!
//! Scalar multiplication by secret values (signing, public key
//! derivation) processes every bit identically; verification only
//! handles public values and skips the additions for zero bits.
//!
//! [RFC 8032]: https://tools.ietf.org/html/rfc8032

use crate::field::{FieldElement, LIMBS, WIDE_LIMBS};
use bignum::{Limb, Word};
use hex_literal::hex;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Length of an Ed25519 secret key in bytes.
pub const SECRET_KEY_SIZE: usize = 32;

/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// The curve constant d.
const D: [u8; 32] = hex!("a3785913ca4deb75abd841414d0a700098e879777940c78c73fe6f2bee6c0352");

/// 2 * d, used by the addition formulas.
const D2: [u8; 32] = hex!("59f1b226949bd6eb56b183829a14e00030d1f3eef2808e19e7fcdf56dcd90624");

/// Extended homogeneous coordinates of the base point B.
const BASE_X: [u8; 32] = hex!("1ad5258f602d56c9b2a7259560c72c695cdcd6fd31e2a4c0fe536ecdd3366921");
const BASE_Y: [u8; 32] = hex!("5866666666666666666666666666666666666666666666666666666666666666");
const BASE_T: [u8; 32] = hex!("a3ddb7a5b38ade6df5525177809ff0207de3ab648e4eea6665768bd70f5f8767");

/// The group order q = 2^252 + 27742317777372353535851937790883648493.
const ORDER: [u8; 32] = hex!("edd3f55c1a631258d69cf7a2def9de1400000000000000000000000000000010");

/// floor(2^512 / q), the Barrett reciprocal for reduction modulo q.
///
/// The natural Barrett constant for a 253-bit modulus would be
/// floor(4^253 / q) = floor(2^506 / q); six extra bits of precision line
/// the shift up with the 512-bit input at the cost of one more trial
/// subtraction.
const BARRETT_M: [u8; 33] =
    hex!("1b132c0aa3e59ceda72963085d210621ebffffffffffffffffffffffffffffff0f");

/// A curve point in extended homogeneous coordinates.
#[derive(Clone, Copy)]
struct Point {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
    t: FieldElement,
}

impl Point {
    /// The neutral element (0, 1, 1, 0).
    const IDENTITY: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ONE,
        z: FieldElement::ONE,
        t: FieldElement::ZERO,
    };

    fn base() -> Self {
        Self {
            x: FieldElement::from_bytes(&BASE_X),
            y: FieldElement::from_bytes(&BASE_Y),
            z: FieldElement::ONE,
            t: FieldElement::from_bytes(&BASE_T),
        }
    }

    /// `self += other` using the unified extended-coordinate formulas.
    fn add(&mut self, other: &Point) {
        let a = self.y.sub(&self.x).mul(&other.y.sub(&other.x));
        let b = self.y.add(&self.x).mul(&other.y.add(&other.x));
        let c = self.t.mul(&other.t).mul(&FieldElement::from_bytes(&D2));
        let d = self.z.mul(&other.z).double();
        let e = b.sub(&a);
        let f = d.sub(&c);
        let g = d.add(&c);
        let h = b.add(&a);
        self.x = e.mul(&f);
        self.y = g.mul(&h);
        self.z = f.mul(&g);
        self.t = e.mul(&h);
    }

    /// `self = 2 * self`; the addition formulas with squarings folded in.
    fn double(&mut self) {
        let a = self.y.sub(&self.x).square();
        let b = self.y.add(&self.x).square();
        let c = self.t.square().mul(&FieldElement::from_bytes(&D2));
        let d = self.z.square().double();
        let e = b.sub(&a);
        let f = d.sub(&c);
        let g = d.add(&c);
        let h = b.add(&a);
        self.x = e.mul(&f);
        self.y = g.mul(&h);
        self.z = f.mul(&g);
        self.t = e.mul(&h);
    }

    fn conditional_assign(&mut self, other: &Point, choice: Choice) {
        self.x = FieldElement::conditional_select(&self.x, &other.x, choice);
        self.y = FieldElement::conditional_select(&self.y, &other.y, choice);
        self.z = FieldElement::conditional_select(&self.z, &other.z, choice);
        self.t = FieldElement::conditional_select(&self.t, &other.t, choice);
    }

    /// Projective comparison by cross-multiplying out the z denominators.
    fn ct_eq(&self, other: &Point) -> Choice {
        let xz = self.x.mul(&other.z);
        let zx = other.x.mul(&self.z);
        let yz = self.y.mul(&other.z);
        let zy = other.y.mul(&self.z);
        xz.ct_eq(&zx) & yz.ct_eq(&zy)
    }

    /// Encodes the point as 32 bytes: the y-coordinate with the low bit
    /// of x folded into the top bit.
    fn encode(&self) -> [u8; 32] {
        let zinv = self.z.invert();
        let x = self.x.mul(&zinv);
        let y = self.y.mul(&zinv);
        let mut bytes = y.to_bytes();
        bytes[31] |= (x.to_bytes()[0] & 1) << 7;
        bytes
    }

    /// Decodes a point, recovering x from y via the curve equation.
    ///
    /// Returns `None` if the bytes do not name a curve point. Not
    /// constant time, for use on public values only.
    fn decode(bytes: &[u8; 32]) -> Option<Point> {
        let sign = bytes[31] >> 7;
        let mut y_limbs = [Limb::MIN; LIMBS];
        bignum::unpack_le(&mut y_limbs, bytes);
        y_limbs[LIMBS - 1] &= Limb::MAX >> 1;
        let y = FieldElement(y_limbs);

        // x^2 = (y^2 - 1) / (d * y^2 + 1)
        let yy = y.square();
        let u = yy.sub(&FieldElement::ONE);
        let v = yy.mul(&FieldElement::from_bytes(&D)).add(&FieldElement::ONE);
        let xx = u.mul(&v.invert());

        if bool::from(xx.is_zero()) {
            // x = 0 has no odd square root to select.
            if sign != 0 {
                return None;
            }
            return Some(Point {
                x: FieldElement::ZERO,
                y,
                z: FieldElement::ONE,
                t: FieldElement::ZERO,
            });
        }

        let mut x = xx.sqrt()?;
        if x.to_bytes()[0] & 1 != sign {
            x = FieldElement::ZERO.sub(&x);
        }
        let t = x.mul(&y);
        Some(Point {
            x,
            y,
            z: FieldElement::ONE,
            t,
        })
    }
}

/// `scalar * point` with a secret scalar: double-and-add-always over the
/// low 255 bits, selecting each addition result in constant time.
fn scalar_mul_secret(scalar: &[Limb; LIMBS], point: &Point) -> Point {
    let mut doubled = *point;
    let mut result = Point::IDENTITY;
    for i in 0..255 {
        let bit = (scalar[i / Limb::BITS as usize] >> (i as u32 % Limb::BITS)) & 1;
        let mut sum = result;
        sum.add(&doubled);
        result.conditional_assign(&sum, Choice::from(bit.low_u8()));
        doubled.double();
    }
    result
}

/// `scalar * point` with a public scalar: plain double-and-add.
fn scalar_mul_public(scalar: &[Limb; LIMBS], point: &Point) -> Point {
    let mut doubled = *point;
    let mut result = Point::IDENTITY;
    for i in 0..255 {
        let bit = (scalar[i / Limb::BITS as usize] >> (i as u32 % Limb::BITS)) & 1;
        if bit != Limb::MIN {
            result.add(&doubled);
        }
        doubled.double();
    }
    result
}

/// Barrett reduction modulo q of a value up to 512 bits plus one spare
/// limb (which must be zero on entry in the top limb position).
fn reduce_q(value: &[Limb; WIDE_LIMBS + 1]) -> [Limb; LIMBS] {
    let mut m = [Limb::MIN; LIMBS + 1];
    bignum::unpack_le(&mut m, &BARRETT_M);
    let mut q = [Limb::MIN; LIMBS];
    bignum::unpack_le(&mut q, &ORDER);

    // quotient estimate: floor(value * m / 2^512)
    let mut product = [Limb::MIN; 3 * LIMBS + 2];
    bignum::mul(&mut product, value, &m);
    let mut estimate = [Limb::MIN; LIMBS + 1];
    estimate.copy_from_slice(&product[WIDE_LIMBS..WIDE_LIMBS + LIMBS + 1]);

    // value - estimate * q: only the low limbs matter, the high limbs of
    // the difference are all zero.
    let mut correction = [Limb::MIN; 2 * LIMBS + 1];
    bignum::mul(&mut correction, &estimate, &q);
    let mut result = [Limb::MIN; LIMBS];
    bignum::sub(&mut result, &value[..LIMBS], &correction[..LIMBS]);

    // The estimate can be short by at most two q.
    let mut once = [Limb::MIN; LIMBS];
    bignum::reduce_quick(&mut once, &result, &q);
    let mut twice = [Limb::MIN; LIMBS];
    bignum::reduce_quick(&mut twice, &once, &q);
    twice
}

/// Reduces a 64-byte little-endian hash output modulo q.
fn reduce_q_bytes(buf: &[u8; 64]) -> [Limb; LIMBS] {
    let mut wide = [Limb::MIN; WIDE_LIMBS + 1];
    bignum::unpack_le(&mut wide, buf);
    reduce_q(&wide)
}

/// `(r + k * a) mod q`.
fn mul_add_q(k: &[Limb; LIMBS], a: &[Limb; LIMBS], r: &[Limb; LIMBS]) -> [Limb; LIMBS] {
    let mut wide = [Limb::MIN; WIDE_LIMBS + 1];
    bignum::mul(&mut wide[..WIDE_LIMBS], k, a);
    let mut sum = reduce_q(&wide);
    wide.zeroize();

    let mut q = [Limb::MIN; LIMBS];
    bignum::unpack_le(&mut q, &ORDER);
    let mut tmp = [Limb::MIN; LIMBS];
    bignum::add(&mut tmp, &sum, r);
    sum.zeroize();
    let mut result = [Limb::MIN; LIMBS];
    bignum::reduce_quick(&mut result, &tmp, &q);
    tmp.zeroize();
    result
}

/// Expands a secret key into the clamped scalar `a` and the 32-byte
/// prefix used for nonce derivation.
fn expand_secret_key(secret_key: &[u8; SECRET_KEY_SIZE]) -> ([Limb; LIMBS], [u8; 32]) {
    let mut buf = [0u8; 64];
    buf.copy_from_slice(&Sha512::digest(secret_key));
    buf[0] &= 0xf8;
    buf[31] = (buf[31] & 0x7f) | 0x40;

    let mut a = [Limb::MIN; LIMBS];
    bignum::unpack_le(&mut a, &buf[..32]);
    let mut prefix = [0u8; 32];
    prefix.copy_from_slice(&buf[32..]);
    buf.zeroize();
    (a, prefix)
}

/// Generates a random Ed25519 secret key.
///
/// Any 32-byte string is a valid key; clamping happens during expansion.
pub fn generate_secret_key(rng: &mut (impl RngCore + CryptoRng)) -> [u8; SECRET_KEY_SIZE] {
    let mut secret_key = [0u8; SECRET_KEY_SIZE];
    rng.fill_bytes(&mut secret_key);
    secret_key
}

/// Derives the public key `A = a * B` for a secret key.
pub fn derive_public_key(secret_key: &[u8; SECRET_KEY_SIZE]) -> [u8; PUBLIC_KEY_SIZE] {
    let (mut a, mut prefix) = expand_secret_key(secret_key);
    prefix.zeroize();
    let point = scalar_mul_secret(&a, &Point::base());
    a.zeroize();
    point.encode()
}

/// Signs a message, producing the 64-byte signature (R, s).
///
/// The caller passes the public key alongside the secret key so it does
/// not have to be re-derived; use [`derive_public_key`] to obtain it.
pub fn sign(
    secret_key: &[u8; SECRET_KEY_SIZE],
    public_key: &[u8; PUBLIC_KEY_SIZE],
    message: &[u8],
) -> [u8; SIGNATURE_SIZE] {
    let (mut a, mut prefix) = expand_secret_key(secret_key);

    // r = H(prefix || message) mod q, the deterministic nonce. The
    // prefix recovers the nonce given another message, so it is wiped
    // as soon as the hash has absorbed it.
    let mut hash = Sha512::new();
    hash.update(prefix);
    hash.update(message);
    prefix.zeroize();
    let mut buf = [0u8; 64];
    buf.copy_from_slice(&hash.finalize());
    let mut r = reduce_q_bytes(&buf);
    buf.zeroize();

    // First half of the signature: R = r * B.
    let mut signature = [0u8; SIGNATURE_SIZE];
    let r_point = scalar_mul_secret(&r, &Point::base());
    signature[..32].copy_from_slice(&r_point.encode());

    // k = H(R || A || message) mod q.
    let mut hash = Sha512::new();
    hash.update(&signature[..32]);
    hash.update(public_key);
    hash.update(message);
    let mut buf = [0u8; 64];
    buf.copy_from_slice(&hash.finalize());
    let k = reduce_q_bytes(&buf);
    buf.zeroize();

    // Second half: s = (r + k * a) mod q.
    let mut s = mul_add_q(&k, &a, &r);
    bignum::pack_le(&mut signature[32..], &s);

    a.zeroize();
    r.zeroize();
    s.zeroize();
    signature
}

/// Verifies a signature: checks `s * B = R + k * A`.
pub fn verify(
    signature: &[u8; SIGNATURE_SIZE],
    public_key: &[u8; PUBLIC_KEY_SIZE],
    message: &[u8],
) -> bool {
    let Some(a_point) = Point::decode(public_key) else {
        return false;
    };
    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&signature[..32]);
    let Some(r_point) = Point::decode(&r_bytes) else {
        return false;
    };

    // Reconstruct k from the signing step.
    let mut hash = Sha512::new();
    hash.update(&signature[..32]);
    hash.update(public_key);
    hash.update(message);
    let mut buf = [0u8; 64];
    buf.copy_from_slice(&hash.finalize());
    let k = reduce_q_bytes(&buf);

    let mut s = [Limb::MIN; LIMBS];
    bignum::unpack_le(&mut s, &signature[32..]);
    let s_b = scalar_mul_public(&s, &Point::base());

    let mut sum = scalar_mul_public(&k, &a_point);
    sum.add(&r_point);

    bool::from(s_b.ct_eq(&sum))
}
