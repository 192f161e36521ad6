//! X25519 Diffie-Hellman key agreement ([RFC 7748]).
//!
//! The two-phase exchange follows the usual pattern: [`dh1`] produces an
//! ephemeral key pair, the public halves are swapped, and [`dh2`] turns
//! the peer's public key and the local secret into the shared secret.
//! Public keys matching a known small-order point are rejected in both
//! phases so a malicious peer cannot force a predictable shared secret.
//!
//! [RFC 7748]: https://tools.ietf.org/html/rfc7748

use crate::field::{FieldElement, LIMBS};
use bignum::Limb;
use hex_literal::hex;
use rand_core::{CryptoRng, RngCore};
use subtle::Choice;
use zeroize::Zeroize;

/// Length of secret keys, public keys and shared secrets in bytes.
pub const KEY_SIZE: usize = 32;

/// The points of small order from the curve's twist and subgroup, plus
/// the identity. Variants of the form `point + i * p` are caught by the
/// range check in [`evaluate`] together with the masked high bit.
const WEAK_POINTS: [[u8; 32]; 5] = [
    hex!("0000000000000000000000000000000000000000000000000000000000000000"),
    hex!("0100000000000000000000000000000000000000000000000000000000000000"),
    hex!("e0eb7a7c3b41b8ae1656e3faf19fc46ada098deb9c32b1fd866205165f49b800"),
    hex!("5f9c95bca3508c24b1d0b1559c83ef5b04445cc4581c8e86d8224eddd09f1157"),
    hex!("ecffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f"),
];

/// A clamped X25519 secret scalar.
///
/// Zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; KEY_SIZE]);

/// An X25519 public key: the u-coordinate of a curve point.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublicKey([u8; KEY_SIZE]);

/// The result of a completed key exchange.
///
/// Zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret([u8; KEY_SIZE]);

impl SecretKey {
    /// Generates a random secret scalar.
    pub fn generate(rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rng.fill_bytes(&mut bytes);
        clamp(&mut bytes);
        Self(bytes)
    }

    /// Builds a secret key from raw bytes, clamping them as required by
    /// RFC 7748.
    pub fn from_bytes(mut bytes: [u8; KEY_SIZE]) -> Self {
        clamp(&mut bytes);
        Self(bytes)
    }

    /// Computes the public key for this secret: `self * 9` on the curve.
    pub fn public_key(&self) -> PublicKey {
        let (bytes, _) = evaluate(&self.0, None);
        PublicKey(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PublicKey {
    /// Builds a public key from the bytes received from the other party.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Serializes the public key for transmission.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl SharedSecret {
    /// The raw shared secret bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Phase 1 of a Diffie-Hellman exchange: generates the key pair for this
/// party. The public key is sent to the other party; the secret key is
/// kept in memory until [`dh2`].
///
/// Key pairs whose public half lands on a weak point are discarded and
/// regenerated. That case is vanishingly unlikely but cheap to check.
pub fn dh1(rng: &mut (impl RngCore + CryptoRng)) -> (PublicKey, SecretKey) {
    loop {
        let secret = SecretKey::generate(rng);
        let public = secret.public_key();
        if !bool::from(is_weak_point(&public.0)) {
            return (public, secret);
        }
    }
}

/// Phase 2 of a Diffie-Hellman exchange: combines the peer's public key
/// with the local secret from [`dh1`].
///
/// Returns `None` if the peer's key is out of field range or weak for
/// contributory behaviour, before or after evaluation. All three checks
/// always run so the timing does not reveal which one failed. The secret
/// key is consumed and zeroed either way.
pub fn dh2(peer: &PublicKey, secret: SecretKey) -> Option<SharedSecret> {
    let mut reject = is_weak_point(&peer.0);
    let (shared, in_range) = evaluate(secret.as_bytes(), Some(&peer.0));
    reject |= !in_range;
    reject |= is_weak_point(&shared);
    if bool::from(reject) {
        None
    } else {
        Some(SharedSecret(shared))
    }
}

/// Evaluates the raw curve function: the u-coordinate of `scalar * point`.
///
/// `None` for `point` selects the base point u = 9. Returns the packed
/// result together with a flag that is 0 if `point` (after masking its
/// high bit) was not a proper element of the field modulo 2^255 - 19.
/// The curve is still evaluated on the reduced value in that case so the
/// check costs no observable time.
///
/// This is exposed for building other protocols on the curve; key
/// exchanges should use [`dh1`] and [`dh2`], which also screen for weak
/// points.
pub fn evaluate(scalar: &[u8; KEY_SIZE], point: Option<&[u8; KEY_SIZE]>) -> ([u8; 32], Choice) {
    let mut x1_limbs = [Limb::MIN; LIMBS];
    match point {
        Some(bytes) => {
            bignum::unpack_le(&mut x1_limbs, bytes);
            x1_limbs[LIMBS - 1] &= Limb::MAX >> 1;
        }
        None => x1_limbs[0] = 9,
    }
    let in_range = FieldElement::reduce_quick(&mut x1_limbs);

    // Montgomery ladder over the low 255 bits of the scalar, from highest
    // to lowest. Swaps are deferred: each iteration swaps only if the
    // current bit differs from the previous one.
    let x1 = FieldElement(x1_limbs);
    let mut x2 = FieldElement::ONE;
    let mut z2 = FieldElement::ZERO;
    let mut x3 = x1;
    let mut z3 = FieldElement::ONE;

    let mut swap = 0u8;
    for t in (0..255).rev() {
        let bit = (scalar[t >> 3] >> (t & 7)) & 1;
        swap ^= bit;
        FieldElement::conditional_swap(&mut x2, &mut x3, Choice::from(swap));
        FieldElement::conditional_swap(&mut z2, &mut z3, Choice::from(swap));
        swap = bit;

        let a = x2.add(&z2);
        let aa = a.square();
        let b = x2.sub(&z2);
        let bb = b.square();
        let e = aa.sub(&bb);
        let c = x3.add(&z3);
        let d = x3.sub(&z3);
        let da = d.mul(&a);
        let cb = c.mul(&b);
        x3 = da.add(&cb).square();
        z3 = da.sub(&cb).square().mul(&x1);
        x2 = aa.mul(&bb);
        z2 = e.mul_small(121_665).add(&aa).mul(&e);
    }
    FieldElement::conditional_swap(&mut x2, &mut x3, Choice::from(swap));
    FieldElement::conditional_swap(&mut z2, &mut z3, Choice::from(swap));

    let result = x2.mul(&z2.invert());
    (result.to_bytes(), in_range)
}

/// Constant-time check of `k` against the weak point table.
///
/// Every table entry is compared in full even after a match so the
/// timing reveals neither whether `k` is weak nor which point it is.
/// The high bit of `k` is ignored, mirroring the mask in [`evaluate`].
pub fn is_weak_point(k: &[u8; KEY_SIZE]) -> Choice {
    let mut result = 0u8;
    for point in &WEAK_POINTS {
        let mut check = (point[31] ^ k[31]) & 0x7f;
        for index in 0..31 {
            check |= point[index] ^ k[index];
        }
        result |= (0x0100u16.wrapping_sub(check as u16) >> 8) as u8;
    }
    Choice::from(result)
}

/// Masks a random scalar into the form RFC 7748 requires: a multiple of
/// the cofactor with the high bit clear and bit 254 set.
fn clamp(f: &mut [u8; KEY_SIZE]) {
    f[0] &= 0xf8;
    f[31] = (f[31] & 0x7f) | 0x40;
}
