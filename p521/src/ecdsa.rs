//! Deterministic ECDSA signatures over P-521 ([RFC 6979]).
//!
//! The nonce is derived from the key and message through an HMAC-based
//! generator, so signing consumes no randomness and the same key and
//! message always yield the same signature. The digest that hashes the
//! message also drives the nonce generator; the prehashed variants use
//! SHA-512 for nonce generation. Hashes longer than 64 bytes are
//! truncated, and shorter ones are left-padded with zeros into the
//! 66-byte scalar width.
//!
//! [RFC 6979]: https://tools.ietf.org/html/rfc6979

use hmac::{Mac, SimpleHmac};
use sha2::digest::crypto_common::BlockSizeUser;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::arithmetic::point;
use crate::arithmetic::scalar::Scalar;
use crate::ecdh::{is_valid_secret_key, PublicKey, SecretKey};

/// Length of a serialized signature (r then s) in bytes.
pub const SIGNATURE_SIZE: usize = 132;

/// An ECDSA signature: r and s, 66 big-endian bytes each.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Wraps serialized bytes; range checks happen during verification.
    pub fn from_bytes(bytes: &[u8; SIGNATURE_SIZE]) -> Self {
        Self(*bytes)
    }

    /// The serialized form.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }
}

/// Signs a message, hashing it with `D` and using `D` inside the
/// RFC 6979 nonce generator.
pub fn sign<D>(secret: &SecretKey, message: &[u8]) -> Signature
where
    D: Digest + BlockSizeUser + Clone,
{
    let output = D::digest(message);
    sign_formatted::<D>(secret, &format_hash(&output))
}

/// Signs a message that was already hashed; the nonce generator falls
/// back to SHA-512.
pub fn sign_prehashed(secret: &SecretKey, hash: &[u8]) -> Signature {
    sign_formatted::<Sha512>(secret, &format_hash(hash))
}

/// Verifies a signature over a message hashed with `D`.
pub fn verify<D: Digest>(signature: &Signature, public_key: &PublicKey, message: &[u8]) -> bool {
    let output = D::digest(message);
    verify_formatted(signature, public_key, &format_hash(&output))
}

/// Verifies a signature over an already-hashed message.
pub fn verify_prehashed(signature: &Signature, public_key: &PublicKey, hash: &[u8]) -> bool {
    verify_formatted(signature, public_key, &format_hash(hash))
}

/// Truncates a hash to 64 bytes and left-pads it with zeros into the
/// 66-byte big-endian scalar width (bits2octets for q > 2^512).
fn format_hash(hash: &[u8]) -> [u8; 66] {
    let len = hash.len().min(64);
    let mut hm = [0u8; 66];
    hm[66 - len..].copy_from_slice(&hash[..len]);
    hm
}

fn sign_formatted<D>(secret: &SecretKey, hm: &[u8; 66]) -> Signature
where
    D: Digest + BlockSizeUser + Clone,
{
    let mut signature = [0u8; SIGNATURE_SIZE];
    let mut count = 0u64;
    loop {
        let mut k = generate_k::<D>(hm, secret.as_bytes(), count);

        // r = (k·G).x mod q
        let (mut x, mut y) = point::generator();
        point::scalar_mul(&mut x, &mut y, &k);
        let r = Scalar::reduce_once(&x.0);
        signature[..66].copy_from_slice(&r.to_bytes());
        if bool::from(r.is_zero()) {
            // Vanishing r cannot be signed with; re-derive k.
            k.zeroize();
            count += 1;
            continue;
        }

        // s = (d·r + hm) / k mod q
        let mut d = Scalar::from_bytes(secret.as_bytes());
        let mut dr = d.mul(&r);
        let s = Scalar::from_bytes(hm).add(&dr);
        let mut k_scalar = Scalar::from_bytes(&k);
        let mut k_inv = k_scalar.invert();
        let s = s.mul(&k_inv);
        signature[66..].copy_from_slice(&s.to_bytes());

        let done = !bool::from(s.is_zero());
        d.zeroize();
        dr.zeroize();
        k_scalar.zeroize();
        k_inv.zeroize();
        k.zeroize();
        if done {
            break;
        }
        count += 1;
    }
    Signature(signature)
}

fn verify_formatted(signature: &Signature, public_key: &PublicKey, hm: &[u8; 66]) -> bool {
    // Everything here is public, so malformed values are rejected early.
    let mut half = [0u8; 66];
    half.copy_from_slice(&signature.0[..66]);
    let r = Scalar::from_bytes(&half);
    half.copy_from_slice(&signature.0[66..]);
    let s = Scalar::from_bytes(&half);
    if !r.is_valid() || !s.is_valid() {
        return false;
    }

    let (mut qx, mut qy) = point::unpack(public_key.as_bytes());
    if !point::validate(&qx, &qy) {
        return false;
    }

    // u1 = hm / s, u2 = r / s, R = u1·G + u2·Q; accept when R.x = r mod q.
    let s_inv = s.invert();
    let u1 = Scalar::from_bytes(hm).mul(&s_inv);
    let u2 = r.mul(&s_inv);

    point::scalar_mul(&mut qx, &mut qy, &u2.to_bytes());
    let (mut x, mut y) = point::generator();
    point::scalar_mul(&mut x, &mut y, &u1.to_bytes());
    point::add_affine(&mut x, &mut y, &qx, &qy);

    let candidate = Scalar::reduce_once(&x.0);
    bool::from(candidate.ct_eq(&r))
}

/// Derives a signing nonce per RFC 6979.
///
/// `count` handles the improbable rejection of a candidate by the sign
/// loop: when non-zero it is appended to the personalization of steps
/// (d) and (f), the alternate construction from RFC 6979 section 3.6,
/// so each retry draws from a fresh HMAC stream.
fn generate_k<D>(hm: &[u8; 66], x: &[u8; 66], count: u64) -> [u8; 66]
where
    D: Digest + BlockSizeUser + Clone,
{
    let hlen = <D as Digest>::output_size().min(64);
    let mut v = [0u8; 64];
    let mut key = [0u8; 64];

    // Steps (b) and (c): V = 0x01 01 ... 01, K = 0x00 00 ... 00.
    for byte in v[..hlen].iter_mut() {
        *byte = 0x01;
    }

    // Step (d): K = HMAC_K(V || 0x00 || x || hm [|| count]).
    let mut mac = hmac::<D>(&key[..hlen]);
    mac.update(&v[..hlen]);
    mac.update(&[0x00]);
    mac.update(x);
    mac.update(hm);
    if count != 0 {
        mac.update(&count.to_le_bytes());
    }
    let output = mac.finalize().into_bytes();
    key[..hlen].copy_from_slice(&output[..hlen]);

    // Step (e): V = HMAC_K(V).
    let mut mac = hmac::<D>(&key[..hlen]);
    mac.update(&v[..hlen]);
    let output = mac.finalize().into_bytes();
    v[..hlen].copy_from_slice(&output[..hlen]);

    // Step (f): K = HMAC_K(V || 0x01 || x || hm [|| count]).
    let mut mac = hmac::<D>(&key[..hlen]);
    mac.update(&v[..hlen]);
    mac.update(&[0x01]);
    mac.update(x);
    mac.update(hm);
    if count != 0 {
        mac.update(&count.to_le_bytes());
    }
    let output = mac.finalize().into_bytes();
    key[..hlen].copy_from_slice(&output[..hlen]);

    // Step (g): V = HMAC_K(V).
    let mut mac = hmac::<D>(&key[..hlen]);
    mac.update(&v[..hlen]);
    let output = mac.finalize().into_bytes();
    v[..hlen].copy_from_slice(&output[..hlen]);

    // Step (h): concatenate HMAC output blocks until 66 bytes are
    // available, take the top 521 bits, and retry until the candidate
    // lands in [1, q - 1].
    let mut k = [0u8; 66];
    loop {
        let mut filled = 0;
        while filled < 66 {
            let mut mac = hmac::<D>(&key[..hlen]);
            mac.update(&v[..hlen]);
            let output = mac.finalize().into_bytes();
            v[..hlen].copy_from_slice(&output[..hlen]);
            let take = hlen.min(66 - filled);
            k[filled..filled + take].copy_from_slice(&v[..take]);
            filled += take;
        }

        // bits2int: the candidate is 528 bits wide, shift out the low
        // seven.
        for i in (1..66).rev() {
            k[i] = (k[i - 1] << 1) | (k[i] >> 7);
        }
        k[0] >>= 7;
        if is_valid_secret_key(&k) {
            break;
        }

        // Out of range: K = HMAC_K(V || 0x00), V = HMAC_K(V), go again.
        let mut mac = hmac::<D>(&key[..hlen]);
        mac.update(&v[..hlen]);
        mac.update(&[0x00]);
        let output = mac.finalize().into_bytes();
        key[..hlen].copy_from_slice(&output[..hlen]);
        let mut mac = hmac::<D>(&key[..hlen]);
        mac.update(&v[..hlen]);
        let output = mac.finalize().into_bytes();
        v[..hlen].copy_from_slice(&output[..hlen]);
    }

    v.zeroize();
    key.zeroize();
    k
}

fn hmac<D>(key: &[u8]) -> SimpleHmac<D>
where
    D: Digest + BlockSizeUser + Clone,
{
    SimpleHmac::new_from_slice(key).expect("HMAC accepts keys of any length")
}
