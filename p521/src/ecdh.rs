//! Ephemeral ECDH key agreement over P-521 ([RFC 6090]).
//!
//! Phase one generates a key pair and sends the public half to the
//! peer; phase two combines the peer's public value with the retained
//! secret to produce the shared point, of which the x co-ordinate is
//! the raw shared secret. Feed it through a key-derivation function
//! before use as a session key.
//!
//! [RFC 6090]: https://tools.ietf.org/html/rfc6090

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::arithmetic::point;
use crate::arithmetic::scalar::ORDER;

/// Length of a serialized secret key in bytes.
pub const SECRET_KEY_SIZE: usize = 66;

/// Length of a serialized public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 132;

/// A P-521 secret key: a scalar in `[1, q - 1]`, 66 big-endian bytes.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; SECRET_KEY_SIZE]);

impl SecretKey {
    /// Generates a key by rejection sampling, as RFC 6090 appendix B
    /// recommends: draw 521 random bits and retry until the value lands
    /// in `[1, q - 1]`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SECRET_KEY_SIZE];
        loop {
            rng.fill_bytes(&mut bytes);
            // Mask down to 521 bits before the range test.
            bytes[0] &= 0x01;
            if is_valid_secret_key(&bytes) {
                break;
            }
        }
        Self(bytes)
    }

    /// Wraps an existing scalar, rejecting values outside `[1, q - 1]`.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_SIZE]) -> Option<Self> {
        if is_valid_secret_key(bytes) {
            Some(Self(*bytes))
        } else {
            None
        }
    }

    /// Derives the public key d·G.
    pub fn public_key(&self) -> PublicKey {
        let (mut x, mut y) = point::generator();
        point::scalar_mul(&mut x, &mut y, &self.0);
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        point::pack(&mut bytes, &x, &y);
        PublicKey(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }
}

/// A P-521 public key: an uncompressed curve point, x then y.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wraps received bytes without validation; [`dh2`] and signature
    /// verification validate the point before using it.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(*bytes)
    }

    /// The serialized form, x then y, 66 big-endian bytes each.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

/// The x co-ordinate of the agreed curve point.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret([u8; SECRET_KEY_SIZE]);

impl SharedSecret {
    /// The raw shared bytes; derive session keys from these rather than
    /// using them directly.
    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }
}

/// Phase one of a key exchange: generates an ephemeral key pair.
///
/// Send the public key to the peer and keep the secret key for
/// [`dh2`]; it never needs to touch permanent storage.
pub fn dh1<R: RngCore + CryptoRng>(rng: &mut R) -> (PublicKey, SecretKey) {
    let secret = SecretKey::generate(rng);
    let public = secret.public_key();
    (public, secret)
}

/// Phase two of a key exchange: combines the peer's public value with
/// the local secret.
///
/// Returns `None` when the peer value is not a point on the curve. The
/// scalar multiplication runs regardless of the validation outcome, so
/// acceptance and rejection take similar time.
pub fn dh2(peer: &PublicKey, secret: &SecretKey) -> Option<SharedSecret> {
    let (mut x, mut y) = point::unpack(&peer.0);
    let ok = point::validate(&x, &y);
    point::scalar_mul(&mut x, &mut y, secret.as_bytes());
    let shared = SharedSecret(x.to_bytes());
    if ok {
        Some(shared)
    } else {
        None
    }
}

/// Whether 66 big-endian bytes encode a scalar in `[1, q - 1]`.
pub fn is_valid_secret_key(key: &[u8; SECRET_KEY_SIZE]) -> bool {
    // Single pass from the least significant byte: accumulate an OR for
    // the zero test while rippling the borrow of key - q. A final
    // borrow-out means key < q.
    let mut non_zero = 0u8;
    let mut borrow = 0u16;
    for i in (0..SECRET_KEY_SIZE).rev() {
        non_zero |= key[i];
        borrow = u16::from(key[i])
            .wrapping_sub(u16::from(ORDER[i]))
            .wrapping_sub((borrow >> 8) & 1);
    }
    non_zero != 0 && (borrow >> 8) & 1 == 1
}

/// Whether 132 bytes encode a valid point on the curve.
pub fn is_valid_public_key(key: &[u8; PUBLIC_KEY_SIZE]) -> bool {
    let (x, y) = point::unpack(key);
    point::validate(&x, &y)
}
