//! Key exchange and key validation tests.

use hex_literal::hex;
use p521::ecdh::{self, PublicKey, SecretKey};
use rand_core::{CryptoRng, Error, RngCore};

/// Deterministic RNG (splitmix64) so key exchange tests are repeatable.
struct TestRng(u64);

impl RngCore for TestRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for TestRng {}

const ORDER: [u8; 66] = hex!(
    "01fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffa"
    "51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e91386409"
);

#[test]
fn two_phase_exchange_agrees() {
    let mut rng = TestRng(42);
    let (alice_public, alice_secret) = ecdh::dh1(&mut rng);
    let (bob_public, bob_secret) = ecdh::dh1(&mut rng);
    assert_ne!(alice_public.as_bytes(), bob_public.as_bytes());

    let alice_shared = ecdh::dh2(&bob_public, &alice_secret).expect("valid peer");
    let bob_shared = ecdh::dh2(&alice_public, &bob_secret).expect("valid peer");
    assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
}

#[test]
fn dh2_rejects_invalid_peer() {
    let mut rng = TestRng(7);
    let (peer_public, _) = ecdh::dh1(&mut rng);
    let (_, secret) = ecdh::dh1(&mut rng);

    // The point at infinity encodes as all zeros and is not on the curve.
    let zero = PublicKey::from_bytes(&[0u8; 132]);
    assert!(ecdh::dh2(&zero, &secret).is_none());

    // Corrupting a coordinate moves the point off the curve.
    let mut bytes = *peer_public.as_bytes();
    bytes[70] ^= 0x01;
    assert!(ecdh::dh2(&PublicKey::from_bytes(&bytes), &secret).is_none());
}

#[test]
fn evaluate_by_one_yields_generator() {
    let mut f = [0u8; 66];
    f[65] = 1;
    let mut result = [0u8; 132];
    assert!(p521::evaluate(&mut result, &f, None));
    assert!(ecdh::is_valid_public_key(&result));
    assert_eq!(
        &result[..66],
        &hex!(
            "00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d3d"
            "baa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5bd66"
        )
    );
    assert_eq!(
        &result[66..],
        &hex!(
            "011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e66"
            "2c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd16650"
        )
    );
}

#[test]
fn secret_key_range_checks() {
    assert!(!ecdh::is_valid_secret_key(&[0u8; 66]));
    assert!(!ecdh::is_valid_secret_key(&ORDER));

    let mut one = [0u8; 66];
    one[65] = 1;
    assert!(ecdh::is_valid_secret_key(&one));

    let mut order_minus_one = ORDER;
    order_minus_one[65] -= 1;
    assert!(ecdh::is_valid_secret_key(&order_minus_one));

    assert!(SecretKey::from_bytes(&ORDER).is_none());
    assert!(SecretKey::from_bytes(&one).is_some());
}

#[test]
fn generated_keys_are_valid() {
    let mut rng = TestRng(1);
    for _ in 0..4 {
        let secret = SecretKey::generate(&mut rng);
        let public = secret.public_key();
        assert!(ecdh::is_valid_public_key(public.as_bytes()));
    }
}
