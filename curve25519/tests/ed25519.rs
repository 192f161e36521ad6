//! Ed25519 test vectors from RFC 8032 section 7.1.

use curve25519::ed25519;
use hex_literal::hex;

#[test]
fn rfc8032_test_1_empty_message() {
    let secret_key = hex!("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60");
    let public_key = ed25519::derive_public_key(&secret_key);
    assert_eq!(
        public_key,
        hex!("d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a")
    );

    let signature = ed25519::sign(&secret_key, &public_key, b"");
    assert_eq!(
        signature,
        hex!(
            "e5564300c360ac729086e2cc806e828a"
            "84877f1eb8e5d974d873e06522490155"
            "5fb8821590a33bacc61e39701cf9b46b"
            "d25bf5f0595bbe24655141438e7a100b"
        )
    );
    assert!(ed25519::verify(&signature, &public_key, b""));
}

#[test]
fn rfc8032_test_2_one_byte() {
    let secret_key = hex!("4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb");
    let public_key = ed25519::derive_public_key(&secret_key);
    assert_eq!(
        public_key,
        hex!("3d4017c3e843895a92b70aa74d1b7ebc9c982ccf2ec4968cc0cd55f12af4660c")
    );

    let message = hex!("72");
    let signature = ed25519::sign(&secret_key, &public_key, &message);
    assert_eq!(
        signature,
        hex!(
            "92a009a9f0d4cab8720e820b5f642540"
            "a2b27b5416503f8fb3762223ebdb69da"
            "085ac1e43e15996e458f3613d0f11d8c"
            "387b2eaeb4302aeeb00d291612bb0c00"
        )
    );
    assert!(ed25519::verify(&signature, &public_key, &message));
}

#[test]
fn rfc8032_test_3_two_bytes() {
    let secret_key = hex!("c5aa8df43f9f837bedb7442f31dcb7b166d38535076f094b85ce3a2e0b4458f7");
    let public_key = ed25519::derive_public_key(&secret_key);
    assert_eq!(
        public_key,
        hex!("fc51cd8e6218a1a38da47ed00230f0580816ed13ba3303ac5deb911548908025")
    );

    let message = hex!("af82");
    let signature = ed25519::sign(&secret_key, &public_key, &message);
    assert_eq!(
        signature,
        hex!(
            "6291d657deec24024827e69c3abe01a3"
            "0ce548a284743a445e3680d7db5ac3ac"
            "18ff9b538d16f290ae67f760984dc659"
            "4a7c15e9716ed28dc027beceea1ec40a"
        )
    );
    assert!(ed25519::verify(&signature, &public_key, &message));
}

#[test]
fn corrupted_signature_is_rejected() {
    let secret_key = hex!("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60");
    let public_key = ed25519::derive_public_key(&secret_key);
    let message = b"attack at dawn";
    let signature = ed25519::sign(&secret_key, &public_key, message);
    assert!(ed25519::verify(&signature, &public_key, message));

    // Flip one bit in each half of the signature.
    let mut bad = signature;
    bad[0] ^= 1;
    assert!(!ed25519::verify(&bad, &public_key, message));

    let mut bad = signature;
    bad[40] ^= 1;
    assert!(!ed25519::verify(&bad, &public_key, message));

    // And alter the message.
    assert!(!ed25519::verify(&signature, &public_key, b"attack at dusk"));
}

#[test]
fn wrong_public_key_is_rejected() {
    let secret_key = hex!("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60");
    let public_key = ed25519::derive_public_key(&secret_key);
    let other_key = ed25519::derive_public_key(&hex!(
        "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb"
    ));

    let message = b"hello";
    let signature = ed25519::sign(&secret_key, &public_key, message);
    assert!(!ed25519::verify(&signature, &other_key, message));
}

#[test]
fn undecodable_public_key_is_rejected() {
    let secret_key = hex!("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60");
    let public_key = ed25519::derive_public_key(&secret_key);
    let signature = ed25519::sign(&secret_key, &public_key, b"x");

    // y = 1 forces x = 0, whose encoding never carries a sign bit, so
    // this byte string does not decode to a curve point.
    let bogus = hex!("0100000000000000000000000000000000000000000000000000000000000080");
    assert!(!ed25519::verify(&signature, &bogus, b"x"));
}
