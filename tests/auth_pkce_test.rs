//! PKCE material integration tests
//!
//! Exercises the public `auth::pkce` API the way the login flow uses it.

use std::collections::HashSet;

use base64::Engine as _;
use sha2::{Digest, Sha256};

use bpnr::auth::pkce::{code_challenge_s256, generate};

#[test]
fn test_challenge_is_unpadded_base64url_sha256() {
    for _ in 0..32 {
        let pkce = generate().unwrap();
        let expected = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(Sha256::digest(pkce.code_verifier.as_bytes()));

        assert_eq!(pkce.code_challenge, expected);
        for value in [&pkce.code_verifier, &pkce.code_challenge, &pkce.state] {
            assert!(
                !value.contains(['=', '+', '/']),
                "value must be unpadded base64url: {value}"
            );
        }
    }
}

#[test]
fn test_verifier_length_is_within_rfc_bounds() {
    let pkce = generate().unwrap();
    // RFC 7636 section 4.1: 43..=128 characters
    assert!((43..=128).contains(&pkce.code_verifier.len()));
}

#[test]
fn test_states_do_not_repeat() {
    let states: HashSet<String> = (0..256).map(|_| generate().unwrap().state).collect();
    assert_eq!(states.len(), 256);
}

#[test]
fn test_known_vector() {
    assert_eq!(
        code_challenge_s256("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}
