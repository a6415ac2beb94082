//! PKCE S256 material and login state generation
//!
//! Implements the Proof Key for Code Exchange extension (RFC 7636) with the
//! `S256` method, plus the opaque `state` value that ties an authorization
//! redirect to the attempt that started it.
//!
//! # How PKCE works
//!
//! 1. A high-entropy `code_verifier` is generated and kept in memory.
//! 2. Its SHA-256 digest, base64url-encoded without padding, is sent to the
//!    authorization endpoint as `code_challenge`.
//! 3. The token exchange sends the original verifier, proving possession.
//!
//! # References
//!
//! - RFC 7636 <https://www.rfc-editor.org/rfc/rfc7636>

use base64::Engine as _;
use rand::TryRngCore as _;
use sha2::{Digest, Sha256};

use crate::error::{BpnrError, Result};

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

// ---------------------------------------------------------------------------
// PkceMaterial
// ---------------------------------------------------------------------------

/// Per-attempt secrets for one login.
///
/// Never persisted and never logged.  A new value is generated for every
/// login attempt.
///
/// # Examples
///
/// ```
/// use bpnr::auth::pkce::generate;
///
/// let pkce = generate().unwrap();
/// assert_eq!(pkce.code_verifier.len(), 43);
/// assert_eq!(pkce.code_challenge.len(), 43);
/// assert_eq!(pkce.state.len(), 22);
/// ```
#[derive(Clone)]
pub struct PkceMaterial {
    /// base64url (no padding) of 32 random bytes; 43 characters.
    pub code_verifier: String,

    /// base64url (no padding) of `SHA-256(code_verifier)`; 43 characters.
    pub code_challenge: String,

    /// base64url (no padding) of 16 random bytes; 22 characters.
    pub state: String,
}

impl std::fmt::Debug for PkceMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceMaterial")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .field("state", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/// Generates a fresh verifier, challenge, and state from the OS random
/// source.
///
/// # Errors
///
/// Returns [`BpnrError::Environment`] if the operating system cannot supply
/// secure random bytes.  There is no fallback to a weaker generator.
pub fn generate() -> Result<PkceMaterial> {
    let code_verifier = random_base64url::<VERIFIER_BYTES>()?;
    let code_challenge = code_challenge_s256(&code_verifier);
    let state = random_base64url::<STATE_BYTES>()?;

    Ok(PkceMaterial {
        code_verifier,
        code_challenge,
        state,
    })
}

/// Computes the `S256` challenge for `verifier`.
///
/// `BASE64URL-ENCODE(SHA256(ASCII(code_verifier)))`, RFC 7636 section 4.2.
///
/// # Examples
///
/// ```
/// use bpnr::auth::pkce::code_challenge_s256;
///
/// assert_eq!(
///     code_challenge_s256("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
///     "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
/// );
/// ```
pub fn code_challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice())
}

fn random_base64url<const N: usize>() -> Result<String> {
    let mut bytes = [0u8; N];
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| BpnrError::Environment(format!("secure random source unavailable: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
