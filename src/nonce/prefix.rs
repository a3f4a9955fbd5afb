//! Instance prefix derivation.
//!
//! Every nonce issued by an instance begins with a short prefix derived from
//! the secret key and the instance's own listen address. The prefix lets the
//! redemption path discard nonces issued elsewhere with a single string
//! comparison, which is what allows running many instances behind one
//! deployment config without cross-instance counter coordination.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::nonce::key::SecretKey;

type HmacSha256 = Hmac<Sha256>;

/// Length of the derived prefix in base64url characters.
pub const PREFIX_LEN: usize = 8;

/// Derives the instance prefix from the secret key and instance identity.
///
/// Computes `HMAC-SHA256(key, identity)`, encodes it as unpadded base64url,
/// and truncates to [`PREFIX_LEN`] characters. Deterministic for a given
/// `(key, identity)` pair; different keys or identities yield independent
/// prefixes. Called once at authority construction, never per nonce.
///
/// The identity is conventionally the service's listen address, hard-binding
/// issued nonces to the instance that must redeem them.
pub fn derive_prefix(key: &SecretKey, identity: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(identity.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(PREFIX_LEN);
    encoded
}
