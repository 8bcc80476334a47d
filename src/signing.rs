//! HMAC request signing.
//!
//! The provider authenticates payload-bearing requests with an
//! `X-HMAC-SIGNATURE` header: HMAC-SHA256 over the exact bytes placed on the
//! wire, hex-encoded. For GET requests with no body the signed payload is the
//! UTF-8 bytes of the session id. Callers must sign the final serialized
//! string and transmit that same string; re-serializing afterwards
//! invalidates the signature.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret as _, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs `payload` with the shared secret, returning the lowercase hex
/// digest. The secret does not leave this module in any other form.
pub(crate) fn sign(payload: &[u8], secret: &SecretString) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    // RFC 4231 test case 2.
    #[test]
    fn matches_rfc4231_vector() {
        let digest = sign(b"what do ya want for nothing?", &secret("Jefe"));
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn same_inputs_same_digest() {
        let key = secret("shared-secret");
        let a = sign(b"{\"image\":{\"context\":\"face\"}}", &key);
        let b = sign(b"{\"image\":{\"context\":\"face\"}}", &key);
        assert_eq!(a, b);
    }

    #[test]
    fn single_byte_change_flips_digest() {
        let key = secret("shared-secret");
        let a = sign(b"payload-a", &key);
        let b = sign(b"payload-b", &key);
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_lowercase_hex_of_sha256_width() {
        let digest = sign(b"0123", &secret("k"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
