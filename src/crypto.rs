//! Signature verification.

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, Secp256k1};
use sha2::{Digest, Sha256};

use crate::types::Address;

/// Verify a DER-encoded ECDSA signature over the SHA-256 digest of
/// `message` under `address`.
///
/// An absent address never verifies: an input claiming an unknown output
/// has no payee to check against and fails here. Malformed signature bytes
/// also verify false rather than erroring.
pub fn verify_signature(address: Option<&Address>, message: &[u8], signature: &[u8]) -> bool {
    let Some(address) = address else {
        return false;
    };
    let Ok(signature) = Signature::from_der(signature) else {
        return false;
    };
    let digest: [u8; 32] = Sha256::digest(message).into();
    let Ok(message) = Message::from_digest_slice(&digest) else {
        return false;
    };
    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &signature, address).is_ok()
}
