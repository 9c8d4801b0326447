//! Verification of `X-Freshchat-Signature`: RSASSA-PKCS1-v1_5 over the
//! SHA-256 digest of the raw request body, base64 encoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("freshchat public key is not a PKCS#1 or SPKI PEM RSA key: {0}")]
pub struct PublicKeyError(String);

#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    public_key: RsaPublicKey,
}

impl SignatureVerifier {
    /// Accepts `BEGIN RSA PUBLIC KEY` (what Freshchat publishes) and `BEGIN PUBLIC KEY`.
    pub fn from_pem(pem: &str) -> Result<Self, PublicKeyError> {
        let pem = pem.trim();
        let public_key = RsaPublicKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPublicKey::from_public_key_pem(pem))
            .map_err(|error| PublicKeyError(error.to_string()))?;
        Ok(Self { public_key })
    }

    pub fn new(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }

    /// Never errors: bad base64, a wrong key and a tampered body all read as `false`.
    pub fn verify(&self, body: &[u8], signature_b64: &str) -> bool {
        let Ok(signature) = STANDARD.decode(signature_b64.trim()) else {
            return false;
        };
        let digest = Sha256::digest(body);
        self.public_key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature).is_ok()
    }
}
