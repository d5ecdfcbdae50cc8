//! Ed25519 signatures (EdDSA).
//!
//! EdDSA signs the message directly; no digest is applied beforehand.
//! Signatures are the raw 64-byte encoding.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;

use super::keys::{KeyKind, check_private_key, check_public_key};
use super::registry::AlgorithmRegistry;
use super::{AlgorithmDescriptor, AlgorithmError, HashFunction, KeyPairDer, SignAlgorithm};

/// Ed25519 with 32-byte seeds.
#[derive(Debug, Clone, Default)]
pub struct EddsaAlgorithm;

impl EddsaAlgorithm {
    pub fn new() -> Self {
        Self
    }
}

impl SignAlgorithm for EddsaAlgorithm {
    fn descriptor(&self) -> AlgorithmDescriptor {
        AlgorithmDescriptor {
            name: "EdDSA",
            hash: HashFunction::None,
        }
    }

    fn generate(&self) -> Result<KeyPairDer, AlgorithmError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let private_key = signing_key
            .to_pkcs8_der()
            .map_err(|e| AlgorithmError::KeyGeneration(e.to_string()))?;
        let public_key = signing_key
            .verifying_key()
            .to_public_key_der()
            .map_err(|e| AlgorithmError::KeyGeneration(e.to_string()))?;

        Ok(KeyPairDer {
            public_key: public_key.as_bytes().to_vec(),
            private_key: private_key.as_bytes().to_vec(),
        })
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, AlgorithmError> {
        check_private_key(private_key, KeyKind::Ed25519)?;
        let signing_key =
            SigningKey::from_pkcs8_der(private_key).map_err(AlgorithmError::malformed)?;

        Ok(signing_key.sign(message).to_bytes().to_vec())
    }

    fn validate_signature(
        &self,
        public_key: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> Result<(), AlgorithmError> {
        check_public_key(public_key, KeyKind::Ed25519)?;
        let verifying_key =
            VerifyingKey::from_public_key_der(public_key).map_err(AlgorithmError::malformed)?;

        // Must be exactly 64 bytes
        let signature =
            Signature::from_slice(signature).map_err(|_| AlgorithmError::InvalidSignature)?;

        verifying_key
            .verify(message, &signature)
            .map_err(|_| AlgorithmError::InvalidSignature)
    }
}

/// Register EdDSA.
pub fn register(registry: &mut AlgorithmRegistry) {
    registry.register(EddsaAlgorithm::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_valid_signature() {
        let alg = EddsaAlgorithm::new();
        let keys = alg.generate().unwrap();
        let sig = alg.sign(&keys.private_key, b"Hello, World!").unwrap();

        assert_eq!(sig.len(), 64);
        assert!(alg.validate_signature(&keys.public_key, &sig, b"Hello, World!").is_ok());
    }

    #[test]
    fn test_verify_wrong_message() {
        let alg = EddsaAlgorithm::new();
        let keys = alg.generate().unwrap();
        let sig = alg.sign(&keys.private_key, b"Hello, World!").unwrap();

        assert!(matches!(
            alg.validate_signature(&keys.public_key, &sig, b"Wrong message"),
            Err(AlgorithmError::InvalidSignature)
        ));
    }

    #[test]
    fn test_invalid_signature_length() {
        let alg = EddsaAlgorithm::new();
        let keys = alg.generate().unwrap();

        // Too short signature
        assert!(alg.validate_signature(&keys.public_key, &[0u8; 32], b"Hello").is_err());
        // Too long signature
        assert!(alg.validate_signature(&keys.public_key, &[0u8; 128], b"Hello").is_err());
    }

    #[test]
    fn test_descriptor_has_no_hash() {
        let desc = EddsaAlgorithm::new().descriptor();
        assert_eq!(desc.name, "EdDSA");
        assert_eq!(desc.hash, HashFunction::None);
    }
}
