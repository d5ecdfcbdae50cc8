//! ECDSA over secp256k1 (ES256K).
//!
//! Keys travel in the containers produced by [`codec`]; signatures are the
//! same ASN.1 DER `(r, s)` form used for ES256.

pub mod asn1;
pub mod codec;

use k256::SecretKey;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use super::registry::AlgorithmRegistry;
use super::{AlgorithmDescriptor, AlgorithmError, HashFunction, KeyPairDer, SignAlgorithm};

/// ECDSA on secp256k1.
#[derive(Debug, Clone)]
pub struct Secp256k1Algorithm {
    name: &'static str,
    hash: HashFunction,
}

impl Secp256k1Algorithm {
    pub fn new(name: &'static str, hash: HashFunction) -> Self {
        Self { name, hash }
    }

    /// secp256k1 with SHA-256.
    pub fn es256k() -> Self {
        Self::new("ES256K", HashFunction::Sha256)
    }
}

impl SignAlgorithm for Secp256k1Algorithm {
    fn descriptor(&self) -> AlgorithmDescriptor {
        AlgorithmDescriptor {
            name: self.name,
            hash: self.hash,
        }
    }

    fn generate(&self) -> Result<KeyPairDer, AlgorithmError> {
        let secret = SecretKey::random(&mut OsRng);

        Ok(KeyPairDer {
            public_key: codec::encode_public_key(&secret.public_key()),
            private_key: codec::encode_private_key(&secret),
        })
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, AlgorithmError> {
        let secret = codec::decode_private_key(private_key)?;
        let signing_key = SigningKey::from(&secret);

        let digest = self.hash.digest(message)?;
        let signature: Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|e| AlgorithmError::Signing(e.to_string()))?;

        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn validate_signature(
        &self,
        public_key: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> Result<(), AlgorithmError> {
        let public = codec::decode_public_key(public_key)?;
        let verifying_key = VerifyingKey::from(&public);

        let digest = self.hash.digest(message)?;
        let signature =
            Signature::from_der(signature).map_err(|_| AlgorithmError::InvalidSignature)?;
        // Other signers do not normalize s; the verifier only accepts low-s
        let signature = signature.normalize_s().unwrap_or(signature);

        verifying_key
            .verify_prehash(&digest, &signature)
            .map_err(|_| AlgorithmError::InvalidSignature)
    }
}

/// Register the secp256k1 variants.
pub fn register(registry: &mut AlgorithmRegistry) {
    registry.register(Secp256k1Algorithm::es256k());
}
