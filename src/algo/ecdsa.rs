//! ECDSA over NIST P-256 (ES256).
//!
//! Keys use the standard PKCS#8 / PKIX containers; signatures are ASN.1 DER
//! `(r, s)` sequences computed over the configured digest of the message.

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;

use super::keys::{KeyKind, OID_P256, check_private_key, check_public_key};
use super::registry::AlgorithmRegistry;
use super::{AlgorithmDescriptor, AlgorithmError, HashFunction, KeyPairDer, SignAlgorithm};

/// ECDSA on P-256.
#[derive(Debug, Clone)]
pub struct EcdsaAlgorithm {
    name: &'static str,
    hash: HashFunction,
}

impl EcdsaAlgorithm {
    pub fn new(name: &'static str, hash: HashFunction) -> Self {
        Self { name, hash }
    }

    /// P-256 with SHA-256.
    pub fn es256() -> Self {
        Self::new("ES256", HashFunction::Sha256)
    }
}

impl SignAlgorithm for EcdsaAlgorithm {
    fn descriptor(&self) -> AlgorithmDescriptor {
        AlgorithmDescriptor {
            name: self.name,
            hash: self.hash,
        }
    }

    fn generate(&self) -> Result<KeyPairDer, AlgorithmError> {
        let signing_key = SigningKey::random(&mut OsRng);
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
        check_private_key(private_key, KeyKind::Ec(OID_P256))?;
        let signing_key =
            SigningKey::from_pkcs8_der(private_key).map_err(AlgorithmError::malformed)?;

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
        check_public_key(public_key, KeyKind::Ec(OID_P256))?;
        let verifying_key =
            VerifyingKey::from_public_key_der(public_key).map_err(AlgorithmError::malformed)?;

        let digest = self.hash.digest(message)?;
        let signature =
            Signature::from_der(signature).map_err(|_| AlgorithmError::InvalidSignature)?;

        verifying_key
            .verify_prehash(&digest, &signature)
            .map_err(|_| AlgorithmError::InvalidSignature)
    }
}

/// Register the ECDSA P-256 variants.
pub fn register(registry: &mut AlgorithmRegistry) {
    registry.register(EcdsaAlgorithm::es256());
}
