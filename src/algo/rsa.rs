//! RSASSA-PKCS1-v1_5 signatures (RS256, RS512).

use ::rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ::rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use rand::rngs::OsRng;
use sha2::{Sha256, Sha512};

use super::keys::{KeyKind, check_private_key, check_public_key};
use super::registry::AlgorithmRegistry;
use super::{AlgorithmDescriptor, AlgorithmError, HashFunction, KeyPairDer, SignAlgorithm};

/// Modulus size for generated keys.
pub const RSA_KEY_BITS: usize = 2048;

/// RSA PKCS#1 v1.5 with a fixed digest.
#[derive(Debug, Clone)]
pub struct RsaAlgorithm {
    name: &'static str,
    hash: HashFunction,
}

impl RsaAlgorithm {
    pub fn new(name: &'static str, hash: HashFunction) -> Self {
        Self { name, hash }
    }

    pub fn rs256() -> Self {
        Self::new("RS256", HashFunction::Sha256)
    }

    pub fn rs512() -> Self {
        Self::new("RS512", HashFunction::Sha512)
    }

    fn padding(&self) -> Result<Pkcs1v15Sign, AlgorithmError> {
        match self.hash {
            HashFunction::Sha256 => Ok(Pkcs1v15Sign::new::<Sha256>()),
            HashFunction::Sha512 => Ok(Pkcs1v15Sign::new::<Sha512>()),
            HashFunction::None => Err(AlgorithmError::HashUnavailable),
        }
    }
}

impl SignAlgorithm for RsaAlgorithm {
    fn descriptor(&self) -> AlgorithmDescriptor {
        AlgorithmDescriptor {
            name: self.name,
            hash: self.hash,
        }
    }

    fn generate(&self) -> Result<KeyPairDer, AlgorithmError> {
        let private = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| AlgorithmError::KeyGeneration(e.to_string()))?;
        let private_key = private
            .to_pkcs8_der()
            .map_err(|e| AlgorithmError::KeyGeneration(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private)
            .to_public_key_der()
            .map_err(|e| AlgorithmError::KeyGeneration(e.to_string()))?;

        Ok(KeyPairDer {
            public_key: public_key.as_bytes().to_vec(),
            private_key: private_key.as_bytes().to_vec(),
        })
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, AlgorithmError> {
        check_private_key(private_key, KeyKind::Rsa)?;
        let private =
            RsaPrivateKey::from_pkcs8_der(private_key).map_err(AlgorithmError::malformed)?;

        let padding = self.padding()?;
        let digest = self.hash.digest(message)?;
        private
            .sign(padding, &digest)
            .map_err(|e| AlgorithmError::Signing(e.to_string()))
    }

    fn validate_signature(
        &self,
        public_key: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> Result<(), AlgorithmError> {
        check_public_key(public_key, KeyKind::Rsa)?;
        let public =
            RsaPublicKey::from_public_key_der(public_key).map_err(AlgorithmError::malformed)?;

        let padding = self.padding()?;
        let digest = self.hash.digest(message)?;
        public
            .verify(padding, &digest, signature)
            .map_err(|_| AlgorithmError::InvalidSignature)
    }
}

/// Register RS256 and RS512.
pub fn register(registry: &mut AlgorithmRegistry) {
    registry.register(RsaAlgorithm::rs256());
    registry.register(RsaAlgorithm::rs512());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::eddsa::EddsaAlgorithm;

    #[test]
    fn test_rs256_and_rs512() {
        let keys = RsaAlgorithm::rs256().generate().unwrap();

        for alg in [RsaAlgorithm::rs256(), RsaAlgorithm::rs512()] {
            let sig = alg.sign(&keys.private_key, b"test data").unwrap();
            assert_eq!(sig.len(), RSA_KEY_BITS / 8);
            assert!(alg.validate_signature(&keys.public_key, &sig, b"test data").is_ok());
        }
    }

    #[test]
    fn test_digest_is_bound_to_variant() {
        let keys = RsaAlgorithm::rs256().generate().unwrap();
        let sig = RsaAlgorithm::rs256().sign(&keys.private_key, b"data").unwrap();

        assert!(matches!(
            RsaAlgorithm::rs512().validate_signature(&keys.public_key, &sig, b"data"),
            Err(AlgorithmError::InvalidSignature)
        ));
    }

    #[test]
    fn test_ed25519_key_is_wrong_type() {
        let ed = EddsaAlgorithm::new().generate().unwrap();
        assert!(matches!(
            RsaAlgorithm::rs256().sign(&ed.private_key, b"data"),
            Err(AlgorithmError::InvalidKeyType)
        ));
    }
}
