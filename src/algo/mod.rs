//! Pluggable signature algorithms.
//!
//! Every algorithm works on DER key containers (PKCS#8 private keys,
//! PKIX SubjectPublicKeyInfo public keys) and is fully stateless: key
//! material is passed in on every call and never retained.
//!
//! ## Components
//! - `registry`: name -> implementation table built at start-up
//! - `ecdsa`: ES256 (P-256 + SHA-256)
//! - `secp256k1`: ES256K (secp256k1 + SHA-256) with its own DER codec
//! - `eddsa`: EdDSA (Ed25519)
//! - `rsa`: RS256 / RS512 (PKCS#1 v1.5)
//! - `keys`: container type checks shared by the standard-library-backed variants
//! - `pem`: PEM / base64 helpers for keys at the boundary

pub mod ecdsa;
pub mod eddsa;
pub mod error;
pub mod keys;
pub mod pem;
pub mod registry;
pub mod rsa;
pub mod secp256k1;

use sha2::{Digest, Sha256, Sha512};

pub use error::AlgorithmError;
pub use registry::AlgorithmRegistry;

/// Digest applied to the message before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunction {
    Sha256,
    Sha512,
    /// The algorithm signs the raw message (EdDSA).
    None,
}

impl HashFunction {
    /// Hash `data`, failing with `HashUnavailable` when there is no digest.
    pub fn digest(self, data: &[u8]) -> Result<Vec<u8>, AlgorithmError> {
        match self {
            Self::Sha256 => Ok(Sha256::digest(data).to_vec()),
            Self::Sha512 => Ok(Sha512::digest(data).to_vec()),
            Self::None => Err(AlgorithmError::HashUnavailable),
        }
    }
}

/// Immutable description of a registered algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    pub name: &'static str,
    pub hash: HashFunction,
}

/// Freshly generated keypair in DER containers.
///
/// `public_key` is PKIX SubjectPublicKeyInfo, `private_key` is PKCS#8.
pub struct KeyPairDer {
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl std::fmt::Debug for KeyPairDer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairDer")
            .field("public_key", &self.public_key.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Contract shared by all signature algorithms.
pub trait SignAlgorithm: Send + Sync {
    /// Name and hash of this algorithm.
    fn descriptor(&self) -> AlgorithmDescriptor;

    /// Stable identifier used in stored records and requests.
    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Generate a keypair.
    fn generate(&self) -> Result<KeyPairDer, AlgorithmError>;

    /// Sign `message` with a PKCS#8 DER private key.
    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, AlgorithmError>;

    /// Verify `signature` over `message` with a PKIX DER public key.
    fn validate_signature(
        &self,
        public_key: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> Result<(), AlgorithmError>;
}
