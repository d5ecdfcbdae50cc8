//! Signature algorithm error types.

use thiserror::Error;

use super::secp256k1::codec::DerError;

/// Failure of a key generation, signing or verification operation.
///
/// Verification fails closed: every variant means "not valid".
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// The decoded key belongs to a different algorithm or curve.
    #[error("invalid key type")]
    InvalidKeyType,

    /// The configured digest cannot be computed.
    #[error("hash function not available")]
    HashUnavailable,

    /// Signature did not verify against the key and message.
    #[error("invalid signature")]
    InvalidSignature,

    /// Key container could not be decoded.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

impl AlgorithmError {
    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Self::MalformedKey(err.to_string())
    }
}

impl From<DerError> for AlgorithmError {
    fn from(err: DerError) -> Self {
        match err {
            DerError::AlgorithmMismatch | DerError::CurveMismatch => Self::InvalidKeyType,
            other => Self::MalformedKey(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_error_mapping() {
        assert!(matches!(
            AlgorithmError::from(DerError::CurveMismatch),
            AlgorithmError::InvalidKeyType
        ));
        assert!(matches!(
            AlgorithmError::from(DerError::AlgorithmMismatch),
            AlgorithmError::InvalidKeyType
        ));
        assert!(matches!(
            AlgorithmError::from(DerError::TrailingData),
            AlgorithmError::MalformedKey(_)
        ));
    }
}
