//! Key container type checks.
//!
//! The generic PKCS#8 / SPKI headers are inspected before handing the DER
//! to a concrete key type, so a well-formed key of the wrong kind is
//! reported as `InvalidKeyType` rather than as a decode failure.

use pkcs8::{ObjectIdentifier, PrivateKeyInfo, SubjectPublicKeyInfoRef};

use super::AlgorithmError;

/// id-ecPublicKey
pub const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// prime256v1 / secp256r1
pub const OID_P256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
/// secp256k1
pub const OID_SECP256K1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");
/// id-Ed25519
pub const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
/// rsaEncryption
pub const OID_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Expected key kind for an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// EC key on the named curve.
    Ec(ObjectIdentifier),
    Ed25519,
    Rsa,
}

impl KeyKind {
    fn matches(self, oid: ObjectIdentifier, curve: Option<ObjectIdentifier>) -> bool {
        match self {
            Self::Ec(expected) => oid == OID_EC_PUBLIC_KEY && curve == Some(expected),
            Self::Ed25519 => oid == OID_ED25519,
            Self::Rsa => oid == OID_RSA,
        }
    }
}

/// Check that a PKCS#8 private key container holds a key of `kind`.
pub fn check_private_key(der: &[u8], kind: KeyKind) -> Result<(), AlgorithmError> {
    let info = PrivateKeyInfo::try_from(der).map_err(AlgorithmError::malformed)?;
    let curve = info.algorithm.parameters_oid().ok();
    if kind.matches(info.algorithm.oid, curve) {
        Ok(())
    } else {
        Err(AlgorithmError::InvalidKeyType)
    }
}

/// Check that a PKIX public key container holds a key of `kind`.
pub fn check_public_key(der: &[u8], kind: KeyKind) -> Result<(), AlgorithmError> {
    let info = SubjectPublicKeyInfoRef::try_from(der).map_err(AlgorithmError::malformed)?;
    let curve = info.algorithm.parameters_oid().ok();
    if kind.matches(info.algorithm.oid, curve) {
        Ok(())
    } else {
        Err(AlgorithmError::InvalidKeyType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::SignAlgorithm;
    use crate::algo::ecdsa::EcdsaAlgorithm;
    use crate::algo::eddsa::EddsaAlgorithm;

    #[test]
    fn test_matching_kind_accepted() {
        let keys = EcdsaAlgorithm::es256().generate().unwrap();
        assert!(check_private_key(&keys.private_key, KeyKind::Ec(OID_P256)).is_ok());
        assert!(check_public_key(&keys.public_key, KeyKind::Ec(OID_P256)).is_ok());
    }

    #[test]
    fn test_other_curve_rejected() {
        let keys = EcdsaAlgorithm::es256().generate().unwrap();
        assert!(matches!(
            check_public_key(&keys.public_key, KeyKind::Ec(OID_SECP256K1)),
            Err(AlgorithmError::InvalidKeyType)
        ));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let keys = EddsaAlgorithm::new().generate().unwrap();
        assert!(matches!(
            check_private_key(&keys.private_key, KeyKind::Rsa),
            Err(AlgorithmError::InvalidKeyType)
        ));
        assert!(check_public_key(&keys.public_key, KeyKind::Ed25519).is_ok());
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            check_public_key(&[0x30, 0x03, 0x01, 0x02], KeyKind::Ed25519),
            Err(AlgorithmError::MalformedKey(_))
        ));
    }
}
