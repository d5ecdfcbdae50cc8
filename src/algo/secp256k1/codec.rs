//! PKCS#8 / PKIX containers for secp256k1 keys.
//!
//! The generic key-container crates only understand the NIST curves, so
//! secp256k1 keys are framed here by hand. The layouts are the standard ones:
//!
//! ```text
//! PrivateKeyInfo ::= SEQUENCE {
//!     version             INTEGER (0 | 1),
//!     algorithm           SEQUENCE { id-ecPublicKey, secp256k1 },
//!     privateKey          OCTET STRING (ECPrivateKey)
//! }
//!
//! ECPrivateKey ::= SEQUENCE {
//!     version             INTEGER (1),
//!     privateKey          OCTET STRING (32 bytes, big-endian),
//!     parameters      [0] OBJECT IDENTIFIER OPTIONAL,
//!     publicKey       [1] BIT STRING OPTIONAL
//! }
//!
//! SubjectPublicKeyInfo ::= SEQUENCE {
//!     algorithm           SEQUENCE { id-ecPublicKey, secp256k1 },
//!     subjectPublicKey    BIT STRING (04 || X || Y)
//! }
//! ```
//!
//! Decoding is lenient about the width of the private scalar: over-long
//! encodings may carry leading zero bytes, and short encodings from
//! encoders that drop leading zeros are zero-extended.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{FieldBytes, PublicKey, SecretKey};
use thiserror::Error;

use super::asn1::{
    self, Reader, TAG_CONTEXT_0, TAG_CONTEXT_1, TAG_OCTET_STRING, TAG_OID, TAG_SEQUENCE,
};

/// id-ecPublicKey (1.2.840.10045.2.1), content bytes.
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];
/// secp256k1 (1.3.132.0.10), content bytes.
const OID_SECP256K1: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x0A];

/// Byte length of the secp256k1 group order.
const SCALAR_LEN: usize = 32;
/// Uncompressed SEC1 point length.
const POINT_LEN: usize = 1 + 2 * SCALAR_LEN;

const PKCS8_VERSION: u64 = 0;
/// OneAsymmetricKey (RFC 5958), may carry a trailing public key.
const PKCS8_V2_VERSION: u64 = 1;
const EC_PRIVATE_KEY_VERSION: u64 = 1;

/// Container decode failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerError {
    #[error("truncated DER input")]
    Truncated,

    #[error("unexpected tag: expected {expected:#04x}, found {found:#04x}")]
    UnexpectedTag { expected: u8, found: u8 },

    #[error("invalid DER length")]
    InvalidLength,

    #[error("invalid INTEGER encoding")]
    InvalidInteger,

    #[error("invalid BIT STRING encoding")]
    InvalidBitString,

    #[error("unsupported version {0}")]
    UnsupportedVersion(u64),

    /// Algorithm OID is not id-ecPublicKey.
    #[error("algorithm is not id-ecPublicKey")]
    AlgorithmMismatch,

    /// Curve parameters are missing or name another curve.
    #[error("curve is not secp256k1")]
    CurveMismatch,

    #[error("trailing data after key")]
    TrailingData,

    /// Non-zero byte before the expected scalar width.
    #[error("private scalar is too long")]
    ScalarTooLong,

    #[error("private scalar out of range")]
    ScalarOutOfRange,

    #[error("invalid curve point")]
    InvalidPoint,
}

fn algorithm_identifier() -> Vec<u8> {
    let mut content = asn1::tlv(TAG_OID, OID_EC_PUBLIC_KEY);
    asn1::write(&mut content, TAG_OID, OID_SECP256K1);
    asn1::tlv(TAG_SEQUENCE, &content)
}

fn check_algorithm_identifier(content: &[u8]) -> Result<(), DerError> {
    let mut reader = Reader::new(content);
    if reader.read(TAG_OID)? != OID_EC_PUBLIC_KEY {
        return Err(DerError::AlgorithmMismatch);
    }
    // Named curve only; NULL or explicit parameters are not secp256k1 to us
    match reader.read_optional(TAG_OID)? {
        Some(curve) if curve == OID_SECP256K1 => Ok(()),
        _ => Err(DerError::CurveMismatch),
    }
}

fn uncompressed_point(public_key: &PublicKey) -> Vec<u8> {
    public_key.to_encoded_point(false).as_bytes().to_vec()
}

/// Frame raw scalar and point bytes as PKCS#8.
pub(crate) fn private_key_der(scalar: &[u8], point: &[u8]) -> Vec<u8> {
    let mut ec = asn1::small_uint(EC_PRIVATE_KEY_VERSION as u8);
    asn1::write(&mut ec, TAG_OCTET_STRING, scalar);
    asn1::write(&mut ec, TAG_CONTEXT_0, &asn1::tlv(TAG_OID, OID_SECP256K1));
    asn1::write(&mut ec, TAG_CONTEXT_1, &asn1::bit_string(point));
    let ec_private_key = asn1::tlv(TAG_SEQUENCE, &ec);

    let mut info = asn1::small_uint(PKCS8_VERSION as u8);
    info.extend(algorithm_identifier());
    asn1::write(&mut info, TAG_OCTET_STRING, &ec_private_key);
    asn1::tlv(TAG_SEQUENCE, &info)
}

/// Encode a private key as PKCS#8 DER.
///
/// The scalar is always written at the full 32-byte width.
pub fn encode_private_key(key: &SecretKey) -> Vec<u8> {
    let scalar = key.to_bytes();
    private_key_der(&scalar, &uncompressed_point(&key.public_key()))
}

/// Encode a public key as PKIX SubjectPublicKeyInfo DER.
pub fn encode_public_key(key: &PublicKey) -> Vec<u8> {
    let mut info = algorithm_identifier();
    info.extend(asn1::bit_string(&uncompressed_point(key)));
    asn1::tlv(TAG_SEQUENCE, &info)
}

/// Bring an encoded scalar to exactly `SCALAR_LEN` bytes.
fn normalize_scalar(mut scalar: &[u8]) -> Result<[u8; SCALAR_LEN], DerError> {
    while scalar.len() > SCALAR_LEN {
        if scalar[0] != 0 {
            return Err(DerError::ScalarTooLong);
        }
        scalar = &scalar[1..];
    }

    let mut fixed = [0u8; SCALAR_LEN];
    fixed[SCALAR_LEN - scalar.len()..].copy_from_slice(scalar);
    Ok(fixed)
}

/// Decode a PKCS#8 DER private key.
///
/// Bytes following the outer sequence are ignored. The embedded public
/// point is not trusted; the public key is always derived from the scalar.
/// The algorithm is checked before the version so that a v2 container of
/// another key type reports a mismatch.
pub fn decode_private_key(der: &[u8]) -> Result<SecretKey, DerError> {
    let info = Reader::new(der).read(TAG_SEQUENCE)?;
    let mut reader = Reader::new(info);

    let version = reader.read_small_uint()?;
    check_algorithm_identifier(reader.read(TAG_SEQUENCE)?)?;
    if version != PKCS8_VERSION && version != PKCS8_V2_VERSION {
        return Err(DerError::UnsupportedVersion(version));
    }
    let octets = reader.read(TAG_OCTET_STRING)?;

    let ec = Reader::new(octets).read(TAG_SEQUENCE)?;
    let mut reader = Reader::new(ec);

    let version = reader.read_small_uint()?;
    if version != EC_PRIVATE_KEY_VERSION {
        return Err(DerError::UnsupportedVersion(version));
    }
    let scalar = reader.read(TAG_OCTET_STRING)?;

    if let Some(parameters) = reader.read_optional(TAG_CONTEXT_0)? {
        if Reader::new(parameters).read(TAG_OID)? != OID_SECP256K1 {
            return Err(DerError::CurveMismatch);
        }
    }

    let fixed = normalize_scalar(scalar)?;
    SecretKey::from_bytes(FieldBytes::from_slice(&fixed)).map_err(|_| DerError::ScalarOutOfRange)
}

/// Decode a PKIX SubjectPublicKeyInfo DER public key.
pub fn decode_public_key(der: &[u8]) -> Result<PublicKey, DerError> {
    let mut outer = Reader::new(der);
    let info = outer.read(TAG_SEQUENCE)?;
    if !outer.is_empty() {
        return Err(DerError::TrailingData);
    }

    let mut reader = Reader::new(info);
    check_algorithm_identifier(reader.read(TAG_SEQUENCE)?)?;
    let point = reader.read_bit_string()?;

    if point.len() != POINT_LEN || point[0] != 0x04 {
        return Err(DerError::InvalidPoint);
    }
    PublicKey::from_sec1_bytes(point).map_err(|_| DerError::InvalidPoint)
}
