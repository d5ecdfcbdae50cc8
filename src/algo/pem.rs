//! PEM and base64 helpers for moving DER keys across process boundaries.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::AlgorithmError;

pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Wrap DER bytes in a PEM block with `label`.
pub fn encode(label: &str, der: &[u8]) -> String {
    pem::encode(&pem::Pem::new(label, der.to_vec()))
}

/// Parse a PEM block, requiring `label`, and return the DER payload.
pub fn decode(label: &str, input: &str) -> Result<Vec<u8>, AlgorithmError> {
    let block = pem::parse(input).map_err(AlgorithmError::malformed)?;
    if block.tag() != label {
        return Err(AlgorithmError::MalformedKey(format!(
            "expected PEM label {label:?}, found {:?}",
            block.tag()
        )));
    }
    Ok(block.into_contents())
}

/// Standard base64 with padding.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(input)
}
