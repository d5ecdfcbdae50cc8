//! Minimal DER reader/writer.
//!
//! Covers only what the secp256k1 key containers need: definite-length
//! TLVs with single-byte tags, small non-negative INTEGERs, OCTET STRINGs,
//! BIT STRINGs and OBJECT IDENTIFIERs compared as raw content bytes.

use super::codec::DerError;

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_BIT_STRING: u8 = 0x03;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_OID: u8 = 0x06;
pub const TAG_SEQUENCE: u8 = 0x30;
/// `[0] EXPLICIT`
pub const TAG_CONTEXT_0: u8 = 0xA0;
/// `[1] EXPLICIT`
pub const TAG_CONTEXT_1: u8 = 0xA1;

/// Cursor over a run of DER elements.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Read one element with `tag` and return its content.
    pub fn read(&mut self, tag: u8) -> Result<&'a [u8], DerError> {
        let found = self.peek_tag().ok_or(DerError::Truncated)?;
        if found != tag {
            return Err(DerError::UnexpectedTag {
                expected: tag,
                found,
            });
        }

        let (len, header) = read_length(&self.data[1..])?;
        let start = 1 + header;
        let end = start.checked_add(len).ok_or(DerError::InvalidLength)?;
        if end > self.data.len() {
            return Err(DerError::Truncated);
        }

        let content = &self.data[start..end];
        self.data = &self.data[end..];
        Ok(content)
    }

    /// Read an element only if the next tag is `tag`.
    pub fn read_optional(&mut self, tag: u8) -> Result<Option<&'a [u8]>, DerError> {
        if self.peek_tag() == Some(tag) {
            self.read(tag).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read a non-negative INTEGER that fits in a u64.
    pub fn read_small_uint(&mut self) -> Result<u64, DerError> {
        let content = self.read(TAG_INTEGER)?;
        match content {
            [] => Err(DerError::InvalidInteger),
            [first, ..] if first & 0x80 != 0 => Err(DerError::InvalidInteger),
            [0, second, ..] if second & 0x80 == 0 => Err(DerError::InvalidInteger),
            _ if content.len() > 9 || (content.len() == 9 && content[0] != 0) => {
                Err(DerError::InvalidInteger)
            }
            _ => Ok(content.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))),
        }
    }

    /// Read a BIT STRING with no unused bits and return its payload.
    pub fn read_bit_string(&mut self) -> Result<&'a [u8], DerError> {
        match self.read(TAG_BIT_STRING)? {
            [0, payload @ ..] => Ok(payload),
            _ => Err(DerError::InvalidBitString),
        }
    }
}

/// Parse a definite length, returning `(length, header_bytes)`.
fn read_length(data: &[u8]) -> Result<(usize, usize), DerError> {
    let first = *data.first().ok_or(DerError::Truncated)?;
    if first < 0x80 {
        return Ok((first as usize, 1));
    }

    let count = (first & 0x7F) as usize;
    // 0x80 is BER indefinite length
    if count == 0 || count > 4 {
        return Err(DerError::InvalidLength);
    }
    let bytes = data.get(1..1 + count).ok_or(DerError::Truncated)?;
    if bytes[0] == 0 {
        return Err(DerError::InvalidLength);
    }

    let len = bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
    if len < 0x80 {
        return Err(DerError::InvalidLength);
    }
    Ok((len, 1 + count))
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Append one TLV to `out`.
pub fn write(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    write_length(out, content.len());
    out.extend_from_slice(content);
}

/// Encode one TLV.
pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 4);
    write(&mut out, tag, content);
    out
}

/// Encode a BIT STRING with no unused bits.
pub fn bit_string(payload: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(payload.len() + 1);
    content.push(0);
    content.extend_from_slice(payload);
    tlv(TAG_BIT_STRING, &content)
}

/// Encode a small non-negative INTEGER.
pub fn small_uint(value: u8) -> Vec<u8> {
    if value & 0x80 != 0 {
        tlv(TAG_INTEGER, &[0, value])
    } else {
        tlv(TAG_INTEGER, &[value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_form_length() {
        let content = vec![0x55u8; 300];
        let der = tlv(TAG_OCTET_STRING, &content);
        assert_eq!(&der[..4], &[0x04, 0x82, 0x01, 0x2C]);

        let mut reader = Reader::new(&der);
        assert_eq!(reader.read(TAG_OCTET_STRING).unwrap(), &content[..]);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_non_minimal_length_rejected() {
        // 0x81 0x05 should have been encoded as 0x05
        let der = [0x04, 0x81, 0x05, 1, 2, 3, 4, 5];
        assert!(matches!(
            Reader::new(&der).read(TAG_OCTET_STRING),
            Err(DerError::InvalidLength)
        ));

        let indefinite = [0x30, 0x80, 0x00, 0x00];
        assert!(matches!(
            Reader::new(&indefinite).read(TAG_SEQUENCE),
            Err(DerError::InvalidLength)
        ));
    }

    #[test]
    fn test_truncated_content() {
        let der = [0x04, 0x05, 1, 2];
        assert!(matches!(
            Reader::new(&der).read(TAG_OCTET_STRING),
            Err(DerError::Truncated)
        ));
    }

    #[test]
    fn test_unexpected_tag() {
        let der = tlv(TAG_OID, &[0x2B]);
        assert!(matches!(
            Reader::new(&der).read(TAG_SEQUENCE),
            Err(DerError::UnexpectedTag {
                expected: TAG_SEQUENCE,
                found: TAG_OID
            })
        ));
    }

    #[test]
    fn test_small_uint() {
        assert_eq!(Reader::new(&small_uint(0)).read_small_uint().unwrap(), 0);
        assert_eq!(Reader::new(&small_uint(1)).read_small_uint().unwrap(), 1);
        assert_eq!(Reader::new(&small_uint(200)).read_small_uint().unwrap(), 200);

        // negative
        assert!(Reader::new(&[0x02, 0x01, 0xFF]).read_small_uint().is_err());
        // redundant leading zero
        assert!(Reader::new(&[0x02, 0x02, 0x00, 0x01]).read_small_uint().is_err());
    }

    #[test]
    fn test_optional_element() {
        let mut der = tlv(TAG_OCTET_STRING, &[1]);
        der.extend(tlv(TAG_CONTEXT_1, &bit_string(&[4, 5])));

        let mut reader = Reader::new(&der);
        reader.read(TAG_OCTET_STRING).unwrap();
        assert!(reader.read_optional(TAG_CONTEXT_0).unwrap().is_none());
        let inner = reader.read_optional(TAG_CONTEXT_1).unwrap().unwrap();
        assert_eq!(Reader::new(inner).read_bit_string().unwrap(), &[4, 5]);
    }
}
