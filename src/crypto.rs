//! Whole-file symmetric encryption for source datasets.
//!
//! The cipher is a keyed byte-rotation XOR stream: each ciphertext byte is
//! rotated and XORed against the previous ciphertext byte, its position, and
//! the key. A fixed magic preamble is encrypted along with the payload so a
//! wrong key is detected deterministically instead of feeding garbage rows to
//! the parser.

use crate::error::{EngineError, EngineResult};

const MAGIC: &[u8; 4] = b"JDX1";
const SEED: u8 = 0x36;

/// Encrypts plaintext for storage. Used by the `encrypt` CLI command and by
/// tests; the engine itself only ever decrypts.
pub fn encrypt(plain: &[u8], key: &str) -> EngineResult<Vec<u8>> {
    let key = key_bytes(key)?;
    let mut out = Vec::with_capacity(plain.len() + MAGIC.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(plain);

    let mut prev = SEED;
    for (i, byte) in out.iter_mut().enumerate() {
        let cipher = (*byte ^ prev ^ (i as u8) ^ key[i % key.len()]).rotate_right(4);
        *byte = cipher;
        prev = cipher;
    }
    Ok(out)
}

/// Decrypts raw file bytes. When `enabled` is false the bytes pass through
/// unchanged; when true a key must be configured and the magic preamble must
/// survive decryption, otherwise the key was wrong or the file is mangled.
pub fn decrypt(raw: Vec<u8>, enabled: bool, key: Option<&str>) -> EngineResult<Vec<u8>> {
    if !enabled {
        return Ok(raw);
    }
    let key = key.ok_or_else(|| EngineError::decryption("encryption enabled but no key configured"))?;
    let key = key_bytes(key)?;

    if raw.len() < MAGIC.len() {
        return Err(EngineError::decryption("ciphertext shorter than preamble"));
    }

    let mut data = raw;
    let mut prev = SEED;
    for (i, byte) in data.iter_mut().enumerate() {
        let cipher = *byte;
        *byte = cipher.rotate_left(4) ^ prev ^ (i as u8) ^ key[i % key.len()];
        prev = cipher;
    }

    if &data[..MAGIC.len()] != MAGIC {
        return Err(EngineError::decryption("bad preamble (wrong key?)"));
    }
    data.drain(..MAGIC.len());
    Ok(data)
}

fn key_bytes(key: &str) -> EngineResult<&[u8]> {
    let bytes = key.as_bytes();
    if bytes.is_empty() {
        return Err(EngineError::decryption("empty key"));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let plain = b"JobTitle\tCompany\nSoftware Engineer\tAcme\n".to_vec();
        let cipher = encrypt(&plain, "sekrit").unwrap();
        assert_ne!(cipher, plain);
        let back = decrypt(cipher, true, Some("sekrit")).unwrap();
        assert_eq!(back, plain);
    }

    #[test]
    fn test_wrong_key_is_an_error() {
        let cipher = encrypt(b"payload", "right-key").unwrap();
        let result = decrypt(cipher, true, Some("wrong-key"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("decryption"));
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let cipher = encrypt(b"payload", "key").unwrap();
        assert!(decrypt(cipher, true, None).is_err());
    }

    #[test]
    fn test_disabled_passes_through() {
        let raw = b"anything at all".to_vec();
        let out = decrypt(raw.clone(), false, None).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_truncated_ciphertext() {
        assert!(decrypt(vec![0x12, 0x34], true, Some("key")).is_err());
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let cipher = encrypt(b"", "key").unwrap();
        let back = decrypt(cipher, true, Some("key")).unwrap();
        assert!(back.is_empty());
    }
}
