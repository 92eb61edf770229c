//! AES-128-CBC/PKCS7 decryption of the `data` envelope some REST responses
//! wrap their JSON payload in.

use aes::Aes128;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};

use crate::error::{CryptoError, CryptoResult};

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// A response `data` field is either plaintext JSON (starts with `{`) or a
/// Base64-encoded AES-128-CBC ciphertext of the same schema. Heuristic from
/// the wire contract: treat anything that isn't already a JSON object, and
/// that looks like Base64 (length and alphabet), as ciphertext.
pub fn looks_like_ciphertext(data: &str) -> bool {
    let trimmed = data.trim();
    if trimmed.starts_with('{') {
        return false;
    }
    trimmed.len() >= 50
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
}

/// Base64-decode then AES-128-CBC/PKCS7-decrypt `ciphertext`, returning the
/// decrypted UTF-8 string with JSON's `\/` escape unescaped to `/`.
pub fn decrypt_envelope(ciphertext_b64: &str, key: &[u8; 16], iv: &[u8; 16]) -> CryptoResult<String> {
    let mut buf = STANDARD
        .decode(ciphertext_b64.trim())
        .map_err(|e| CryptoError::Base64(e.to_string()))?;

    if buf.len() % 16 != 0 || buf.is_empty() {
        return Err(CryptoError::InvalidCiphertextLength(buf.len()));
    }

    let decrypted = Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

    let text = std::str::from_utf8(decrypted)
        .map_err(|e| CryptoError::Utf8(e.to_string()))?
        .replace("\\/", "/");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::Aes128;
    use cbc::cipher::BlockEncryptMut;

    type Aes128CbcEnc = cbc::Encryptor<Aes128>;

    const KEY: [u8; 16] = *b"0123456789abcdef";
    const IV: [u8; 16] = *b"fedcba9876543210";

    fn encrypt(plaintext: &str) -> String {
        let mut buf = plaintext.as_bytes().to_vec();
        let pos = buf.len();
        buf.resize(pos + 16, 0);
        let ciphertext = Aes128CbcEnc::new(&KEY.into(), &IV.into())
            .encrypt_padded_mut::<cbc::cipher::block_padding::Pkcs7>(&mut buf, pos)
            .unwrap();
        STANDARD.encode(ciphertext)
    }

    #[test]
    fn decrypt_round_trips_with_encrypt() {
        let plaintext = r#"{"api_url":"https:\/\/api.example.com"}"#;
        let encoded = encrypt(plaintext);
        let decrypted = decrypt_envelope(&encoded, &KEY, &IV).unwrap();
        assert_eq!(decrypted, r#"{"api_url":"https://api.example.com"}"#);
    }

    #[test]
    fn looks_like_ciphertext_rejects_plain_json() {
        assert!(!looks_like_ciphertext(r#"{"api_url":"https://x"}"#));
    }

    #[test]
    fn looks_like_ciphertext_rejects_short_strings() {
        assert!(!looks_like_ciphertext("c2hvcnQ="));
    }

    #[test]
    fn looks_like_ciphertext_accepts_long_base64() {
        let candidate = STANDARD.encode([0u8; 48]);
        assert!(looks_like_ciphertext(&candidate));
    }

    #[test]
    fn decrypt_rejects_non_block_aligned_input() {
        let err = decrypt_envelope(&STANDARD.encode(b"short"), &KEY, &IV).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidCiphertextLength(_)));
    }
}
