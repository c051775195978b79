use crate::error::SecurityError;
use aes_gcm::{
    aead::{Aead, NewAead}, // NewAead for 0.9/0.4
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

pub struct SecurityUtils;

impl SecurityUtils {
    /// Decrypts a wallet payload produced by the Node.js wallet tooling:
    /// scrypt(N=16384, r=8, p=1) key derivation and AES-256-GCM with a detached tag.
    pub fn decrypt_components(
        ciphertext_hex: &str,
        iv_hex: &str,
        salt_hex: &str,
        tag_hex: &str,
        password: &str,
    ) -> Result<Zeroizing<String>, SecurityError> {
        let ciphertext = decode_hex("ciphertext", ciphertext_hex)?;
        let iv = decode_hex("iv", iv_hex)?;
        let salt = decode_hex("salt", salt_hex)?;
        let mut tag = decode_hex("tag", tag_hex)?;

        if iv.len() != 12 {
            return Err(SecurityError::CryptographyFailed {
                reason: format!("expected 12-byte IV, got {}", iv.len()),
            });
        }

        let key = derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new(&(*key).into());
        let nonce = Nonce::from_slice(&iv);

        let mut full_payload = ciphertext;
        full_payload.append(&mut tag);

        let plaintext = cipher
            .decrypt(nonce, full_payload.as_ref())
            .map_err(|e| SecurityError::CryptographyFailed {
                reason: e.to_string(),
            })?;

        String::from_utf8(plaintext)
            .map(Zeroizing::new)
            .map_err(|_| SecurityError::CryptographyFailed {
                reason: "decrypted data is not valid UTF-8".to_string(),
            })
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, SecurityError> {
    hex::decode(value.trim_start_matches("0x")).map_err(|_| SecurityError::InvalidHex {
        field: field.to_string(),
    })
}

fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, SecurityError> {
    // Rust scrypt Params: log_n (14 -> 16384), r (8), p (1)
    let params =
        scrypt::Params::new(14, 8, 1, 32).map_err(|e| SecurityError::CryptographyFailed {
            reason: format!("invalid scrypt params: {}", e),
        })?;
    let mut key = Zeroizing::new([0u8; 32]);
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut key[..]).map_err(|e| {
        SecurityError::CryptographyFailed {
            reason: format!("scrypt failed: {}", e),
        }
    })?;
    Ok(key)
}

/// Encrypts `plaintext` into hex components understood by `decrypt_components`.
#[cfg(any(test, feature = "testing"))]
pub fn encrypt_components(
    plaintext: &str,
    password: &str,
    salt: &[u8],
    iv: &[u8; 12],
) -> Result<(String, String, String, String), SecurityError> {
    let key = derive_key(password, salt)?;
    let cipher = Aes256Gcm::new(&(*key).into());
    let sealed = cipher
        .encrypt(Nonce::from_slice(iv), plaintext.as_bytes())
        .map_err(|e| SecurityError::CryptographyFailed {
            reason: e.to_string(),
        })?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - 16);
    Ok((
        hex::encode(ciphertext),
        hex::encode(iv),
        hex::encode(salt),
        hex::encode(tag),
    ))
}
