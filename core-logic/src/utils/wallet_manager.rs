use crate::config::WalletSource;
use crate::error::{ConfigError, CoreError, SecurityError, WalletError};
use crate::security::SecurityUtils;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// A validated 32-byte hex private key, without `0x` prefix. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn parse(raw: &str) -> Result<Self, WalletError> {
        let trimmed = raw.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidKeyFormat);
        }
        if hex_part.len() != 64 {
            return Err(WalletError::InvalidKeyLength {
                length: hex_part.len(),
            });
        }
        Ok(Self(hex_part.to_ascii_lowercase()))
    }

    pub fn expose_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(***REDACTED***)")
    }
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct DecryptedWallet {
    #[serde(default)]
    evm_private_key: String,
}

#[derive(Deserialize)]
struct EncryptedBlock {
    ciphertext: String,
    iv: String,
    salt: String,
    tag: String,
}

#[derive(Deserialize)]
struct WalletFile {
    #[serde(default)]
    encrypted: Option<EncryptedBlock>,
    #[serde(default)]
    evm_private_key: Option<String>,
}

pub struct WalletManager;

impl WalletManager {
    /// Resolves the single signing key for this process.
    pub fn load_private_key(
        source: &WalletSource,
        password: Option<&str>,
    ) -> Result<PrivateKey, CoreError> {
        match source {
            WalletSource::Env { key } => {
                let raw = Zeroizing::new(std::env::var(key).map_err(|_| {
                    WalletError::MissingEnvKey { key: key.clone() }
                })?);
                Ok(PrivateKey::parse(&raw)?)
            }
            WalletSource::File { path, encrypted } => {
                Self::load_wallet_file(Path::new(path), *encrypted, password)
            }
        }
    }

    fn load_wallet_file(
        path: &Path,
        encrypted: bool,
        password: Option<&str>,
    ) -> Result<PrivateKey, CoreError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound { path: display }.into());
        }
        let content = Zeroizing::new(fs::read_to_string(path).map_err(|e| {
            ConfigError::IoError {
                path: display.clone(),
                msg: e.to_string(),
            }
        })?);
        let wallet: WalletFile = serde_json::from_str(&content)
            .map_err(|_| WalletError::UnrecognizedFormat {
                path: display.clone(),
            })?;

        match (wallet.encrypted, wallet.evm_private_key) {
            (Some(block), _) => {
                let pass = password.ok_or(SecurityError::PasswordRequired)?;
                let decrypted = SecurityUtils::decrypt_components(
                    &block.ciphertext,
                    &block.iv,
                    &block.salt,
                    &block.tag,
                    pass,
                )
                .map_err(|e| WalletError::DecryptionFailed {
                    path: display.clone(),
                    reason: e.to_string(),
                })?;
                let inner: DecryptedWallet = serde_json::from_str(&decrypted)
                    .map_err(|_| WalletError::UnrecognizedFormat {
                        path: display.clone(),
                    })?;
                Ok(PrivateKey::parse(&inner.evm_private_key)?)
            }
            (None, Some(raw)) if !encrypted => {
                let raw = Zeroizing::new(raw);
                Ok(PrivateKey::parse(&raw)?)
            }
            _ => Err(WalletError::UnrecognizedFormat { path: display }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_parse_accepts_prefixed_key() {
        let key = PrivateKey::parse(&format!("0x{}", KEY.to_uppercase())).unwrap();
        assert_eq!(key.expose_hex(), KEY);
    }

    #[test]
    fn test_parse_rejects_short_key() {
        assert_eq!(
            PrivateKey::parse("abcd").unwrap_err(),
            WalletError::InvalidKeyLength { length: 4 }
        );
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert_eq!(
            PrivateKey::parse("not-a-key").unwrap_err(),
            WalletError::InvalidKeyFormat
        );
    }

    #[test]
    fn test_encrypted_wallet_file_round_trip() {
        use std::io::Write;

        let inner = format!(r#"{{"evm_private_key":"0x{}","evm_address":"0xabc"}}"#, KEY);
        let (ciphertext, iv, salt, tag) =
            crate::security::encrypt_components(&inner, "pw", b"farm-salt", &[3u8; 12]).unwrap();
        let json = format!(
            r#"{{"encrypted":{{"ciphertext":"{}","iv":"{}","salt":"{}","tag":"{}"}}}}"#,
            ciphertext, iv, salt, tag
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let source = WalletSource::File {
            path: file.path().display().to_string(),
            encrypted: true,
        };
        let key = WalletManager::load_private_key(&source, Some("pw")).unwrap();
        assert_eq!(key.expose_hex(), KEY);

        let err = WalletManager::load_private_key(&source, Some("nope")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Wallet(WalletError::DecryptionFailed { .. })
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = PrivateKey::parse(KEY).unwrap();
        assert!(!format!("{:?}", key).contains(KEY));
    }
}
