use core_logic::config::{ChainConfig, WalletSource};

#[test]
fn test_wallet_source_file_parsing() {
    let source: WalletSource =
        serde_json::from_str(r#"{"type":"file","path":"wallet.json","encrypted":true}"#).unwrap();

    match source {
        WalletSource::File { path, encrypted } => {
            assert_eq!(path, "wallet.json");
            assert!(encrypted);
        }
        _ => panic!("Expected File variant"),
    }
}

#[test]
fn test_wallet_source_env_parsing() {
    let source: WalletSource =
        serde_json::from_str(r#"{"type":"env","key":"FARMER_KEY"}"#).unwrap();

    assert_eq!(
        source,
        WalletSource::Env {
            key: "FARMER_KEY".to_string()
        }
    );
}

#[test]
fn test_wallet_source_optional_fields_default() {
    let env: WalletSource = serde_json::from_str(r#"{"type":"env"}"#).unwrap();
    assert_eq!(env, WalletSource::default());

    let file: WalletSource = serde_json::from_str(r#"{"type":"file","path":"w.json"}"#).unwrap();
    assert!(!file.needs_password());
}

#[test]
fn test_wallet_source_defaults_to_private_key_env() {
    assert_eq!(
        WalletSource::default(),
        WalletSource::Env {
            key: "PRIVATE_KEY".to_string()
        }
    );
}

#[test]
fn test_only_encrypted_files_need_password() {
    let encrypted = WalletSource::File {
        path: "w.json".to_string(),
        encrypted: true,
    };
    let plain = WalletSource::File {
        path: "w.json".to_string(),
        encrypted: false,
    };

    assert!(encrypted.needs_password());
    assert!(!plain.needs_password());
    assert!(!WalletSource::default().needs_password());
}

#[test]
fn test_chain_config_optional_chain_id() {
    let config: ChainConfig =
        serde_json::from_str(r#"{"name":"berachain","rpc_url":"https://rpc.berachain.com"}"#)
            .unwrap();

    assert_eq!(config.name, "berachain");
    assert!(config.chain_id.is_none());
}
