use std::str::FromStr;

use hex::FromHex;
use snafu::ResultExt;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;
use subxt_signer::SecretUri;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::*;

/// load a hex encoded sr25519 key from a file
pub async fn load_substrate_key(file_path: &str) -> Result<Keypair> {
    let mut file = File::open(file_path).await.context(KeyFileReadSnafu {
        path: file_path.to_string(),
    })?;

    let mut hex_string = String::new();
    file.read_to_string(&mut hex_string)
        .await
        .context(KeyFileReadSnafu {
            path: file_path.to_string(),
        })?;

    keypair_from_hex(&hex_string)
}

/// Builds a keypair from a hex encoded 32 byte secret, with or without `0x`.
pub fn keypair_from_hex(hex_string: &str) -> Result<Keypair> {
    let trimmed = hex_string.trim();
    let key_bytes = Vec::from_hex(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .context(KeyParseSnafu)?;

    let length = key_bytes.len();
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| Error::InvalidKeyLength { length })?;

    Keypair::from_secret_key(key_bytes).context(KeypairCreationSnafu)
}

/// Builds a keypair from a secret uri such as `//Alice` or a mnemonic with a derivation path.
pub fn keypair_from_uri(uri: &str) -> Result<Keypair> {
    let uri = SecretUri::from_str(uri).context(SecretUriSnafu)?;
    Keypair::from_uri(&uri).context(KeypairCreationSnafu)
}

/// The privileged identity allowed to dispatch `Sudo.sudo`.
///
/// Passed to the fixtures explicitly rather than looked up from a well-known account, so
/// a test can point them at any chain's sudo key.
#[derive(Clone)]
pub struct AdminCredential {
    /// Sudo keypair.
    keypair: Keypair,
}

impl AdminCredential {
    /// Wraps the sudo keypair.
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Loads the sudo keypair from a secret uri.
    pub fn from_uri(uri: &str) -> Result<Self> {
        keypair_from_uri(uri).map(Self::new)
    }

    /// The keypair used to sign privileged calls.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Account id of the sudo key.
    pub fn account_id(&self) -> AccountId32 {
        self.keypair.public_key().to_account_id()
    }
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("account_id", &self.account_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use subxt_signer::sr25519::dev;

    use super::*;

    #[test]
    fn dev_uris_match_the_dev_accounts() {
        let alice = keypair_from_uri("//Alice").unwrap();
        assert_eq!(
            alice.public_key().to_account_id(),
            dev::alice().public_key().to_account_id()
        );

        let admin = AdminCredential::from_uri("//Alice").unwrap();
        assert_eq!(admin.account_id(), dev::alice().public_key().to_account_id());
    }

    #[test]
    fn hex_secrets_must_be_32_bytes() {
        let secret = "0x".to_string() + &"11".repeat(32);
        assert!(keypair_from_hex(&secret).is_ok());
        assert!(keypair_from_hex(&format!("  {}\n", &"11".repeat(32))).is_ok());

        assert!(matches!(
            keypair_from_hex(&"11".repeat(31)),
            Err(Error::InvalidKeyLength { length: 31 })
        ));
        assert!(matches!(keypair_from_hex("zz"), Err(Error::KeyParse { .. })));
    }

    #[tokio::test]
    async fn missing_key_files_report_the_path() {
        let err = load_substrate_key("/nonexistent/.substrate").await.unwrap_err();
        assert!(matches!(err, Error::KeyFileRead { ref path, .. } if path == "/nonexistent/.substrate"));
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let admin = AdminCredential::new(dev::alice());
        let rendered = format!("{admin:?}");

        assert!(rendered.starts_with("AdminCredential"));
        assert!(rendered.contains("account_id"));
    }
}
