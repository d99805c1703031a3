//! Create and open keystore wallets outside of any flow.

use alloy_primitives::Address;
use k256::ecdsa::SigningKey;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::flow::FlowError;
use crate::keystore::{self, DecryptedAccount, KeystoreError, ScryptSettings};

/// A freshly generated account and its encrypted keystore.
pub struct CreatedWallet {
    pub address: Address,
    private_key: Zeroizing<String>,
    pub keystore_json: String,
}

impl CreatedWallet {
    /// `0x`-prefixed hex private key.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// File name the keystore is saved under: the checksummed `0x` address.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.address)
    }
}

impl std::fmt::Debug for CreatedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedWallet")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Generate a new secp256k1 key and encrypt it under `password`.
pub fn create_wallet(password: &str) -> Result<CreatedWallet, KeystoreError> {
    create_wallet_with(password, ScryptSettings::default(), &mut rand::rngs::OsRng)
}

pub fn create_wallet_with<R: RngCore + CryptoRng>(
    password: &str,
    settings: ScryptSettings,
    rng: &mut R,
) -> Result<CreatedWallet, KeystoreError> {
    if password.is_empty() {
        return Err(KeystoreError::EmptyPassword);
    }
    let signing_key = SigningKey::random(&mut *rng);
    let file = keystore::encrypt_with(&signing_key, password, settings, rng)?;
    let account = DecryptedAccount::new(signing_key);
    tracing::info!(address = %account.address, "wallet created");
    Ok(CreatedWallet {
        address: account.address,
        private_key: account.private_key_hex(),
        keystore_json: file.to_json()?,
    })
}

/// Decrypt a keystore blob for display, mapping failures onto the flow taxonomy.
pub fn decrypt_wallet(json: &str, password: &str) -> Result<DecryptedAccount, FlowError> {
    if json.trim().is_empty() || password.is_empty() {
        return Err(FlowError::MissingIdentity);
    }
    keystore::decrypt(json, password).map_err(|e| FlowError::DecryptionFailed(e.to_string()))
}
