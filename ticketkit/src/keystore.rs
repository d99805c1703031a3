//! Web3 Secret Storage (version 3) keystore files.
//!
//! Supports scrypt and PBKDF2-HMAC-SHA256 key derivation with AES-128-CTR,
//! which covers what web3.js, ethers and geth write.

use aes::Aes128;
use alloy_primitives::{keccak256, Address};
use ctr::cipher::{KeyIvInit, StreamCipher};
use k256::ecdsa::SigningKey;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::signer::local::address_from_signing_key;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const CIPHER: &str = "aes-128-ctr";
const KEY_LEN: usize = 32;
const MAX_KEY_LEN: usize = 64;
/// Largest scrypt working set accepted from a file (128 * r * n bytes).
const MAX_SCRYPT_MEMORY: u64 = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("keystore is empty")]
    EmptyKeystore,

    #[error("malformed keystore: {0}")]
    Malformed(String),

    #[error("unsupported keystore version {0}")]
    UnsupportedVersion(u64),

    #[error("unsupported key derivation function: {0}")]
    UnsupportedKdf(String),

    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    #[error("key derivation failed - possibly wrong password")]
    MacMismatch,

    #[error("keystore holds an invalid private key")]
    InvalidKey,
}

type Result<T> = std::result::Result<T, KeystoreError>;

/// scrypt cost parameters used when encrypting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptSettings {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for ScryptSettings {
    /// `n = 8192, r = 8, p = 1`, the web3.js default.
    fn default() -> Self {
        Self {
            log_n: 13,
            r: 8,
            p: 1,
        }
    }
}

/// Serialized keystore, as found in a `<address>.json` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub version: u64,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(alias = "Crypto")]
    pub crypto: CryptoSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoSection {
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub cipher: String,
    pub kdf: String,
    pub kdfparams: KdfParams,
    pub mac: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KdfParams {
    Scrypt {
        dklen: usize,
        n: u64,
        r: u32,
        p: u32,
        salt: String,
    },
    Pbkdf2 {
        c: u32,
        dklen: usize,
        prf: String,
        salt: String,
    },
}

/// Private key recovered from a keystore.
pub struct DecryptedAccount {
    pub address: Address,
    signing_key: SigningKey,
}

impl DecryptedAccount {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            address: address_from_signing_key(&signing_key),
            signing_key,
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// `0x`-prefixed hex private key. Only for explicit display requests.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_bytes().to_vec());
        Zeroizing::new(format!("0x{}", hex::encode(bytes.as_slice())))
    }
}

impl std::fmt::Debug for DecryptedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedAccount")
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl KeystoreFile {
    pub fn parse(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Err(KeystoreError::EmptyKeystore);
        }
        serde_json::from_str(json).map_err(|e| KeystoreError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| KeystoreError::Malformed(e.to_string()))
    }
}

/// Encrypt `signing_key` under `password` with default scrypt settings.
pub fn encrypt(signing_key: &SigningKey, password: &str) -> Result<KeystoreFile> {
    encrypt_with(
        signing_key,
        password,
        ScryptSettings::default(),
        &mut rand::rngs::OsRng,
    )
}

/// Encrypt `signing_key` under `password` with explicit scrypt cost and randomness.
pub fn encrypt_with<R: RngCore + CryptoRng>(
    signing_key: &SigningKey,
    password: &str,
    settings: ScryptSettings,
    rng: &mut R,
) -> Result<KeystoreFile> {
    if password.is_empty() {
        return Err(KeystoreError::EmptyPassword);
    }

    let mut salt = [0u8; 32];
    rng.fill_bytes(&mut salt);
    let mut iv = [0u8; 16];
    rng.fill_bytes(&mut iv);
    let mut id = [0u8; 16];
    rng.fill_bytes(&mut id);

    let kdfparams = KdfParams::Scrypt {
        dklen: KEY_LEN,
        n: 1u64 << settings.log_n,
        r: settings.r,
        p: settings.p,
        salt: hex::encode(salt),
    };
    let derived = derive_key(password, &kdfparams)?;

    let mut ciphertext = signing_key.to_bytes().to_vec();
    apply_ctr(&derived[..16], &iv, &mut ciphertext)?;
    let mac = compute_mac(&derived, &ciphertext);

    let address = address_from_signing_key(signing_key);

    Ok(KeystoreFile {
        version: 3,
        id: uuid::Builder::from_random_bytes(id)
            .into_uuid()
            .to_string(),
        address: Some(hex::encode(address.as_slice())),
        crypto: CryptoSection {
            ciphertext: hex::encode(&ciphertext),
            cipherparams: CipherParams {
                iv: hex::encode(iv),
            },
            cipher: CIPHER.to_string(),
            kdf: "scrypt".to_string(),
            kdfparams,
            mac: hex::encode(mac),
        },
    })
}

/// Decrypt keystore JSON text with `password`.
///
/// # Errors
///
/// `MacMismatch` for a wrong password; `Malformed`, `UnsupportedKdf`,
/// `UnsupportedCipher` or `UnsupportedVersion` for blobs this module cannot read.
pub fn decrypt(json: &str, password: &str) -> Result<DecryptedAccount> {
    let file = KeystoreFile::parse(json)?;
    decrypt_file(&file, password)
}

pub fn decrypt_file(file: &KeystoreFile, password: &str) -> Result<DecryptedAccount> {
    if password.is_empty() {
        return Err(KeystoreError::EmptyPassword);
    }
    if file.version != 3 {
        return Err(KeystoreError::UnsupportedVersion(file.version));
    }
    let crypto = &file.crypto;
    if crypto.cipher != CIPHER {
        return Err(KeystoreError::UnsupportedCipher(crypto.cipher.clone()));
    }
    let expected_kdf = match crypto.kdfparams {
        KdfParams::Scrypt { .. } => "scrypt",
        KdfParams::Pbkdf2 { .. } => "pbkdf2",
    };
    if crypto.kdf != expected_kdf {
        return Err(KeystoreError::UnsupportedKdf(crypto.kdf.clone()));
    }

    let ciphertext = decode_field("ciphertext", &crypto.ciphertext)?;
    let iv = decode_field("iv", &crypto.cipherparams.iv)?;
    let mac = decode_field("mac", &crypto.mac)?;

    let derived = derive_key(password, &crypto.kdfparams)?;
    let expected = compute_mac(&derived, &ciphertext);
    if mac.len() != expected.len() || !bool::from(expected.as_slice().ct_eq(&mac)) {
        return Err(KeystoreError::MacMismatch);
    }

    let mut plain = Zeroizing::new(ciphertext);
    apply_ctr(&derived[..16], &iv, &mut plain)?;
    let signing_key = SigningKey::from_slice(&plain).map_err(|_| KeystoreError::InvalidKey)?;
    let account = DecryptedAccount::new(signing_key);

    if let Some(stored) = &file.address {
        if !stored
            .trim_start_matches("0x")
            .eq_ignore_ascii_case(&hex::encode(account.address.as_slice()))
        {
            tracing::warn!(
                stored = %stored,
                derived = %account.address,
                "keystore address field does not match decrypted key"
            );
        }
    }

    Ok(account)
}

fn derive_key(password: &str, params: &KdfParams) -> Result<Zeroizing<Vec<u8>>> {
    match params {
        KdfParams::Scrypt {
            dklen,
            n,
            r,
            p,
            salt,
        } => {
            check_dklen(*dklen)?;
            if *n < 2 || !n.is_power_of_two() {
                return Err(KeystoreError::Malformed(format!(
                    "scrypt n must be a power of two, got {n}"
                )));
            }
            if 128 * u64::from(*r) > MAX_SCRYPT_MEMORY / n {
                return Err(KeystoreError::Malformed(format!(
                    "scrypt parameters n={n} r={r} exceed the memory limit"
                )));
            }
            let log_n = n.trailing_zeros() as u8;
            let salt = decode_field("salt", salt)?;
            let params = scrypt::Params::new(log_n, *r, *p, *dklen)
                .map_err(|e| KeystoreError::Malformed(format!("scrypt params: {e}")))?;
            let mut out = Zeroizing::new(vec![0u8; *dklen]);
            scrypt::scrypt(password.as_bytes(), &salt, &params, &mut out)
                .map_err(|e| KeystoreError::Malformed(format!("scrypt: {e}")))?;
            Ok(out)
        }
        KdfParams::Pbkdf2 {
            c,
            dklen,
            prf,
            salt,
        } => {
            check_dklen(*dklen)?;
            if prf != "hmac-sha256" {
                return Err(KeystoreError::UnsupportedKdf(format!("pbkdf2 with {prf}")));
            }
            let salt = decode_field("salt", salt)?;
            let mut out = Zeroizing::new(vec![0u8; *dklen]);
            pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, *c, &mut out);
            Ok(out)
        }
    }
}

fn check_dklen(dklen: usize) -> Result<()> {
    if !(KEY_LEN..=MAX_KEY_LEN).contains(&dklen) {
        return Err(KeystoreError::Malformed(format!(
            "dklen must be between {KEY_LEN} and {MAX_KEY_LEN}, got {dklen}"
        )));
    }
    Ok(())
}

fn compute_mac(derived: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(16 + ciphertext.len());
    preimage.extend_from_slice(&derived[16..32]);
    preimage.extend_from_slice(ciphertext);
    keccak256(&preimage).0
}

fn apply_ctr(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
    let mut cipher = Aes128Ctr::new_from_slices(key, iv)
        .map_err(|_| KeystoreError::Malformed(format!("iv must be 16 bytes, got {}", iv.len())))?;
    cipher.apply_keystream(buf);
    Ok(())
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| KeystoreError::Malformed(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn cheap() -> ScryptSettings {
        ScryptSettings {
            log_n: 4,
            r: 8,
            p: 1,
        }
    }

    fn key() -> SigningKey {
        SigningKey::from_slice(&[0x11; 32]).unwrap()
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let mut rng = StdRng::seed_from_u64(7);
        let file = encrypt_with(&key(), "hunter2", cheap(), &mut rng).unwrap();
        let json = file.to_json().unwrap();

        let account = decrypt(&json, "hunter2").unwrap();
        assert_eq!(account.signing_key().to_bytes(), key().to_bytes());
        assert_eq!(
            file.address.as_deref(),
            Some(hex::encode(account.address.as_slice()).as_str())
        );
    }

    #[test]
    fn test_wrong_password_is_mac_mismatch() {
        let mut rng = StdRng::seed_from_u64(7);
        let json = encrypt_with(&key(), "right", cheap(), &mut rng)
            .unwrap()
            .to_json()
            .unwrap();
        assert!(matches!(
            decrypt(&json, "wrong"),
            Err(KeystoreError::MacMismatch)
        ));
    }

    #[test]
    fn test_layout_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let file = encrypt_with(&key(), "pw", cheap(), &mut rng).unwrap();
        let value: serde_json::Value = serde_json::from_str(&file.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["crypto"]["cipher"], "aes-128-ctr");
        assert_eq!(value["crypto"]["kdf"], "scrypt");
        assert_eq!(value["crypto"]["kdfparams"]["n"], 16);
        assert_eq!(value["crypto"]["kdfparams"]["dklen"], 32);
        assert_eq!(value["crypto"]["cipherparams"]["iv"].as_str().unwrap().len(), 32);
        assert_eq!(uuid::Uuid::parse_str(&file.id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(
            encrypt_with(&key(), "", cheap(), &mut StdRng::seed_from_u64(0)),
            Err(KeystoreError::EmptyPassword)
        ));
        assert!(matches!(decrypt("  ", "pw"), Err(KeystoreError::EmptyKeystore)));
        assert!(matches!(decrypt("{not json", "pw"), Err(KeystoreError::Malformed(_))));
    }

    #[test]
    fn test_unsupported_cipher_and_version() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut file = encrypt_with(&key(), "pw", cheap(), &mut rng).unwrap();
        file.crypto.cipher = "aes-256-gcm".into();
        assert!(matches!(
            decrypt_file(&file, "pw"),
            Err(KeystoreError::UnsupportedCipher(_))
        ));

        file.crypto.cipher = CIPHER.into();
        file.version = 1;
        assert!(matches!(
            decrypt_file(&file, "pw"),
            Err(KeystoreError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn test_uppercase_crypto_key_accepted() {
        let mut rng = StdRng::seed_from_u64(5);
        let json = encrypt_with(&key(), "pw", cheap(), &mut rng)
            .unwrap()
            .to_json()
            .unwrap()
            .replace("\"crypto\"", "\"Crypto\"");
        assert!(decrypt(&json, "pw").is_ok());
    }

    fn pbkdf2_json(dklen: &str) -> String {
        format!(
            r#"{{"version":3,"id":"00000000-0000-4000-8000-000000000000","crypto":{{
                "cipher":"aes-128-ctr","cipherparams":{{"iv":"6087dab2f9fdbbfaddc31a909735c1e6"}},
                "ciphertext":"5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
                "kdf":"pbkdf2","kdfparams":{{"c":1,"dklen":{dklen},"prf":"hmac-sha256","salt":"ae3c"}},
                "mac":"517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2"}}}}"#
        )
    }

    #[test]
    fn test_oversized_dklen_is_malformed() {
        for dklen in ["18446744073709551615", "9223372036854775807", "65", "16"] {
            assert!(
                matches!(
                    decrypt(&pbkdf2_json(dklen), "pw"),
                    Err(KeystoreError::Malformed(_))
                ),
                "dklen {dklen} should be rejected"
            );
        }
    }

    #[test]
    fn test_scrypt_memory_limit() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut file = encrypt_with(&key(), "pw", cheap(), &mut rng).unwrap();
        if let KdfParams::Scrypt { n, .. } = &mut file.crypto.kdfparams {
            *n = 1 << 40;
        }
        assert!(matches!(
            decrypt_file(&file, "pw"),
            Err(KeystoreError::Malformed(_))
        ));
    }

    #[test]
    fn test_truncated_mac_is_mismatch() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut file = encrypt_with(&key(), "pw", cheap(), &mut rng).unwrap();
        file.crypto.mac.truncate(32);
        assert!(matches!(
            decrypt_file(&file, "pw"),
            Err(KeystoreError::MacMismatch)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let account = DecryptedAccount::new(key());
        let rendered = format!("{account:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&hex::encode([0x11u8; 32])));
    }
}
