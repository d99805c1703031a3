use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::contract::ContractClient;
use crate::error::{Result, TicketError};
use crate::keystore::DecryptedAccount;
use crate::signer::tx::LegacyTransaction;
use crate::types::TransactionIntent;

/// Ethereum address of a secp256k1 key: last 20 bytes of the Keccak-256 of
/// the uncompressed public key without its `0x04` prefix.
pub fn address_from_signing_key(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Key decrypted from a keystore, signing locally.
#[derive(Debug)]
pub struct LocalSigner {
    account: DecryptedAccount,
}

impl LocalSigner {
    pub fn new(account: DecryptedAccount) -> Self {
        Self { account }
    }

    pub fn address(&self) -> Address {
        self.account.address
    }

    pub fn account(&self) -> &DecryptedAccount {
        &self.account
    }

    /// Sign `tx` and return the raw RLP bytes for `eth_sendRawTransaction`.
    pub fn sign_transaction(&self, tx: &LegacyTransaction) -> Result<Bytes> {
        let hash = tx.signing_hash();
        let (signature, recovery_id) = self
            .account
            .signing_key()
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| TicketError::Signing(e.to_string()))?;

        let bytes = signature.to_bytes();
        let r = U256::from_be_slice(&bytes[..32]);
        let s = U256::from_be_slice(&bytes[32..]);
        Ok(tx.encode_signed(recovery_id.to_byte(), r, s))
    }

    /// Fill nonce, gas price and chain id from the node, sign, and broadcast.
    pub async fn send(&self, contract: &ContractClient, intent: &TransactionIntent) -> Result<B256> {
        let nonce = contract.rpc.get_transaction_count(self.address()).await?;
        let gas_price = contract.rpc.gas_price().await?;
        let chain_id = contract.chain_id().await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit: intent.gas_limit(),
            to: intent.to(),
            value: intent.value().unwrap_or(U256::ZERO),
            data: intent.call_data().clone(),
            chain_id,
        };
        tracing::debug!(nonce, %gas_price, chain_id, from = %self.address(), "signing locally");

        let raw = self.sign_transaction(&tx)?;
        contract.rpc.send_raw_transaction(&raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer_from_hex(key: &str) -> LocalSigner {
        let bytes = hex::decode(key).unwrap();
        LocalSigner::new(DecryptedAccount::new(SigningKey::from_slice(&bytes).unwrap()))
    }

    #[test]
    fn test_address_from_known_key() {
        let signer =
            signer_from_hex("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318");
        assert_eq!(
            signer.address(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_eip155_signed_transaction() {
        let signer = signer_from_hex(&"46".repeat(32));
        let tx = LegacyTransaction {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: 21_000,
            to: Address::repeat_byte(0x35),
            value: U256::from(1_000_000_000_000_000_000u64),
            data: Bytes::new(),
            chain_id: 1,
        };
        let raw = signer.sign_transaction(&tx).unwrap();
        assert_eq!(
            hex::encode(&raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }
}
