use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};

/// Pre-EIP-2718 transaction, signed with EIP-155 replay protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn body(&self) -> [&dyn Encodable; 6] {
        [
            &self.nonce,
            &self.gas_price,
            &self.gas_limit,
            &self.to,
            &self.value,
            &self.data,
        ]
    }

    /// Keccak-256 of `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn signing_hash(&self) -> B256 {
        let zero = 0u64;
        let mut fields: Vec<&dyn Encodable> = self.body().to_vec();
        let tail: [&dyn Encodable; 3] = [&self.chain_id, &zero, &zero];
        fields.extend(tail);
        keccak256(encode_list(&fields))
    }

    /// Raw signed transaction with `v = recovery_id + 2 * chainId + 35`.
    pub fn encode_signed(&self, recovery_id: u8, r: U256, s: U256) -> Bytes {
        let v = u64::from(recovery_id) + self.chain_id * 2 + 35;
        let mut fields: Vec<&dyn Encodable> = self.body().to_vec();
        let tail: [&dyn Encodable; 3] = [&v, &r, &s];
        fields.extend(tail);
        encode_list(&fields).into()
    }
}

fn encode_list(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length: usize = fields.iter().map(|f| f.length()).sum();
    let header = Header {
        list: true,
        payload_length,
    };
    let mut out = Vec::with_capacity(header.length() + payload_length);
    header.encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eip155_signing_hash() {
        // Example transaction from EIP-155.
        let tx = LegacyTransaction {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: 21_000,
            to: Address::repeat_byte(0x35),
            value: U256::from(1_000_000_000_000_000_000u64),
            data: Bytes::new(),
            chain_id: 1,
        };
        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_v_includes_chain_id() {
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: U256::from(1),
            gas_limit: 21_000,
            to: Address::ZERO,
            value: U256::ZERO,
            data: Bytes::new(),
            chain_id: 1337,
        };
        let raw = tx.encode_signed(1, U256::from(1), U256::from(2));
        // v = 1 + 2 * 1337 + 35 = 2710 = 0x0a96, encoded as 0x82 0x0a 0x96
        let tail = &raw[raw.len() - 5..];
        assert_eq!(tail, &[0x82, 0x0a, 0x96, 0x01, 0x02]);
    }
}
