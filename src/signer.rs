//! EIP-712 signing of quote levels
//!
//! The `ORDER_TYPEHASH` this protocol uses omits argument names from its type
//! string, so the usual `sol!`-derived EIP-712 struct hashing (which embeds
//! field names) would produce the wrong typehash. The struct has no
//! dynamic-length sub-structs beyond the already-hashed `rfqId`, so the
//! struct hash is computed directly: typehash word followed by one 32-byte
//! word per field, in order.

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signer, SignerSync};
use alloy_primitives::{keccak256, Address, B256, U256};

use crate::model::{Chain, QuoteLevel, Rfq};

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")`
fn domain_typehash() -> B256 {
    keccak256(b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")
}

/// `keccak256("LiquoriceSettlement")`
fn name_hash() -> B256 {
    keccak256(b"LiquoriceSettlement")
}

/// `keccak256("1")`
fn version_hash() -> B256 {
    keccak256(b"1")
}

/// `keccak256("Single(string,uint256,address,address,address,address,uint256,uint256,uint256,uint256,address)")`
fn order_typehash() -> B256 {
    keccak256(b"Single(string,uint256,address,address,address,address,uint256,uint256,uint256,uint256,address)")
}

/// The hash of a dynamic `string` field per EIP-712: the keccak256 of its
/// UTF-8 bytes, not an ABI-encoded wrapper
fn rfq_id_hash(rfq_id: &uuid::Uuid) -> B256 {
    keccak256(rfq_id.to_string().as_bytes())
}

/// Left-pad an address into a 32-byte ABI word
fn address_word(addr: Address) -> [u8; 32] {
    addr.into_word().0
}

/// Compute the domain separator for a given chain id and settlement contract
fn domain_separator(chain_id: u64, settlement_contract: Address) -> B256 {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(domain_typehash().as_slice());
    buf.extend_from_slice(name_hash().as_slice());
    buf.extend_from_slice(version_hash().as_slice());
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&address_word(settlement_contract));
    keccak256(buf)
}

/// The fields that go into the struct hash, in typehash order
struct OrderFields {
    rfq_id: uuid::Uuid,
    nonce: [u8; 32],
    trader: Address,
    effective_trader: Address,
    base_token: Address,
    quote_token: Address,
    base_token_amount: U256,
    quote_token_amount: U256,
    min_quote_token_amount: U256,
    quote_expiry: u64,
    recipient: Address,
}

/// Compute the struct hash: typehash word followed by one word per field
fn struct_hash(fields: &OrderFields) -> B256 {
    let mut buf = Vec::with_capacity(32 * 12);
    buf.extend_from_slice(order_typehash().as_slice());
    buf.extend_from_slice(rfq_id_hash(&fields.rfq_id).as_slice());
    buf.extend_from_slice(&fields.nonce);
    buf.extend_from_slice(&address_word(fields.trader));
    buf.extend_from_slice(&address_word(fields.effective_trader));
    buf.extend_from_slice(&address_word(fields.base_token));
    buf.extend_from_slice(&address_word(fields.quote_token));
    buf.extend_from_slice(&fields.base_token_amount.to_be_bytes::<32>());
    buf.extend_from_slice(&fields.quote_token_amount.to_be_bytes::<32>());
    buf.extend_from_slice(&fields.min_quote_token_amount.to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(fields.quote_expiry).to_be_bytes::<32>());
    buf.extend_from_slice(&address_word(fields.recipient));
    keccak256(buf)
}

/// Compute the final EIP-712 digest: `keccak256(0x1901 || domainSeparator || structHash)`
fn digest(chain_id: u64, settlement_contract: Address, fields: &OrderFields) -> B256 {
    let domain = domain_separator(chain_id, settlement_contract);
    let s_hash = struct_hash(fields);
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(&[0x19, 0x01]);
    buf.extend_from_slice(domain.as_slice());
    buf.extend_from_slice(s_hash.as_slice());
    keccak256(buf)
}

/// Signs quote levels with the operator's private key
pub struct QuoteSigner {
    signer: PrivateKeySigner,
}

impl QuoteSigner {
    /// Build a signer from a hex-encoded secp256k1 private key
    pub fn from_private_key(hex_key: &str) -> Result<Self, String> {
        let signer: PrivateKeySigner = hex_key.parse().map_err(|e| format!("invalid signer private key: {e}"))?;
        Ok(Self { signer })
    }

    /// The operator's on-chain address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a quote level for the given RFQ against the given chain
    ///
    /// Returns `None` (the spec's "no signature") if the chain is not
    /// active or is missing its settlement/skeeper addresses.
    pub fn sign(&self, rfq: &Rfq, quote: &QuoteLevel, chain: &Chain) -> Option<QuoteLevel> {
        if !chain.active {
            return None;
        }
        let settlement_contract = chain.liquorice_settlement_address?;
        let skeeper = chain.skeeper_address?;

        let fields = OrderFields {
            rfq_id: rfq.rfq_id,
            nonce: rfq.nonce,
            trader: rfq.trader,
            effective_trader: rfq.effective_trader,
            base_token: quote.base_token,
            quote_token: quote.quote_token,
            base_token_amount: quote.base_token_amount,
            quote_token_amount: quote.quote_token_amount,
            min_quote_token_amount: quote.min_quote_token_amount,
            quote_expiry: quote.expiry,
            recipient: skeeper,
        };

        let digest = digest(rfq.chain_id, settlement_contract, &fields);
        let signature = self.signer.sign_hash_sync(&digest).ok()?;

        let mut signed = quote.clone();
        signed.settlement_contract = settlement_contract;
        signed.recipient = Some(skeeper);
        signed.eip1271_verifier = Some(skeeper);
        signed.signer = self.signer.address();
        signed.signature = signature.as_bytes();
        Some(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chain, QuoteLevel};
    use uuid::Uuid;

    /// Anvil/Hardhat default account 0
    const TEST_PRIV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_OPERATOR_ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn test_chain() -> Chain {
        Chain::new(
            42161,
            "Arbitrum One",
            vec!["arbitrum".to_string()],
            "ETH",
            false,
            "0x0000000000000000000000000000000000000001".parse().unwrap(),
            "0x0000000000000000000000000000000000000002".parse().unwrap(),
        )
        .activate_for_test()
    }

    trait ActivateForTest {
        fn activate_for_test(self) -> Self;
    }

    impl ActivateForTest for Chain {
        fn activate_for_test(mut self) -> Self {
            self.active = true;
            self
        }
    }

    #[test]
    fn uuid_to_keccak256_vector() {
        let id = Uuid::parse_str("c61c7b1d-86fa-402e-ba12-fb49c9c55cf8").unwrap();
        let hash = rfq_id_hash(&id);
        let expected = "5205ecfc2e68786dcf34fffa27fb32e55f3c1c740959eb95c8b37ad61504a5c8";
        assert_eq!(hex::encode(hash.as_slice()), expected);
    }

    #[test]
    fn sign_then_recover_matches_operator_address() {
        let signer = QuoteSigner::from_private_key(TEST_PRIV_KEY).unwrap();
        assert_eq!(signer.address(), TEST_OPERATOR_ADDR.parse::<Address>().unwrap());

        let chain = test_chain();
        let rfq = test_rfq();
        let quote = QuoteLevel::unsigned(
            rfq.expiry + 30,
            rfq.base_token,
            rfq.quote_token,
            rfq.base_token_amount.unwrap(),
            U256::from(6_676_530_000u64),
            U256::from(1u64),
        );

        let signed = signer.sign(&rfq, &quote, &chain).unwrap();
        assert!(signed.is_signed());
        assert_eq!(signed.signer, signer.address());
        assert_eq!(signed.settlement_contract, chain.liquorice_settlement_address.unwrap());
        assert_eq!(signed.recipient, chain.skeeper_address);

        let fields = OrderFields {
            rfq_id: rfq.rfq_id,
            nonce: rfq.nonce,
            trader: rfq.trader,
            effective_trader: rfq.effective_trader,
            base_token: quote.base_token,
            quote_token: quote.quote_token,
            base_token_amount: quote.base_token_amount,
            quote_token_amount: quote.quote_token_amount,
            min_quote_token_amount: quote.min_quote_token_amount,
            quote_expiry: quote.expiry,
            recipient: chain.skeeper_address.unwrap(),
        };
        let d = digest(rfq.chain_id, chain.liquorice_settlement_address.unwrap(), &fields);
        let sig = alloy_primitives::Signature::from_raw(&signed.signature).unwrap();
        let recovered = sig.recover_address_from_prehash(&d).unwrap();
        assert_eq!(recovered, signer.address());

        // §8 scenario 2: the digest vector is pinned exactly, not just
        // round-tripped through recovery (a subtly wrong struct-hash word
        // order could still recover correctly if both sides built it the
        // same wrong way).
        let expected_digest = "2342c2e81befd9dda11c9e769d6d867e347d5b84a0137bf9fa31acbe7ee4f5ac";
        assert_eq!(hex::encode(d.as_slice()), expected_digest);

        // §8 scenario 3: the 65-byte signature is pinned exactly
        let expected_signature = "6d512bc0bf3388a27968202e7b516e4777fda5b06be7b8bcd04ad37c103d776b3ea2132045a41e07e7aa9f552c6ad9fda33d53904d09a7cc11abd4a73f024b401c";
        assert_eq!(hex::encode(signed.signature), expected_signature);
    }

    #[test]
    fn inactive_chain_yields_no_signature() {
        let signer = QuoteSigner::from_private_key(TEST_PRIV_KEY).unwrap();
        let mut chain = test_chain();
        chain.active = false;
        let rfq = test_rfq();
        let quote = QuoteLevel::unsigned(
            rfq.expiry + 30,
            rfq.base_token,
            rfq.quote_token,
            rfq.base_token_amount.unwrap(),
            U256::from(1u64),
            U256::from(1u64),
        );
        assert!(signer.sign(&rfq, &quote, &chain).is_none());
    }

    fn test_rfq() -> Rfq {
        crate::model::rfq::Rfq::from_wire(crate::model::rfq::RfqWire {
            chain_id: 42161,
            solver: None,
            solver_rfq_id: Uuid::new_v4(),
            rfq_id: Uuid::parse_str("846063db-1769-438b-8002-00fd981603df").unwrap(),
            nonce: [7u8; 32],
            base_token: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".parse().unwrap(),
            quote_token: "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9".parse().unwrap(),
            trader: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            effective_trader: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            expiry: 1_750_707_521,
            base_token_amount: Some(U256::from(6_358_600_000u64)),
            quote_token_amount: None,
            intent_metadata: None,
        })
        .unwrap()
    }
}
