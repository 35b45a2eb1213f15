//! Outbound Quote Level / Quote Message
//!
//! A Quote Level is built by the Quoter with placeholder addressing and a
//! zero signature, then mutated in place by the Signer to fill in the
//! operator-controlled fields. After it's handed to the out-queue it is not
//! referenced again, so mutation in place (rather than a second builder
//! type) matches the lifecycle described in §3.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::serde_util::{checksummed_address, checksummed_address_opt, signature, u256_flexible};

/// A single price level within a Quote Message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLevel {
    /// Always `"lite"`
    #[serde(rename = "type")]
    pub level_type: String,
    /// UNIX-second expiry of this quote level
    pub expiry: u64,
    #[serde(with = "checksummed_address")]
    pub settlement_contract: Address,
    #[serde(with = "checksummed_address")]
    pub signer: Address,
    #[serde(default, with = "checksummed_address_opt", skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Address>,
    #[serde(default, with = "checksummed_address_opt", skip_serializing_if = "Option::is_none")]
    pub eip1271_verifier: Option<Address>,
    #[serde(with = "checksummed_address")]
    pub base_token: Address,
    #[serde(with = "checksummed_address")]
    pub quote_token: Address,
    #[serde(with = "u256_flexible")]
    pub base_token_amount: U256,
    #[serde(with = "u256_flexible")]
    pub quote_token_amount: U256,
    #[serde(with = "u256_flexible")]
    pub min_quote_token_amount: U256,
    #[serde(with = "signature")]
    pub signature: [u8; 65],
}

impl QuoteLevel {
    /// The "lite" level type string
    pub const TYPE_LITE: &'static str = "lite";

    /// Build an unsigned quote level with placeholder addressing, as the
    /// Quoter does before handing off to the Signer
    #[allow(clippy::too_many_arguments)]
    pub fn unsigned(
        expiry: u64,
        base_token: Address,
        quote_token: Address,
        base_token_amount: U256,
        quote_token_amount: U256,
        min_quote_token_amount: U256,
    ) -> Self {
        Self {
            level_type: Self::TYPE_LITE.to_string(),
            expiry,
            settlement_contract: Address::ZERO,
            signer: Address::ZERO,
            recipient: None,
            eip1271_verifier: None,
            base_token,
            quote_token,
            base_token_amount,
            quote_token_amount,
            min_quote_token_amount,
            signature: [0u8; 65],
        }
    }

    /// True iff the Signer has filled in a non-zero signature
    pub fn is_signed(&self) -> bool {
        self.signature != [0u8; 65]
    }
}

/// The outbound message wrapping one or more quote levels for an RFQ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteMessage {
    /// The RFQ this message answers
    pub rfq_id: Uuid,
    /// One or more price levels, in priority order
    pub levels: Vec<QuoteLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn unsigned_quote_has_placeholder_fields() {
        let level = QuoteLevel::unsigned(
            1_750_707_551,
            addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
            addr("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
            U256::from(6_358_600_000u64),
            U256::from(6_676_530_000u64),
            U256::from(1u64),
        );
        assert!(!level.is_signed());
        assert!(level.recipient.is_none());
        assert_eq!(level.level_type, "lite");
    }

    #[test]
    fn serialization_omits_absent_optional_fields() {
        let level = QuoteLevel::unsigned(
            1,
            addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
            addr("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
            U256::from(1u64),
            U256::from(1u64),
            U256::from(1u64),
        );
        let json = serde_json::to_value(&level).unwrap();
        assert!(json.get("recipient").is_none());
        assert!(json.get("eip1271Verifier").is_none());
    }

    #[test]
    fn round_trip_through_json_is_byte_identical() {
        let msg = QuoteMessage {
            rfq_id: Uuid::new_v4(),
            levels: vec![QuoteLevel::unsigned(
                1,
                addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
                addr("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
                U256::from(1u64),
                U256::from(1u64),
                U256::from(1u64),
            )],
        };
        let encoded = serde_json::to_string(&msg).unwrap();
        let decoded: QuoteMessage = serde_json::from_str(&encoded).unwrap();
        let re_encoded = serde_json::to_string(&decoded).unwrap();
        assert_eq!(encoded, re_encoded);
    }
}
