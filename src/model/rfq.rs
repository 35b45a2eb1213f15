//! The inbound RFQ message and its validating constructor
//!
//! The wire shape (`RfqWire`) is a plain serde DTO; `Rfq::from_wire` is the
//! validating constructor that enforces the invariants of §3 and freezes the
//! result. Keeping the two separate means malformed-but-parseable frames can
//! still be logged with their original shape before being dropped.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::serde_util::{checksummed_address, nonce, u256_flexible_opt};

/// Lower bound (exclusive) of the sane `expiry` window: anything at or below
/// this looks like a stale or malformed timestamp
const EXPIRY_MIN: u64 = 1_750_000_000;
/// Upper bound (exclusive) of the sane `expiry` window: anything at or above
/// this looks like milliseconds rather than seconds
const EXPIRY_MAX: u64 = 2_000_000_000;

/// Metadata attached by CoW Protocol integrations; the only known source today
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentMetadataContent {
    /// The CoW Protocol auction id this RFQ was sourced from
    #[serde(rename = "auctionId")]
    pub auction_id: String,
}

/// Optional intent metadata carried on an RFQ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentMetadata {
    /// Always `"cow_protocol"` today; any other value is a validation error
    pub source: String,
    /// The source-specific payload
    pub content: IntentMetadataContent,
}

/// The raw wire shape of an RFQ, deserialized before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqWire {
    /// The chain this swap is requested on
    pub chain_id: u64,
    /// The upstream solver's name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
    /// The solver's own RFQ identifier
    pub solver_rfq_id: Uuid,
    /// This RFQ's identifier
    pub rfq_id: Uuid,
    /// 32-byte nonce, hex-encoded with or without a `0x` prefix
    #[serde(with = "nonce")]
    pub nonce: [u8; 32],
    #[serde(with = "checksummed_address")]
    pub base_token: Address,
    #[serde(with = "checksummed_address")]
    pub quote_token: Address,
    #[serde(with = "checksummed_address")]
    pub trader: Address,
    #[serde(with = "checksummed_address")]
    pub effective_trader: Address,
    /// UNIX-second expiry
    pub expiry: u64,
    #[serde(default, with = "u256_flexible_opt", skip_serializing_if = "Option::is_none")]
    pub base_token_amount: Option<U256>,
    #[serde(default, with = "u256_flexible_opt", skip_serializing_if = "Option::is_none")]
    pub quote_token_amount: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_metadata: Option<IntentMetadata>,
}

/// A validated, frozen RFQ
#[derive(Debug, Clone)]
pub struct Rfq {
    /// The chain this swap is requested on
    pub chain_id: u64,
    /// The upstream solver's name, if known
    pub solver: Option<String>,
    /// The solver's own RFQ identifier
    pub solver_rfq_id: Uuid,
    /// This RFQ's identifier
    pub rfq_id: Uuid,
    /// 32-byte nonce
    pub nonce: [u8; 32],
    /// The token the trader is selling
    pub base_token: Address,
    /// The token the trader is buying
    pub quote_token: Address,
    /// The originating trader address
    pub trader: Address,
    /// The address actually executing the swap, if different from `trader`
    pub effective_trader: Address,
    /// UNIX-second expiry
    pub expiry: u64,
    /// Set iff the trader specified an exact sell amount
    pub base_token_amount: Option<U256>,
    /// Set iff the trader specified an exact buy amount
    pub quote_token_amount: Option<U256>,
    /// Optional CoW Protocol provenance
    pub intent_metadata: Option<IntentMetadata>,
}

impl Rfq {
    /// Validate a wire RFQ and freeze it, or return a description of the
    /// first invariant violated
    pub fn from_wire(wire: RfqWire) -> Result<Self, String> {
        let base_set = wire.base_token_amount.is_some_and(|v| v > U256::ZERO);
        let quote_set = wire.quote_token_amount.is_some_and(|v| v > U256::ZERO);
        if base_set == quote_set {
            return Err("exactly one of baseTokenAmount/quoteTokenAmount must be set".to_string());
        }

        if wire.expiry <= EXPIRY_MIN || wire.expiry >= EXPIRY_MAX {
            return Err(format!(
                "expiry {} is not a plausible unix timestamp in seconds",
                wire.expiry
            ));
        }

        if let Some(meta) = &wire.intent_metadata {
            if meta.source != "cow_protocol" {
                return Err(format!("unsupported intentMetadata.source: {}", meta.source));
            }
        }

        Ok(Self {
            chain_id: wire.chain_id,
            solver: wire.solver,
            solver_rfq_id: wire.solver_rfq_id,
            rfq_id: wire.rfq_id,
            nonce: wire.nonce,
            base_token: wire.base_token,
            quote_token: wire.quote_token,
            trader: wire.trader,
            effective_trader: wire.effective_trader,
            expiry: wire.expiry,
            base_token_amount: wire.base_token_amount.filter(|v| *v > U256::ZERO),
            quote_token_amount: wire.quote_token_amount.filter(|v| *v > U256::ZERO),
            intent_metadata: wire.intent_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_wire() -> RfqWire {
        RfqWire {
            chain_id: 42161,
            solver: None,
            solver_rfq_id: Uuid::new_v4(),
            rfq_id: Uuid::new_v4(),
            nonce: [1u8; 32],
            base_token: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".parse().unwrap(),
            quote_token: "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9".parse().unwrap(),
            trader: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            effective_trader: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            expiry: 1_750_707_521,
            base_token_amount: Some(U256::from(6_358_600_000u64)),
            quote_token_amount: None,
            intent_metadata: None,
        }
    }

    #[test]
    fn happy_path_validates() {
        assert!(Rfq::from_wire(base_wire()).is_ok());
    }

    #[test]
    fn rejects_both_amounts_set() {
        let mut wire = base_wire();
        wire.quote_token_amount = Some(U256::from(1u64));
        assert!(Rfq::from_wire(wire).is_err());
    }

    #[test]
    fn rejects_neither_amount_set() {
        let mut wire = base_wire();
        wire.base_token_amount = None;
        assert!(Rfq::from_wire(wire).is_err());
    }

    #[test]
    fn zero_amount_counts_as_unset() {
        let mut wire = base_wire();
        wire.base_token_amount = Some(U256::ZERO);
        wire.quote_token_amount = Some(U256::from(1u64));
        assert!(Rfq::from_wire(wire).is_ok());
    }

    #[test]
    fn rejects_millisecond_expiry() {
        let mut wire = base_wire();
        wire.expiry = 2_000_000_000_000;
        let err = Rfq::from_wire(wire).unwrap_err();
        assert!(err.contains("unix timestamp in seconds"));
    }

    #[test]
    fn max_amount_round_trips_through_validation() {
        let mut wire = base_wire();
        wire.base_token_amount = Some(U256::MAX);
        let rfq = Rfq::from_wire(wire).unwrap();
        assert_eq!(rfq.base_token_amount, Some(U256::MAX));
    }

    #[test]
    fn rejects_non_cow_protocol_intent_source() {
        let mut wire = base_wire();
        wire.intent_metadata = Some(IntentMetadata {
            source: "other".to_string(),
            content: IntentMetadataContent { auction_id: "1".to_string() },
        });
        assert!(Rfq::from_wire(wire).is_err());
    }
}
