//! The data model: Chain/Token, RFQ, Quote Level/Message, and the wire Envelope

pub mod chain;
pub mod envelope;
pub mod quote;
pub mod rfq;
pub mod serde_util;

pub use chain::{Chain, Token, TokenBalance};
pub use envelope::Envelope;
pub use quote::{QuoteLevel, QuoteMessage};
pub use rfq::{IntentMetadata, IntentMetadataContent, Rfq, RfqWire};
