//! The wire envelope wrapping every frame exchanged with the upstream feed
//!
//! `messageType` is an explicit discriminant rather than something inferred
//! from the payload shape; an envelope whose declared type disagrees with
//! what can be parsed out of `message` is rejected outright rather than
//! guessed at.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::quote::QuoteMessage;
use super::rfq::RfqWire;

/// The raw wire shape before the tag/payload pair is resolved into a typed variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    message_type: String,
    #[serde(default)]
    message: Value,
}

/// A parsed upstream envelope
#[derive(Debug, Clone)]
pub enum Envelope {
    /// An inbound RFQ
    Rfq(RfqWire),
    /// An outbound (or, if received, malformed-for-us) signed quote message
    RfqQuote(QuoteMessage),
    /// The upstream's connection acknowledgement; carries no payload we act on
    Connected,
    /// A message type this gateway does not recognize
    Unknown(String),
}

impl Envelope {
    /// Parse a raw text frame into a typed envelope
    ///
    /// Returns an error only for frames that aren't valid JSON or whose
    /// declared `messageType` disagrees with a parseable `message` payload;
    /// an unrecognized `messageType` is not an error, it resolves to
    /// `Envelope::Unknown` so the caller can log and continue per §4.4.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let envelope: RawEnvelope = serde_json::from_str(raw).map_err(|e| format!("invalid envelope json: {e}"))?;
        match envelope.message_type.as_str() {
            "rfq" => {
                let rfq: RfqWire =
                    serde_json::from_value(envelope.message).map_err(|e| format!("messageType=rfq but message does not parse as RFQ: {e}"))?;
                Ok(Self::Rfq(rfq))
            },
            "rfqQuote" => {
                let quote: QuoteMessage = serde_json::from_value(envelope.message)
                    .map_err(|e| format!("messageType=rfqQuote but message does not parse as QuoteMessage: {e}"))?;
                Ok(Self::RfqQuote(quote))
            },
            "connected" => Ok(Self::Connected),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }

    /// Serialize a signed `QuoteMessage` into the `{messageType, message}` envelope
    /// shape the writer sends, omitting null fields
    pub fn wrap_quote(quote: &QuoteMessage) -> Result<String, String> {
        let envelope = RawEnvelope {
            message_type: "rfqQuote".to_string(),
            message: serde_json::to_value(quote).map_err(|e| format!("failed to serialize quote message: {e}"))?,
        };
        serde_json::to_string(&envelope).map_err(|e| format!("failed to serialize envelope: {e}"))
    }
}
