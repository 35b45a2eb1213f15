//! Custom (de)serializers for wire types that don't map cleanly onto serde's
//! defaults: amounts that may arrive as either a JSON number or a decimal
//! string, checksummed addresses, and a nonce that may arrive with or without
//! its `0x` prefix.

use alloy_primitives::{Address, U256};
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

/// Serde helper for a `U256` that may arrive as a JSON number or a decimal
/// string (the wire format allows both, per spec §6)
pub mod u256_flexible {
    use super::*;

    /// Deserialize a `U256` from either a JSON number or a decimal string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NumberOrString {
            /// A plain JSON integer
            Number(u128),
            /// A decimal string, used for values that overflow u128/f64
            String(String),
        }

        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(U256::from(n)),
            NumberOrString::String(s) => {
                U256::from_str_radix(&s, 10).map_err(|e| D::Error::custom(format!("invalid u256: {e}")))
            },
        }
    }

    /// Serialize a `U256` as a decimal string
    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_string().serialize(serializer)
    }
}

/// Serde helper for an `Option<U256>` using the same flexible encoding
pub mod u256_flexible_opt {
    use super::*;

    /// Deserialize an optional `U256` from either a JSON number or string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MaybeNumberOrString {
            /// A plain JSON integer
            Number(u128),
            /// A decimal string
            String(String),
        }

        let opt: Option<MaybeNumberOrString> = Option::deserialize(deserializer)?;
        match opt {
            None => Ok(None),
            Some(MaybeNumberOrString::Number(n)) => Ok(Some(U256::from(n))),
            Some(MaybeNumberOrString::String(s)) => U256::from_str_radix(&s, 10)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid u256: {e}"))),
        }
    }

    /// Serialize an optional `U256` as a decimal string, omitted entirely when
    /// absent (the caller is expected to use `skip_serializing_if`)
    pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }
}

/// Parses an EIP-55 checksummed address, rejecting all-lowercase/all-uppercase
/// input that doesn't match the checksum
pub fn parse_checksummed_address(raw: &str) -> Result<Address, String> {
    let addr: Address = raw.parse().map_err(|e| format!("invalid address {raw}: {e}"))?;
    let checksummed = addr.to_checksum(None);
    if checksummed != raw {
        return Err(format!("address {raw} is not EIP-55 checksummed"));
    }
    Ok(addr)
}

/// Serde helper for a checksummed `Address`
pub mod checksummed_address {
    use super::*;

    /// Deserialize an `Address`, rejecting non-checksummed input
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_checksummed_address(&raw).map_err(D::Error::custom)
    }

    /// Serialize an `Address` in checksummed form
    pub fn serialize<S>(value: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_checksum(None).serialize(serializer)
    }
}

/// Serde helper for an `Option<Address>` in checksummed form, skipped when
/// absent via `skip_serializing_if = "Option::is_none"` at the field site
pub mod checksummed_address_opt {
    use super::*;

    /// Deserialize an optional checksummed `Address`
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse_checksummed_address(&s).map_err(D::Error::custom)).transpose()
    }

    /// Serialize an optional checksummed `Address`
    pub fn serialize<S>(value: &Option<Address>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_checksum(None)),
            None => serializer.serialize_none(),
        }
    }
}

/// Parses a 32-byte nonce from a hex string that may or may not carry a `0x`
/// prefix. Exactly 64 hex characters (after stripping the prefix) are
/// required; 63 or 65 are rejected (spec §8 boundary case).
pub fn parse_nonce(raw: &str) -> Result<[u8; 32], String> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    if stripped.len() != 64 {
        return Err(format!("nonce must be 64 hex chars, got {}", stripped.len()));
    }
    let bytes = hex::decode(stripped).map_err(|e| format!("invalid nonce hex: {e}"))?;
    bytes.try_into().map_err(|_| "nonce did not decode to 32 bytes".to_string())
}

/// Serde helper for the 32-byte nonce
pub mod nonce {
    use super::*;

    /// Deserialize a 32-byte nonce from a hex string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_nonce(&raw).map_err(D::Error::custom)
    }

    /// Serialize a 32-byte nonce as a `0x`-prefixed hex string
    pub fn serialize<S>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format!("0x{}", hex::encode(value)).serialize(serializer)
    }
}

/// Serde helper for the 65-byte signature, `0x`-prefixed hex (130 hex chars)
pub mod signature {
    use super::*;

    /// Deserialize a 65-byte signature from a `0x`-prefixed hex string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 65], D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let stripped = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(stripped).map_err(D::Error::custom)?;
        bytes.try_into().map_err(|_| D::Error::custom("signature must be 65 bytes"))
    }

    /// Serialize a 65-byte signature as a `0x`-prefixed hex string
    pub fn serialize<S>(value: &[u8; 65], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format!("0x{}", hex::encode(value)).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksummed_address_roundtrip() {
        let addr: Address = "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".parse().unwrap();
        let checksummed = addr.to_checksum(None);
        assert_eq!(parse_checksummed_address(&checksummed).unwrap(), addr);
    }

    #[test]
    fn lowercase_address_rejected() {
        let lower = "0xaf88d065e77c8cc2239327c5edb3a432268e5831";
        assert!(parse_checksummed_address(lower).is_err());
    }

    #[test]
    fn nonce_must_be_exactly_32_bytes() {
        let short = "a".repeat(63);
        let long = "a".repeat(65);
        let exact = "a".repeat(64);
        assert!(parse_nonce(&short).is_err());
        assert!(parse_nonce(&long).is_err());
        assert!(parse_nonce(&exact).is_ok());
    }

    #[test]
    fn nonce_accepts_optional_0x_prefix() {
        let exact = "b".repeat(64);
        let prefixed = format!("0x{exact}");
        assert_eq!(parse_nonce(&exact).unwrap(), parse_nonce(&prefixed).unwrap());
    }
}
