//! Chain and Token, the static inventory the registry builds once at startup
//!
//! Token holds a `chain_id`, not an owning reference to its `Chain` — the
//! reverse edge (Chain -> Vec<Token>) is the only owning direction, per the
//! cyclic-reference design note. Equality/hashing is `(chain_id, lower(address))`
//! so lookups are case-insensitive on address but scoped to a chain.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use arc_swap::ArcSwap;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use url::Url;

/// A chain the gateway can quote on
#[derive(Debug, Clone)]
pub struct Chain {
    /// The chain id, e.g. 42161 for Arbitrum One
    pub id: u64,
    /// Human-readable name
    pub name: String,
    /// Short names used for `<SHORTNAME>_WS_URL` environment lookup
    pub short_names: Vec<String>,
    /// The native gas token symbol, e.g. "ETH"
    pub native_gas_symbol: String,
    /// Whether this chain's blocks carry extra-data proof-of-authority fields
    pub poa: bool,
    /// True iff a well-formed `ws`/`wss` RPC URL was resolved for this chain
    pub active: bool,
    /// The chain node websocket URL, set only once `active`
    pub ws_rpc_url: Option<Url>,
    /// The on-chain settlement contract this chain's quotes are signed against
    pub liquorice_settlement_address: Option<Address>,
    /// The operator's on-chain custody account: fund recipient and EIP-1271 verifier
    pub skeeper_address: Option<Address>,
    /// Tokens known on this chain
    pub tokens: Vec<Token>,
}

impl Chain {
    /// Build a chain definition with no WS URL yet; the registry's
    /// enrichment pass fills `ws_rpc_url`/`active` from the environment
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        name: impl Into<String>,
        short_names: Vec<String>,
        native_gas_symbol: impl Into<String>,
        poa: bool,
        liquorice_settlement_address: Address,
        skeeper_address: Address,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            short_names,
            native_gas_symbol: native_gas_symbol.into(),
            poa,
            active: false,
            ws_rpc_url: None,
            liquorice_settlement_address: Some(liquorice_settlement_address),
            skeeper_address: Some(skeeper_address),
            tokens: Vec::new(),
        }
    }

    /// Push a token onto this chain's inventory
    pub fn with_token(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self
    }

    /// Mark this chain active with the given resolved RPC URL
    pub fn activate(&mut self, url: Url) {
        self.ws_rpc_url = Some(url);
        self.active = true;
    }
}

/// A snapshot of a token's mutable inventory fields, published atomically
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBalance {
    /// The raw (non-decimal-adjusted) balance, last observed
    pub raw_balance: U256,
    /// The block number the balance was last observed at
    pub last_updated_block: u64,
}

/// An ERC-20 token on a specific chain
#[derive(Debug, Clone)]
pub struct Token {
    /// Token name, e.g. "USD Coin"
    pub name: String,
    /// Token symbol, e.g. "USDC"
    pub symbol: String,
    /// The id of the chain this token lives on
    pub chain_id: u64,
    /// The checksummed contract address
    pub address: Address,
    /// Decimal places, 0-36 in practice
    pub decimals: u8,
    /// Mutable balance fields, last-writer-wins, no locking
    balance: Arc<ArcSwap<TokenBalance>>,
}

impl Token {
    /// Construct a token with zeroed balance fields
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, chain_id: u64, address: Address, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            chain_id,
            address,
            decimals,
            balance: Arc::new(ArcSwap::from_pointee(TokenBalance::default())),
        }
    }

    /// Read the current balance snapshot
    pub fn balance(&self) -> TokenBalance {
        **self.balance.load()
    }

    /// Publish a new balance snapshot; overwrites unconditionally (last-writer-wins)
    pub fn set_balance(&self, raw_balance: U256, last_updated_block: u64) {
        self.balance.store(Arc::new(TokenBalance { raw_balance, last_updated_block }));
    }

    /// Convert a raw integer amount to its exact decimal value, scaled by
    /// `10^-decimals`. Goes through `BigInt`/`BigDecimal` rather than `f64`
    /// so the conversion is exact for the full `U256` range (§8 round-trip
    /// property).
    pub fn raw_to_decimal(&self, raw: U256) -> BigDecimal {
        let digits = BigInt::from_bytes_be(Sign::Plus, &raw.to_be_bytes::<32>());
        BigDecimal::new(digits, i64::from(self.decimals))
    }

    /// Convert a decimal value back to a raw integer amount, truncating toward zero
    pub fn decimal_to_raw(&self, decimal: &BigDecimal) -> U256 {
        let (digits, scale) = decimal.clone().into_bigint_and_scale();
        let target_scale = i64::from(self.decimals);
        let raw_digits = match target_scale.cmp(&scale) {
            Ordering::Greater => digits * BigInt::from(10u8).pow((target_scale - scale) as u32),
            // integer division on `BigInt` truncates toward zero
            Ordering::Less => digits / BigInt::from(10u8).pow((scale - target_scale) as u32),
            Ordering::Equal => digits,
        };

        if raw_digits.sign() != Sign::Plus {
            return U256::ZERO;
        }
        let bytes = raw_digits.to_bytes_be().1;
        if bytes.len() > 32 {
            return U256::MAX;
        }
        let mut buf = [0u8; 32];
        buf[32 - bytes.len()..].copy_from_slice(&bytes);
        U256::from_be_bytes(buf)
    }

    /// The balance, decimal-adjusted
    pub fn balance_decimal(&self) -> BigDecimal {
        self.raw_to_decimal(self.balance().raw_balance)
    }

    /// The lowercase address used for case-insensitive identity
    fn address_key(&self) -> String {
        format!("{:?}", self.address).to_lowercase()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address_key() == other.address_key()
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address_key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn equality_is_case_insensitive_on_address() {
        let a = Token::new("USD Coin", "USDC", 1, addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"), 6);
        let b = Token::new("USD Coin", "USDC", 1, addr("0xAF88D065E77C8CC2239327C5EDB3A432268E5831"), 6);
        assert_eq!(a, b);

        let mut hasher_a = std::collections::hash_map::DefaultHasher::new();
        let mut hasher_b = std::collections::hash_map::DefaultHasher::new();
        a.hash(&mut hasher_a);
        b.hash(&mut hasher_b);
        assert_eq!(hasher_a.finish(), hasher_b.finish());
    }

    #[test]
    fn different_chain_same_address_not_equal() {
        let a = Token::new("USD Coin", "USDC", 1, addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"), 6);
        let b = Token::new("USD Coin", "USDC", 42161, addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"), 6);
        assert_ne!(a, b);
    }

    #[test]
    fn decimal_round_trip_at_boundaries() {
        let t = Token::new("USD Coin", "USDC", 1, addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"), 6);
        assert_eq!(t.decimal_to_raw(&t.raw_to_decimal(U256::ZERO)), U256::ZERO);
        let one_unit = U256::from(1_000_000u64);
        assert_eq!(t.decimal_to_raw(&t.raw_to_decimal(one_unit)), one_unit);

        // 18-decimal token, large values f64 cannot represent exactly
        let weth = Token::new("Wrapped Ether", "WETH", 1, addr("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18);
        let big = U256::from_str_radix("1123456789012345678", 10).unwrap();
        assert_eq!(weth.decimal_to_raw(&weth.raw_to_decimal(big)), big);

        let bigger = U256::from_str_radix("21000000000000000000000000", 10).unwrap();
        assert_eq!(weth.decimal_to_raw(&weth.raw_to_decimal(bigger)), bigger);

        assert_eq!(weth.decimal_to_raw(&weth.raw_to_decimal(U256::MAX)), U256::MAX);
    }

    #[test]
    fn raw_to_decimal_preserves_full_precision() {
        let weth = Token::new("Wrapped Ether", "WETH", 1, addr("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18);
        let raw = U256::from_str_radix("1123456789012345678", 10).unwrap();
        let decimal = weth.raw_to_decimal(raw);
        assert_eq!(decimal.to_string(), "1.123456789012345678");
    }

    #[test]
    fn balance_is_last_writer_wins() {
        let t = Token::new("Tether", "USDT", 1, addr("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"), 6);
        t.set_balance(U256::from(100u64), 10);
        t.set_balance(U256::from(50u64), 11);
        let snap = t.balance();
        assert_eq!(snap.raw_balance, U256::from(50u64));
        assert_eq!(snap.last_updated_block, 11);
    }
}
