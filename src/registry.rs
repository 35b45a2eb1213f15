//! Chain Registry: the static chain/token inventory, built once and then
//! enriched from the environment
//!
//! Chains are listed explicitly via one builder function each, never
//! discovered by scanning modules (see the §9 design note this replaces).
//! The enrichment pass reads `<SHORTNAME>_WS_URL` for every configured short
//! name and marks a chain `active` on the first one that resolves to a
//! well-formed `ws`/`wss` URL.

use std::env;

use alloy_primitives::Address;
use tracing::{info, warn};
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::model::{Chain, Token};

/// Arbitrum One's chain id
pub const ARBITRUM_ONE_CHAIN_ID: u64 = 42161;
/// Ethereum mainnet's chain id
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// The static chain/token inventory, loaded once at startup
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<Chain>,
}

impl ChainRegistry {
    /// Build the registry with its hardcoded chain list, then enrich each
    /// chain's `active`/`ws_rpc_url` from the environment
    pub fn load() -> GatewayResult<Self> {
        let mut chains = vec![arbitrum_one(), ethereum_mainnet()];
        for chain in &mut chains {
            enrich_from_env(chain)?;
        }
        Ok(Self { chains })
    }

    /// All configured chains, active or not
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Only the chains an Inventory Tracker should be spawned for
    pub fn active_chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter().filter(|c| c.active)
    }

    /// Look up a chain by id
    pub fn chain(&self, chain_id: u64) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == chain_id)
    }
}

/// Read `<SHORTNAME>_WS_URL` for each of the chain's short names, activating
/// on the first well-formed `ws`/`wss` URL found
fn enrich_from_env(chain: &mut Chain) -> GatewayResult<()> {
    for short_name in chain.short_names.clone() {
        let var = format!("{}_WS_URL", short_name.to_uppercase());
        let Ok(raw) = env::var(&var) else { continue };
        let url = Url::parse(&raw).map_err(|e| GatewayError::config(format!("{var} is not a valid URL: {e}")))?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(GatewayError::config(format!("{var} must use ws:// or wss://, got {}", url.scheme())));
        }
        info!(chain = %chain.name, url = %var, "activating chain from environment");
        chain.activate(url);
        return Ok(());
    }
    warn!(chain = %chain.name, "no WS URL configured, chain will be inactive");
    Ok(())
}

/// Placeholder settlement contract address shared across the demo chains
fn placeholder_settlement_contract() -> Address {
    "0x0000000000000000000000000000000000000001".parse().unwrap()
}

/// Placeholder skeeper (operator custody) address shared across the demo chains
fn placeholder_skeeper() -> Address {
    "0x0000000000000000000000000000000000000002".parse().unwrap()
}

/// Build the Arbitrum One chain definition with USDC/USDT/DAI
fn arbitrum_one() -> Chain {
    Chain::new(
        ARBITRUM_ONE_CHAIN_ID,
        "Arbitrum One",
        vec!["arbitrum".to_string(), "arb".to_string()],
        "ETH",
        false,
        placeholder_settlement_contract(),
        placeholder_skeeper(),
    )
    .with_token(Token::new(
        "USD Coin",
        "USDC",
        ARBITRUM_ONE_CHAIN_ID,
        "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".parse().unwrap(),
        6,
    ))
    .with_token(Token::new(
        "Tether USD",
        "USDT",
        ARBITRUM_ONE_CHAIN_ID,
        "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9".parse().unwrap(),
        6,
    ))
    .with_token(Token::new(
        "Dai Stablecoin",
        "DAI",
        ARBITRUM_ONE_CHAIN_ID,
        "0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1".parse().unwrap(),
        18,
    ))
}

/// Build the Ethereum mainnet chain definition with USDC/USDT/DAI
fn ethereum_mainnet() -> Chain {
    Chain::new(
        ETHEREUM_MAINNET_CHAIN_ID,
        "Ethereum Mainnet",
        vec!["ethereum".to_string(), "eth".to_string()],
        "ETH",
        false,
        placeholder_settlement_contract(),
        placeholder_skeeper(),
    )
    .with_token(Token::new(
        "USD Coin",
        "USDC",
        ETHEREUM_MAINNET_CHAIN_ID,
        "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse().unwrap(),
        6,
    ))
    .with_token(Token::new(
        "Tether USD",
        "USDT",
        ETHEREUM_MAINNET_CHAIN_ID,
        "0xdAC17F958D2ee523a2206206994597C13D831ec7".parse().unwrap(),
        6,
    ))
    .with_token(Token::new(
        "Dai Stablecoin",
        "DAI",
        ETHEREUM_MAINNET_CHAIN_ID,
        "0x6B175474E89094C44Da98b954EedeAC495271d0F".parse().unwrap(),
        18,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_chain_has_no_ws_url_without_env() {
        // SAFETY: test runs single-threaded within this process's env state
        env::remove_var("ARBITRUM_WS_URL");
        env::remove_var("ARB_WS_URL");
        let chain = {
            let mut c = arbitrum_one();
            enrich_from_env(&mut c).unwrap();
            c
        };
        assert!(!chain.active);
        assert!(chain.ws_rpc_url.is_none());
    }

    #[test]
    fn bad_scheme_is_a_config_error() {
        env::set_var("ARBITRUM_WS_URL", "http://example.com");
        let mut chain = arbitrum_one();
        let result = enrich_from_env(&mut chain);
        env::remove_var("ARBITRUM_WS_URL");
        assert!(result.is_err());
    }

    #[test]
    fn valid_ws_url_activates_chain() {
        env::set_var("ARBITRUM_WS_URL", "wss://arb1.example.com/ws");
        let mut chain = arbitrum_one();
        enrich_from_env(&mut chain).unwrap();
        env::remove_var("ARBITRUM_WS_URL");
        assert!(chain.active);
        assert_eq!(chain.ws_rpc_url.unwrap().scheme(), "wss");
    }

    #[test]
    fn registry_loads_both_demo_chains() {
        let registry = ChainRegistry::load().unwrap();
        assert!(registry.chain(ARBITRUM_ONE_CHAIN_ID).is_some());
        assert!(registry.chain(ETHEREUM_MAINNET_CHAIN_ID).is_some());
    }
}
