//! Market State: the in-memory token graph
//!
//! Nodes are tokens, edges are known swap pairs. Structure is frozen after
//! startup seeding (stablecoin triangles per chain); only the per-token
//! balance fields mutate afterward, so no locking is needed for topology
//! reads concurrent with balance writes.

use std::collections::HashMap;

use alloy_primitives::Address;
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::model::Token;

/// Stablecoin symbols seeded with triangle edges on every chain at startup
const STABLE_TRIANGLE: [(&str, &str); 3] = [("USDT", "USDC"), ("USDT", "DAI"), ("USDC", "DAI")];

/// The token graph: lookup by `(chain_id, lower(address))` and shortest-path routing
#[derive(Debug, Default)]
pub struct MarketState {
    graph: UnGraph<Token, f64>,
    index_by_key: HashMap<(u64, String), NodeIndex>,
}

impl MarketState {
    /// Build an empty market state
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the graph from a chain's token list: add all tokens as nodes,
    /// then wire the stablecoin triangle edges (weight 1.0) where both
    /// symbols are present on the chain
    pub fn seed_chain(&mut self, tokens: &[Token]) {
        for token in tokens {
            self.add_token(token.clone());
        }
        for (a_symbol, b_symbol) in STABLE_TRIANGLE {
            let a = tokens.iter().find(|t| t.symbol == a_symbol);
            let b = tokens.iter().find(|t| t.symbol == b_symbol);
            if let (Some(a), Some(b)) = (a, b) {
                self.add_edge(a.chain_id, a.address, b.address, 1.0);
            }
        }
    }

    /// Add a single token node if it isn't already present
    fn add_token(&mut self, token: Token) {
        let key = node_key(token.chain_id, token.address);
        self.index_by_key.entry(key).or_insert_with(|| self.graph.add_node(token.clone()));
    }

    /// Add an undirected edge between two tokens on the same chain; a no-op
    /// if either token hasn't been added yet
    fn add_edge(&mut self, chain_id: u64, a: Address, b: Address, weight: f64) {
        let (Some(&ia), Some(&ib)) =
            (self.index_by_key.get(&node_key(chain_id, a)), self.index_by_key.get(&node_key(chain_id, b)))
        else {
            return;
        };
        self.graph.add_edge(ia, ib, weight);
    }

    /// All tokens on a chain
    pub fn tokens_of(&self, chain_id: u64) -> impl Iterator<Item = &Token> {
        self.graph.node_weights().filter(move |t| t.chain_id == chain_id)
    }

    /// Look up a token by address, case-insensitive, scoped to a chain
    pub fn get_token(&self, address: Address, chain_id: u64) -> Option<&Token> {
        self.index_by_key.get(&node_key(chain_id, address)).map(|&idx| &self.graph[idx])
    }

    /// The unweighted shortest path between two tokens, or `None` if either
    /// endpoint is absent or they're disconnected
    pub fn shortest_path(&self, chain_id: u64, source: Address, target: Address) -> Option<Vec<Token>> {
        let &source_idx = self.index_by_key.get(&node_key(chain_id, source))?;
        let &target_idx = self.index_by_key.get(&node_key(chain_id, target))?;

        let (_, path) = astar(&self.graph, source_idx, |n| n == target_idx, |e| *e.weight(), |_| 0.0)?;
        Some(path.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }
}

/// The lookup key: chain-scoped, lowercase address
fn node_key(chain_id: u64, address: Address) -> (u64, String) {
    (chain_id, format!("{address:?}").to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str, chain_id: u64, addr: &str, decimals: u8) -> Token {
        Token::new(symbol, symbol, chain_id, addr.parse().unwrap(), decimals)
    }

    #[test]
    fn seeded_triangle_connects_all_three_stables() {
        let usdt = token("USDT", 1, "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9", 6);
        let usdc = token("USDC", 1, "0xaf88d065e77c8cC2239327C5EDb3A432268e5831", 6);
        let dai = token("DAI", 1, "0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1", 18);

        let mut state = MarketState::new();
        state.seed_chain(&[usdt.clone(), usdc.clone(), dai.clone()]);

        let path = state.shortest_path(1, usdt.address, dai.address).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].symbol, "USDT");
        assert_eq!(path[1].symbol, "DAI");
    }

    #[test]
    fn get_token_is_case_insensitive() {
        let usdc = token("USDC", 1, "0xaf88d065e77c8cC2239327C5EDb3A432268e5831", 6);
        let mut state = MarketState::new();
        state.seed_chain(&[usdc.clone()]);

        let lower: Address = "0xaf88d065e77c8cc2239327c5edb3a432268e5831".parse().unwrap();
        assert!(state.get_token(lower, 1).is_some());
    }

    #[test]
    fn missing_endpoint_returns_none() {
        let usdc = token("USDC", 1, "0xaf88d065e77c8cC2239327C5EDb3A432268e5831", 6);
        let mut state = MarketState::new();
        state.seed_chain(&[usdc.clone()]);

        let unknown: Address = "0x0000000000000000000000000000000000dEaD".parse().unwrap();
        assert!(state.shortest_path(1, usdc.address, unknown).is_none());
    }

    #[test]
    fn no_cross_chain_edges() {
        let usdc_arb = token("USDC", 42161, "0xaf88d065e77c8cC2239327C5EDb3A432268e5831", 6);
        let usdc_eth = token("USDC", 1, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6);
        let mut state = MarketState::new();
        state.seed_chain(&[usdc_arb.clone()]);
        state.seed_chain(&[usdc_eth.clone()]);

        assert!(state.shortest_path(42161, usdc_arb.address, usdc_eth.address).is_none());
    }
}
