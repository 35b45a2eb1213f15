//! Per-chain Inventory Tracker: an event subscriber that kicks a balance
//! poller awake, plus the poller's own 10s cadence
//!
//! Two cooperating loops share one provider connection. The event subscriber
//! only ever notifies; it never touches `raw_balance` itself, since a
//! `Transfer` log doesn't tell us the resulting balance, only that one
//! changed.

use std::sync::Arc;
use std::time::Duration;

use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use alloy_primitives::Address;
use futures_util::stream::select_all;
use futures_util::StreamExt;
use tokio::sync::Notify;
use tokio::time::timeout;
use tracing::{error, info, warn};
use url::Url;

use super::abi::IERC20;
use crate::model::{Chain, Token};

/// Steady-state balance poll cadence
const POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Minimum delay between consecutive poller runs, event-kicked or not
const MIN_POLL_DELAY: Duration = Duration::from_millis(100);
/// Backoff before retrying a faulted connection
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// The tracker's coarse lifecycle state, logged on every transition
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Not yet started, or exited after cancellation
    Stopped,
    /// Connecting to the chain node
    Starting,
    /// Subscriber and poller are both live
    Running,
    /// A transport error occurred; about to sleep and retry from `Starting`
    Fault,
}

/// Tracks balances for one active chain's tokens
pub struct InventoryTracker {
    chain: Chain,
    tokens: Vec<Token>,
    cancel: Arc<Notify>,
}

impl InventoryTracker {
    /// Build a tracker over the given chain's tokens (cloned handles into the
    /// same Market State graph, so balance writes here are visible there)
    pub fn new(chain: Chain, tokens: Vec<Token>, cancel: Arc<Notify>) -> Self {
        Self { chain, tokens, cancel }
    }

    /// Run until cancelled: `stopped -> starting -> running <-> fault -> stopped`
    pub async fn run(self) {
        let Some(url) = self.chain.ws_rpc_url.clone() else {
            error!(chain = %self.chain.name, "inventory tracker has no ws url configured, exiting");
            return;
        };

        loop {
            info!(chain = %self.chain.name, "inventory tracker starting");
            match self.connect(&url).await {
                Ok(provider) => {
                    info!(chain = %self.chain.name, "inventory tracker running");
                    let kick = Arc::new(Notify::new());

                    let subscriber = self.run_event_subscriber(provider.clone(), kick.clone());
                    let poller = self.run_balance_poller(provider, kick);

                    tokio::select! {
                        _ = subscriber => {
                            warn!(chain = %self.chain.name, "event subscriber ended, faulting");
                        },
                        _ = poller => {
                            warn!(chain = %self.chain.name, "balance poller ended, faulting");
                        },
                        _ = self.cancel.notified() => {
                            info!(chain = %self.chain.name, "inventory tracker cancelled");
                            return;
                        },
                    }
                },
                Err(e) => {
                    error!(chain = %self.chain.name, error = %e, "inventory tracker failed to connect");
                },
            }

            tokio::select! {
                _ = tokio::time::sleep(RECONNECT_BACKOFF) => {},
                _ = self.cancel.notified() => {
                    info!(chain = %self.chain.name, "inventory tracker cancelled during backoff");
                    return;
                },
            }
        }
    }

    /// Open a websocket connection to the chain node
    ///
    /// The original tracker injects `ExtraDataToPOAMiddleware` for
    /// `chain.poa` chains because web3.py's header decoder rejects the
    /// longer `extraData` that clique/PoA validators stamp into block
    /// headers. Alloy's RPC header type models `extra_data` as an unbounded
    /// `Bytes`, so no equivalent decoder swap exists or is needed here; this
    /// tracker never decodes full headers anyway (`get_block_number`,
    /// `subscribe_logs`, and `balanceOf` calls don't touch `extraData`). The
    /// flag is still logged so a POA-chain misconfiguration is visible.
    async fn connect(&self, url: &Url) -> Result<DynProvider, String> {
        if self.chain.poa {
            info!(chain = %self.chain.name, "connecting to a PoA chain, no decoder changes required under alloy");
        }
        let conn = WsConnect::new(url.as_str());
        let provider = ProviderBuilder::new().on_ws(conn).await.map_err(|e| e.to_string())?;
        Ok(DynProvider::new(provider))
    }

    /// The four Transfer-log filters for one token: `{zeroAddress, settlement}` paired
    /// with `{topic1 (from), topic2 (to)}`
    fn filters_for_token(&self, token: &Token) -> Vec<Filter> {
        let settlement = self.chain.liquorice_settlement_address.unwrap_or(Address::ZERO);
        let mut filters = Vec::with_capacity(4);
        for watched in [Address::ZERO, settlement] {
            filters.push(Filter::new().address(token.address).event(IERC20::Transfer::SIGNATURE).topic1(watched));
            filters.push(Filter::new().address(token.address).event(IERC20::Transfer::SIGNATURE).topic2(watched));
        }
        filters
    }

    /// Subscribe to all tokens' Transfer filters and kick the poller awake on
    /// every delivered log
    async fn run_event_subscriber(&self, provider: DynProvider, kick: Arc<Notify>) {
        let mut streams = Vec::new();
        for token in &self.tokens {
            for filter in self.filters_for_token(token) {
                match provider.subscribe_logs(&filter).await {
                    Ok(sub) => streams.push(sub.into_stream().boxed()),
                    Err(e) => {
                        warn!(chain = %self.chain.name, token = %token.symbol, error = %e, "failed to subscribe to transfer filter");
                    },
                }
            }
        }

        if streams.is_empty() {
            warn!(chain = %self.chain.name, "no transfer subscriptions established");
            return;
        }

        let mut merged = select_all(streams);
        while merged.next().await.is_some() {
            kick.notify_one();
        }
    }

    /// Poll every token's `balanceOf` on a 10s cadence, or immediately when
    /// kicked, never more often than `MIN_POLL_DELAY`
    async fn run_balance_poller(&self, provider: DynProvider, kick: Arc<Notify>) {
        loop {
            let _ = timeout(POLL_INTERVAL, kick.notified()).await;

            let block_number = match provider.get_block_number().await {
                Ok(n) => n,
                Err(e) => {
                    error!(chain = %self.chain.name, error = %e, "failed to read block number");
                    tokio::time::sleep(MIN_POLL_DELAY).await;
                    continue;
                },
            };

            let Some(skeeper) = self.chain.skeeper_address else {
                warn!(chain = %self.chain.name, "no skeeper address configured, skipping balance poll");
                tokio::time::sleep(MIN_POLL_DELAY).await;
                continue;
            };

            for token in &self.tokens {
                let contract = IERC20::new(token.address, provider.clone());
                match contract.balanceOf(skeeper).call().await {
                    Ok(balance) => token.set_balance(balance, block_number),
                    Err(e) => {
                        error!(chain = %self.chain.name, token = %token.symbol, error = %e, "balanceOf call failed");
                        token.set_balance(alloy_primitives::U256::ZERO, block_number);
                    },
                }
            }

            tokio::time::sleep(MIN_POLL_DELAY).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_for_token_are_four() {
        let chain = Chain::new(
            42161,
            "Arbitrum One",
            vec!["arbitrum".to_string()],
            "ETH",
            false,
            "0x0000000000000000000000000000000000000001".parse().unwrap(),
            "0x0000000000000000000000000000000000000002".parse().unwrap(),
        );
        let tracker = InventoryTracker::new(chain, Vec::new(), Arc::new(Notify::new()));
        let token = Token::new("USD Coin", "USDC", 42161, "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".parse().unwrap(), 6);
        assert_eq!(tracker.filters_for_token(&token).len(), 4);
    }
}
