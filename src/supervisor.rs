//! Supervisor: brings components up in order and tears them down in reverse
//!
//! Mirrors the solver's `main.rs` shape (construct clients, spawn the
//! polling loop, serve warp routes) generalized to this gateway's longer
//! component list. The `rfqs`/`quotes` channels are constructed exactly
//! once, here, and the single sender/receiver halves are moved into their
//! owning tasks — by construction there's no second queue-creation site to
//! disagree with the first (§9 open question).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::{GatewayError, GatewayResult};
use crate::health::{CounterHealthChecker, HealthRegistry};
use crate::inventory::InventoryTracker;
use crate::market_state::MarketState;
use crate::quoter::Quoter;
use crate::registry::ChainRegistry;
use crate::signer::QuoteSigner;
use crate::upstream::UpstreamClient;

/// Bounded grace period shutdown waits for each task to exit
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
/// The fixed upstream RFQ feed endpoint
const UPSTREAM_URL: &str = "wss://api.liquorice.tech/v1/maker/ws";

/// One spawned task plus the cancel signal that stops it
struct Supervised {
    name: String,
    cancel: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Owns every long-running task and the shared read-only state they close over
pub struct Supervisor {
    pub health_registry: HealthRegistry,
    tasks: Vec<Supervised>,
}

impl Supervisor {
    /// Build every component in order and spawn their long-running tasks
    pub async fn start(cli: &Cli) -> GatewayResult<Self> {
        // Market State is constructed empty; the registry supplies the
        // token lists it's seeded with once loaded, just below.
        let mut market_state = MarketState::new();

        info!("loading chain registry");
        let registry = ChainRegistry::load()?;
        for chain in registry.chains() {
            market_state.seed_chain(&chain.tokens);
        }
        let market_state = Arc::new(market_state);
        let registry = Arc::new(registry);

        info!("constructing signer");
        let signer = Arc::new(QuoteSigner::from_private_key(&cli.signer_priv_key).map_err(GatewayError::config)?);

        let mut health_registry = HealthRegistry::new();
        let quote_sent_checker = Arc::new(CounterHealthChecker::new("quote_flow"));
        health_registry.register(quote_sent_checker.clone());

        let mut tasks = Vec::new();

        for chain in registry.active_chains() {
            let tokens: Vec<_> = market_state.tokens_of(chain.id).cloned().collect();
            let cancel = Arc::new(Notify::new());
            let tracker = InventoryTracker::new(chain.clone(), tokens, cancel.clone());
            let name = format!("inventory[{}]", chain.name);
            info!(chain = %chain.name, "spawning inventory tracker");
            let handle = tokio::spawn(tracker.run());
            tasks.push(Supervised { name, cancel, handle });
        }

        let (rfqs_tx, rfqs_rx) = mpsc::unbounded_channel();
        let (quotes_tx, quotes_rx) = mpsc::unbounded_channel();

        let upstream_url: url::Url = UPSTREAM_URL.parse().map_err(|e| GatewayError::config(format!("bad upstream url: {e}")))?;
        let upstream_cancel = Arc::new(Notify::new());
        let upstream = UpstreamClient::new(
            upstream_url,
            cli.maker_sess_id.clone(),
            cli.maker_sess_auth.clone(),
            rfqs_tx,
            quotes_rx,
            upstream_cancel.clone(),
        );
        info!("spawning upstream client");
        let upstream_handle = tokio::spawn(upstream.run());
        tasks.push(Supervised { name: "upstream".to_string(), cancel: upstream_cancel, handle: upstream_handle });

        let quoter_cancel = Arc::new(Notify::new());
        let quoter = Quoter::new(
            market_state,
            registry,
            signer,
            rfqs_rx,
            quotes_tx,
            quote_sent_checker,
            quoter_cancel.clone(),
        );
        info!("spawning quoter");
        let quoter_handle = tokio::spawn(quoter.run());
        tasks.push(Supervised { name: "quoter".to_string(), cancel: quoter_cancel, handle: quoter_handle });

        Ok(Self { health_registry, tasks })
    }

    /// Cancel every task in reverse startup order, waiting up to
    /// `SHUTDOWN_GRACE` for each to exit before moving to the next
    pub async fn shutdown(self) {
        for task in self.tasks.into_iter().rev() {
            info!(task = %task.name, "cancelling task");
            task.cancel.notify_waiters();
            match tokio::time::timeout(SHUTDOWN_GRACE, task.handle).await {
                Ok(Ok(())) => info!(task = %task.name, "task exited cleanly"),
                Ok(Err(e)) => warn!(task = %task.name, error = %e, "task panicked"),
                Err(_) => warn!(task = %task.name, "task did not exit within grace period"),
            }
        }
    }
}
