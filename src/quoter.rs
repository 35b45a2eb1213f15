//! Quoter: consumes RFQs, decides, prices, signs, and emits quotes
//!
//! Each RFQ's procedure is broadly caught and metric-labeled, matching the
//! serviceability-check-then-solve shape of the solver's order loop, not a
//! per-error-type catch, since any uncaught failure here is scoped to one
//! RFQ (§4.5/§9).

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::U256;
use bigdecimal::BigDecimal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::health::CounterHealthChecker;
use crate::market_state::MarketState;
use crate::model::{QuoteLevel, QuoteMessage, Rfq};
use crate::registry::ChainRegistry;
use crate::signer::QuoteSigner;
use crate::telemetry::{status, RFQS_TOTAL};

/// The offered quote amount is 105% of the base notional, capped by inventory
fn spread() -> BigDecimal {
    BigDecimal::from_str("1.05").expect("1.05 is a valid decimal literal")
}
/// Grace period added to the RFQ's own expiry for the quote level's expiry
const EXPIRY_GRACE_SECONDS: u64 = 30;

/// Prices and signs RFQs, one at a time, in FIFO order
pub struct Quoter {
    market_state: Arc<MarketState>,
    registry: Arc<ChainRegistry>,
    signer: Arc<QuoteSigner>,
    rfqs_rx: mpsc::UnboundedReceiver<Rfq>,
    quotes_tx: mpsc::UnboundedSender<QuoteMessage>,
    quote_sent_checker: Arc<CounterHealthChecker>,
    cancel: Arc<tokio::sync::Notify>,
}

impl Quoter {
    /// Build a quoter over the shared market state/registry/signer and the
    /// process-wide `rfqs`/`quotes` queues
    pub fn new(
        market_state: Arc<MarketState>,
        registry: Arc<ChainRegistry>,
        signer: Arc<QuoteSigner>,
        rfqs_rx: mpsc::UnboundedReceiver<Rfq>,
        quotes_tx: mpsc::UnboundedSender<QuoteMessage>,
        quote_sent_checker: Arc<CounterHealthChecker>,
        cancel: Arc<tokio::sync::Notify>,
    ) -> Self {
        Self { market_state, registry, signer, rfqs_rx, quotes_tx, quote_sent_checker, cancel }
    }

    /// Consume RFQs until either the queue's sender side is dropped or a
    /// cancellation signal arrives
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                rfq = self.rfqs_rx.recv() => {
                    match rfq {
                        Some(rfq) => self.handle_rfq(&rfq),
                        None => {
                            info!("rfqs queue closed, quoter exiting");
                            return;
                        },
                    }
                },
                _ = self.cancel.notified() => {
                    info!("quoter cancelled");
                    return;
                },
            }
        }
    }

    /// Run the decide/price/sign/emit pipeline for one RFQ, per §4.5
    ///
    /// Every drop rule below records its own status and returns early; the
    /// broad catch at this level exists only for a failure none of those
    /// rules anticipated, counted `QUOTER_UNHANDLED_EXC` rather than
    /// panicking the task (§4.5/§9).
    fn handle_rfq(&self, rfq: &Rfq) {
        let solver = rfq.solver.clone().unwrap_or_default();

        let record = |status: &str| {
            metrics::counter!(
                RFQS_TOTAL,
                "chain_id" => rfq.chain_id.to_string(),
                "solver" => solver.clone(),
                "base_token" => rfq.base_token.to_string(),
                "quote_token" => rfq.quote_token.to_string(),
                "status" => status.to_string(),
            )
            .increment(1);
        };

        if let Err(msg) = self.try_quote(rfq, &record) {
            error!(rfq_id = %rfq.rfq_id, error = %msg, "quoter hit an unhandled exception");
            record(status::QUOTER_UNHANDLED_EXC);
        }
    }

    /// The actual decide/price/sign/emit steps. Drop rules record their own
    /// status and return `Ok(())`; `Err` is reserved for a failure no drop
    /// rule recognizes.
    fn try_quote(&self, rfq: &Rfq, record: &dyn Fn(&str)) -> Result<(), String> {
        let base_token = self.market_state.get_token(rfq.base_token, rfq.chain_id);
        let Some(base_token) = base_token else {
            record(status::UNSUPPORTED_BT);
            return Ok(());
        };

        let quote_token = self.market_state.get_token(rfq.quote_token, rfq.chain_id);
        let Some(quote_token) = quote_token else {
            record(status::UNSUPPORTED_QT);
            return Ok(());
        };

        if self.market_state.shortest_path(rfq.chain_id, rfq.base_token, rfq.quote_token).is_none() {
            warn!(rfq_id = %rfq.rfq_id, "no route between base and quote token");
            record(status::UNSUPPORTED_QT);
            return Ok(());
        }

        let Some(base_token_amount) = rfq.base_token_amount.filter(|v| *v > U256::ZERO) else {
            warn!(rfq_id = %rfq.rfq_id, "quoter only handles the base-given direction");
            record(status::UNSUPPORTED_BT);
            return Ok(());
        };

        let base_decimal = base_token.raw_to_decimal(base_token_amount);
        let proposed_decimal = (base_decimal * spread()).min(quote_token.balance_decimal());
        let quote_token_amount = quote_token.decimal_to_raw(&proposed_decimal);

        if quote_token_amount == U256::ZERO {
            record(status::LOW_QT_BALANCE);
            return Ok(());
        }

        let unsigned = QuoteLevel::unsigned(
            rfq.expiry + EXPIRY_GRACE_SECONDS,
            base_token.address,
            quote_token.address,
            base_token_amount,
            quote_token_amount,
            U256::from(1u64),
        );

        let Some(chain) = self.registry.chain(rfq.chain_id) else {
            warn!(rfq_id = %rfq.rfq_id, chain_id = rfq.chain_id, "no such chain registered");
            return Ok(());
        };

        let Some(signed) = self.signer.sign(rfq, &unsigned, chain) else {
            warn!(rfq_id = %rfq.rfq_id, "signer declined to sign: chain not active or not provisioned");
            return Ok(());
        };

        let message = QuoteMessage { rfq_id: rfq.rfq_id, levels: vec![signed] };
        if self.quotes_tx.send(message).is_err() {
            warn!(rfq_id = %rfq.rfq_id, "quotes queue receiver dropped, dropping quote");
            return Ok(());
        }

        record(status::QUOTE_SENT);
        self.quote_sent_checker.record();
        Ok(())
    }
}
