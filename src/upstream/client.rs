//! Upstream Client: one WebSocket session to the upstream RFQ service
//!
//! The reader and writer halves run as two branches of the same `select!`
//! rather than as separately spawned tasks — `select!` already gives us
//! "run concurrently, cancel the other the moment either finishes", which is
//! exactly the supervision rule this component needs, without the
//! `Arc<Mutex<_>>` a cross-task-shared receiver would otherwise require.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::http::Request;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{error, info, warn};
use url::Url;

use crate::model::{Envelope, Rfq, QuoteMessage};

/// Backoff between reconnect attempts
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Maintains the duplex session to the upstream RFQ provider
pub struct UpstreamClient {
    url: Url,
    maker_sess_id: String,
    maker_sess_auth: String,
    rfqs_tx: mpsc::UnboundedSender<Rfq>,
    quotes_rx: mpsc::UnboundedReceiver<QuoteMessage>,
    cancel: Arc<Notify>,
}

impl UpstreamClient {
    /// Build a client over the given queues; `rfqs_tx` is the in-queue the
    /// reader pushes onto, `quotes_rx` is the out-queue the writer drains
    pub fn new(
        url: Url,
        maker_sess_id: String,
        maker_sess_auth: String,
        rfqs_tx: mpsc::UnboundedSender<Rfq>,
        quotes_rx: mpsc::UnboundedReceiver<QuoteMessage>,
        cancel: Arc<Notify>,
    ) -> Self {
        Self { url, maker_sess_id, maker_sess_auth, rfqs_tx, quotes_rx, cancel }
    }

    /// Run the reconnect-supervised session loop until cancelled
    pub async fn run(mut self) {
        loop {
            match self.connect().await {
                Ok((mut sink, mut stream)) => {
                    info!("upstream client connected");
                    tokio::select! {
                        _ = Self::read_loop(&mut stream, &self.rfqs_tx) => {
                            warn!("upstream reader ended, reconnecting");
                        },
                        _ = Self::write_loop(&mut sink, &mut self.quotes_rx) => {
                            warn!("upstream writer ended, reconnecting");
                        },
                        _ = self.cancel.notified() => {
                            info!("upstream client cancelled");
                            return;
                        },
                    }
                },
                Err(e) => {
                    error!(error = %e, "upstream connect failed");
                },
            }

            tokio::select! {
                _ = tokio::time::sleep(RECONNECT_BACKOFF) => {},
                _ = self.cancel.notified() => {
                    info!("upstream client cancelled during backoff");
                    return;
                },
            }
        }
    }

    /// Open the websocket session with the `maker`/`authorization` headers
    async fn connect(&self) -> Result<(WsSink, WsStream), String> {
        let request = Request::builder()
            .uri(self.url.as_str())
            .header("maker", &self.maker_sess_id)
            .header("authorization", &self.maker_sess_auth)
            .header("host", self.url.host_str().unwrap_or_default())
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", tokio_tungstenite::tungstenite::handshake::client::generate_key())
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .body(())
            .map_err(|e| format!("failed to build connect request: {e}"))?;

        let (ws_stream, _resp) = connect_async(request).await.map_err(|e| format!("websocket handshake failed: {e}"))?;
        Ok(ws_stream.split())
    }

    /// Parse and route every incoming frame, per §4.4
    async fn read_loop(stream: &mut WsStream, rfqs_tx: &mpsc::UnboundedSender<Rfq>) {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => Self::handle_frame(&text, rfqs_tx),
                Ok(Message::Close(_)) => {
                    info!("upstream closed the connection");
                    return;
                },
                Ok(_) => {},
                Err(e) => {
                    error!(error = %e, "upstream read error");
                    return;
                },
            }
        }
    }

    /// Decode one text frame into an envelope and route the inner message
    fn handle_frame(text: &str, rfqs_tx: &mpsc::UnboundedSender<Rfq>) {
        match Envelope::parse(text) {
            Ok(Envelope::Connected) => info!("upstream acknowledged connection"),
            Ok(Envelope::Rfq(wire)) => match Rfq::from_wire(wire) {
                Ok(rfq) => {
                    if rfqs_tx.send(rfq).is_err() {
                        warn!("rfqs queue receiver dropped");
                    }
                },
                Err(e) => warn!(error = %e, "dropping invalid rfq"),
            },
            Ok(Envelope::RfqQuote(_)) => warn!("unexpected rfqQuote frame from upstream, ignoring"),
            Ok(Envelope::Unknown(t)) => warn!(message_type = %t, "unknown envelope message type"),
            Err(e) => warn!(error = %e, "failed to parse upstream envelope"),
        }
    }

    /// Drain the out-queue, wrapping and sending each quote as a text frame
    async fn write_loop(sink: &mut WsSink, quotes_rx: &mut mpsc::UnboundedReceiver<QuoteMessage>) {
        while let Some(quote) = quotes_rx.recv().await {
            match Envelope::wrap_quote(&quote) {
                Ok(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        error!(error = %e, "upstream write error");
                        return;
                    }
                },
                Err(e) => error!(error = %e, "failed to serialize outgoing quote"),
            }
        }
    }
}
