//! The CLI for the market-maker gateway

use clap::Parser;

/// The default log level if `LOG_LEVEL` is unset
const DEFAULT_LOG_LEVEL: &str = "info";

/// Market-maker RFQ gateway
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // --- Upstream session --- //
    /// The maker session id presented on the `maker` connect header
    #[arg(long, env = "MAKER_SESS_ID")]
    pub maker_sess_id: String,
    /// The UUID presented on the `authorization` connect header
    #[arg(long, env = "MAKER_SESS_AUTH")]
    pub maker_sess_auth: String,

    // --- Signing --- //
    /// The 32-byte hex private key used to sign quote levels
    #[arg(long, env = "SIGNER_PRIV_KEY")]
    pub signer_priv_key: String,

    // --- Server --- //
    /// Port to run the health/metrics HTTP server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // --- Telemetry --- //
    /// The log level, parsed as a `tracing` `EnvFilter` directive
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}
