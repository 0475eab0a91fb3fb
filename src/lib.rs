pub mod codegen;
pub mod commands;
pub mod correlation;
pub mod db;
pub mod dialer;
pub mod error;
pub mod extraction;
pub mod printer;
pub mod receipt;
pub mod services;
pub mod settings;
pub mod template;
pub mod transaction;
mod utils;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;

pub use codegen::CodeGenerator;
pub use correlation::{
    CorrelationHandle, CorrelationOutcome, CorrelationSession, CorrelationStatus, InboundMessage,
    InboxChannel, MessageSource, ReferenceCorrelator,
};
pub use error::{CodeGenError, PosError, PrintError, TransportError};
pub use extraction::{ReferenceData, ReferenceExtractor};
pub use printer::{PrintDispatcher, PrinterTransport};
pub use receipt::ReceiptRenderer;
pub use services::{ServiceId, ServiceRule, ServiceRuleRegistry};
pub use transaction::{TransactionFlow, TransactionResult};

pub fn run() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    let level = if settings::debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    log::debug!("POS assistant starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(commands::execute(cli));

    // The stdin forwarder may still be parked on a blocking read.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}
