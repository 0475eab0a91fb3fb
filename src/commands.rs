//! Operator command line.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    codegen::CodeGenerator,
    correlation::{InboundMessage, InboxChannel},
    db::{Database, HistoryStore},
    dialer::ConsoleDialer,
    printer::PrintDispatcher,
    services::{ServiceId, ServiceRule, ServiceRuleRegistry},
    settings::{PosSettings, SettingsStore},
    transaction::TransactionFlow,
};

#[derive(Parser, Debug)]
#[command(name = "pos-assistant", version, about = "Carrier wallet point-of-sale assistant")]
pub struct Cli {
    /// Settings file; defaults apply while it is missing (see `settings --init`)
    #[arg(short = 'c', long = "config", default_value = "pos-settings.json", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List services, optionally filtered by name, description or category
    Services {
        query: Option<String>,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the dial code for a service without dialing
    Code {
        id: ServiceId,

        /// Field value as key=value (repeatable)
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Dial a service and wait for the carrier reply on stdin
    Run {
        id: ServiceId,

        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Send the receipt to the configured printer
        #[arg(long)]
        print: bool,

        /// Override the configured correlation timeout
        #[arg(long = "timeout-ms")]
        timeout_ms: Option<u64>,
    },

    /// Show recent transactions
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the effective settings as JSON
    Settings {
        /// Write them to the settings file
        #[arg(long)]
        init: bool,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn execute(cli: Cli) -> Result<()> {
    let registry = Arc::new(ServiceRuleRegistry::new());

    match cli.command {
        Command::Services { query, json } => list_services(&registry, query.as_deref(), json),
        Command::Code { id, fields } => {
            let rule = registry.lookup(id)?;
            let code = CodeGenerator::new().generate(rule, &fields.into_iter().collect())?;
            println!("{code}");
            Ok(())
        }
        Command::Run {
            id,
            fields,
            print,
            timeout_ms,
        } => {
            let settings = settings_store(&cli.config)?.get();
            run_transaction(
                registry,
                settings,
                id,
                fields.into_iter().collect(),
                print,
                timeout_ms,
            )
            .await
        }
        Command::History { limit } => {
            let settings = settings_store(&cli.config)?.get();
            let db = Database::new(settings.history_path.clone())?;
            for record in db.recent(limit).await? {
                println!(
                    "{} {}  {:<28} {:<9} ref1={} ref2={}",
                    record.date,
                    record.time,
                    record.service_name,
                    record.outcome.as_str(),
                    record.reference_data.ref1,
                    record.reference_data.ref2
                );
            }
            Ok(())
        }
        Command::Settings { init } => {
            let store = settings_store(&cli.config)?;
            let settings = store.get();
            if init {
                store.update(settings.clone())?;
                info!("Wrote settings to {}", store.path().display());
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn settings_store(path: &Path) -> Result<SettingsStore> {
    SettingsStore::new(path.to_path_buf())
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

fn list_services(registry: &ServiceRuleRegistry, query: Option<&str>, json: bool) -> Result<()> {
    let matches = registry.search(query.unwrap_or_default());

    if json {
        let summaries: Vec<_> = matches.iter().map(|rule| rule.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for rule in matches {
        println!(
            "{:>3}  {:<32} {:<12} {}",
            rule.id,
            rule.name,
            rule.category.label(),
            field_labels(rule)
        );
    }
    Ok(())
}

fn field_labels(rule: &ServiceRule) -> String {
    rule.visible_fields()
        .into_iter()
        .map(|key| rule.label_for(key.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn run_transaction(
    registry: Arc<ServiceRuleRegistry>,
    settings: PosSettings,
    id: ServiceId,
    fields: HashMap<String, String>,
    print: bool,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let inbox = InboxChannel::default();
    let history = Database::new(settings.history_path.clone())?;
    let flow = TransactionFlow::new(
        registry,
        Arc::new(inbox.clone()),
        Arc::new(ConsoleDialer),
        timeout_ms.unwrap_or(settings.correlation_timeout_ms),
    )
    .with_history(Arc::new(history))
    .with_sim_override(settings.sim_override);

    let reader = tokio::spawn(forward_stdin(inbox));
    let result = flow.run(id, fields).await;
    reader.abort();
    let result = result?;

    println!("{}", result.receipt);
    if !result.is_matched() {
        warn!("No carrier confirmation ({})", result.outcome.status().as_str());
    }

    if print {
        let printer = &settings.printer;
        let dispatcher = PrintDispatcher::new(printer.header.clone(), printer.retry_delay());
        let transport = printer.build_transport();
        dispatcher
            .print_text(transport.as_ref(), &result.receipt, printer.max_attempts)
            .await
            .with_context(|| format!("receipt not printed on {}", transport.describe()))?;
    }

    Ok(())
}

/// Publishes each stdin line as an inbound carrier message.
async fn forward_stdin(inbox: InboxChannel) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        // Piped input can arrive before the session subscribes.
        while inbox.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let delivered = inbox.publish(InboundMessage::new(line));
        info!("Forwarded inbound message to {delivered} listener(s)");
    }
    Ok(())
}
