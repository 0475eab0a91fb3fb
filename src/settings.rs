use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::{
    printer::{
        DevicePrinterTransport, PrinterTransport, TcpPrinterTransport, DEFAULT_CONNECT_TIMEOUT,
        DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
    },
    services::SimSelector,
};

pub const DEBUG_ENV: &str = "POS_ASSISTANT_DEBUG";
const DEBUG_RETRY_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PrinterTransportSettings {
    Device { path: PathBuf },
    Tcp { address: String },
}

impl PrinterTransportSettings {
    pub fn build(&self, connect_timeout: Duration) -> Box<dyn PrinterTransport> {
        match self {
            PrinterTransportSettings::Device { path } => Box::new(
                DevicePrinterTransport::new(path.clone()).with_connect_timeout(connect_timeout),
            ),
            PrinterTransportSettings::Tcp { address } => Box::new(
                TcpPrinterTransport::new(address.clone()).with_connect_timeout(connect_timeout),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrinterSettings {
    pub transport: PrinterTransportSettings,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub header: String,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            transport: PrinterTransportSettings::Device {
                path: PathBuf::from("/dev/rfcomm0"),
            },
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: millis(DEFAULT_RETRY_DELAY),
            connect_timeout_ms: millis(DEFAULT_CONNECT_TIMEOUT),
            header: "COMPROBANTE".into(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl PrinterSettings {
    pub fn build_transport(&self) -> Box<dyn PrinterTransport> {
        self.transport
            .build(Duration::from_millis(self.connect_timeout_ms))
    }

    /// Retry delay after applying the debug override.
    pub fn retry_delay(&self) -> Duration {
        if debug_enabled() {
            Duration::from_millis(self.retry_delay_ms.min(DEBUG_RETRY_DELAY_MS))
        } else {
            Duration::from_millis(self.retry_delay_ms)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PosSettings {
    pub correlation_timeout_ms: u64,
    pub printer: PrinterSettings,
    pub history_path: PathBuf,
    pub sim_override: Option<SimSelector>,
}

impl Default for PosSettings {
    fn default() -> Self {
        Self {
            correlation_timeout_ms: 60_000,
            printer: PrinterSettings::default(),
            history_path: PathBuf::from("pos-history.db"),
            sim_override: None,
        }
    }
}

pub fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// JSON-backed settings. A missing or unreadable file yields defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<PosSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings in {}: {err}", path.display());
                PosSettings::default()
            })
        } else {
            PosSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> PosSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: PosSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &PosSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: PosSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        let settings = store.get();
        assert_eq!(settings.correlation_timeout_ms, 60_000);
        assert_eq!(settings.printer.max_attempts, 3);
        assert_eq!(settings.printer.retry_delay_ms, 1_000);
        assert_eq!(settings.printer.connect_timeout_ms, 5_000);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.get(), PosSettings::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.get();
        settings.correlation_timeout_ms = 45_000;
        settings.sim_override = Some(SimSelector::Sim2);
        settings.printer.transport = PrinterTransportSettings::Tcp {
            address: "192.168.0.50:9100".into(),
        };
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.get(), settings);
        reopened.reload().unwrap();
        assert_eq!(reopened.get().printer.build_transport().describe(), "tcp 192.168.0.50:9100");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "correlation_timeout_ms": 5000 }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.correlation_timeout_ms, 5_000);
        assert_eq!(settings.printer, PrinterSettings::default());
    }
}
