use anyhow::Result;
use async_trait::async_trait;
use log::info;

use crate::services::SimSelector;

/// Hands a dial code to the carrier. Delivery is fire-and-forget: the
/// carrier's answer arrives later through the message source.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dispatch(&self, code: &str, sim: SimSelector) -> Result<()>;
}

/// Prints the code so the operator can key it in by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDialer;

#[async_trait]
impl Dialer for ConsoleDialer {
    async fn dispatch(&self, code: &str, sim: SimSelector) -> Result<()> {
        info!("Dialing {} on SIM {}", code, sim.slot() + 1);
        println!("Marcar en SIM {}: {}", sim.slot() + 1, code);
        Ok(())
    }
}
