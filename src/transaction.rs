//! End-to-end transaction: generate, dial, correlate, render, record.

use std::{collections::HashMap, sync::Arc};

use chrono::Local;
use log::{error, info, warn};

use crate::{
    codegen::CodeGenerator,
    correlation::{CorrelationOutcome, CorrelationSession, MessageSource, ReferenceCorrelator},
    db::{HistoryStore, TransactionOutcome, TransactionRecord},
    dialer::Dialer,
    error::{CodeGenError, PosError},
    extraction::ReferenceData,
    receipt::ReceiptRenderer,
    services::{ServiceId, ServiceRule, ServiceRuleRegistry, SimSelector},
};

/// Everything a finished transaction produced. The receipt is rendered for
/// every outcome so nothing the operator typed is lost.
#[derive(Debug, Clone)]
pub struct TransactionResult {
    pub code: String,
    pub session: CorrelationSession,
    pub outcome: CorrelationOutcome,
    pub receipt: String,
    pub record: TransactionRecord,
}

impl TransactionResult {
    pub fn references(&self) -> Result<ReferenceData, PosError> {
        self.outcome.clone().into_result(self.session.service_id)
    }

    pub fn is_matched(&self) -> bool {
        matches!(self.outcome, CorrelationOutcome::Matched(_))
    }
}

pub struct TransactionFlow {
    registry: Arc<ServiceRuleRegistry>,
    generator: CodeGenerator,
    renderer: ReceiptRenderer,
    correlator: ReferenceCorrelator,
    dialer: Arc<dyn Dialer>,
    history: Option<Arc<dyn HistoryStore>>,
    timeout_ms: u64,
    sim_override: Option<SimSelector>,
}

impl TransactionFlow {
    pub fn new(
        registry: Arc<ServiceRuleRegistry>,
        source: Arc<dyn MessageSource>,
        dialer: Arc<dyn Dialer>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            correlator: ReferenceCorrelator::new(registry.clone(), source),
            registry,
            generator: CodeGenerator::new(),
            renderer: ReceiptRenderer::new(),
            dialer,
            history: None,
            timeout_ms,
            sim_override: None,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_sim_override(mut self, sim: Option<SimSelector>) -> Self {
        self.sim_override = sim;
        self
    }

    pub fn correlator(&self) -> &ReferenceCorrelator {
        &self.correlator
    }

    pub fn rule(&self, service_id: ServiceId) -> ServiceRule {
        self.registry.get_or_fallback(service_id)
    }

    /// Dial code for `service_id`, without dispatching it.
    pub fn code_for(
        &self,
        service_id: ServiceId,
        fields: &HashMap<String, String>,
    ) -> Result<String, PosError> {
        let rule = self.rule(service_id);
        self.generator
            .generate(&rule, fields)
            .map_err(|err| match err {
                CodeGenError::MissingTemplate { service_id } => {
                    PosError::MissingTemplate(service_id)
                }
                other => PosError::CodeGen(other),
            })
    }

    /// Runs one transaction. Errors are returned only when nothing was
    /// dialed; every later failure is reported through the result's outcome.
    pub async fn run(
        &self,
        service_id: ServiceId,
        fields: HashMap<String, String>,
    ) -> Result<TransactionResult, PosError> {
        let rule = self.rule(service_id);
        let code = self.code_for(service_id, &fields)?;
        let sim = self.sim_override.unwrap_or(rule.sim_selector);

        let handle = self.correlator.start(rule.id, self.timeout_ms).await;
        let session = handle.session().clone();

        let outcome = match self.dialer.dispatch(&code, sim).await {
            Ok(()) => handle.outcome().await,
            Err(err) => {
                error!("Dial failed for service {}: {err:#}", rule.id);
                self.correlator.cancel().await;
                CorrelationOutcome::Error(format!("dial failed: {err}"))
            }
        };

        let references = match &outcome {
            CorrelationOutcome::Matched(refs) => refs.clone(),
            _ => ReferenceData::default(),
        };
        if !matches!(outcome, CorrelationOutcome::Matched(_)) {
            warn!(
                "Service {} finished without references ({})",
                rule.id,
                outcome.status().as_str()
            );
        }

        let receipt = self.renderer.render(&rule, &fields, &references);
        let record = TransactionRecord::new(
            &rule,
            &fields,
            references,
            receipt.clone(),
            TransactionOutcome::from(&outcome),
            Local::now(),
        );

        if let Some(history) = &self.history {
            match history.append(record.clone()).await {
                Ok(()) => info!("Recorded transaction {}", record.id),
                Err(err) => error!("Failed to record transaction {}: {err:#}", record.id),
            }
        }

        Ok(TransactionResult {
            code,
            session,
            outcome,
            receipt,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;
    use crate::correlation::{CorrelationStatus, InboxChannel};

    #[derive(Default)]
    struct RecordingDialer {
        dialed: Mutex<Vec<(String, SimSelector)>>,
        fail: bool,
    }

    #[async_trait]
    impl Dialer for RecordingDialer {
        async fn dispatch(&self, code: &str, sim: SimSelector) -> anyhow::Result<()> {
            if self.fail {
                return Err(anyhow!("no signal"));
            }
            self.dialed.lock().unwrap().push((code.to_string(), sim));
            Ok(())
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn flow(dialer: Arc<RecordingDialer>, timeout_ms: u64) -> TransactionFlow {
        TransactionFlow::new(
            Arc::new(ServiceRuleRegistry::new()),
            Arc::new(InboxChannel::default()),
            dialer,
            timeout_ms,
        )
    }

    #[tokio::test]
    async fn timeout_still_renders_receipt() {
        let dialer = Arc::new(RecordingDialer::default());
        let flow = flow(dialer.clone(), 20);

        let result = flow
            .run(10, fields(&[("numero", "0981555111"), ("monto", "20000")]))
            .await
            .unwrap();

        assert_eq!(result.outcome, CorrelationOutcome::TimedOut);
        assert_eq!(result.references(), Err(PosError::CorrelationTimedOut(10)));
        assert!(result.receipt.contains("Recarga Tigo"));
        assert_eq!(result.record.outcome, TransactionOutcome::TimedOut);
        assert_eq!(
            dialer.dialed.lock().unwrap().as_slice(),
            &[("*555*5*1*0981555111*20000#".to_string(), SimSelector::Sim1)]
        );
    }

    #[tokio::test]
    async fn dial_failure_is_reported_as_error_outcome() {
        let dialer = Arc::new(RecordingDialer {
            fail: true,
            ..Default::default()
        });
        let flow = flow(dialer, 5_000);

        let result = flow
            .run(10, fields(&[("numero", "0981"), ("monto", "5000")]))
            .await
            .unwrap();

        assert!(matches!(result.outcome, CorrelationOutcome::Error(_)));
        assert_eq!(result.record.outcome, TransactionOutcome::Failed);
        assert_eq!(flow.correlator().status().await, CorrelationStatus::Cancelled);
    }

    #[tokio::test]
    async fn unknown_service_is_blocked_before_dialing() {
        let dialer = Arc::new(RecordingDialer::default());
        let flow = flow(dialer.clone(), 20);

        let err = flow.run(500, HashMap::new()).await.unwrap_err();

        assert_eq!(err, PosError::MissingTemplate(500));
        assert!(dialer.dialed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_required_field_is_blocked() {
        let dialer = Arc::new(RecordingDialer::default());
        let flow = flow(dialer.clone(), 20);

        let err = flow.run(0, fields(&[("numero", "0991")])).await.unwrap_err();

        assert!(matches!(
            err,
            PosError::CodeGen(CodeGenError::MissingField { service_id: 0, .. })
        ));
        assert!(dialer.dialed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sim_override_wins_over_rule() {
        let dialer = Arc::new(RecordingDialer::default());
        let flow = flow(dialer.clone(), 10).with_sim_override(Some(SimSelector::Sim2));

        flow.run(10, fields(&[("numero", "0981"), ("monto", "5000")]))
            .await
            .unwrap();

        assert_eq!(dialer.dialed.lock().unwrap()[0].1, SimSelector::Sim2);
    }
}
