use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, oneshot, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    extraction::ReferenceExtractor,
    services::{ServiceId, ServiceRule, ServiceRuleRegistry},
};

use super::{
    source::{InboundMessage, MessageSource},
    CorrelationOutcome, CorrelationSession, CorrelationState, CorrelationStatus,
};

const ENABLE_LOGS: bool = true;
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365);

use crate::{log_debug, log_info, log_warn};

/// Caller's side of a running session.
#[derive(Debug)]
pub struct CorrelationHandle {
    session: CorrelationSession,
    outcome: oneshot::Receiver<CorrelationOutcome>,
}

impl CorrelationHandle {
    pub fn session(&self) -> &CorrelationSession {
        &self.session
    }

    pub async fn outcome(self) -> CorrelationOutcome {
        self.outcome
            .await
            .unwrap_or_else(|_| CorrelationOutcome::Error("correlator dropped the session".into()))
    }
}

struct Watcher {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Matches carrier replies to the request that was just dialed.
///
/// One session at a time: `start` supersedes whatever was running. Clones
/// share the same session.
#[derive(Clone)]
pub struct ReferenceCorrelator {
    registry: Arc<ServiceRuleRegistry>,
    source: Arc<dyn MessageSource>,
    extractor: ReferenceExtractor,
    state: Arc<Mutex<CorrelationState>>,
    watcher: Arc<Mutex<Option<Watcher>>>,
}

impl ReferenceCorrelator {
    pub fn new(registry: Arc<ServiceRuleRegistry>, source: Arc<dyn MessageSource>) -> Self {
        Self {
            registry,
            source,
            extractor: ReferenceExtractor::new(),
            state: Arc::new(Mutex::new(CorrelationState::new())),
            watcher: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn snapshot(&self) -> Option<CorrelationSession> {
        self.state.lock().await.session().cloned()
    }

    pub async fn status(&self) -> CorrelationStatus {
        self.state.lock().await.status()
    }

    /// Opens a session for `service_id` that listens for `deadline_ms`.
    /// Messages stamped at or before the session start are ignored.
    pub async fn start(&self, service_id: ServiceId, deadline_ms: u64) -> CorrelationHandle {
        self.cancel().await;

        let rule = self.registry.get_or_fallback(service_id);
        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let deadline_at = started_at
            .checked_add_signed(chrono::Duration::milliseconds(
                i64::try_from(deadline_ms).unwrap_or(i64::MAX),
            ))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let mut state = self.state.lock().await;
            state.begin_session(
                session_id.clone(),
                service_id,
                started_at,
                deadline_at,
                reply_tx,
            );
        }

        let inbox = self.source.subscribe();

        let session = {
            let mut state = self.state.lock().await;
            state.mark_listening(&session_id);
            state.session().cloned()
        }
        .unwrap_or(CorrelationSession {
            id: session_id.clone(),
            service_id,
            started_at,
            deadline: deadline_at,
            status: CorrelationStatus::Listening,
        });

        log_info!(
            "Correlation {} listening for service {} ({}) for {}ms",
            session_id,
            service_id,
            rule.name,
            deadline_ms
        );

        let cancel_token = CancellationToken::new();
        let now = Instant::now();
        let deadline = now
            .checked_add(Duration::from_millis(deadline_ms))
            .unwrap_or(now + FAR_FUTURE);
        let handle = tokio::spawn(watch_inbox(
            self.state.clone(),
            session_id,
            started_at,
            rule,
            self.extractor,
            inbox,
            cancel_token.clone(),
            deadline,
        ));

        *self.watcher.lock().await = Some(Watcher {
            handle,
            cancel_token,
        });

        CorrelationHandle {
            session,
            outcome: reply_rx,
        }
    }

    /// Cancels the live session, if any, and stops observing the inbox.
    /// No-op when nothing is running.
    pub async fn cancel(&self) {
        let cancelled = self
            .state
            .lock()
            .await
            .finish_current(CorrelationOutcome::Cancelled);

        if let Some(session) = cancelled {
            log_info!("Correlation {} cancelled", session.id);
        }

        if let Some(watcher) = self.watcher.lock().await.take() {
            watcher.cancel_token.cancel();
            if let Err(err) = watcher.handle.await {
                log_warn!("Correlation watcher failed to join: {err}");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn watch_inbox(
    state: Arc<Mutex<CorrelationState>>,
    session_id: String,
    started_at: DateTime<Utc>,
    rule: ServiceRule,
    extractor: ReferenceExtractor,
    mut inbox: broadcast::Receiver<InboundMessage>,
    cancel_token: CancellationToken,
    deadline: Instant,
) {
    let timer = time::sleep_until(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_debug!("Correlation {} watcher stopped", session_id);
                break;
            }
            _ = &mut timer => {
                if state.lock().await.finish(&session_id, CorrelationOutcome::TimedOut) {
                    log_warn!("Correlation {} timed out waiting for service {}", session_id, rule.id);
                }
                break;
            }
            received = inbox.recv() => match received {
                Ok(message) => {
                    if message.timestamp <= started_at {
                        log_debug!("Ignoring message stamped before correlation {}", session_id);
                        continue;
                    }
                    let Some(refs) = extractor.extract(&rule, &message.body) else {
                        continue;
                    };
                    if state
                        .lock()
                        .await
                        .finish(&session_id, CorrelationOutcome::Matched(refs.clone()))
                    {
                        log_info!(
                            "Correlation {} matched: ref1={} ref2={}",
                            session_id,
                            refs.ref1,
                            refs.ref2
                        );
                    }
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("Correlation {} skipped {} messages", session_id, skipped);
                }
                Err(RecvError::Closed) => {
                    state.lock().await.finish(
                        &session_id,
                        CorrelationOutcome::Error("message source closed".into()),
                    );
                    log_warn!("Message source closed during correlation {}", session_id);
                    break;
                }
            }
        }
    }
}
