use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{PrintError, TransportError};

use super::{frame, PrinterTransport};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// One framed payload and the attempts it has left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub payload_bytes: Vec<u8>,
    pub remaining_attempts: u32,
}

impl PrintJob {
    pub fn new(payload_bytes: Vec<u8>, max_attempts: u32) -> Self {
        Self {
            payload_bytes,
            remaining_attempts: max_attempts.max(1),
        }
    }
}

/// Writes receipts to a printer with a bounded, constant-delay retry.
/// Jobs sent through the same dispatcher never overlap.
pub struct PrintDispatcher {
    header: String,
    retry_delay: Duration,
    queue: Mutex<()>,
}

impl Default for PrintDispatcher {
    fn default() -> Self {
        Self::new("", DEFAULT_RETRY_DELAY)
    }
}

impl PrintDispatcher {
    pub fn new(header: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            header: header.into(),
            retry_delay,
            queue: Mutex::new(()),
        }
    }

    /// Sanitises `text` for the printer's code page and prints it.
    pub async fn print_text(
        &self,
        transport: &dyn PrinterTransport,
        text: &str,
        max_attempts: u32,
    ) -> Result<(), PrintError> {
        self.print(transport, frame::sanitize(text).as_bytes(), max_attempts)
            .await
    }

    pub async fn print(
        &self,
        transport: &dyn PrinterTransport,
        payload: &[u8],
        max_attempts: u32,
    ) -> Result<(), PrintError> {
        if payload.is_empty() {
            return Err(PrintError::EmptyPayload);
        }

        let _turn = self.queue.lock().await;
        let mut job = PrintJob::new(frame::build(&self.header, payload), max_attempts);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            job.remaining_attempts -= 1;

            match send_once(transport, &job.payload_bytes).await {
                Ok(()) => {
                    log_info!(
                        "Printed {} bytes on {} (attempt {})",
                        job.payload_bytes.len(),
                        transport.describe(),
                        attempt
                    );
                    return Ok(());
                }
                Err(err) => {
                    log_warn!(
                        "Print attempt {} on {} failed: {}",
                        attempt,
                        transport.describe(),
                        err
                    );
                    if job.remaining_attempts == 0 {
                        return Err(PrintError::ExhaustedRetries {
                            attempts: attempt,
                            last_error: err,
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

/// One connect/write/flush cycle. The connection is closed on every path
/// once it was opened. A close error after a good flush is only logged,
/// since the frame was already delivered.
async fn send_once(transport: &dyn PrinterTransport, frame: &[u8]) -> Result<(), TransportError> {
    let mut connection = transport.connect().await?;

    let written = match connection.write(frame).await {
        Ok(()) => connection.flush().await,
        Err(err) => Err(err),
    };

    if let Err(err) = connection.close().await {
        log_warn!("Closing {} failed: {}", transport.describe(), err);
    }
    written
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex as StdMutex,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::printer::PrinterConnection;

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Step {
        RefuseConnect,
        FailWrite,
        FailClose,
        Accept,
    }

    #[derive(Default)]
    struct Counters {
        connects: AtomicU32,
        open: AtomicU32,
        max_open: AtomicU32,
        closed: AtomicU32,
    }

    struct ScriptedTransport {
        script: StdMutex<Vec<Step>>,
        counters: Arc<Counters>,
        written: Arc<StdMutex<Vec<u8>>>,
    }

    impl ScriptedTransport {
        fn new(steps: &[Step]) -> Self {
            let mut script = steps.to_vec();
            script.reverse();
            Self {
                script: StdMutex::new(script),
                counters: Arc::new(Counters::default()),
                written: Arc::new(StdMutex::new(Vec::new())),
            }
        }

        fn connects(&self) -> u32 {
            self.counters.connects.load(Ordering::SeqCst)
        }
    }

    struct ScriptedConnection {
        fail_write: bool,
        fail_close: bool,
        counters: Arc<Counters>,
        written: Arc<StdMutex<Vec<u8>>>,
    }

    #[async_trait]
    impl PrinterConnection for ScriptedConnection {
        async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            tokio::task::yield_now().await;
            if self.fail_write {
                return Err(TransportError::Write {
                    message: "broken pipe".into(),
                });
            }
            self.written.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.counters.open.fetch_sub(1, Ordering::SeqCst);
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(TransportError::Write {
                    message: "close failed: reset by peer".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PrinterTransport for ScriptedTransport {
        fn describe(&self) -> String {
            "scripted".into()
        }

        async fn connect(&self) -> Result<Box<dyn PrinterConnection>, TransportError> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            let step = self.script.lock().unwrap().pop().unwrap_or(Step::Accept);
            if step == Step::RefuseConnect {
                return Err(TransportError::Connect {
                    message: "no route to printer".into(),
                });
            }

            let open = self.counters.open.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_open.fetch_max(open, Ordering::SeqCst);
            Ok(Box::new(ScriptedConnection {
                fail_write: step == Step::FailWrite,
                fail_close: step == Step::FailClose,
                counters: self.counters.clone(),
                written: self.written.clone(),
            }))
        }
    }

    fn dispatcher() -> PrintDispatcher {
        PrintDispatcher::new("TICKET", Duration::ZERO)
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let transport =
            ScriptedTransport::new(&[Step::RefuseConnect, Step::FailWrite, Step::Accept]);

        dispatcher()
            .print(&transport, b"Giros\n", 3)
            .await
            .unwrap();

        assert_eq!(transport.connects(), 3);
        assert_eq!(transport.counters.closed.load(Ordering::SeqCst), 2);
        assert_eq!(
            *transport.written.lock().unwrap(),
            frame::build("TICKET", b"Giros\n")
        );
    }

    #[tokio::test]
    async fn reports_exhausted_retries() {
        let transport = ScriptedTransport::new(&[
            Step::RefuseConnect,
            Step::RefuseConnect,
            Step::FailWrite,
            Step::Accept,
        ]);

        let err = dispatcher()
            .print(&transport, b"Giros\n", 3)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PrintError::ExhaustedRetries {
                attempts: 3,
                last_error: TransportError::Write {
                    message: "broken pipe".into()
                },
            }
        );
        assert_eq!(transport.connects(), 3);
        assert_eq!(transport.counters.open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_failure_after_flush_does_not_reprint() {
        let transport = ScriptedTransport::new(&[Step::FailClose, Step::Accept]);

        dispatcher()
            .print(&transport, b"Giros\n", 3)
            .await
            .unwrap();

        assert_eq!(transport.connects(), 1);
        assert_eq!(transport.counters.closed.load(Ordering::SeqCst), 1);
        assert_eq!(
            *transport.written.lock().unwrap(),
            frame::build("TICKET", b"Giros\n")
        );
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let transport = ScriptedTransport::new(&[Step::RefuseConnect]);
        let err = dispatcher().print(&transport, b"x", 0).await.unwrap_err();

        assert!(matches!(err, PrintError::ExhaustedRetries { attempts: 1, .. }));
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let transport = ScriptedTransport::new(&[]);
        assert_eq!(
            dispatcher().print(&transport, b"", 3).await,
            Err(PrintError::EmptyPayload)
        );
        assert_eq!(transport.connects(), 0);
    }

    #[tokio::test]
    async fn concurrent_jobs_are_serialized() {
        let transport = ScriptedTransport::new(&[]);
        let dispatcher = dispatcher();

        let (first, second) = tokio::join!(
            dispatcher.print(&transport, b"uno\n", 3),
            dispatcher.print_text(&transport, "dos\n", 3),
        );

        assert!(first.is_ok() && second.is_ok());
        assert_eq!(transport.connects(), 2);
        assert_eq!(transport.counters.max_open.load(Ordering::SeqCst), 1);
    }
}
