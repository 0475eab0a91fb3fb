use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Request {
    Run(Job),
    Stop,
}

/// Owns the worker thread. Dropped with the last `Database` clone.
struct Worker {
    requests: mpsc::Sender<Request>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if self.requests.send(Request::Stop).is_err() {
            warn!("History DB thread was already gone at shutdown");
        }
        if thread.join().is_err() {
            error!("History DB thread panicked");
        }
    }
}

/// SQLite history database. The connection lives on one thread and every
/// statement is shipped to it as a closure; callers await the reply.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let (requests, inbox) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);
        let path = db_path.clone();

        let thread = thread::Builder::new()
            .name("pos-history-db".into())
            .spawn(move || match open(&path) {
                Ok(mut conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        serve(&mut conn, inbox);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn history DB thread")?;

        let startup = ready_rx
            .recv()
            .map_err(|_| anyhow!("history DB thread exited during startup"))?;
        if let Err(err) = startup {
            let _ = thread.join();
            return Err(err);
        }

        info!("History database ready at {}", db_path.display());
        Ok(Self {
            worker: Arc::new(Worker {
                requests,
                thread: Some(thread),
            }),
        })
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // The caller may have given up waiting.
            let _ = reply_tx.send(task(conn));
        });

        self.worker
            .requests
            .send(Request::Run(job))
            .map_err(|_| anyhow!("history DB thread is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("history DB thread dropped the request"))?
    }
}

fn open(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("WAL journal unavailable, using default mode: {err}");
    }
    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

fn serve(conn: &mut Connection, inbox: mpsc::Receiver<Request>) {
    for request in inbox {
        match request {
            Request::Run(job) => job(conn),
            Request::Stop => break,
        }
    }
    info!("History DB thread stopped");
}
