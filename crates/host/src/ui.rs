use std::thread::{self, JoinHandle, ThreadId};

use common::{BridgeError, BridgeResult};
use tokio::sync::{mpsc, oneshot};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs closures on the thread that owns the engine.
///
/// The engine is only driven from its own thread; background work that
/// needs to touch it posts a closure here instead.
pub trait UiExecutor: Send + Sync {
    fn run_on_ui_thread(&self, task: Task) -> BridgeResult<()>;
}

/// Runs tasks immediately on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl UiExecutor for InlineExecutor {
    fn run_on_ui_thread(&self, task: Task) -> BridgeResult<()> {
        task();
        Ok(())
    }
}

/// A dedicated thread draining a task queue in submission order.
pub struct UiThread {
    tx: Option<mpsc::UnboundedSender<Task>>,
    thread_id: ThreadId,
    join: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn spawn(name: &str) -> BridgeResult<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let join = thread::Builder::new().name(name.to_string()).spawn(move || {
            while let Some(task) = rx.blocking_recv() {
                task();
            }
            tracing::debug!("ui thread exiting");
        })?;
        Ok(Self {
            tx: Some(tx),
            thread_id: join.thread().id(),
            join: Some(join),
        })
    }

    /// Whether the caller is running on this UI thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Block until every task submitted before this call has run.
    pub fn flush(&self) -> BridgeResult<()> {
        if self.is_current() {
            return Err(BridgeError::InvalidState(
                "cannot flush the ui thread from itself".into(),
            ));
        }
        let (done_tx, done_rx) = oneshot::channel();
        self.run_on_ui_thread(Box::new(move || {
            let _ = done_tx.send(());
        }))?;
        done_rx
            .blocking_recv()
            .map_err(|_| BridgeError::InvalidState("ui thread stopped".into()))
    }
}

impl UiExecutor for UiThread {
    fn run_on_ui_thread(&self, task: Task) -> BridgeResult<()> {
        self.tx
            .as_ref()
            .ok_or_else(|| BridgeError::InvalidState("ui thread stopped".into()))?
            .send(task)
            .map_err(|_| BridgeError::InvalidState("ui thread stopped".into()))
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        // Closing the channel lets the loop finish queued work and exit.
        self.tx.take();
        if let Some(join) = self.join.take() {
            if !self.is_current() {
                let _ = join.join();
            }
        }
    }
}

impl std::fmt::Debug for UiThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiThread")
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}
