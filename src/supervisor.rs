//! Reconnecting stream supervisor
//!
//! [`StreamMonitor`] keeps one logical RTCM stream alive forever: it builds
//! a fresh transport session per attempt, consumes its message sequence into
//! [`StreamStatus`], and on any failure records the error, waits the
//! configured delay, and retries. Only an explicit [`StreamMonitor::stop`]
//! ends the loop.
//!
//! Two tasks run per monitor: the run loop (sole writer of status) and a
//! periodic listener-notification task. Both are guarded by one
//! `CancellationToken`; `stop` cancels and then awaits both, so no status
//! write can happen after it returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::Result;
use crate::config::StreamConfig;
use crate::source::SourceFactory;
use crate::sources::ntrip::NtripFactory;
use crate::status::StreamStatus;

/// Handle returned by [`StreamMonitor::register_listener`].
pub type ListenerId = u64;

type Callback = Box<dyn Fn() + Send + Sync>;

/// Registered change-notification callbacks.
///
/// Callbacks run synchronously on the supervisor's tasks and must not
/// block.
#[derive(Default)]
struct Listeners {
    callbacks: Mutex<Vec<(ListenerId, Callback)>>,
    next_id: AtomicU64,
}

impl Listeners {
    fn add(&self, callback: Callback) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, callback));
        id
    }

    fn remove(&self, id: ListenerId) {
        self.lock().retain(|(listener_id, _)| *listener_id != id);
    }

    fn notify(&self) {
        let callbacks = self.lock();
        trace!("Notifying {} listeners", callbacks.len());
        for (_, callback) in callbacks.iter() {
            callback();
        }
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Callback)>> {
        // A poisoned lock only means a callback panicked; the list itself
        // is still usable.
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Supervises one monitored NTRIP stream.
pub struct StreamMonitor {
    name: String,
    update_interval: Duration,
    reconnect_delay: Duration,
    factory: Arc<dyn SourceFactory>,
    listeners: Arc<Listeners>,
    status_tx: Arc<watch::Sender<StreamStatus>>,
    status_rx: watch::Receiver<StreamStatus>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl StreamMonitor {
    /// Create a monitor that connects over NTRIP with the given parameters.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let factory = Arc::new(NtripFactory::new(config.clone()));
        Self::with_factory(config, factory)
    }

    /// Create a monitor with a custom connection factory.
    ///
    /// This is the seam tests use to drive the supervisor without a network.
    pub fn with_factory(config: StreamConfig, factory: Arc<dyn SourceFactory>) -> Result<Self> {
        config.validate()?;
        let (status_tx, status_rx) = watch::channel(StreamStatus::default());

        Ok(Self {
            name: config.name,
            update_interval: config.update_interval,
            reconnect_delay: config.reconnect_delay,
            factory,
            listeners: Arc::new(Listeners::default()),
            status_tx: Arc::new(status_tx),
            status_rx,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Start the supervision tasks. No-op if already running or stopped.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.iter().any(|task| !task.is_finished()) {
            debug!("[{}] Already running", self.name);
            return;
        }
        if self.cancel.is_cancelled() {
            warn!("[{}] Monitor was stopped and cannot be restarted", self.name);
            return;
        }
        tasks.clear();

        tasks.push(tokio::spawn(run_loop(
            self.name.clone(),
            Arc::clone(&self.factory),
            Arc::clone(&self.status_tx),
            Arc::clone(&self.listeners),
            self.reconnect_delay,
            self.cancel.clone(),
        )));
        tasks.push(tokio::spawn(notify_loop(
            self.update_interval,
            Arc::clone(&self.listeners),
            self.cancel.clone(),
        )));
    }

    /// Stop the monitor and wait for its tasks to exit.
    ///
    /// Cancels any in-flight connect, read, or retry sleep. After this
    /// returns, status is frozen and no listener will be invoked again.
    /// Stopping is terminal.
    pub async fn stop(&self) {
        info!("[{}] Stopping monitor", self.name);
        self.cancel.cancel();

        let tasks: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            tasks.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }
        self.listeners.clear();
    }

    /// Snapshot of the current stream status.
    pub fn status(&self) -> StreamStatus {
        self.status_rx.borrow().clone()
    }

    /// Register a change-notification callback, returning its handle.
    ///
    /// Callbacks are invoked synchronously on every failure transition and
    /// on the configured update cadence; they must not block.
    pub fn register_listener(&self, callback: impl Fn() + Send + Sync + 'static) -> ListenerId {
        self.listeners.add(Box::new(callback))
    }

    /// Remove a previously registered callback.
    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

/// The retry-forever loop: one connection attempt per iteration.
async fn run_loop(
    name: String,
    factory: Arc<dyn SourceFactory>,
    status_tx: Arc<watch::Sender<StreamStatus>>,
    listeners: Arc<Listeners>,
    reconnect_delay: Duration,
    cancel: CancellationToken,
) {
    info!("[{}] Stream supervisor started", name);
    let mut status = StreamStatus::default();

    'supervise: while !cancel.is_cancelled() {
        status.clear_error();
        let _ = status_tx.send(status.clone());

        let connected = tokio::select! {
            _ = cancel.cancelled() => break 'supervise,
            result = factory.connect() => result,
        };

        match connected {
            Ok(mut source) => {
                debug!("[{}] Session established, reading stream", name);
                loop {
                    let next = tokio::select! {
                        _ = cancel.cancelled() => break 'supervise,
                        result = source.next_message() => result,
                    };
                    match next {
                        Ok(msg) => {
                            if !status.connected {
                                info!("[{}] Stream connected", name);
                            }
                            status.record_message(&msg);
                            trace!(
                                "[{}] Message #{}: {}",
                                name,
                                status.message_count,
                                msg.summary()
                            );
                            let _ = status_tx.send(status.clone());
                        }
                        Err(e) => {
                            warn!("[{}] Stream error: {}", name, e);
                            status.record_error(e.to_string());
                            let _ = status_tx.send(status.clone());
                            listeners.notify();
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                error!("[{}] Connection failed: {}", name, e);
                status.record_error(e.to_string());
                let _ = status_tx.send(status.clone());
                listeners.notify();
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break 'supervise,
            _ = sleep(reconnect_delay) => {}
        }
    }

    info!("[{}] Stream supervisor stopped", name);
}

/// Fixed-cadence listener notification, independent of message arrival.
async fn notify_loop(interval: Duration, listeners: Arc<Listeners>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => listeners.notify(),
        }
    }
}
