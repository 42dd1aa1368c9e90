//! Connection orchestrator for streaming readings.
//!
//! [`ReadingStream`] issues the streaming POST, feeds the body through an
//! [`SseDecoder`] into the reading's [`Session`], forwards content deltas to
//! the three output sequences, and reconnects with backoff when a retryable
//! fault interrupts the stream. Each reconnect clears the three channels and
//! carries the session's last event id as `Last-Event-ID`; the retry delay and
//! retry count survive the reconnect.
//!
//! # Lifecycle
//!
//! ```text
//! start_reading ─► connect ─► stream ─► complete ─► Completed
//!                     ▲          │
//!                     │   retryable fault
//!                     │          ▼
//!                     └──── backoff sleep ──► ceiling reached ─► Failed
//! ```
//!
//! A reading ends exactly once: completed, failed, or cancelled. Cancelling
//! or starting another reading tears the driver task down, which closes the
//! output sequences and resolves the outcome to [`ReadingError::Cancelled`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::channels::{reading_channels, ChannelSenders, ReadingHandle};
use super::session::{ReadingSnapshot, RouteOutcome, Session};
use crate::config::ReadingConfig;
use crate::error::{ReadingError, ReadingResult};
use crate::models::{ReadingRecord, ReadingRequest};
use crate::sse::SseDecoder;
use crate::storage::ReadingStore;
use crate::traits::{ByteStream, Headers, HttpClient, HttpError};

/// Capacity of the status notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Upper bound on how much of a non-2xx body ends up in the error message.
const MAX_ERROR_BODY_BYTES: usize = 4096;

/// Status notifications for the current reading.
#[derive(Debug, Clone)]
pub enum ReadingEvent {
    /// A connection was accepted with a 2xx status. `attempt` counts
    /// connections within this reading, starting at 1.
    Connected { attempt: u32 },
    /// A retryable fault interrupted the stream; a reconnect fires after
    /// `delay`.
    Retrying {
        attempt: u32,
        delay: Duration,
        reason: ReadingError,
    },
    /// The server sent `complete`.
    Completed(ReadingSnapshot),
    /// The reading failed terminally.
    Failed(ReadingError),
    /// The reading was cancelled or replaced.
    Cancelled,
}

impl ReadingEvent {
    /// Whether this notification ends the reading.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReadingEvent::Completed(_) | ReadingEvent::Failed(_) | ReadingEvent::Cancelled
        )
    }
}

/// Bookkeeping for the reading currently in flight.
struct ActiveReading {
    id: Uuid,
    task: JoinHandle<()>,
    cancel_tx: watch::Sender<bool>,
    /// Set by whoever delivers the terminal notification first
    terminal: Arc<AtomicBool>,
    session: Arc<Mutex<Session>>,
}

/// Streams readings from the backend, one at a time.
pub struct ReadingStream {
    client: Arc<dyn HttpClient>,
    config: ReadingConfig,
    store: Option<Arc<dyn ReadingStore>>,
    events: broadcast::Sender<ReadingEvent>,
    active: std::sync::Mutex<Option<ActiveReading>>,
}

impl ReadingStream {
    pub fn new(client: Arc<dyn HttpClient>, config: ReadingConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            config,
            store: None,
            events,
            active: std::sync::Mutex::new(None),
        }
    }

    /// Record completed readings in `store`.
    pub fn with_store(mut self, store: Arc<dyn ReadingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &ReadingConfig {
        &self.config
    }

    /// Subscribe to status notifications. Only notifications sent after this
    /// call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<ReadingEvent> {
        self.events.subscribe()
    }

    /// Start streaming a reading, cancelling any reading already in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_reading(&self, request: ReadingRequest) -> ReadingHandle {
        let mut active = self.lock_active();
        if let Some(previous) = active.take() {
            info!("Replacing reading {} with a new one", previous.id);
            self.teardown(previous);
        }

        let id = Uuid::new_v4();
        let (handle, senders, outcome_tx) = reading_channels();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let terminal = Arc::new(AtomicBool::new(false));
        let session = Arc::new(Mutex::new(Session::new(self.config.retry_delay)));

        let driver = Driver {
            id,
            client: Arc::clone(&self.client),
            config: self.config.clone(),
            request,
            session: Arc::clone(&session),
            senders,
            events: self.events.clone(),
        };
        let store = self.store.clone();
        let events = self.events.clone();
        let task_terminal = Arc::clone(&terminal);

        info!("Starting reading {}", id);
        let task = tokio::spawn(async move {
            let result = driver.run(cancel_rx).await;
            let record = match &result {
                Ok(snapshot) if !snapshot.interpretation.is_empty() => Some(
                    ReadingRecord::from_request(&driver.request, snapshot.interpretation.clone()),
                ),
                _ => None,
            };
            // Close the output sequences before the outcome resolves
            drop(driver);

            // Once claimed, a cancel no longer aborts this task
            if task_terminal.swap(true, Ordering::SeqCst) {
                debug!("Reading {} already ended elsewhere", id);
                return;
            }

            if let (Some(record), Some(store)) = (record, store) {
                persist(id, store, record).await;
            }

            let event = match &result {
                Ok(snapshot) => {
                    info!("Reading {} completed", id);
                    ReadingEvent::Completed(snapshot.clone())
                }
                Err(ReadingError::Cancelled) => ReadingEvent::Cancelled,
                Err(err) => {
                    error!("Reading {} failed: {} ({})", id, err, err.error_code());
                    ReadingEvent::Failed(err.clone())
                }
            };
            let _ = events.send(event);
            let _ = outcome_tx.send(result);
        });

        *active = Some(ActiveReading {
            id,
            task,
            cancel_tx,
            terminal,
            session,
        });
        handle
    }

    /// Cancel the reading in flight, if any. Calling this again, or after the
    /// reading ended, does nothing.
    pub fn cancel_reading(&self) {
        if let Some(previous) = self.lock_active().take() {
            info!("Cancelling reading {}", previous.id);
            self.teardown(previous);
        }
    }

    /// Current text of the reading in flight or the one that last ended on
    /// its own. `None` after a cancel.
    pub async fn snapshot(&self) -> Option<ReadingSnapshot> {
        let session = self
            .lock_active()
            .as_ref()
            .map(|active| Arc::clone(&active.session))?;
        let session = session.lock().await;
        Some(session.snapshot())
    }

    /// Whether a reading was started and has not ended yet.
    pub fn is_streaming(&self) -> bool {
        self.lock_active()
            .as_ref()
            .map(|active| !active.terminal.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Stop a reading. A driver that already claimed the terminal
    /// notification is left to deliver it.
    fn teardown(&self, reading: ActiveReading) {
        let _ = reading.cancel_tx.send(true);
        if !reading.terminal.swap(true, Ordering::SeqCst) {
            reading.task.abort();
            let _ = self.events.send(ReadingEvent::Cancelled);
        }
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveReading>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ReadingStream {
    fn drop(&mut self) {
        self.cancel_reading();
    }
}

/// Hand a completed reading to the record store. Failures are logged only.
async fn persist(id: Uuid, store: Arc<dyn ReadingStore>, record: ReadingRecord) {
    let record_id = record.id;
    match tokio::task::spawn_blocking(move || store.create(record)).await {
        Ok(Ok(())) => info!("Reading {} saved as record {}", id, record_id),
        Ok(Err(err)) => warn!("Failed to save reading {}: {:#}", id, err),
        Err(err) => warn!("Record store task for reading {} did not finish: {}", id, err),
    }
}

/// State owned by one reading's driver task.
struct Driver {
    id: Uuid,
    client: Arc<dyn HttpClient>,
    config: ReadingConfig,
    request: ReadingRequest,
    session: Arc<Mutex<Session>>,
    senders: ChannelSenders,
    events: broadcast::Sender<ReadingEvent>,
}

impl Driver {
    /// Connect, stream and reconnect until the reading ends.
    async fn run(&self, mut cancel: watch::Receiver<bool>) -> ReadingResult<ReadingSnapshot> {
        let body = serde_json::to_string(&self.request)?;
        let url = self.config.stream_url();
        let policy = self.config.retry_policy;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let fault = match self.connect_once(&url, &body, attempt, &mut cancel).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            let (retry_count, base_delay) = {
                let session = self.session.lock().await;
                (session.retry_count(), session.retry_delay())
            };
            if policy.exhausted(retry_count) {
                warn!(
                    "Reading {} giving up after {} retries: {}",
                    self.id, retry_count, fault
                );
                return Err(ReadingError::MaxRetriesExceeded {
                    attempts: retry_count,
                    last: Box::new(fault),
                });
            }

            let delay = policy.delay_for(base_delay, retry_count);
            warn!(
                "Reading {} interrupted ({}), retry {}/{} in {:?}",
                self.id,
                fault,
                retry_count + 1,
                policy.max_retries,
                delay
            );
            let _ = self.events.send(ReadingEvent::Retrying {
                attempt: retry_count + 1,
                delay,
                reason: fault,
            });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled(&mut cancel) => {
                    debug!("Reading {} cancelled during backoff", self.id);
                    return Err(ReadingError::Cancelled);
                }
            }
            // Each reconnect replays the reading into empty channels
            let resets = {
                let mut session = self.session.lock().await;
                session.record_retry();
                session.reset_content()
            };
            for delta in resets {
                self.senders.send(delta);
            }
        }
    }

    /// One connection: request, validate, then stream until the reading
    /// completes or the connection faults.
    async fn connect_once(
        &self,
        url: &str,
        body: &str,
        attempt: u32,
        cancel: &mut watch::Receiver<bool>,
    ) -> ReadingResult<ReadingSnapshot> {
        let headers = self.request_headers().await;
        debug!("Reading {} connecting to {} (attempt {})", self.id, url, attempt);

        let response = tokio::select! {
            response = self.client.post_stream(url, body, &headers) => response?,
            _ = cancelled(cancel) => return Err(ReadingError::Cancelled),
        };

        if !response.is_success() {
            let status = response.status;
            let message = read_error_body(response.body, self.config.idle_timeout).await;
            warn!("Reading {} got HTTP {}: {}", self.id, status, message);
            return Err(ReadingError::HttpError { status, message });
        }

        info!("Reading {} connected (attempt {})", self.id, attempt);
        let _ = self.events.send(ReadingEvent::Connected { attempt });

        let mut stream = response.body;
        let mut decoder = SseDecoder::with_limit(self.config.max_buffer_bytes);
        loop {
            let next = tokio::select! {
                next = next_chunk(&mut stream, self.config.idle_timeout) => next,
                _ = cancelled(cancel) => return Err(ReadingError::Cancelled),
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => return Err(err.into()),
                None => {
                    decoder.finish();
                    return Err(ReadingError::Network(HttpError::ConnectionLost(
                        "stream ended before the reading completed".to_string(),
                    )));
                }
            };

            let frames = decoder.feed(&chunk)?;
            let mut session = self.session.lock().await;
            for frame in &frames {
                match session.apply(frame) {
                    RouteOutcome::Continue(deltas) => {
                        for delta in deltas {
                            self.senders.send(delta);
                        }
                    }
                    RouteOutcome::Completed => return Ok(session.snapshot()),
                    RouteOutcome::ServerError(message) => {
                        return Err(ReadingError::ServerEvent(message));
                    }
                }
            }
            // Heartbeat blocks can move the cursor without producing a frame
            session.observe_cursor(decoder.last_event_id(), decoder.retry_interval());
        }
    }

    async fn request_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers.insert("Accept-Encoding".to_string(), "identity".to_string());
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.config.bearer_token()),
        );
        if let Some(id) = self.session.lock().await.last_event_id() {
            headers.insert("Last-Event-ID".to_string(), id.to_string());
        }
        headers
    }
}

/// Resolves once cancellation was requested or the canceller went away.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

/// Next body chunk, or a timeout error when the stream stays silent too long.
async fn next_chunk(
    stream: &mut ByteStream,
    idle_timeout: Option<Duration>,
) -> Option<Result<Bytes, HttpError>> {
    match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
            Ok(next) => next,
            Err(_) => Some(Err(HttpError::Timeout(format!(
                "no data received for {:?}",
                limit
            )))),
        },
        None => stream.next().await,
    }
}

/// Best-effort text of an error response body.
async fn read_error_body(mut stream: ByteStream, idle_timeout: Option<Duration>) -> String {
    let mut bytes = Vec::new();
    while bytes.len() < MAX_ERROR_BODY_BYTES {
        match next_chunk(&mut stream, idle_timeout).await {
            Some(Ok(chunk)) => bytes.extend_from_slice(&chunk),
            _ => break,
        }
    }
    bytes.truncate(MAX_ERROR_BODY_BYTES);
    let text = String::from_utf8_lossy(&bytes).trim().to_string();
    if text.is_empty() {
        "empty response body".to_string()
    } else {
        text
    }
}
