//! The poll driver.
//!
//! A [`Monitor`] owns one [`WsSession`] and walks through
//! `Idle -> Running -> Stopping -> Stopped`:
//!
//! ```text
//!   ticker (poll_interval) ──▶ connected? ──yes──▶ send ue_get
//!                                  │
//!                                  no ──▶ backoff elapsed? ──▶ connect
//!
//!   session events ──▶ receive task ──▶ Recorder ──▶ live view
//!
//!   StopHandle::stop() ──▶ close session ──▶ drain receive task ──▶ export once
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{MonitorConfig, ReconnectPolicy};
use crate::data::duration::format_duration;
use crate::data::{Extractor, FieldSet, Recorder};
use crate::error::MonitorError;
use crate::export::{ExportOutcome, Exporter};
use crate::report;
use crate::source::{SessionEvent, UeGetRequest, WsSession};

/// Buffered session events between the socket reader and the recorder.
const EVENT_BUFFER: usize = 64;

/// Shortest poll period; a zero period would stall the ticker.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Requests a cooperative stop of a running [`Monitor`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
    state: Arc<Mutex<MonitorState>>,
}

impl StopHandle {
    /// Ask the monitor to stop. Returns `false` if a stop was already requested.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock()
    }
}

/// Capped exponential delay between reconnection attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    failures: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, failures: 0 }
    }

    /// Record a failed attempt and return how long to wait before the next
    /// one, or `None` once `max_attempts` consecutive attempts have failed.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self
            .policy
            .max_attempts
            .is_some_and(|max| self.failures >= max)
        {
            return None;
        }

        let factor = self.policy.multiplier.max(1.0).powi(self.failures as i32 - 1);
        let delay = self.policy.initial_delay.as_secs_f64() * factor;
        let capped = delay.min(self.policy.max_delay.as_secs_f64());
        Some(Duration::from_secs_f64(capped))
    }

    /// Forget previous failures after a successful connect.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Polls one UE until stopped, then exports what it collected.
#[derive(Debug)]
pub struct Monitor {
    config: MonitorConfig,
    recorder: Arc<Recorder>,
    state: Arc<Mutex<MonitorState>>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
    live_view: bool,
    sequence: u64,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        let recorder = Recorder::new(Extractor::new(config.fields))
            .with_clamp_counter_reset(config.clamp_counter_reset);
        let (stop_tx, stop_rx) = watch::channel(false);

        Self {
            config,
            recorder: Arc::new(recorder),
            state: Arc::new(Mutex::new(MonitorState::Idle)),
            stop_tx: Arc::new(stop_tx),
            stop_rx,
            live_view: true,
            sequence: 0,
        }
    }

    /// Print each sample to stdout as it arrives (on by default).
    pub fn with_live_view(mut self, enabled: bool) -> Self {
        self.live_view = enabled;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn recorder(&self) -> &Arc<Recorder> {
        &self.recorder
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Run until a stop is requested (or reconnection gives up), then export
    /// the collected samples and write the statistics to `console`.
    pub async fn run<W: Write>(mut self, console: &mut W) -> ExportOutcome {
        self.set_state(MonitorState::Running);

        let (session, events) = WsSession::channel(self.config.ws_url.clone(), EVENT_BUFFER);
        let live = self.live_view.then_some((self.config.ue_id, self.config.fields));
        let mut receiver = tokio::spawn(receive_loop(events, self.recorder.clone(), live));

        self.poll(&session).await;

        self.set_state(MonitorState::Stopping);
        if let Err(e) = session.close().await {
            debug!("Error while closing session: {}", e);
        }
        // Dropping the session releases its event sender; the receive task
        // ends once the last read loop has delivered everything.
        drop(session);

        let drain_timeout = self.config.drain_timeout;
        if tokio::time::timeout(drain_timeout, &mut receiver).await.is_err() {
            warn!(
                "Receive path did not drain within {}, discarding in-flight frames",
                format_duration(drain_timeout)
            );
            receiver.abort();
        }

        self.set_state(MonitorState::Stopped);

        let samples = self.recorder.take_samples();
        let exporter = Exporter::new(self.config.export_path(), self.config.ue_id, self.config.fields);
        exporter.export(&samples, console)
    }

    async fn poll(&mut self, session: &WsSession) {
        let mut stop_rx = self.stop_rx.clone();
        let mut backoff = Backoff::new(self.config.reconnect.clone());
        let mut next_attempt = Instant::now();
        let mut was_connected = false;

        let mut ticker = tokio::time::interval(self.config.poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {}
            }
            if *stop_rx.borrow() {
                break;
            }

            if session.is_connected() {
                was_connected = true;
                self.send_request(session).await;
                continue;
            }

            if was_connected {
                warn!("Connection to {} lost", session.url());
                was_connected = false;
            }
            if Instant::now() < next_attempt {
                continue;
            }

            let attempt = tokio::select! {
                result = session.connect() => result,
                _ = stop_rx.changed() => break,
            };

            match attempt {
                Ok(()) => {
                    backoff.reset();
                    was_connected = true;
                    self.send_request(session).await;
                }
                Err(e) => {
                    warn!("{}", e);
                    let Some(delay) = backoff.next_delay() else {
                        error!(
                            "Giving up on {} after {} failed connection attempts",
                            session.url(),
                            backoff.failures()
                        );
                        break;
                    };
                    info!("Retrying connection in {}", format_duration(delay));
                    next_attempt = Instant::now() + delay;
                }
            }
        }
    }

    async fn send_request(&mut self, session: &WsSession) {
        self.sequence += 1;
        let request = UeGetRequest::new(
            self.config.ue_id,
            format!("{}{}", self.config.message_id_prefix, self.sequence),
        );
        if let Err(e) = session.send_json(&request).await {
            debug!(message_id = %request.message_id, "Dropping request: {}", e);
        }
    }

    fn set_state(&self, next: MonitorState) {
        let mut state = self.state.lock();
        if *state != next {
            info!("Monitor {:?} -> {:?}", *state, next);
            *state = next;
        }
    }
}

async fn receive_loop(
    mut events: mpsc::Receiver<SessionEvent>,
    recorder: Arc<Recorder>,
    live: Option<(u32, FieldSet)>,
) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Message(payload) => match recorder.ingest(&payload, Local::now()) {
                Ok(Some(sample)) => {
                    if let Some((ue_id, fields)) = live {
                        println!("{}", report::format_live(&sample, ue_id, fields));
                    }
                }
                Ok(None) => debug!("Frame carried no sample"),
                Err(e @ MonitorError::Decode(_)) => warn!(payload = %payload, "{}", e),
                Err(e) => warn!("{}", e),
            },
            SessionEvent::Closed => info!("WebSocket connection closed"),
            SessionEvent::Error(e) => warn!("WebSocket error: {}", e),
        }
    }
    debug!("Receive path drained");
}
