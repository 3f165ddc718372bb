//! CaptureCoordinator - single owner actor for capture jobs.
//!
//! The coordinator owns the countdown tick, the delay timer, the pending frame
//! promise and the clipboard write of every live job, and feeds everything that
//! happens to them through the pure state machine in [`super::state`].
//!
//! Architecture:
//! - `SchedulerHandle` sends Commands to the coordinator via command_tx
//! - Timer and clipboard tasks send CaptureEvents back via event_tx
//! - The coordinator runs `transition` and executes the returned SideEffects
//! - Observers read state through a `watch` channel and notices through `broadcast`

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use super::frame::{FrameSource, ImageBlob};
use super::state::{
    transition, CaptureEvent, CaptureMode, CaptureOutcome, CaptureState, JobId, Notice,
    SideEffect,
};
use crate::clipboard::{ClipboardSink, ImagePayload};
use crate::error::ViewerError;

pub const DEFAULT_DELAY_SECS: u32 = 5;
const TICK_INTERVAL: Duration = Duration::from_secs(1);
const NOTICE_CAPACITY: usize = 16;
const MSG_NO_FRAME_BLOB: &str = "Failed to capture frame blob.";

/// Commands sent from the handle to the coordinator.
#[derive(Debug)]
pub enum Command {
    CaptureNow {
        response_tx: oneshot::Sender<CaptureOutcome>,
    },
    CaptureAfterDelay {
        seconds: u32,
        response_tx: oneshot::Sender<CaptureOutcome>,
    },
}

/// Everything a live job holds. Dropping it without `cancel` would leave its
/// tasks running, so removal always goes through `cancel`.
struct JobTasks {
    tick: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
    write: Option<JoinHandle<()>>,
    pending_frame: Option<oneshot::Sender<Result<ImageBlob, String>>>,
    response_tx: Option<oneshot::Sender<CaptureOutcome>>,
}

impl JobTasks {
    fn new(response_tx: oneshot::Sender<CaptureOutcome>) -> Self {
        Self {
            tick: None,
            timer: None,
            write: None,
            pending_frame: None,
            response_tx: Some(response_tx),
        }
    }

    fn stop_countdown(&mut self) {
        if let Some(tick) = self.tick.take() {
            tick.abort();
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn cancel(&mut self) {
        self.stop_countdown();
        if let Some(write) = self.write.take() {
            write.abort();
        }
        self.pending_frame = None;
    }

    fn respond(&mut self, outcome: CaptureOutcome) {
        if let Some(tx) = self.response_tx.take() {
            let _ = tx.send(outcome);
        }
    }
}

pub struct CaptureCoordinator<C: ClipboardSink> {
    state: CaptureState,
    source: Arc<dyn FrameSource>,
    clipboard: Arc<C>,
    jobs: HashMap<JobId, JobTasks>,
    next_job: u64,
    command_rx: mpsc::UnboundedReceiver<Command>,
    event_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    event_tx: mpsc::UnboundedSender<CaptureEvent>,
    state_tx: watch::Sender<CaptureState>,
    notice_tx: broadcast::Sender<Notice>,
}

impl<C: ClipboardSink> CaptureCoordinator<C> {
    pub fn new(source: Arc<dyn FrameSource>, clipboard: Arc<C>) -> (Self, SchedulerHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(CaptureState::Idle);
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);

        let handle = SchedulerHandle {
            command_tx,
            state_rx,
            notice_tx: notice_tx.clone(),
        };

        let coordinator = Self {
            state: CaptureState::Idle,
            source,
            clipboard,
            jobs: HashMap::new(),
            next_job: 0,
            command_rx,
            event_rx,
            event_tx,
            state_tx,
            notice_tx,
        };

        (coordinator, handle)
    }

    /// Creates the coordinator and runs it on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(source: Arc<dyn FrameSource>, clipboard: Arc<C>) -> SchedulerHandle {
        let (coordinator, handle) = Self::new(source, clipboard);
        tokio::spawn(coordinator.run());
        handle
    }

    /// Main event loop. Ends when every handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!(target: "capture", "[SCHEDULER] Starting event loop");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        tracing::info!(target: "capture", "[SCHEDULER] All handles dropped, shutting down");
                        break;
                    }
                },
                Some(event) = self.event_rx.recv() => {
                    self.dispatch(event);
                }
            }
        }

        self.cleanup();
    }

    fn handle_command(&mut self, cmd: Command) {
        self.next_job += 1;
        let job = JobId(self.next_job);

        let event = match cmd {
            Command::CaptureNow { response_tx } => {
                tracing::info!(target: "capture", "[SCHEDULER] Job {} requested: immediate", job.0);
                self.jobs.insert(job, JobTasks::new(response_tx));
                CaptureEvent::ImmediateRequested { job }
            }
            Command::CaptureAfterDelay {
                seconds,
                response_tx,
            } => {
                tracing::info!(target: "capture", "[SCHEDULER] Job {} requested: {}s delay", job.0, seconds);
                self.jobs.insert(job, JobTasks::new(response_tx));
                CaptureEvent::DelayedRequested { job, seconds }
            }
        };

        self.dispatch(event);
    }

    /// Runs an event and every event its effects produce, in order.
    fn dispatch(&mut self, event: CaptureEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            tracing::trace!(target: "capture", "[SCHEDULER] Event: {:?}", event);
            let (new_state, effects) = transition(std::mem::take(&mut self.state), event);
            self.state = new_state;

            for effect in effects {
                if let Some(follow_up) = self.execute(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn execute(&mut self, effect: SideEffect) -> Option<CaptureEvent> {
        match effect {
            SideEffect::Supersede { job } => {
                if let Some(mut tasks) = self.jobs.remove(&job) {
                    tracing::info!(target: "capture", "[SCHEDULER] Job {} superseded", job.0);
                    tasks.cancel();
                    tasks.respond(CaptureOutcome::Superseded);
                }
                None
            }

            SideEffect::StartCountdown { job, seconds } => {
                let tick = self.spawn_tick(job);
                let timer = self.spawn_timer(job, seconds);
                if let Some(tasks) = self.jobs.get_mut(&job) {
                    tasks.tick = Some(tick);
                    tasks.timer = Some(timer);
                } else {
                    tick.abort();
                    timer.abort();
                }
                None
            }

            SideEffect::BeginClipboardWrite { job } => {
                let (frame_tx, payload) = ImagePayload::pending();
                let write = self.spawn_write(job, payload);
                if let Some(tasks) = self.jobs.get_mut(&job) {
                    tasks.pending_frame = Some(frame_tx);
                    tasks.write = Some(write);
                } else {
                    write.abort();
                }
                None
            }

            SideEffect::CaptureFrame { job, mode } => {
                let blob = self.source.capture();
                let available = blob.is_some();
                tracing::info!(
                    target: "capture",
                    "[SCHEDULER] Job {} frame captured: available={}",
                    job.0,
                    available
                );

                match mode {
                    CaptureMode::Immediate => {
                        if let Some(blob) = blob {
                            let write = self.spawn_write(job, ImagePayload::Ready(blob));
                            match self.jobs.get_mut(&job) {
                                Some(tasks) => tasks.write = Some(write),
                                None => write.abort(),
                            }
                        }
                    }
                    CaptureMode::Delayed { .. } => {
                        let pending = self.jobs.get_mut(&job).and_then(|t| t.pending_frame.take());
                        if let Some(frame_tx) = pending {
                            let _ = frame_tx.send(blob.ok_or_else(|| MSG_NO_FRAME_BLOB.to_string()));
                        }
                    }
                }

                Some(if available {
                    CaptureEvent::FrameCaptured { job }
                } else {
                    CaptureEvent::FrameUnavailable { job }
                })
            }

            SideEffect::ClearCountdown { job } => {
                if let Some(tasks) = self.jobs.get_mut(&job) {
                    tasks.stop_countdown();
                }
                None
            }

            SideEffect::Notify(mut notice) => {
                notice.emitted_at = Some(Instant::now());
                if notice.is_error {
                    tracing::warn!(target: "capture", "[SCHEDULER] {}", notice.message);
                }
                // No subscribers is fine
                let _ = self.notice_tx.send(notice);
                None
            }

            SideEffect::Settle { job, outcome } => {
                if let Some(mut tasks) = self.jobs.remove(&job) {
                    tracing::info!(target: "capture", "[SCHEDULER] Job {} settled: {:?}", job.0, outcome);
                    tasks.cancel();
                    tasks.respond(outcome);
                }
                None
            }

            SideEffect::EmitStateChange { state } => {
                self.state_tx.send_replace(state);
                None
            }
        }
    }

    fn spawn_tick(&self, job: JobId) -> JoinHandle<()> {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if event_tx.send(CaptureEvent::Tick { job }).is_err() {
                    break;
                }
            }
        })
    }

    fn spawn_timer(&self, job: JobId, seconds: u32) -> JoinHandle<()> {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(u64::from(seconds))).await;
            let _ = event_tx.send(CaptureEvent::TimerFired { job });
        })
    }

    fn spawn_write(&self, job: JobId, payload: ImagePayload) -> JoinHandle<()> {
        let event_tx = self.event_tx.clone();
        let clipboard = Arc::clone(&self.clipboard);
        tokio::spawn(async move {
            let event = match clipboard.write_image(payload).await {
                Ok(()) => CaptureEvent::ClipboardWritten { job },
                Err(e) => CaptureEvent::ClipboardFailed {
                    job,
                    reason: e.to_string(),
                },
            };
            let _ = event_tx.send(event);
        })
    }

    fn cleanup(&mut self) {
        for (_, mut tasks) in self.jobs.drain() {
            tasks.cancel();
            tasks.respond(CaptureOutcome::Failed(ViewerError::SchedulerClosed));
        }
    }
}

/// Cloneable front door to a running [`CaptureCoordinator`].
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<CaptureState>,
    notice_tx: broadcast::Sender<Notice>,
}

impl SchedulerHandle {
    /// Starts an immediate capture without waiting for it. The receiver resolves
    /// once the clipboard write settles.
    pub fn request_capture_now(&self) -> Result<oneshot::Receiver<CaptureOutcome>, ViewerError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(Command::CaptureNow { response_tx })
            .map_err(|_| ViewerError::SchedulerClosed)?;
        Ok(response_rx)
    }

    /// Starts a delayed capture, replacing any job in flight.
    pub fn request_capture_after_delay(
        &self,
        seconds: u32,
    ) -> Result<oneshot::Receiver<CaptureOutcome>, ViewerError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(Command::CaptureAfterDelay {
                seconds,
                response_tx,
            })
            .map_err(|_| ViewerError::SchedulerClosed)?;
        Ok(response_rx)
    }

    pub async fn capture_now(&self) -> CaptureOutcome {
        match self.request_capture_now() {
            Ok(rx) => settle(rx).await,
            Err(e) => CaptureOutcome::Failed(e),
        }
    }

    pub async fn capture_after_delay(&self, seconds: u32) -> CaptureOutcome {
        match self.request_capture_after_delay(seconds) {
            Ok(rx) => settle(rx).await,
            Err(e) => CaptureOutcome::Failed(e),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state_rx.borrow().clone()
    }

    /// Visible countdown, `None` when nothing is counting.
    pub fn countdown(&self) -> Option<u32> {
        self.state_rx.borrow().countdown()
    }

    pub fn watch_state(&self) -> watch::Receiver<CaptureState> {
        self.state_rx.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }
}

async fn settle(rx: oneshot::Receiver<CaptureOutcome>) -> CaptureOutcome {
    rx.await
        .unwrap_or(CaptureOutcome::Failed(ViewerError::SchedulerClosed))
}
