//! Pure state machine for capture-and-copy jobs.
//!
//! `(State, Event) -> (NewState, Vec<SideEffect>)`. The coordinator performs the
//! effects; this module never touches timers, frames or the clipboard.
//!
//! Every event names the job it belongs to. Events for any job other than the
//! active one fall through to the no-op arm, which is what keeps a superseded
//! job from overwriting newer state.

use serde::Serialize;
use tokio::time::Instant;

use crate::error::ViewerError;

pub const MSG_COPIED: &str = "Frame copied to clipboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CaptureMode {
    Immediate,
    Delayed { seconds: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase", tag = "phase")]
pub enum CaptureState {
    #[default]
    Idle,

    /// Waiting for the delay to elapse. `remaining` is the visible countdown and
    /// becomes `None` once it would drop below 1.
    Counting {
        job: JobId,
        seconds: u32,
        remaining: Option<u32>,
    },

    /// Frame requested; waiting for the clipboard write to settle.
    Capturing { job: JobId, mode: CaptureMode },

    Delivered { job: JobId },

    Failed { job: JobId, reason: String },
}

impl CaptureState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CaptureState::Counting { .. } | CaptureState::Capturing { .. }
        )
    }

    pub fn job(&self) -> Option<JobId> {
        match self {
            CaptureState::Idle => None,
            CaptureState::Counting { job, .. }
            | CaptureState::Capturing { job, .. }
            | CaptureState::Delivered { job }
            | CaptureState::Failed { job, .. } => Some(*job),
        }
    }

    /// Number to show over the video, if any. Never zero.
    pub fn countdown(&self) -> Option<u32> {
        match self {
            CaptureState::Counting { remaining, .. } => *remaining,
            _ => None,
        }
    }

    fn active_job(&self) -> Option<JobId> {
        if self.is_active() {
            self.job()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    ImmediateRequested { job: JobId },
    DelayedRequested { job: JobId, seconds: u32 },
    /// One-second countdown tick.
    Tick { job: JobId },
    /// The delay elapsed.
    TimerFired { job: JobId },
    FrameCaptured { job: JobId },
    FrameUnavailable { job: JobId },
    ClipboardWritten { job: JobId },
    ClipboardFailed { job: JobId, reason: String },
}

/// How a job ended, reported to whoever requested it.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Copied,
    Failed(ViewerError),
    /// A newer capture request replaced this one before it settled.
    Superseded,
}

/// Transient user notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
    /// Stamped by the coordinator when the notice is broadcast.
    #[serde(skip)]
    pub emitted_at: Option<Instant>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            emitted_at: None,
        }
    }

    pub fn error(err: &ViewerError) -> Self {
        Self {
            message: err.to_string(),
            is_error: true,
            emitted_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// Abort the job's timers and pending write, and report it as superseded.
    Supersede { job: JobId },

    /// Start the 1s tick and the one-shot delay timer.
    StartCountdown { job: JobId, seconds: u32 },

    /// Issue the clipboard write now with a payload the capture fulfils later.
    BeginClipboardWrite { job: JobId },

    /// Render the current frame. Immediate jobs write it to the clipboard; delayed
    /// jobs fulfil (or reject) their pending payload.
    CaptureFrame { job: JobId, mode: CaptureMode },

    /// Stop the tick timer. Idempotent.
    ClearCountdown { job: JobId },

    Notify(Notice),

    /// Release the job's resources and report its outcome.
    Settle { job: JobId, outcome: CaptureOutcome },

    EmitStateChange { state: CaptureState },
}

pub fn transition(state: CaptureState, event: CaptureEvent) -> (CaptureState, Vec<SideEffect>) {
    match (&state, event) {
        // New requests replace whatever is in flight
        (_, CaptureEvent::ImmediateRequested { job }) => {
            let mut effects = supersede(&state);
            let new_state = CaptureState::Capturing {
                job,
                mode: CaptureMode::Immediate,
            };
            effects.push(SideEffect::EmitStateChange {
                state: new_state.clone(),
            });
            effects.push(SideEffect::CaptureFrame {
                job,
                mode: CaptureMode::Immediate,
            });
            (new_state, effects)
        }

        (_, CaptureEvent::DelayedRequested { job, seconds }) => {
            let seconds = seconds.max(1);
            let mut effects = supersede(&state);
            let new_state = CaptureState::Counting {
                job,
                seconds,
                remaining: Some(seconds),
            };
            effects.push(SideEffect::StartCountdown { job, seconds });
            effects.push(SideEffect::BeginClipboardWrite { job });
            effects.push(SideEffect::EmitStateChange {
                state: new_state.clone(),
            });
            (new_state, effects)
        }

        // Counting + Tick -> Counting (decremented, or cleared below 1)
        (
            CaptureState::Counting {
                job,
                seconds,
                remaining,
            },
            CaptureEvent::Tick { job: tick_job },
        ) if *job == tick_job => {
            let next = remaining.and_then(|r| (r > 1).then(|| r - 1));
            if next == *remaining {
                return (state, vec![]);
            }
            let new_state = CaptureState::Counting {
                job: *job,
                seconds: *seconds,
                remaining: next,
            };
            let effects = vec![SideEffect::EmitStateChange {
                state: new_state.clone(),
            }];
            (new_state, effects)
        }

        // Counting + TimerFired -> Capturing
        (CaptureState::Counting { job, seconds, .. }, CaptureEvent::TimerFired { job: fired })
            if *job == fired =>
        {
            let job = *job;
            let mode = CaptureMode::Delayed { seconds: *seconds };
            let new_state = CaptureState::Capturing { job, mode };
            let effects = vec![
                SideEffect::CaptureFrame { job, mode },
                SideEffect::ClearCountdown { job },
                SideEffect::EmitStateChange {
                    state: new_state.clone(),
                },
            ];
            (new_state, effects)
        }

        // Capturing + FrameUnavailable: immediate jobs fail without touching the
        // clipboard; delayed jobs fail through their rejected payload.
        (
            CaptureState::Capturing {
                job,
                mode: CaptureMode::Immediate,
            },
            CaptureEvent::FrameUnavailable { job: failed },
        ) if *job == failed => {
            let job = *job;
            let error = ViewerError::CaptureUnavailable;
            let new_state = CaptureState::Failed {
                job,
                reason: error.to_string(),
            };
            let effects = vec![
                SideEffect::Notify(Notice::error(&error)),
                SideEffect::EmitStateChange {
                    state: new_state.clone(),
                },
                SideEffect::Settle {
                    job,
                    outcome: CaptureOutcome::Failed(error),
                },
            ];
            (new_state, effects)
        }

        // Counting/Capturing + ClipboardWritten -> Delivered
        (_, CaptureEvent::ClipboardWritten { job }) if state.active_job() == Some(job) => {
            let new_state = CaptureState::Delivered { job };
            let effects = vec![
                SideEffect::ClearCountdown { job },
                SideEffect::Notify(Notice::info(MSG_COPIED)),
                SideEffect::EmitStateChange {
                    state: new_state.clone(),
                },
                SideEffect::Settle {
                    job,
                    outcome: CaptureOutcome::Copied,
                },
            ];
            (new_state, effects)
        }

        // Counting/Capturing + ClipboardFailed -> Failed
        (_, CaptureEvent::ClipboardFailed { job, reason }) if state.active_job() == Some(job) => {
            let error = ViewerError::ClipboardWriteFailed(reason);
            let new_state = CaptureState::Failed {
                job,
                reason: error.to_string(),
            };
            let effects = vec![
                SideEffect::ClearCountdown { job },
                SideEffect::Notify(Notice::error(&error)),
                SideEffect::EmitStateChange {
                    state: new_state.clone(),
                },
                SideEffect::Settle {
                    job,
                    outcome: CaptureOutcome::Failed(error),
                },
            ];
            (new_state, effects)
        }

        // Stale job, or nothing to do (FrameCaptured is informational)
        _ => (state, vec![]),
    }
}

fn supersede(state: &CaptureState) -> Vec<SideEffect> {
    match state.active_job() {
        Some(job) => vec![SideEffect::Supersede { job }],
        None => vec![],
    }
}
