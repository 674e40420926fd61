//! Lighting fade orchestrator.
//!
//! Sends scene parameters and a transition duration to the LED controllers
//! on the layout; the controllers perform the high-fidelity interpolation
//! locally. This module never streams per-frame values — for transitions
//! longer than one bus segment (255 s) it splits the request into
//! equal-duration segments with intermediate targets:
//!
//! ```text
//!  start ──────▶ 1/N ──────▶ 2/N ──────▶ ... ──────▶ target
//!        seg 0        seg 1        seg 2      seg N-1
//! ```
//!
//! Each segment covers 1/N of the time and 1/N of the colour change, which
//! keeps both this side's arithmetic and the receivers' fade math simple.
//! Aggregate progress is reported from wall-clock elapsed over total
//! duration, so it is continuous and monotone across segment boundaries.
//!
//! ```text
//!  IDLE ──start()──▶ FADING ──last segment elapsed──▶ COMPLETE ──tick──▶ IDLE
//!    ▲                  │
//!    └─────abort()──────┘
//! ```
//!
//! COMPLETE holds for exactly one tick so that a progress consumer polling
//! between ticks can observe "100%, then idle" instead of the session
//! vanishing atomically.

use core::time::Duration;

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink, TransportPort};
use crate::bus::{send_command_set, CommandSet, MAX_SEGMENT_DURATION_SECS};
use crate::error::{Error, Result};
use crate::lighting::{FadeRequest, LightingState};

/// Longest single segment, in milliseconds.
const MAX_SEGMENT_DURATION_MS: u32 = MAX_SEGMENT_DURATION_SECS * 1000;

// ───────────────────────────────────────────────────────────────
// Phase and progress
// ───────────────────────────────────────────────────────────────

/// Fade orchestrator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    /// No active session.
    Idle,
    /// A session is in flight (drives the progress bar).
    Fading,
    /// The last segment finished; becomes `Idle` on the next tick.
    Complete,
}

/// Aggregate progress across all segments, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeProgress {
    pub phase: FadePhase,
    /// 0-100, wall-clock based, saturating at 100 exactly in `Complete`.
    pub percent: u8,
    pub elapsed: Duration,
    pub total: Duration,
    /// What the receivers are converging to.
    pub target: LightingState,
}

// ───────────────────────────────────────────────────────────────
// Session
// ───────────────────────────────────────────────────────────────

/// One fade transaction. Created by `start()`, replaced wholesale by the
/// next `start()`, dissolved on completion or abort.
#[derive(Debug, Clone, Copy)]
struct FadeSession {
    /// Channel values when the session began (what receivers showed).
    start: LightingState,
    /// Ultimate target of the whole session.
    final_target: LightingState,
    total_ms: u32,
    /// 0-based index of the segment currently fading.
    segment_index: u32,
    segment_count: u32,
    segment_target: LightingState,
    segment_duration_ms: u32,
    session_start_us: u64,
    segment_start_us: u64,
    /// The current segment's command set was rejected by the transport and
    /// must be re-sent (in full) on the next tick.
    needs_resend: bool,
}

impl FadeSession {
    fn segment_command(&self) -> CommandSet {
        CommandSet {
            target: self.segment_target,
            duration_secs: (self.segment_duration_ms / 1000) as u8,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// The fade orchestrator.
///
/// Owns exactly one session at a time, mutated only through the operations
/// below. Callers that need concurrent access wrap the controller in their
/// own lock (see [`Station`](crate::app::service::Station)).
pub struct FadeController {
    base_event_id: u64,
    phase: FadePhase,
    session: Option<FadeSession>,
    /// Last commanded values — the baseline the next `start()` fades from.
    current: LightingState,
}

impl FadeController {
    /// Construction is initialisation: a controller that exists is ready.
    pub fn new(base_event_id: u64) -> Self {
        Self {
            base_event_id,
            phase: FadePhase::Idle,
            session: None,
            current: LightingState::OFF,
        }
    }

    // ── Session control ───────────────────────────────────────

    /// Start a fade to `req.target`, replacing any in-flight session.
    ///
    /// The new session fades from [`current`](Self::current) — the last
    /// commanded values — not from the previous session's final target.
    /// Emits segment 0's command set immediately. On a transport error the
    /// controller returns to idle and the caller keeps the request; nothing
    /// is queued internally.
    pub fn start(
        &mut self,
        req: &FadeRequest,
        tx: &mut impl TransportPort,
        sink: &mut impl EventSink,
        clock: &impl Clock,
    ) -> Result<()> {
        let total_ms = u32::try_from(req.duration.as_millis())
            .map_err(|_| Error::InvalidArgument("fade duration exceeds u32 milliseconds"))?;

        let segment_count = if total_ms == 0 {
            1
        } else {
            total_ms.div_ceil(MAX_SEGMENT_DURATION_MS)
        };

        let now = clock.now_us();
        let start = self.current;
        let mut session = FadeSession {
            start,
            final_target: req.target,
            total_ms,
            segment_index: 0,
            segment_count,
            segment_target: start.lerp(&req.target, 1, segment_count),
            segment_duration_ms: total_ms / segment_count,
            session_start_us: now,
            segment_start_us: now,
            needs_resend: false,
        };

        debug!(
            "starting fade: {}ms ({} segment{}) to B={} R={} G={} B={} W={}",
            total_ms,
            segment_count,
            if segment_count > 1 { "s" } else { "" },
            req.target.brightness,
            req.target.red,
            req.target.green,
            req.target.blue,
            req.target.white,
        );

        let set = session.segment_command();
        if let Err(e) = send_command_set(tx, self.base_event_id, &set) {
            warn!("fade start rejected by transport: {e}");
            self.phase = FadePhase::Idle;
            self.session = None;
            return Err(e.into());
        }

        // Receivers are now fading to the first segment target.
        self.current = session.segment_target;
        session.segment_start_us = clock.now_us();
        self.phase = FadePhase::Fading;

        sink.emit(&AppEvent::FadeStarted {
            target: req.target,
            total: req.duration,
            segments: segment_count,
        });
        sink.emit(&AppEvent::SegmentSent {
            index: 0,
            count: segment_count,
            target: session.segment_target,
            duration_secs: set.duration_secs,
        });

        self.session = Some(session);
        Ok(())
    }

    /// Apply a lighting state with no interpolation.
    ///
    /// Equivalent to [`start`](Self::start) with zero duration; transmits
    /// all six events with the usual ordering and pacing.
    pub fn apply_immediate(
        &mut self,
        state: LightingState,
        tx: &mut impl TransportPort,
        sink: &mut impl EventSink,
        clock: &impl Clock,
    ) -> Result<()> {
        self.start(&FadeRequest::immediate(state), tx, sink, clock)
    }

    /// Abort any active fade. No further command sets are transmitted.
    ///
    /// The baseline for subsequent fades stays at the aborted segment's
    /// *target*: receivers keep whatever their own interpolation reached,
    /// and no attempt is made to reconstruct that mid-fade position here.
    /// A fade started right after an abort can therefore visibly jump.
    pub fn abort(&mut self, sink: &mut impl EventSink) {
        if self.phase == FadePhase::Fading {
            info!("fade aborted");
            sink.emit(&AppEvent::FadeAborted);
        }
        self.phase = FadePhase::Idle;
        self.session = None;
    }

    // ── Periodic drive ────────────────────────────────────────

    /// Advance the orchestrator. Call on a short fixed period (tens of
    /// milliseconds).
    ///
    /// No-op when idle. While fading: re-sends a previously rejected
    /// command set, or advances to the next segment once the current one's
    /// duration has elapsed. `Complete` collapses to `Idle` one tick later.
    pub fn tick(
        &mut self,
        tx: &mut impl TransportPort,
        sink: &mut impl EventSink,
        clock: &impl Clock,
    ) {
        match self.phase {
            FadePhase::Idle => {}
            FadePhase::Complete => {
                self.phase = FadePhase::Idle;
                self.session = None;
            }
            FadePhase::Fading => self.tick_fading(tx, sink, clock),
        }
    }

    fn tick_fading(
        &mut self,
        tx: &mut impl TransportPort,
        sink: &mut impl EventSink,
        clock: &impl Clock,
    ) {
        let Some(session) = self.session.as_mut() else {
            self.phase = FadePhase::Idle;
            return;
        };

        let now = clock.now_us();

        if session.needs_resend {
            let set = session.segment_command();
            match send_command_set(tx, self.base_event_id, &set) {
                Ok(()) => {
                    session.needs_resend = false;
                    self.current = session.segment_target;
                    sink.emit(&AppEvent::SegmentSent {
                        index: session.segment_index,
                        count: session.segment_count,
                        target: session.segment_target,
                        duration_secs: set.duration_secs,
                    });
                }
                Err(e) => {
                    warn!("segment {} re-send failed: {e}", session.segment_index);
                }
            }
            return;
        }

        let elapsed_ms = now.saturating_sub(session.segment_start_us) / 1000;
        if elapsed_ms < u64::from(session.segment_duration_ms) {
            return;
        }

        // Segment complete; receivers have arrived at its target.
        self.current = session.segment_target;

        let next = session.segment_index + 1;
        if next >= session.segment_count {
            self.phase = FadePhase::Complete;
            debug!("all segments complete");
            sink.emit(&AppEvent::FadeCompleted);
            return;
        }

        session.segment_index = next;
        session.segment_target =
            session
                .start
                .lerp(&session.final_target, next + 1, session.segment_count);
        session.segment_start_us = now;

        let set = session.segment_command();
        debug!(
            "starting segment {}/{}: {}ms to B={} R={} G={} B={} W={}",
            next + 1,
            session.segment_count,
            session.segment_duration_ms,
            set.target.brightness,
            set.target.red,
            set.target.green,
            set.target.blue,
            set.target.white,
        );
        match send_command_set(tx, self.base_event_id, &set) {
            Ok(()) => {
                self.current = session.segment_target;
                sink.emit(&AppEvent::SegmentSent {
                    index: next,
                    count: session.segment_count,
                    target: session.segment_target,
                    duration_secs: set.duration_secs,
                });
            }
            Err(e) => {
                warn!("failed to start segment {}: {e}", next);
                session.needs_resend = true;
                sink.emit(&AppEvent::SegmentDeferred { index: next });
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Aggregate progress for the presentation layer.
    ///
    /// `percent` is wall-clock elapsed over total duration, clamped to
    /// [0, 100]; it never resets at a segment boundary and reads exactly
    /// 100 only in [`FadePhase::Complete`].
    pub fn get_progress(&self, clock: &impl Clock) -> FadeProgress {
        match (self.phase, &self.session) {
            (FadePhase::Fading, Some(s)) => {
                let elapsed_ms = (clock.now_us().saturating_sub(s.session_start_us) / 1000)
                    .min(u64::from(s.total_ms)) as u32;
                let percent = if s.total_ms == 0 {
                    100
                } else {
                    ((u64::from(elapsed_ms) * 100 / u64::from(s.total_ms)).min(99)) as u8
                };
                FadeProgress {
                    phase: self.phase,
                    percent,
                    elapsed: Duration::from_millis(u64::from(elapsed_ms)),
                    total: Duration::from_millis(u64::from(s.total_ms)),
                    target: s.final_target,
                }
            }
            (FadePhase::Complete, Some(s)) => FadeProgress {
                phase: self.phase,
                percent: 100,
                elapsed: Duration::from_millis(u64::from(s.total_ms)),
                total: Duration::from_millis(u64::from(s.total_ms)),
                target: s.final_target,
            },
            _ => FadeProgress {
                phase: FadePhase::Idle,
                percent: 0,
                elapsed: Duration::ZERO,
                total: Duration::ZERO,
                target: self.current,
            },
        }
    }

    /// True while a fade is in flight (not idle, not the complete tick).
    pub fn is_active(&self) -> bool {
        self.phase == FadePhase::Fading
    }

    /// The last commanded lighting values.
    pub fn current(&self) -> LightingState {
        self.current
    }

    /// Seed the baseline without transmitting anything. Used once at boot
    /// to establish the assumed post-power-on state of the receivers.
    pub fn set_current(&mut self, state: LightingState) {
        self.current = state;
        info!(
            "current state set: B={} R={} G={} B={} W={}",
            state.brightness, state.red, state.green, state.blue, state.white
        );
    }

    /// Update the configured base event id (live configuration path).
    pub fn set_base_event_id(&mut self, base: u64) {
        self.base_event_id = base;
    }

    pub fn base_event_id(&self) -> u64 {
        self.base_event_id
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
