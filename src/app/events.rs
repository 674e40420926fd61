//! Outbound application events.
//!
//! The fade orchestrator and display power machine emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — the shipping firmware logs them to serial,
//! tests record them. A closed set consumed through `match`, never an
//! open-ended callback registry.

use core::time::Duration;

use crate::lighting::LightingState;
use crate::screen::ScreenState;

/// Structured events emitted by the station's state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// A fade session began (supersedes any previous session).
    FadeStarted {
        target: LightingState,
        total: Duration,
        segments: u32,
    },

    /// One segment's command set went out on the bus.
    SegmentSent {
        index: u32,
        count: u32,
        target: LightingState,
        duration_secs: u8,
    },

    /// A segment send failed and will be retried on the next tick.
    SegmentDeferred { index: u32 },

    /// All segments complete.
    FadeCompleted,

    /// A fade was cancelled; no further command sets follow.
    FadeAborted,

    /// The display power machine moved between states.
    ScreenChanged { from: ScreenState, to: ScreenState },

    /// Live configuration was applied.
    SettingsApplied {
        screen_timeout_secs: u16,
        base_event_id: u64,
    },
}
