//! Bus event encoding and pacing.
//!
//! One fade segment is transmitted as a **command set**: exactly six events
//! in a fixed order — red, green, blue, white, brightness, duration. The
//! first five carry pending channel targets; the sixth carries the segment
//! duration in whole seconds and is the one that triggers interpolation on
//! the receivers. Duration therefore always goes last, and the six events go
//! out as one burst with nothing interleaved.
//!
//! Event identifier layout (64 bits):
//!
//! ```text
//! ┌──────────────────────────────┬───────────┬─────────┐
//! │ base event id (top 48 bits)  │ parameter │  value  │
//! └──────────────────────────────┴───────────┴─────────┘
//!                                   8 bits      8 bits
//! ```

use core::time::Duration;

use burster::Limiter;

use crate::app::ports::TransportPort;
use crate::error::TransportError;
use crate::lighting::LightingState;

/// Maximum duration one command set can carry (seconds-resolution, u8).
pub const MAX_SEGMENT_DURATION_SECS: u32 = 255;

/// Number of events in one command set.
pub const COMMAND_SET_LEN: usize = 6;

/// Minimum spacing between consecutive events on the bus, in milliseconds.
/// A full command-set burst is exempt (see [`PacedTransport`]); sustained
/// traffic beyond this rate is throttled.
pub const MIN_EVENT_SPACING_MS: u64 = 10;

/// The low 16 bits of the configured base event id are ignored; they carry
/// the parameter index and value.
pub const BASE_EVENT_ID_MASK: u64 = 0xFFFF_FFFF_FFFF_0000;

// ───────────────────────────────────────────────────────────────
// Parameter selector
// ───────────────────────────────────────────────────────────────

/// Lighting parameter selector — the 8-bit field following the base id.
///
/// A closed set: receivers understand exactly these six and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LightingParam {
    Red = 0,
    Green = 1,
    Blue = 2,
    White = 3,
    Brightness = 4,
    /// Transition duration in seconds; triggers the fade on receivers.
    Duration = 5,
}

impl LightingParam {
    /// Wire index of this parameter.
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// Construct the full 64-bit event identifier for one parameter event.
pub const fn encode_event_id(base: u64, param: LightingParam, value: u8) -> u64 {
    (base & BASE_EVENT_ID_MASK) | ((param as u64) << 8) | value as u64
}

// ───────────────────────────────────────────────────────────────
// Command set
// ───────────────────────────────────────────────────────────────

/// One fade-segment instruction: target values plus the segment duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSet {
    pub target: LightingState,
    /// Whole seconds, 0 = apply with no interpolation.
    pub duration_secs: u8,
}

impl CommandSet {
    /// The six event identifiers of this command set, in protocol order.
    /// Duration is last — it is the trigger.
    pub fn event_ids(&self, base: u64) -> [u64; COMMAND_SET_LEN] {
        [
            encode_event_id(base, LightingParam::Red, self.target.red),
            encode_event_id(base, LightingParam::Green, self.target.green),
            encode_event_id(base, LightingParam::Blue, self.target.blue),
            encode_event_id(base, LightingParam::White, self.target.white),
            encode_event_id(base, LightingParam::Brightness, self.target.brightness),
            encode_event_id(base, LightingParam::Duration, self.duration_secs),
        ]
    }
}

/// Send one command set as a single burst.
///
/// Fails fast on the first rejected event. Receivers only act on the
/// trailing duration event, so a partially delivered burst is harmless as
/// long as the retry re-sends the *whole* set — which the fade orchestrator
/// always does.
pub fn send_command_set(
    tx: &mut impl TransportPort,
    base: u64,
    set: &CommandSet,
) -> Result<(), TransportError> {
    if !tx.is_ready() {
        return Err(TransportError::NotReady);
    }
    for id in set.event_ids(base) {
        tx.send_event(id)?;
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Pacing decorator
// ───────────────────────────────────────────────────────────────

/// Token-bucket pacing wrapper around any [`TransportPort`].
///
/// Burst capacity is one full command set, refilled at the long-run rate
/// implied by [`MIN_EVENT_SPACING_MS`]. A caller that exceeds the budget
/// gets [`TransportError::Throttled`] instead of a blocked send; the fade
/// orchestrator's next-tick retry absorbs the hiccup, widening the apparent
/// step without disturbing total elapsed duration by more than the retry
/// latency.
pub struct PacedTransport<T> {
    inner: T,
    bucket: burster::TokenBucket<fn() -> Duration>,
}

impl<T: TransportPort> PacedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            bucket: burster::TokenBucket::new_with_time_provider(
                1000 / MIN_EVENT_SPACING_MS, // sustained events per second
                COMMAND_SET_LEN as u64,      // burst capacity: one full command set
                platform_now as fn() -> Duration,
            ),
        }
    }

    /// Access the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: TransportPort> TransportPort for PacedTransport<T> {
    fn send_event(&mut self, event_id: u64) -> Result<(), TransportError> {
        if self.bucket.try_consume(1).is_err() {
            return Err(TransportError::Throttled);
        }
        self.inner.send_event(event_id)
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
}

// ── Platform time for the rate limiter ───────────────────────

#[cfg(target_os = "espidf")]
fn platform_now() -> Duration {
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(target_os = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
