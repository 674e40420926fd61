//! Display power state machine.
//!
//! Automatic backlight timeout with touch-to-wake, for power saving on an
//! idle panel. The transition between full brightness and off is a timed
//! opacity ramp on a full-screen overlay, quantized to a small number of
//! discrete steps — opacity that changes mid-frame on a partial-refresh
//! display causes visible banding, so fewer, frame-aligned steps look
//! better than a continuous ramp.
//!
//! ```text
//!            idle ≥ timeout                ramp done
//!  ACTIVE ──────────────────▶ FADING_OUT ────────────▶ OFF
//!    ▲                            │                     │
//!    │ ramp done                  │ activity            │ activity
//!    │                            ▼ (at ramp end)       ▼ (next tick)
//!  FADING_IN ◀────────────────────┴─────────────────────┘
//! ```
//!
//! Activity while the screen is off (or fading out) only *latches* a wake:
//! restoring power and starting the fade-in needs the rendering context,
//! which the raw input callback does not have. The latch is serviced by the
//! next [`tick`](ScreenTimeout::tick), and it only ever moves the machine
//! toward `Active`, never backward.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, DisplayPort, EventSink};

/// Opacity ramp duration in milliseconds.
pub const FADE_DURATION_MS: u32 = 1000;

/// Number of discrete opacity steps in the ramp.
/// At 60 fps a 1000 ms ramp is 60 frames; 20 steps changes opacity every
/// third frame, giving the display whole frames at each level.
pub const FADE_OPACITY_STEPS: u32 = 20;

/// Default idle timeout in seconds (0 = disabled).
pub const TIMEOUT_DEFAULT_SECS: u16 = 60;

/// Minimum nonzero idle timeout in seconds.
pub const TIMEOUT_MIN_SECS: u16 = 10;

/// Maximum idle timeout in seconds.
pub const TIMEOUT_MAX_SECS: u16 = 3600;

/// Display power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Screen on, input delivered to the UI. The only state in which the
    /// idle timer is evaluated.
    Active,
    /// Overlay ramping transparent → opaque before power-off.
    FadingOut,
    /// Backlight off.
    Off,
    /// Backlight on, overlay ramping opaque → transparent.
    FadingIn,
}

/// The display power state machine.
///
/// [`tick`](Self::tick) must run in the rendering context (it drives the
/// [`DisplayPort`]); every other operation is safe from any context and
/// touches no display state. Guarded by its own lock at the
/// [`Station`](crate::app::service::Station) level — never the lighting
/// machine's lock.
pub struct ScreenTimeout {
    state: ScreenState,
    /// Idle timeout in seconds; 0 disables the timer entirely.
    timeout_secs: u16,
    last_activity_us: u64,
    ramp_start_us: u64,
    /// Activity seen while Off/FadingOut, to be serviced by the next tick.
    pending_wake: bool,
}

impl ScreenTimeout {
    pub fn new(timeout_secs: u16, clock: &impl Clock) -> Self {
        let timeout_secs = clamp_timeout(timeout_secs);
        info!(
            "screen timeout: {}s (0=disabled), ramp {}ms",
            timeout_secs, FADE_DURATION_MS
        );
        Self {
            state: ScreenState::Active,
            timeout_secs,
            last_activity_us: clock.now_us(),
            ramp_start_us: 0,
            pending_wake: false,
        }
    }

    // ── Input operations (any context) ────────────────────────

    /// Record user activity. Resets the idle timer; if the screen is off or
    /// on its way off, latches a wake for the next tick.
    ///
    /// This never makes the screen interactive by itself — dispatchers must
    /// query [`is_interactive`](Self::is_interactive) separately, so the
    /// touch that wakes the screen is never also delivered as a click.
    pub fn notify_activity(&mut self, clock: &impl Clock) {
        self.last_activity_us = clock.now_us();
        match self.state {
            ScreenState::Off => {
                debug!("touch detected - waking screen");
                self.pending_wake = true;
            }
            ScreenState::FadingOut => {
                debug!("touch during fade-out - will wake");
                self.pending_wake = true;
            }
            // Already on or waking; the timer reset is enough.
            ScreenState::FadingIn | ScreenState::Active => {}
        }
    }

    /// Manually wake the screen (also resets the idle timer).
    pub fn wake(&mut self, clock: &impl Clock) {
        self.last_activity_us = clock.now_us();
        if matches!(self.state, ScreenState::Off | ScreenState::FadingOut) {
            info!("manual wake");
            self.pending_wake = true;
        }
    }

    /// Manually put the screen to sleep.
    ///
    /// Forces the idle timer to already-expired so the next tick takes the
    /// normal timeout path — no separate code path for manual sleep. Has no
    /// effect while the timeout is disabled or the screen is not active.
    pub fn sleep(&mut self, clock: &impl Clock) {
        if self.state == ScreenState::Active && self.timeout_secs > 0 {
            info!("manual sleep - expiring idle timer");
            self.last_activity_us = clock.now_us().saturating_sub(self.timeout_us());
        }
    }

    /// Set the idle timeout. 0 disables; nonzero values are clamped to
    /// [`TIMEOUT_MIN_SECS`]..=[`TIMEOUT_MAX_SECS`]. Resets the idle timer.
    pub fn set_timeout(&mut self, timeout_secs: u16, clock: &impl Clock) {
        let clamped = clamp_timeout(timeout_secs);
        if clamped != self.timeout_secs {
            info!("screen timeout changed: {}s -> {}s", self.timeout_secs, clamped);
        }
        self.timeout_secs = clamped;
        self.last_activity_us = clock.now_us();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn timeout(&self) -> u16 {
        self.timeout_secs
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    /// Backlight is powered (on, or mid-transition).
    pub fn is_screen_on(&self) -> bool {
        self.state != ScreenState::Off
    }

    /// Fully on and ready for user interaction. Dispatchers use this to
    /// suppress touches during wake-up transitions.
    pub fn is_interactive(&self) -> bool {
        self.state == ScreenState::Active
    }

    // ── Periodic drive (rendering context only) ───────────────

    /// Advance the state machine. Call on a coarse fixed period (hundreds
    /// of milliseconds) from the rendering context.
    pub fn tick(
        &mut self,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
        clock: &impl Clock,
    ) {
        let now = clock.now_us();

        // A wake latched while off needs this privileged context to
        // restore power.
        if self.pending_wake && self.state == ScreenState::Off {
            self.pending_wake = false;
            self.begin_fade_in(display, sink, now);
            return;
        }

        match self.state {
            ScreenState::Active => {
                if self.timeout_secs == 0 {
                    return;
                }
                let elapsed = now.saturating_sub(self.last_activity_us);
                if elapsed >= self.timeout_us() {
                    info!("idle for {}s - starting fade-out", self.timeout_secs);
                    self.begin_fade_out(display, sink, now);
                }
            }
            ScreenState::FadingOut => {
                let elapsed_ms = (now.saturating_sub(self.ramp_start_us)) / 1000;
                if elapsed_ms >= u64::from(FADE_DURATION_MS) {
                    if self.pending_wake {
                        // Wake arrived during the ramp: straight back to
                        // fade-in, power never cut.
                        self.pending_wake = false;
                        debug!("wake requested during fade-out - waking immediately");
                        self.begin_fade_in(display, sink, now);
                    } else {
                        debug!("fade-out complete, turning off backlight");
                        display.backlight_off();
                        display.hide_overlay();
                        self.transition(ScreenState::Off, sink);
                    }
                } else {
                    display.set_overlay_opacity(stepped_opacity(elapsed_ms));
                }
            }
            ScreenState::FadingIn => {
                let elapsed_ms = (now.saturating_sub(self.ramp_start_us)) / 1000;
                if elapsed_ms >= u64::from(FADE_DURATION_MS) {
                    debug!("fade-in complete");
                    display.hide_overlay();
                    self.last_activity_us = now;
                    self.transition(ScreenState::Active, sink);
                } else {
                    display.set_overlay_opacity(255 - stepped_opacity(elapsed_ms));
                }
            }
            ScreenState::Off => {}
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn begin_fade_out(
        &mut self,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
        now: u64,
    ) {
        self.pending_wake = false;
        self.ramp_start_us = now;
        display.show_overlay();
        display.set_overlay_opacity(0);
        self.transition(ScreenState::FadingOut, sink);
    }

    fn begin_fade_in(
        &mut self,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
        now: u64,
    ) {
        self.ramp_start_us = now;
        display.backlight_on();
        display.show_overlay();
        display.set_overlay_opacity(255);
        self.transition(ScreenState::FadingIn, sink);
    }

    fn transition(&mut self, to: ScreenState, sink: &mut impl EventSink) {
        if to != self.state {
            sink.emit(&AppEvent::ScreenChanged {
                from: self.state,
                to,
            });
            self.state = to;
        }
    }

    fn timeout_us(&self) -> u64 {
        u64::from(self.timeout_secs) * 1_000_000
    }
}

/// Quantize ramp progress into [`FADE_OPACITY_STEPS`] discrete opacity
/// levels (0 = transparent, 255 = opaque).
fn stepped_opacity(elapsed_ms: u64) -> u8 {
    let step = (elapsed_ms * u64::from(FADE_OPACITY_STEPS) / u64::from(FADE_DURATION_MS))
        .min(u64::from(FADE_OPACITY_STEPS));
    (step * 255 / u64::from(FADE_OPACITY_STEPS)) as u8
}

fn clamp_timeout(secs: u16) -> u16 {
    if secs == 0 {
        0
    } else {
        secs.clamp(TIMEOUT_MIN_SECS, TIMEOUT_MAX_SECS)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
