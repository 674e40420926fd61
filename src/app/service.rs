//! Station service — the concurrency glue over the two state machines.
//!
//! ```text
//!  UI thread ──┐                       ┌──▶ TransportPort ──▶ bus
//!              ├──▶ ┌───────────────┐ ─┤
//!  fade tick ──┤    │    Station    │  └──▶ DisplayPort ──▶ panel
//!  power tick ─┤    │ fade · screen │
//!  touch cb  ──┘    └───────────────┘
//! ```
//!
//! Each state machine is bundled with the ports it drives behind its own
//! lock; the two units never share one. Every entry point is `&self` and
//! safe from any thread — the lighting tick, the display tick, touch
//! callbacks and configuration updates all run concurrently in the shipping
//! firmware.

use core::time::Duration;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use log::info;

use super::events::AppEvent;
use super::ports::{Clock, DisplayPort, EventSink, TransportPort};
use crate::config::NodeSettings;
use crate::error::Result;
use crate::fade::{FadeController, FadeProgress};
use crate::lighting::{FadeRequest, LightingState};
use crate::scenes::SceneSource;
use crate::screen::ScreenTimeout;

struct LightingUnit<T, S> {
    fade: FadeController,
    transport: T,
    sink: S,
}

struct DisplayUnit<D, S> {
    screen: ScreenTimeout,
    display: D,
    sink: S,
}

/// The command station: one fade orchestrator, one display power machine,
/// the live settings, and a clock. No globals — everything is owned here.
pub struct Station<T, D, S, C> {
    lighting: Mutex<LightingUnit<T, S>>,
    display: Mutex<DisplayUnit<D, S>>,
    settings: Mutex<NodeSettings>,
    clock: C,
}

impl<T, D, S, C> Station<T, D, S, C>
where
    T: TransportPort,
    D: DisplayPort,
    S: EventSink,
    C: Clock,
{
    /// Assemble the station. Fully usable on return — wire it up
    /// completely before handing it to tick threads or input callbacks.
    pub fn new(
        settings: NodeSettings,
        transport: T,
        display: D,
        lighting_sink: S,
        display_sink: S,
        clock: C,
    ) -> Self {
        let settings = settings.sanitize();
        let fade = FadeController::new(settings.base_event_id);
        let screen = ScreenTimeout::new(settings.screen_timeout_secs, &clock);
        Self {
            lighting: Mutex::new(LightingUnit {
                fade,
                transport,
                sink: lighting_sink,
            }),
            display: Mutex::new(DisplayUnit {
                screen,
                display,
                sink: display_sink,
            }),
            settings: Mutex::new(settings),
            clock,
        }
    }

    // ── Lighting API ──────────────────────────────────────────

    /// Start (or supersede) a fade. See [`FadeController::start`].
    pub fn start_fade(&self, req: &FadeRequest) -> Result<()> {
        let mut guard = self.lighting_unit();
        let LightingUnit {
            fade,
            transport,
            sink,
        } = &mut *guard;
        fade.start(req, transport, sink, &self.clock)
    }

    /// Apply a lighting state with no interpolation.
    pub fn apply_immediate(&self, state: LightingState) -> Result<()> {
        self.start_fade(&FadeRequest::immediate(state))
    }

    /// Cancel any in-flight fade. Immediate and synchronous; already-sent
    /// segments are not corrected.
    pub fn abort_fade(&self) {
        let mut guard = self.lighting_unit();
        let LightingUnit { fade, sink, .. } = &mut *guard;
        fade.abort(sink);
    }

    pub fn fade_progress(&self) -> FadeProgress {
        self.lighting_unit().fade.get_progress(&self.clock)
    }

    pub fn is_fade_active(&self) -> bool {
        self.lighting_unit().fade.is_active()
    }

    /// Seed the assumed receiver state without transmitting.
    pub fn set_lighting_baseline(&self, state: LightingState) {
        self.lighting_unit().fade.set_current(state);
    }

    /// Periodic lighting drive; call every few tens of milliseconds.
    pub fn lighting_tick(&self) {
        let mut guard = self.lighting_unit();
        let LightingUnit {
            fade,
            transport,
            sink,
        } = &mut *guard;
        fade.tick(transport, sink, &self.clock);
    }

    // ── Display API ───────────────────────────────────────────

    /// Record user activity (resets the idle timer, latches wakes).
    pub fn notify_activity(&self) {
        self.display_unit().screen.notify_activity(&self.clock);
    }

    /// Touch gate for the input dispatcher: registers the touch as
    /// activity, then reports whether it may be forwarded to the UI.
    /// A touch that wakes the screen resets the timer but returns `false`,
    /// so the waking gesture is never also delivered as a click.
    pub fn on_touch(&self) -> bool {
        let mut guard = self.display_unit();
        guard.screen.notify_activity(&self.clock);
        guard.screen.is_interactive()
    }

    pub fn is_interactive(&self) -> bool {
        self.display_unit().screen.is_interactive()
    }

    pub fn is_screen_on(&self) -> bool {
        self.display_unit().screen.is_screen_on()
    }

    pub fn request_sleep(&self) {
        self.display_unit().screen.sleep(&self.clock);
    }

    pub fn request_wake(&self) {
        self.display_unit().screen.wake(&self.clock);
    }

    pub fn set_screen_timeout(&self, timeout_secs: u16) {
        let applied = {
            let mut guard = self.display_unit();
            guard.screen.set_timeout(timeout_secs, &self.clock);
            guard.screen.timeout()
        };
        self.settings_guard().screen_timeout_secs = applied;
    }

    pub fn screen_timeout(&self) -> u16 {
        self.display_unit().screen.timeout()
    }

    /// Periodic display drive; call every few hundred milliseconds from
    /// the rendering context. If the display unit's lock is contended the
    /// tick is skipped — never blocked — and the next one catches up.
    pub fn display_tick(&self) {
        let mut guard = match self.display.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        let DisplayUnit {
            screen,
            display,
            sink,
        } = &mut *guard;
        screen.tick(display, sink, &self.clock);
    }

    // ── Configuration ─────────────────────────────────────────

    /// Current settings snapshot.
    pub fn settings(&self) -> NodeSettings {
        *self.settings_guard()
    }

    /// Live configuration update: re-clamp and push the new values into
    /// both state machines.
    pub fn apply_settings(&self, new: NodeSettings) {
        let new = new.sanitize();
        {
            let mut guard = self.lighting_unit();
            if guard.fade.base_event_id() != new.base_event_id {
                info!(
                    "base event id changed: {:016x} -> {:016x}",
                    guard.fade.base_event_id(),
                    new.base_event_id
                );
            }
            guard.fade.set_base_event_id(new.base_event_id);
        }
        {
            let mut guard = self.display_unit();
            let DisplayUnit { screen, sink, .. } = &mut *guard;
            screen.set_timeout(new.screen_timeout_secs, &self.clock);
            sink.emit(&AppEvent::SettingsApplied {
                screen_timeout_secs: screen.timeout(),
                base_event_id: new.base_event_id,
            });
        }
        *self.settings_guard() = new;
    }

    // ── Startup ───────────────────────────────────────────────

    /// Boot-time auto-apply: fade from the assumed power-on state (all
    /// channels dark) to the catalog's first preset, if enabled and a
    /// preset exists.
    pub fn auto_apply_first_scene(&self, catalog: &impl SceneSource) -> Result<()> {
        let settings = self.settings();
        if !settings.auto_apply_enabled {
            info!("startup auto-apply is disabled");
            return Ok(());
        }
        let Some(first) = catalog.first() else {
            info!("no scenes available for auto-apply");
            return Ok(());
        };

        info!(
            "auto-applying scene '{}' over {}s",
            first.name, settings.auto_apply_duration_secs
        );
        let mut guard = self.lighting_unit();
        let LightingUnit {
            fade,
            transport,
            sink,
        } = &mut *guard;
        fade.set_current(LightingState::OFF);
        fade.start(
            &FadeRequest {
                target: first.lighting_state(),
                duration: Duration::from_secs(u64::from(settings.auto_apply_duration_secs)),
            },
            transport,
            sink,
            &self.clock,
        )
    }

    // ── Lock helpers ──────────────────────────────────────────
    //
    // A poisoned lock means some thread panicked mid-update; the station
    // keeps serving with the data as-is rather than taking the panic down
    // every other context.

    fn lighting_unit(&self) -> MutexGuard<'_, LightingUnit<T, S>> {
        self.lighting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn display_unit(&self) -> MutexGuard<'_, DisplayUnit<D, S>> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings_guard(&self) -> MutexGuard<'_, NodeSettings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
