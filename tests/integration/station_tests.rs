//! Integration tests for the station service: startup auto-apply, the
//! touch gate, live settings updates, and the full fade flow through the
//! port boundary. All on the host against mock adapters.

use core::time::Duration;

use scenedeck::app::events::AppEvent;
use scenedeck::app::Station;
use scenedeck::bus::COMMAND_SET_LEN;
use scenedeck::config::NodeSettings;
use scenedeck::fade::FadePhase;
use scenedeck::lighting::{FadeRequest, LightingState};
use scenedeck::scenes::{SceneCatalog, SceneSource, DEFAULT_SCENES_JSON};

use crate::mock_hw::{DisplayCall, ManualClock, MockDisplay, MockTransport, RecordingSink};

type TestStation = Station<MockTransport, MockDisplay, RecordingSink, ManualClock>;

struct Fixture {
    station: TestStation,
    transport: MockTransport,
    display: MockDisplay,
    lighting_events: RecordingSink,
    clock: ManualClock,
}

fn make_station(settings: NodeSettings) -> Fixture {
    let transport = MockTransport::new();
    let display = MockDisplay::new();
    let lighting_events = RecordingSink::new();
    let display_events = RecordingSink::new();
    let clock = ManualClock::new();
    let station = Station::new(
        settings,
        transport.clone(),
        display.clone(),
        lighting_events.clone(),
        display_events,
        clock.clone(),
    );
    Fixture {
        station,
        transport,
        display,
        lighting_events,
        clock,
    }
}

// ── Startup auto-apply ────────────────────────────────────────

#[test]
fn auto_apply_fades_from_dark_to_first_scene() {
    let fx = make_station(NodeSettings::default());
    let catalog = SceneCatalog::from_json(DEFAULT_SCENES_JSON).unwrap();

    fx.station.auto_apply_first_scene(&catalog).unwrap();

    // Default 10 s transition: one command set, duration 10, scene 1 values.
    assert_eq!(fx.transport.sent_count(), COMMAND_SET_LEN);
    let set = fx.transport.last_set();
    assert_eq!(set[0], (0, 255));
    assert_eq!(set[1], (1, 200));
    assert_eq!(set[2], (2, 150));
    assert_eq!(set[3], (3, 0));
    assert_eq!(set[4], (4, 100));
    assert_eq!(set[5], (5, 10));
    assert!(fx.station.is_fade_active());

    // Runs to completion on the lighting tick.
    fx.clock.advance_ms(10_000);
    fx.station.lighting_tick();
    assert_eq!(fx.station.fade_progress().phase, FadePhase::Complete);
    fx.station.lighting_tick();
    assert_eq!(fx.station.fade_progress().phase, FadePhase::Idle);
}

#[test]
fn auto_apply_respects_disabled_flag() {
    let settings = NodeSettings {
        auto_apply_enabled: false,
        ..NodeSettings::default()
    };
    let fx = make_station(settings);
    let catalog = SceneCatalog::from_json(DEFAULT_SCENES_JSON).unwrap();

    fx.station.auto_apply_first_scene(&catalog).unwrap();
    assert_eq!(fx.transport.sent_count(), 0);
    assert!(!fx.station.is_fade_active());
}

#[test]
fn auto_apply_with_empty_catalog_is_a_no_op() {
    let fx = make_station(NodeSettings::default());
    let catalog = SceneCatalog::from_json(r#"{"scenes":[]}"#).unwrap();
    assert!(catalog.first().is_none());

    fx.station.auto_apply_first_scene(&catalog).unwrap();
    assert_eq!(fx.transport.sent_count(), 0);
}

// ── Touch gate ────────────────────────────────────────────────

#[test]
fn waking_touch_is_swallowed_but_counts_as_activity() {
    let fx = make_station(NodeSettings::default());

    // Interactive screen forwards touches.
    assert!(fx.station.on_touch());

    // Let the 60 s idle timeout run the screen down to Off.
    fx.clock.advance_ms(60_000);
    fx.station.display_tick();
    for _ in 0..6 {
        fx.clock.advance_ms(250);
        fx.station.display_tick();
    }
    assert!(!fx.station.is_screen_on());

    // The touch that wakes the screen registers as activity but must not
    // reach the UI as a click.
    assert!(!fx.station.on_touch());
    fx.clock.advance_ms(250);
    fx.station.display_tick();
    assert!(fx.station.is_screen_on());
    assert!(!fx.station.is_interactive(), "still fading in");

    // Once fully active again, touches pass.
    for _ in 0..5 {
        fx.clock.advance_ms(250);
        fx.station.display_tick();
    }
    assert!(fx.station.is_interactive());
    assert!(fx.station.on_touch());
}

#[test]
fn manual_sleep_and_wake_round_trip() {
    let fx = make_station(NodeSettings::default());

    fx.station.request_sleep();
    fx.station.display_tick();
    assert!(!fx.station.is_interactive());

    // Run the ramp down to Off.
    for _ in 0..6 {
        fx.clock.advance_ms(250);
        fx.station.display_tick();
    }
    assert!(!fx.station.is_screen_on());
    assert!(fx.display.calls().contains(&DisplayCall::BacklightOff));

    fx.station.request_wake();
    fx.clock.advance_ms(250);
    fx.station.display_tick();
    assert!(fx.station.is_screen_on());
}

// ── Live settings ─────────────────────────────────────────────

#[test]
fn settings_update_applies_to_both_machines() {
    let fx = make_station(NodeSettings::default());

    let new = NodeSettings {
        auto_apply_enabled: true,
        auto_apply_duration_secs: 10,
        screen_timeout_secs: 5, // below minimum — must be clamped
        base_event_id: 0x0202_0202_0202_0000,
    };
    fx.station.apply_settings(new);

    assert_eq!(fx.station.screen_timeout(), 10, "clamped to the minimum");
    assert_eq!(fx.station.settings().base_event_id, 0x0202_0202_0202_0000);

    // Subsequent sends carry the new base id.
    fx.station
        .apply_immediate(LightingState {
            brightness: 1,
            red: 2,
            green: 3,
            blue: 4,
            white: 5,
        })
        .unwrap();
    let sent = fx.transport.sent();
    assert_eq!(sent[0] >> 16, 0x0202_0202_0202);
}

#[test]
fn screen_timeout_setter_keeps_settings_in_sync() {
    let fx = make_station(NodeSettings::default());
    fx.station.set_screen_timeout(9999);
    assert_eq!(fx.station.screen_timeout(), 3600);
    assert_eq!(fx.station.settings().screen_timeout_secs, 3600);
}

// ── Fade flow through the facade ──────────────────────────────

#[test]
fn fade_lifecycle_events_reach_the_sink() {
    let fx = make_station(NodeSettings::default());

    fx.station
        .start_fade(&FadeRequest {
            target: LightingState {
                brightness: 50,
                red: 60,
                green: 70,
                blue: 80,
                white: 90,
            },
            duration: Duration::from_secs(30),
        })
        .unwrap();
    fx.clock.advance_ms(30_000);
    fx.station.lighting_tick();

    let events = fx.lighting_events.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::FadeStarted { segments: 1, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::SegmentSent { index: 0, .. })));
    assert!(events.iter().any(|e| matches!(e, AppEvent::FadeCompleted)));
}

#[test]
fn abort_through_the_facade_reports_idle() {
    let fx = make_station(NodeSettings::default());
    fx.station
        .start_fade(&FadeRequest {
            target: LightingState::OFF,
            duration: Duration::from_secs(120),
        })
        .unwrap();
    assert!(fx.station.is_fade_active());

    fx.station.abort_fade();
    assert!(!fx.station.is_fade_active());
    let progress = fx.station.fade_progress();
    assert_eq!(progress.phase, FadePhase::Idle);
    assert_eq!(progress.percent, 0);
    assert!(fx
        .lighting_events
        .events()
        .iter()
        .any(|e| matches!(e, AppEvent::FadeAborted)));
}

#[test]
fn failed_start_is_surfaced_and_retryable() {
    let fx = make_station(NodeSettings::default());
    fx.transport.set_ready(false);

    let req = FadeRequest {
        target: LightingState::OFF,
        duration: Duration::from_secs(5),
    };
    assert!(fx.station.start_fade(&req).is_err());
    assert!(!fx.station.is_fade_active());

    fx.transport.set_ready(true);
    fx.station.start_fade(&req).unwrap();
    assert!(fx.station.is_fade_active());
}
