//! SceneDeck firmware — main entry point.
//!
//! Wires the adapters to the [`Station`] and starts the periodic tick
//! threads. The touch-driven UI runs in its own task and reaches the
//! station through [`Station::on_touch`] and the presentation API; the bus
//! configuration protocol pushes live updates through
//! [`Station::apply_settings`].
//!
//! Construction order matters: the station is assembled completely —
//! settings read, catalog loaded, transport and display attached — before
//! any tick thread or input callback can reach it. Initialise fully, then
//! make discoverable.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use scenedeck::adapters::backlight::Ch422gBacklight;
use scenedeck::adapters::twai::TwaiTransport;
use scenedeck::adapters::{FileSettingsSpace, LogEventSink, MonotonicClock};
use scenedeck::app::Station;
use scenedeck::bus::PacedTransport;
use scenedeck::config::NodeSettings;
use scenedeck::fade::FadePhase;
use scenedeck::scenes::SceneCatalog;

/// Node configuration file, maintained by the bus configuration protocol.
const SETTINGS_PATH: &str = "/sdcard/node_config.bin";

/// Scene catalog file, maintained by the UI's scene editor.
const SCENES_PATH: &str = "/sdcard/scenes.json";

/// Bus alias for outgoing event reports. Replaced by the stack's
/// negotiated alias once alias allocation is wired through.
const NODE_ALIAS: u16 = 0x0AA7;

/// Lighting tick period — short against whole-second segments.
const LIGHTING_TICK_MS: u64 = 25;

/// Display tick period — its timeout resolution is seconds.
const DISPLAY_TICK_MS: u64 = 250;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("SceneDeck v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;

    // ── Bus transport: TWAI at the layout's 125 kbit/s ────────
    // Board wiring (Waveshare ESP32-S3 Touch LCD 4.3B): TWAI on
    // GPIO15/GPIO16, CH422G on the touch I2C bus (GPIO8/GPIO9).
    let can_config =
        esp_idf_hal::can::config::Config::new().timing(esp_idf_hal::can::config::Timing::B125K);
    let mut can = esp_idf_hal::can::CanDriver::new(
        peripherals.can,
        peripherals.pins.gpio15,
        peripherals.pins.gpio16,
        &can_config,
    )?;
    can.start()?;
    let transport = PacedTransport::new(TwaiTransport::new(can, NODE_ALIAS));

    // ── Backlight control: CH422G on the touch I2C bus ────────
    let i2c_config = esp_idf_hal::i2c::config::Config::new();
    let i2c = esp_idf_hal::i2c::I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &i2c_config,
    )?;
    let display = Ch422gBacklight::new(i2c);

    // ── Persisted state ───────────────────────────────────────
    let settings = NodeSettings::load(&FileSettingsSpace::new(SETTINGS_PATH));
    let catalog = SceneCatalog::load_or_create(Path::new(SCENES_PATH));

    // ── Station ───────────────────────────────────────────────
    let station = Arc::new(Station::new(
        settings,
        transport,
        display,
        LogEventSink::new(),
        LogEventSink::new(),
        MonotonicClock::new(),
    ));

    if let Err(e) = station.auto_apply_first_scene(&catalog) {
        // Non-fatal: the bus may still be joining; the user can re-apply.
        warn!("startup auto-apply failed: {e}");
    }

    // ── Tick threads ──────────────────────────────────────────
    {
        let station = Arc::clone(&station);
        thread::Builder::new()
            .name("fade_tick".into())
            .stack_size(8 * 1024)
            .spawn(move || loop {
                station.lighting_tick();
                thread::sleep(Duration::from_millis(LIGHTING_TICK_MS));
            })?;
    }
    {
        let station = Arc::clone(&station);
        thread::Builder::new()
            .name("power_tick".into())
            .stack_size(8 * 1024)
            .spawn(move || loop {
                station.display_tick();
                thread::sleep(Duration::from_millis(DISPLAY_TICK_MS));
            })?;
    }

    info!("station ready");

    // Main task idles; UI and protocol tasks drive the station.
    loop {
        thread::sleep(Duration::from_secs(10));
        let progress = station.fade_progress();
        if progress.phase != FadePhase::Idle {
            info!(
                "fade {}% ({}s of {}s)",
                progress.percent,
                progress.elapsed.as_secs(),
                progress.total.as_secs()
            );
        }
    }
}
