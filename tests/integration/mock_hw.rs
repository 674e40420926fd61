//! Mock adapters for integration tests.
//!
//! Every port is backed by shared interior state (`Arc`) so a test keeps a
//! handle for assertions after moving the adapter into the station, and so
//! the same mocks work from multiple threads in the concurrency tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use scenedeck::app::events::AppEvent;
use scenedeck::app::ports::{Clock, DisplayPort, EventSink, TransportPort};
use scenedeck::TransportError;

// ── Manual clock ──────────────────────────────────────────────

/// Starts a simulated day after boot so timer rewinds have headroom.
const EPOCH_US: u64 = 86_400_000_000;

#[derive(Clone)]
pub struct ManualClock(Arc<AtomicU64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(EPOCH_US)))
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.fetch_add(ms * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Transport ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<u64>>>,
    ready: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<u64> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// The trailing command set as (parameter, value) pairs.
    pub fn last_set(&self) -> Vec<(u8, u8)> {
        let sent = self.sent.lock().unwrap();
        sent[sent.len() - scenedeck::bus::COMMAND_SET_LEN..]
            .iter()
            .map(|id| (((id >> 8) & 0xFF) as u8, (id & 0xFF) as u8))
            .collect()
    }
}

impl TransportPort for MockTransport {
    fn send_event(&mut self, event_id: u64) -> Result<(), TransportError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(TransportError::NotReady);
        }
        self.sent.lock().unwrap().push(event_id);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCall {
    BacklightOn,
    BacklightOff,
    ShowOverlay,
    HideOverlay,
    Opacity(u8),
}

#[derive(Clone)]
pub struct MockDisplay {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

#[allow(dead_code)]
impl MockDisplay {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl DisplayPort for MockDisplay {
    fn backlight_on(&mut self) {
        self.calls.lock().unwrap().push(DisplayCall::BacklightOn);
    }

    fn backlight_off(&mut self) {
        self.calls.lock().unwrap().push(DisplayCall::BacklightOff);
    }

    fn show_overlay(&mut self) {
        self.calls.lock().unwrap().push(DisplayCall::ShowOverlay);
    }

    fn hide_overlay(&mut self) {
        self.calls.lock().unwrap().push(DisplayCall::HideOverlay);
    }

    fn set_overlay_opacity(&mut self, opacity: u8) {
        self.calls.lock().unwrap().push(DisplayCall::Opacity(opacity));
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(*event);
    }
}
