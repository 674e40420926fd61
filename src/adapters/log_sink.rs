//! Serial-log event sink.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Renders application events through the `log` facade. The closed event
/// set is matched exhaustively; adding a variant is a compile error here.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::FadeStarted {
                target,
                total,
                segments,
            } => info!(
                "fade started: {}s, {} segment(s), to B={} R={} G={} B={} W={}",
                total.as_secs(),
                segments,
                target.brightness,
                target.red,
                target.green,
                target.blue,
                target.white,
            ),
            AppEvent::SegmentSent {
                index,
                count,
                duration_secs,
                ..
            } => debug!(
                "segment {}/{} sent ({}s)",
                index + 1,
                count,
                duration_secs
            ),
            AppEvent::SegmentDeferred { index } => {
                debug!("segment {} deferred to next tick", index + 1);
            }
            AppEvent::FadeCompleted => info!("fade complete"),
            AppEvent::FadeAborted => info!("fade aborted"),
            AppEvent::ScreenChanged { from, to } => {
                debug!("screen: {from:?} -> {to:?}");
            }
            AppEvent::SettingsApplied {
                screen_timeout_secs,
                base_event_id,
            } => info!(
                "settings applied: screen_timeout={}s, base_event_id={:016x}",
                screen_timeout_secs, base_event_id
            ),
        }
    }
}
