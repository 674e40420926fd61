//! TWAI (CAN) event transport.
//!
//! Emits each application event as one Producer/Consumer Event Report
//! frame: 29-bit header carrying the node's 12-bit alias, 8-byte payload
//! carrying the event id big-endian. Alias allocation, duplicate-node
//! detection and the rest of the bus protocol live in the node stack that
//! owns the controller; this adapter is strictly the "send one event"
//! facade. Wrap it in [`PacedTransport`](crate::bus::PacedTransport) to get
//! the bus pacing contract.

use embedded_can::{ExtendedId, Frame as _, Id};
use esp_idf_hal::can::{CanDriver, Frame};
use log::warn;

use crate::app::ports::TransportPort;
use crate::error::TransportError;

/// PCER frame header; the low 12 bits carry the source alias.
const EVENT_REPORT_HEADER: u32 = 0x195B_4000;

pub struct TwaiTransport<'d> {
    driver: CanDriver<'d>,
    alias: u16,
    ready: bool,
}

impl<'d> TwaiTransport<'d> {
    /// Wrap a started TWAI driver. `alias` is the node's negotiated
    /// 12-bit bus alias.
    pub fn new(driver: CanDriver<'d>, alias: u16) -> Self {
        Self {
            driver,
            alias: alias & 0x0FFF,
            ready: true,
        }
    }
}

impl TransportPort for TwaiTransport<'_> {
    fn send_event(&mut self, event_id: u64) -> Result<(), TransportError> {
        if !self.ready {
            return Err(TransportError::NotReady);
        }
        let raw = EVENT_REPORT_HEADER | u32::from(self.alias);
        let Some(id) = ExtendedId::new(raw) else {
            return Err(TransportError::SendFailed);
        };
        let Some(frame) = Frame::new(Id::Extended(id), &event_id.to_be_bytes()) else {
            return Err(TransportError::SendFailed);
        };
        // Zero timeout: a full TX queue surfaces as an error and the fade
        // orchestrator retries on its next tick.
        self.driver.transmit(&frame, 0).map_err(|e| {
            warn!("TWAI transmit failed: {e}");
            TransportError::SendFailed
        })
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
