//! Persisted node settings.
//!
//! The configuration protocol exposes the node's settings as a flat,
//! byte-addressed space; this module knows the field layout and reads each
//! field through [`SettingsSpace`] with its own bounds check, falling back
//! to the documented default when a value is unreadable or out of range.
//! Multi-byte fields are big-endian on the wire.
//!
//! | field                      | addr | size | range       | default |
//! |----------------------------|------|------|-------------|---------|
//! | auto-apply enabled         | 132  | 1    | 0–1         | 1       |
//! | auto-apply duration (s)    | 133  | 2    | 0–300       | 10      |
//! | screen idle timeout (s)    | 135  | 2    | 0, 10–3600  | 60      |
//! | base event id              | 137  | 8    | low 16 bits ignored | 05.01.01.01.22.60.00.00 |

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{SettingsSpace, SpaceError};
use crate::screen::{TIMEOUT_DEFAULT_SECS, TIMEOUT_MAX_SECS, TIMEOUT_MIN_SECS};

// Field addresses within the configuration space. The segment starts at
// 128 with 4 bytes of internal bookkeeping ahead of the startup group.
pub const AUTO_APPLY_ENABLED_ADDR: u32 = 132;
pub const AUTO_APPLY_DURATION_ADDR: u32 = 133;
pub const SCREEN_TIMEOUT_ADDR: u32 = 135;
pub const BASE_EVENT_ID_ADDR: u32 = 137;

/// Longest allowed startup auto-apply transition, in seconds.
pub const AUTO_APPLY_DURATION_MAX_SECS: u16 = 300;

/// Default startup auto-apply transition, in seconds.
pub const AUTO_APPLY_DURATION_DEFAULT_SECS: u16 = 10;

/// Default base event id (05.01.01.01.22.60.00.00).
pub const DEFAULT_BASE_EVENT_ID: u64 = 0x0501_0101_2260_0000;

/// The four persisted settings this component consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Apply the catalog's first scene automatically after boot.
    pub auto_apply_enabled: bool,
    /// Transition length of the startup auto-apply.
    pub auto_apply_duration_secs: u16,
    /// Display idle timeout; 0 disables.
    pub screen_timeout_secs: u16,
    /// Top 48 bits shared by all six lighting parameter events.
    pub base_event_id: u64,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            auto_apply_enabled: true,
            auto_apply_duration_secs: AUTO_APPLY_DURATION_DEFAULT_SECS,
            screen_timeout_secs: TIMEOUT_DEFAULT_SECS,
            base_event_id: DEFAULT_BASE_EVENT_ID,
        }
    }
}

impl NodeSettings {
    /// Read all four fields from the settings space.
    ///
    /// Each field falls back to its default independently — one corrupt
    /// value never poisons the rest. The result is additionally
    /// [`sanitize`](Self::sanitize)d.
    pub fn load(space: &impl SettingsSpace) -> Self {
        let defaults = Self::default();

        let auto_apply_enabled = match read_u8(space, AUTO_APPLY_ENABLED_ADDR) {
            Ok(0) => false,
            Ok(1) => true,
            Ok(v) => {
                warn!("auto-apply flag {v} out of range, using default");
                defaults.auto_apply_enabled
            }
            Err(e) => {
                warn!("auto-apply flag unreadable ({e}), using default");
                defaults.auto_apply_enabled
            }
        };

        let auto_apply_duration_secs = match read_u16_be(space, AUTO_APPLY_DURATION_ADDR) {
            Ok(v) if v <= AUTO_APPLY_DURATION_MAX_SECS => v,
            Ok(v) => {
                warn!("auto-apply duration {v}s out of range, using default");
                defaults.auto_apply_duration_secs
            }
            Err(e) => {
                warn!("auto-apply duration unreadable ({e}), using default");
                defaults.auto_apply_duration_secs
            }
        };

        let screen_timeout_secs = match read_u16_be(space, SCREEN_TIMEOUT_ADDR) {
            Ok(v) => v,
            Err(e) => {
                warn!("screen timeout unreadable ({e}), using default");
                defaults.screen_timeout_secs
            }
        };

        let base_event_id = match read_u64_be(space, BASE_EVENT_ID_ADDR) {
            Ok(v) => v,
            Err(e) => {
                warn!("base event id unreadable ({e}), using default");
                defaults.base_event_id
            }
        };

        let settings = Self {
            auto_apply_enabled,
            auto_apply_duration_secs,
            screen_timeout_secs,
            base_event_id,
        }
        .sanitize();

        info!(
            "settings: auto_apply={} ({}s), screen_timeout={}s, base_event_id={:016x}",
            if settings.auto_apply_enabled { "enabled" } else { "disabled" },
            settings.auto_apply_duration_secs,
            settings.screen_timeout_secs,
            settings.base_event_id,
        );

        settings
    }

    /// Clamp every field into its valid range.
    pub fn sanitize(mut self) -> Self {
        self.auto_apply_duration_secs = self
            .auto_apply_duration_secs
            .min(AUTO_APPLY_DURATION_MAX_SECS);
        if self.screen_timeout_secs != 0 {
            self.screen_timeout_secs = self
                .screen_timeout_secs
                .clamp(TIMEOUT_MIN_SECS, TIMEOUT_MAX_SECS);
        }
        self
    }
}

// ── Byte-range readers ────────────────────────────────────────

fn read_u8(space: &impl SettingsSpace, addr: u32) -> Result<u8, SpaceError> {
    let mut buf = [0u8; 1];
    space.read(addr, &mut buf)?;
    Ok(buf[0])
}

fn read_u16_be(space: &impl SettingsSpace, addr: u32) -> Result<u16, SpaceError> {
    let mut buf = [0u8; 2];
    space.read(addr, &mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u64_be(space: &impl SettingsSpace, addr: u32) -> Result<u64, SpaceError> {
    let mut buf = [0u8; 8];
    space.read(addr, &mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
