//! SceneDeck — LCC lighting scene command station.
//!
//! Turns user-selected colour/brightness targets into a small sequence of
//! bus events (receivers do the actual fading), and manages display power
//! for a battery/idle touch panel. The two halves are independent state
//! machines behind one [`Station`](app::Station) facade:
//!
//! - [`fade`] — segments a transition into bus-legal command sets and
//!   tracks wall-clock progress.
//! - [`screen`] — idle timeout, touch-to-wake, and the animated backlight
//!   transition between them.
//!
//! All domain logic is host-testable; everything ESP-IDF-specific lives in
//! [`adapters`] and the binary, guarded by `#[cfg(target_os = "espidf")]`.

pub mod app;
pub mod bus;
pub mod config;
pub mod fade;
pub mod lighting;
pub mod scenes;
pub mod screen;

mod error;

pub mod adapters;

pub use error::{Error, Result, TransportError};
