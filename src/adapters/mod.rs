//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter         | Implements      | Connects to                    |
//! |-----------------|-----------------|--------------------------------|
//! | `time`          | Clock           | ESP high-res timer / `Instant` |
//! | `log_sink`      | EventSink       | Serial log output              |
//! | `settings_file` | SettingsSpace   | Config file on the storage card|
//! | `twai`          | TransportPort   | TWAI (CAN) controller          |
//! | `backlight`     | DisplayPort     | CH422G I/O expander over I2C   |

pub mod log_sink;
pub mod settings_file;
pub mod time;

#[cfg(target_os = "espidf")]
pub mod backlight;
#[cfg(target_os = "espidf")]
pub mod twai;

pub use log_sink::LogEventSink;
pub use settings_file::FileSettingsSpace;
pub use time::MonotonicClock;
