//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements          | Connects to               |
//! |----------------|---------------------|---------------------------|
//! | `config_file`  | ConfigPort          | JSON settings file        |
//! | `log_sink`     | EventSink           | `log` facade              |
//! | `sim`          | SensorPort          | first-order oven model    |
//! |                | ActuatorPort        |                           |
//! | `time`         | ClockPort           | `Instant` / manual clock  |

pub mod config_file;
pub mod log_sink;
pub mod sim;
pub mod time;
