//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                      | Connects to                 |
//! |-------------|---------------------------------|-----------------------------|
//! | `hardware`  | ClockPort, PowerControl,        | ISR hand-off statics,       |
//! |             | IntervalPort, PulsePort         | power switch, ESP timer     |
//! | `log_sink`  | EventSink                       | Serial log output           |
//! | `time`      | ClockPort                       | ESP32 high-resolution timer |
//! | `udp`       | TelemetrySink                   | UDP datagram socket         |
//! | `wifi`      | (publishes LinkReady)           | ESP-IDF Wi-Fi STA           |

pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod udp;
pub mod wifi;
