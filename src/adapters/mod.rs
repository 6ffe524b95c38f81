//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                    |
//! |------------|---------------------|--------------------------------|
//! | `hardware` | SensorPort          | ESP32 ADC1 (AD1)               |
//! |            | ActuatorPort        | GPIO (IO1, status LED)         |
//! | `log_sink` | EventSink           | Serial log output              |
//! | `nvs`      | ByteStore           | NVS blob / in-memory image     |
//! | `wifi`     | LinkPort            | ESP-IDF WiFi STA               |
//! | `mqtt`     | BrokerPort          | ESP-IDF MQTT client            |
//! | `time`     | ClockPort           | ESP32 system timer             |
//! | `entropy`  | EntropyPort         | Hardware RNG                   |

pub mod entropy;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
