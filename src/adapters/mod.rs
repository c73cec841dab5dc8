//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements         | Connects to                  |
//! |--------------|--------------------|------------------------------|
//! | `hardware`   | SensorPort         | SHT3x / DS18B20 probes       |
//! |              | ActuatorPort       | heater, fans, LEDs (GPIO)    |
//! | `log_sink`   | EventSink          | log file + publisher queue   |
//! | `time`       | ClockPort          | ESP32 system timer           |
//! | `shared_i2c` | `embedded_hal` I2c | one bus, several probes      |
//! | `onewire`    | OneWireBus         | open-drain GPIO              |

pub mod hardware;
pub mod log_sink;
pub mod onewire;
pub mod shared_i2c;
pub mod time;
