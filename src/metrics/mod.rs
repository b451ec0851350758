//! Metric registry and windowed sensors
//!
//! Sensors are named, tagged accumulators computing a derived statistic
//! over a trailing time window. The registry owns them, guarantees one
//! instance per identity, and fans snapshots out to reporters.

mod name;
mod registry;
mod sensor;

pub use name::MetricName;
pub use registry::MetricRegistry;
pub use sensor::{Sensor, SensorHandle, SensorKind};
