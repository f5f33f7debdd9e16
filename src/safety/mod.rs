pub mod checker;
pub mod debounce;
pub mod liveness;

pub use checker::{check_temperatures, check_voltages, temperature_plausible, Blacklist, Limits};
pub use debounce::{HealthHistory, SafetyStateMachine, SafetyVerdict, HISTORY_DEPTH};
pub use liveness::{check_timestamps, BMS_TIMEOUT_TICKS};
