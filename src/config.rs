//! Compile-time configuration of the monitor.
//! Edit these constants and rebuild.

use crate::safety::{Limits, BMS_TIMEOUT_TICKS};
use crate::types::Tick;

/// Evaluation cadence. 2 Hz, so the 8-deep history gives 4 s hysteresis.
pub const BMS_CHECK_FREQ_MILLISEC: u64 = 500;

/// Pause between poll frames of one wakeup sweep.
pub const WAKEUP_INTERVAL_MILLISEC: u32 = 100;

/// Wait for everything to settle, capacitors to fill etc.
pub const SETTLE_MILLISEC: u64 = 250;

pub const CAN_BITRATE: u32 = 125_000;

/// Sketchy thermistors, 0-based (cells 17, 18 and 19).
pub const TEMPERATURE_BLACKLIST: [usize; 3] = [16, 17, 18];

#[derive(Debug, Copy, Clone)]
pub struct MonitorConfig {
    pub check_period_ms: u64,
    pub wakeup_interval_ms: u32,
    pub settle_ms: u64,
    pub can_bitrate: u32,
    pub timeout_ticks: Tick,
    pub limits: Limits,
    pub blacklist: &'static [usize],
}

impl MonitorConfig {
    pub const fn new() -> Self {
        MonitorConfig {
            check_period_ms: BMS_CHECK_FREQ_MILLISEC,
            wakeup_interval_ms: WAKEUP_INTERVAL_MILLISEC,
            settle_ms: SETTLE_MILLISEC,
            can_bitrate: CAN_BITRATE,
            timeout_ticks: BMS_TIMEOUT_TICKS,
            limits: Limits::new(),
            blacklist: &TEMPERATURE_BLACKLIST,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}
