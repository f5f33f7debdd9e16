#![cfg_attr(not(test), no_std)]

//! Safety monitor for the HV accumulator.
//!
//! Slave BMS modules report cell voltages and temperatures over CAN. The
//! monitor keeps the latest reading of every cell, checks them twice a
//! second with a debounced pass/fail history, and drives the AMS OK line
//! that gates the HV contactors. Hardware glue lives in the firmware binary.

#[macro_use]
mod fmt;

pub mod can_management;
pub mod config;
pub mod monitor;
pub mod output;
pub mod safety;
pub mod types;
pub mod wakeup;

pub use can_management::{BusFrame, FrameKind};
pub use config::MonitorConfig;
pub use monitor::PackMonitor;
pub use output::{fail_safe_output, OutputController};
pub use safety::{Blacklist, Limits, SafetyVerdict};
pub use types::{CellStore, Tick, N_BMS, N_CELLS};
pub use wakeup::{BusTx, WakeupBroadcaster};
