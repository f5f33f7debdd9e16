pub mod cells;
pub use cells::{CellStore, FrameError, PackSummary};

/// Number of slave BMS modules on the bus.
pub const N_BMS: usize = 5;
/// Cells monitored by each slave.
pub const CELLS_PER_BMS: usize = 20;
/// Cells in one category group (voltage or temperature bank).
pub const CELLS_PER_BANK: usize = 10;
pub const N_CELLS: usize = N_BMS * CELLS_PER_BMS;

/// Evaluation tick counter. Wraps; compare with `wrapping_sub` only.
pub type Tick = u32;

// 27500 = 2.75V
#[repr(u16)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Voltages {
    MinVoltage = 27500,
    MaxVoltage = 44000,
}

// 2200 = 22C
#[repr(u16)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Temperatures {
    PlausibleLowest = 50,
    MinTemp = 100,
    MaxTemp = 7000,
    PlausibleHighest = 9500,
}

impl Voltages {
    pub fn as_raw(&self) -> u16 {
        *self as u16
    }
}

impl Temperatures {
    pub fn as_raw(&self) -> u16 {
        *self as u16
    }
}
