//! Slave BMS frame identifiers.
//!
//! ```text
//! 0xN10, 0xN20 -> voltage data, banks 0 and 1
//!     +0: cells 1, 2, 3, 4
//!     +1: cells 5, 6, 7, 8
//!     +2: cells 9, 10
//! 0xN30, 0xN40 -> temperature data, banks 0 and 1
//!     +0: cells 1, 4, 7, 10
//!     +1: cells 2, 5, 8
//!     +2: cells 3, 6, 9
//! 0xN00        -> poll / heartbeat
//! ```
//! `N` is the 1-based device number.

use crate::types::N_BMS;

const DEVICE_SHIFT: u16 = 8;
const DEVICE_MASK: u16 = 0b111 << DEVICE_SHIFT;
const CAT_SHIFT: u16 = 4;
const CAT_MASK: u16 = 0b111 << CAT_SHIFT;
const OFF_MASK: u16 = 0b11;

/// Highest offset a data frame may carry.
const MAX_OFFSET: usize = 2;

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Category {
    Heartbeat = 0,
    VoltageLow = 1,
    VoltageHigh = 2,
    TemperatureLow = 3,
    TemperatureHigh = 4,
}

impl Category {
    pub fn as_raw(&self) -> u8 {
        *self as u8
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Category::Heartbeat),
            1 => Some(Category::VoltageLow),
            2 => Some(Category::VoltageHigh),
            3 => Some(Category::TemperatureLow),
            4 => Some(Category::TemperatureHigh),
            _ => None,
        }
    }
}

/// What a received identifier refers to. `device` and `bank` are 0-based.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    Heartbeat { device: usize },
    Voltage { device: usize, bank: usize, offset: usize },
    Temperature { device: usize, bank: usize, offset: usize },
    /// Known device, but a category or offset this monitor does not store.
    Unknown { device: usize },
    /// Device number outside `1..=N_BMS`.
    Invalid,
}

impl FrameKind {
    /// Device a frame is attributed to, if any.
    pub fn device(&self) -> Option<usize> {
        match *self {
            FrameKind::Heartbeat { device }
            | FrameKind::Voltage { device, .. }
            | FrameKind::Temperature { device, .. }
            | FrameKind::Unknown { device } => Some(device),
            FrameKind::Invalid => None,
        }
    }
}

pub fn decode_id(id: u16) -> FrameKind {
    let number = ((id & DEVICE_MASK) >> DEVICE_SHIFT) as usize;
    let device = match number.checked_sub(1) {
        Some(device) if device < N_BMS => device,
        _ => return FrameKind::Invalid,
    };
    let offset = (id & OFF_MASK) as usize;
    let category = Category::from_raw(((id & CAT_MASK) >> CAT_SHIFT) as u8);

    match category {
        Some(Category::Heartbeat) => FrameKind::Heartbeat { device },
        Some(_) if offset > MAX_OFFSET => FrameKind::Unknown { device },
        Some(cat @ (Category::VoltageLow | Category::VoltageHigh)) => FrameKind::Voltage {
            device,
            bank: (cat.as_raw() - Category::VoltageLow.as_raw()) as usize,
            offset,
        },
        Some(cat @ (Category::TemperatureLow | Category::TemperatureHigh)) => {
            FrameKind::Temperature {
                device,
                bank: (cat.as_raw() - Category::TemperatureLow.as_raw()) as usize,
                offset,
            }
        }
        None => FrameKind::Unknown { device },
    }
}

/// Identifier of a frame addressed to the 0-based `device`.
pub fn encode_id(device: usize, category: Category, offset: usize) -> u16 {
    (((device as u16 + 1) << DEVICE_SHIFT) & DEVICE_MASK)
        | ((category.as_raw() as u16) << CAT_SHIFT)
        | (offset as u16 & OFF_MASK)
}
