//! Latest per-cell telemetry and per-device liveness timestamps.
//!
//! The store is an address-translation layer: each (device, bank, offset)
//! triple on the bus maps to a fixed set of flat cell indices. Nothing is
//! derived or cached here apart from what [`CellStore::summary`] computes on
//! demand.

use libm::roundf;

use super::{Tick, CELLS_PER_BANK, CELLS_PER_BMS, N_BMS, N_CELLS};

/// Number of voltage (or temperature) banks per device.
const BANKS_PER_BMS: usize = CELLS_PER_BMS / CELLS_PER_BANK;

/// Cells carried by one voltage frame, indexed by offset.
const VOLTAGE_CELLS: [usize; 3] = [4, 4, 2];

/// Stride between voltage sub-reads within a bank.
const VOLTAGE_STRIDE: usize = 4;

/// Relative positions written by a temperature frame, indexed by offset.
/// Follows the thermistor wiring: offset 0 carries cells 1, 4, 7, 10 of the
/// bank, offset 1 cells 2, 5, 8 and offset 2 cells 3, 6, 9.
const TEMPERATURE_SLOTS: [&[usize]; 3] = [&[0, 3, 6, 9], &[1, 4, 7], &[2, 5, 8]];

/// Reasons a data frame is rejected before touching the store.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    DeviceOutOfRange(usize),
    BankOutOfRange(usize),
    OffsetOutOfRange(usize),
    LengthMismatch { expected: usize, actual: usize },
    CellOutOfRange(usize),
    ExtendedId(u32),
}

/// Aggregates over the whole pack, used for status logging.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PackSummary {
    pub tot_volt: u32,
    pub max_volt: u16,
    pub min_volt: u16,
    pub avg_volt: u16,
    pub max_temp: u16,
    pub min_temp: u16,
}

#[derive(Debug, Copy, Clone)]
pub struct CellStore {
    cell_volts: [u16; N_CELLS],
    temperatures: [u16; N_CELLS],
    last_seen: [Option<Tick>; N_BMS],
}

impl Default for CellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CellStore {
    pub const fn new() -> Self {
        CellStore {
            cell_volts: [0; N_CELLS],
            temperatures: [0; N_CELLS],
            last_seen: [None; N_BMS],
        }
    }

    /// Marks `device` as heard from at `tick`. Called for every accepted
    /// frame, whatever its category.
    pub fn record_device_seen(&mut self, device: usize, tick: Tick) -> Result<(), FrameError> {
        let slot = self
            .last_seen
            .get_mut(device)
            .ok_or(FrameError::DeviceOutOfRange(device))?;
        *slot = Some(tick);
        Ok(())
    }

    /// Stores a voltage sub-read. Returns the number of cells written.
    ///
    /// Offsets 0 and 1 carry four cells (8 bytes), offset 2 the last two
    /// cells of the bank (4 bytes). On any error no cell is modified.
    pub fn write_voltages(
        &mut self,
        device: usize,
        bank: usize,
        offset: usize,
        payload: &[u8],
    ) -> Result<usize, FrameError> {
        let count = *VOLTAGE_CELLS
            .get(offset)
            .ok_or(FrameError::OffsetOutOfRange(offset))?;
        check_len(payload, count)?;

        let first = bank_base(device, bank)? + offset * VOLTAGE_STRIDE;
        check_cell(first + count - 1)?;

        for (i, value) in words(payload).enumerate() {
            self.cell_volts[first + i] = value;
        }
        Ok(count)
    }

    /// Stores a temperature sub-read, scattered over the bank according to
    /// the sensor wiring. Returns the number of cells written.
    pub fn write_temperatures(
        &mut self,
        device: usize,
        bank: usize,
        offset: usize,
        payload: &[u8],
    ) -> Result<usize, FrameError> {
        let slots = *TEMPERATURE_SLOTS
            .get(offset)
            .ok_or(FrameError::OffsetOutOfRange(offset))?;
        check_len(payload, slots.len())?;

        let base = bank_base(device, bank)?;
        for &slot in slots {
            check_cell(base + slot)?;
        }

        for (&slot, value) in slots.iter().zip(words(payload)) {
            self.temperatures[base + slot] = value;
        }
        Ok(slots.len())
    }

    pub fn voltage(&self, cell: usize) -> Option<u16> {
        self.cell_volts.get(cell).copied()
    }

    pub fn temperature(&self, cell: usize) -> Option<u16> {
        self.temperatures.get(cell).copied()
    }

    pub fn voltages(&self) -> &[u16; N_CELLS] {
        &self.cell_volts
    }

    pub fn temperatures(&self) -> &[u16; N_CELLS] {
        &self.temperatures
    }

    pub fn last_seen(&self, device: usize) -> Option<Tick> {
        self.last_seen.get(device).copied().flatten()
    }

    pub fn last_seen_all(&self) -> &[Option<Tick>; N_BMS] {
        &self.last_seen
    }

    pub fn summary(&self) -> PackSummary {
        let mut summary = PackSummary {
            min_volt: u16::MAX,
            min_temp: u16::MAX,
            ..PackSummary::default()
        };

        for &volt in self.cell_volts.iter() {
            summary.tot_volt = summary.tot_volt.wrapping_add(volt as u32);
            summary.max_volt = summary.max_volt.max(volt);
            summary.min_volt = summary.min_volt.min(volt);
        }
        summary.avg_volt = roundf(summary.tot_volt as f32 / N_CELLS as f32).max(0.0) as u16;

        for &temp in self.temperatures.iter() {
            summary.max_temp = summary.max_temp.max(temp);
            summary.min_temp = summary.min_temp.min(temp);
        }

        summary
    }
}

fn bank_base(device: usize, bank: usize) -> Result<usize, FrameError> {
    if device >= N_BMS {
        return Err(FrameError::DeviceOutOfRange(device));
    }
    if bank >= BANKS_PER_BMS {
        return Err(FrameError::BankOutOfRange(bank));
    }
    Ok(device * CELLS_PER_BMS + bank * CELLS_PER_BANK)
}

fn check_len(payload: &[u8], cells: usize) -> Result<(), FrameError> {
    let expected = cells * core::mem::size_of::<u16>();
    if payload.len() != expected {
        return Err(FrameError::LengthMismatch {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn check_cell(cell: usize) -> Result<(), FrameError> {
    if cell >= N_CELLS {
        return Err(FrameError::CellOutOfRange(cell));
    }
    Ok(())
}

fn words(payload: &[u8]) -> impl Iterator<Item = u16> + '_ {
    payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
}
