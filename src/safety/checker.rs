//! Threshold and plausibility checks over one snapshot of the store.

use crate::types::{CellStore, Temperatures, Voltages, N_CELLS};

/// Safety thresholds, in store units (0.1 mV and 0.01 °C).
///
/// The upper voltage bound and the lower temperature bound are disabled by
/// default; [`Limits::strict`] switches both on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Limits {
    pub cell_min_voltage: u16,
    pub cell_max_voltage: Option<u16>,
    pub cell_min_temp: Option<u16>,
    pub cell_max_temp: u16,
    pub plausible_lowest: u16,
    pub plausible_highest: u16,
}

impl Limits {
    pub const fn new() -> Self {
        Limits {
            cell_min_voltage: Voltages::MinVoltage as u16,
            cell_max_voltage: None,
            cell_min_temp: None,
            cell_max_temp: Temperatures::MaxTemp as u16,
            plausible_lowest: Temperatures::PlausibleLowest as u16,
            plausible_highest: Temperatures::PlausibleHighest as u16,
        }
    }

    pub const fn strict() -> Self {
        Limits {
            cell_max_voltage: Some(Voltages::MaxVoltage as u16),
            cell_min_temp: Some(Temperatures::MinTemp as u16),
            ..Self::new()
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}

/// Cells whose thermistors are known to misreport. Fixed at construction.
#[derive(Debug, Copy, Clone)]
pub struct Blacklist {
    cells: [bool; N_CELLS],
}

impl Blacklist {
    pub const fn empty() -> Self {
        Blacklist {
            cells: [false; N_CELLS],
        }
    }

    /// Builds a blacklist from 0-based cell indices. Indices outside the
    /// pack are ignored.
    pub fn from_cells(cells: &[usize]) -> Self {
        let mut blacklist = Self::empty();
        for &cell in cells {
            if let Some(slot) = blacklist.cells.get_mut(cell) {
                *slot = true;
            }
        }
        blacklist
    }

    pub fn contains(&self, cell: usize) -> bool {
        self.cells.get(cell).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.cells.iter().filter(|&&listed| listed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::empty()
    }
}

/// Fails if any cell is under the minimum (or over the maximum, when
/// enabled). Cells never reported read as zero and therefore fail too.
pub fn check_voltages(store: &CellStore, limits: &Limits) -> bool {
    store.voltages().iter().all(|&volt| {
        volt >= limits.cell_min_voltage
            && limits.cell_max_voltage.map_or(true, |max| volt <= max)
    })
}

pub fn temperature_plausible(temp: u16, limits: &Limits) -> bool {
    temp >= limits.plausible_lowest && temp <= limits.plausible_highest
}

/// Fails if any trusted, plausible reading is over the maximum (or under
/// the minimum, when enabled). The maximum itself is allowed.
pub fn check_temperatures(store: &CellStore, blacklist: &Blacklist, limits: &Limits) -> bool {
    store
        .temperatures()
        .iter()
        .enumerate()
        .filter(|&(cell, _)| !blacklist.contains(cell))
        // Loose connectors report garbage, skip it for this tick
        .filter(|&(_, &temp)| temperature_plausible(temp, limits))
        .all(|(_, &temp)| {
            temp <= limits.cell_max_temp && limits.cell_min_temp.map_or(true, |min| temp >= min)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CELLS_PER_BMS, N_BMS};

    fn le(values: &[u16]) -> heapless::Vec<u8, 8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn fill_voltages(store: &mut CellStore, value: u16) {
        for device in 0..N_BMS {
            for bank in 0..2 {
                store.write_voltages(device, bank, 0, &le(&[value; 4])).unwrap();
                store.write_voltages(device, bank, 1, &le(&[value; 4])).unwrap();
                store.write_voltages(device, bank, 2, &le(&[value; 2])).unwrap();
            }
        }
    }

    fn fill_temperatures(store: &mut CellStore, value: u16) {
        for device in 0..N_BMS {
            for bank in 0..2 {
                store.write_temperatures(device, bank, 0, &le(&[value; 4])).unwrap();
                store.write_temperatures(device, bank, 1, &le(&[value; 3])).unwrap();
                store.write_temperatures(device, bank, 2, &le(&[value; 3])).unwrap();
            }
        }
    }

    /// Sets a single temperature by rewriting the frame that carries it.
    fn set_temperature(store: &mut CellStore, cell: usize, value: u16, fill: u16) {
        let device = cell / CELLS_PER_BMS;
        let bank = (cell % CELLS_PER_BMS) / 10;
        let slot = cell % 10;
        let (offset, count, position) = match slot {
            0 | 3 | 6 | 9 => (0, 4, slot / 3),
            1 | 4 | 7 => (1, 3, slot / 3),
            _ => (2, 3, slot / 3),
        };
        let mut values = [fill; 4];
        values[position] = value;
        store
            .write_temperatures(device, bank, offset, &le(&values[..count]))
            .unwrap();
    }

    #[test]
    fn fresh_store_fails_voltage_check() {
        let store = CellStore::new();
        assert!(!check_voltages(&store, &Limits::default()));
    }

    #[test]
    fn voltage_minimum_is_inclusive() {
        let mut store = CellStore::new();
        fill_voltages(&mut store, Voltages::MinVoltage.as_raw());
        assert!(check_voltages(&store, &Limits::default()));

        store.write_voltages(3, 1, 2, &le(&[27499, 30000])).unwrap();
        assert!(!check_voltages(&store, &Limits::default()));
    }

    #[test]
    fn voltage_upper_bound_only_when_enabled() {
        let mut store = CellStore::new();
        fill_voltages(&mut store, 44001);

        assert!(check_voltages(&store, &Limits::default()));
        assert!(!check_voltages(&store, &Limits::strict()));

        fill_voltages(&mut store, 44000);
        assert!(check_voltages(&store, &Limits::strict()));
    }

    #[test]
    fn temperature_plausibility_band() {
        let limits = Limits::default();
        assert!(!temperature_plausible(0, &limits));
        assert!(!temperature_plausible(49, &limits));
        assert!(temperature_plausible(50, &limits));
        assert!(temperature_plausible(9500, &limits));
        assert!(!temperature_plausible(9501, &limits));
    }

    #[test]
    fn implausible_reading_is_skipped() {
        let mut store = CellStore::new();
        fill_temperatures(&mut store, 2200);
        set_temperature(&mut store, 42, 0, 2200);
        assert!(check_temperatures(&store, &Blacklist::empty(), &Limits::default()));

        set_temperature(&mut store, 42, 12000, 2200);
        assert!(check_temperatures(&store, &Blacklist::empty(), &Limits::default()));
    }

    #[test]
    fn max_temperature_is_allowed_not_exceeded() {
        let mut store = CellStore::new();
        fill_temperatures(&mut store, 2200);

        set_temperature(&mut store, 77, Temperatures::MaxTemp.as_raw(), 2200);
        assert!(check_temperatures(&store, &Blacklist::empty(), &Limits::default()));

        set_temperature(&mut store, 77, Temperatures::MaxTemp.as_raw() + 1, 2200);
        assert!(!check_temperatures(&store, &Blacklist::empty(), &Limits::default()));
    }

    #[test]
    fn blacklisted_cell_never_trips() {
        let mut store = CellStore::new();
        fill_temperatures(&mut store, 2200);
        set_temperature(&mut store, 17, 8000, 2200);

        let blacklist = Blacklist::from_cells(&[16, 17, 18]);
        assert_eq!(blacklist.len(), 3);
        assert!(check_temperatures(&store, &blacklist, &Limits::default()));
        assert!(!check_temperatures(&store, &Blacklist::empty(), &Limits::default()));
    }

    #[test]
    fn blacklist_ignores_indices_outside_pack() {
        let blacklist = Blacklist::from_cells(&[3, N_CELLS, 1000]);
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.contains(3));
        assert!(!blacklist.contains(N_CELLS));
    }

    #[test]
    fn temperature_lower_bound_only_when_enabled() {
        let mut store = CellStore::new();
        fill_temperatures(&mut store, 80);

        assert!(check_temperatures(&store, &Blacklist::empty(), &Limits::default()));
        assert!(!check_temperatures(&store, &Blacklist::empty(), &Limits::strict()));

        fill_temperatures(&mut store, 100);
        assert!(check_temperatures(&store, &Blacklist::empty(), &Limits::strict()));
    }
}
