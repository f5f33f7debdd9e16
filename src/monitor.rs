//! The monitor's shared state: the cell store plus everything the periodic
//! evaluation needs. One instance lives behind a mutex, the CAN receive task
//! feeds it frames and the evaluation task calls [`PackMonitor::evaluate`].

use crate::can_management::{save_bms_data, BusFrame, FrameKind};
use crate::config::MonitorConfig;
use crate::safety::{
    check_temperatures, check_timestamps, check_voltages, Blacklist, Limits, SafetyStateMachine,
    SafetyVerdict,
};
use crate::types::{CellStore, PackSummary, Tick};

pub struct PackMonitor {
    store: CellStore,
    machine: SafetyStateMachine,
    limits: Limits,
    blacklist: Blacklist,
    timeout: Tick,
    tick: Tick,
}

impl PackMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        PackMonitor {
            store: CellStore::new(),
            machine: SafetyStateMachine::new(),
            limits: config.limits,
            blacklist: Blacklist::from_cells(config.blacklist),
            timeout: config.timeout_ticks,
            tick: 0,
        }
    }

    /// Decodes a received frame into the store, stamped with the current tick.
    pub fn handle_frame(&mut self, frame: &BusFrame) -> FrameKind {
        save_bms_data(&mut self.store, self.tick, frame)
    }

    /// Runs one evaluation cycle and advances the tick.
    pub fn evaluate(&mut self) -> SafetyVerdict {
        let voltages_pass = check_voltages(&self.store, &self.limits);
        let temperatures_pass = check_temperatures(&self.store, &self.blacklist, &self.limits);
        let liveness_ok = check_timestamps(&self.store, self.tick, self.timeout);

        let verdict = self.machine.step(voltages_pass, temperatures_pass, liveness_ok);

        if !voltages_pass || !temperatures_pass {
            debug!(
                "Tick {}: snapshot failed (voltages {}, temperatures {})",
                self.tick,
                voltages_pass,
                temperatures_pass
            );
        }
        if !liveness_ok {
            warn!("Tick {}: slave BMS timeout", self.tick);
        }

        self.tick = self.tick.wrapping_add(1);
        verdict
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn summary(&self) -> PackSummary {
        self.store.summary()
    }
}
