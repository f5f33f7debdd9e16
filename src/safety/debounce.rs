//! Debounced pass/fail state for the pack.
//!
//! Voltage and temperature results are kept for the last [`HISTORY_DEPTH`]
//! evaluations. A condition counts as passing while any of those
//! evaluations passed, so a fault must persist for the whole window before
//! it trips the output, and a single passing evaluation clears it again.
//! Liveness is taken as-is for every tick.

use heapless::HistoryBuffer;

/// Evaluations remembered per condition (4 s at 500 ms).
pub const HISTORY_DEPTH: usize = 8;

/// Rolling window of pass/fail results, starting out all-fail.
pub struct HealthHistory {
    results: HistoryBuffer<bool, HISTORY_DEPTH>,
}

impl Default for HealthHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthHistory {
    pub const fn new() -> Self {
        HealthHistory {
            results: HistoryBuffer::new(),
        }
    }

    pub fn push(&mut self, passed: bool) {
        self.results.write(passed);
    }

    /// True if any evaluation in the window passed.
    pub fn any_passed(&self) -> bool {
        self.results.as_slice().iter().any(|&passed| passed)
    }

    /// Number of evaluations recorded, saturating at the depth.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.len() == 0
    }
}

/// Outcome of one evaluation tick.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyVerdict {
    /// Debounced voltage state.
    pub voltages_ok: bool,
    /// Debounced temperature state.
    pub temperatures_ok: bool,
    pub liveness_ok: bool,
    pub ok: bool,
}

#[derive(Default)]
pub struct SafetyStateMachine {
    voltage_history: HealthHistory,
    temperature_history: HealthHistory,
}

impl SafetyStateMachine {
    pub const fn new() -> Self {
        SafetyStateMachine {
            voltage_history: HealthHistory::new(),
            temperature_history: HealthHistory::new(),
        }
    }

    pub fn step(&mut self, voltages_pass: bool, temperatures_pass: bool, liveness_ok: bool) -> SafetyVerdict {
        self.voltage_history.push(voltages_pass);
        self.temperature_history.push(temperatures_pass);

        let voltages_ok = self.voltage_history.any_passed();
        let temperatures_ok = self.temperature_history.any_passed();

        SafetyVerdict {
            voltages_ok,
            temperatures_ok,
            liveness_ok,
            ok: voltages_ok && temperatures_ok && liveness_ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_out_failed() {
        let history = HealthHistory::new();
        assert!(history.is_empty());
        assert!(!history.any_passed());
    }

    #[test]
    fn window_saturates_at_depth() {
        let mut history = HealthHistory::new();
        for _ in 0..20 {
            history.push(false);
        }
        assert_eq!(history.len(), HISTORY_DEPTH);
    }

    #[test]
    fn single_failure_does_not_trip() {
        let mut machine = SafetyStateMachine::new();
        assert!(machine.step(true, true, true).ok);
        assert!(machine.step(false, false, true).ok);
        assert!(machine.step(true, true, true).ok);
    }

    #[test]
    fn trips_after_full_window_of_failures() {
        let mut machine = SafetyStateMachine::new();
        machine.step(true, true, true);

        for _ in 0..HISTORY_DEPTH - 1 {
            let verdict = machine.step(false, true, true);
            assert!(verdict.voltages_ok);
            assert!(verdict.ok);
        }

        let verdict = machine.step(false, true, true);
        assert!(!verdict.voltages_ok);
        assert!(verdict.temperatures_ok);
        assert!(!verdict.ok);
    }

    #[test]
    fn temperature_trips_independently() {
        let mut machine = SafetyStateMachine::new();
        machine.step(true, true, true);

        let mut verdict = machine.step(true, false, true);
        for _ in 1..HISTORY_DEPTH {
            verdict = machine.step(true, false, true);
        }
        assert!(verdict.voltages_ok);
        assert!(!verdict.temperatures_ok);
        assert!(!verdict.ok);
    }

    #[test]
    fn recovers_on_first_passing_tick() {
        let mut machine = SafetyStateMachine::new();
        for _ in 0..3 * HISTORY_DEPTH {
            assert!(!machine.step(false, false, true).ok);
        }
        assert!(machine.step(true, true, true).ok);
    }

    #[test]
    fn liveness_is_not_debounced() {
        let mut machine = SafetyStateMachine::new();
        for _ in 0..HISTORY_DEPTH {
            machine.step(true, true, true);
        }

        let verdict = machine.step(true, true, false);
        assert!(!verdict.liveness_ok);
        assert!(!verdict.ok);
        assert!(machine.step(true, true, true).ok);
    }
}
