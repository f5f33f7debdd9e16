//! Fail-safe output and status indicators.

use embedded_hal::digital::{OutputPin, PinState, StatefulOutputPin};

/// Level of the AMS OK line for a given verdict.
///
/// In charge mode (`readings_enabled == false`) the line is forced high,
/// charge protection is left to the charger.
pub fn fail_safe_output(ok: bool, readings_enabled: bool) -> bool {
    ok || !readings_enabled
}

pub struct OutputController<P> {
    ams_ok: P,
    all_clear_led: P,
    heartbeat_led: P,
}

impl<P: StatefulOutputPin> OutputController<P> {
    /// Takes the pins and drives the fail-safe line low until the first
    /// evaluation.
    pub fn new(mut ams_ok: P, mut all_clear_led: P, heartbeat_led: P) -> Result<Self, P::Error> {
        ams_ok.set_low()?;
        all_clear_led.set_low()?;

        Ok(OutputController {
            ams_ok,
            all_clear_led,
            heartbeat_led,
        })
    }

    /// Drives all outputs for one evaluation tick and returns the level
    /// written to the fail-safe line.
    pub fn apply(&mut self, ok: bool, readings_enabled: bool) -> Result<bool, P::Error> {
        let level = fail_safe_output(ok, readings_enabled);

        self.ams_ok.set_state(PinState::from(level))?;
        self.all_clear_led.set_state(PinState::from(ok))?;
        self.heartbeat_led.toggle()?;

        Ok(level)
    }
}
