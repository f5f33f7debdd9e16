use crate::types::{CellStore, Tick};

/// Ticks a device may stay silent before the pack is considered unsafe.
/// At a 500 ms cadence this is 3 s.
pub const BMS_TIMEOUT_TICKS: Tick = 6;

/// True when every device has reported within `timeout` ticks of `now`.
///
/// Elapsed time is `now.wrapping_sub(last_seen)` on the 32-bit tick, so the
/// comparison stays valid when the counter wraps. A device that has never
/// reported is stale.
pub fn check_timestamps(store: &CellStore, now: Tick, timeout: Tick) -> bool {
    store
        .last_seen_all()
        .iter()
        .all(|seen| matches!(seen, Some(last) if now.wrapping_sub(*last) <= timeout))
}
