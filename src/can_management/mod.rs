pub mod decode;
pub mod frame;

pub use decode::{decode_id, encode_id, Category, FrameKind};
pub use frame::{BusFrame, MAX_DLC};

use crate::types::{CellStore, FrameError, Tick};

/// Routes one received frame into the store.
///
/// Every frame from a known device refreshes its liveness timestamp, data
/// frames then go to the voltage or temperature table. Malformed payloads,
/// including ones longer than a CAN frame can carry, are dropped without
/// touching any cell.
pub fn save_bms_data(store: &mut CellStore, tick: Tick, frame: &BusFrame) -> FrameKind {
    let kind = decode_id(frame.id());

    let Some(device) = kind.device() else {
        debug!("Dropping frame {=u16:#x}: unknown device", frame.id());
        return kind;
    };

    let result = store
        .record_device_seen(device, tick)
        .and_then(|_| checked_payload(frame))
        .and_then(|payload| store_payload(store, kind, payload));

    if let Err(e) = result {
        debug!("Dropping frame {=u16:#x}: {}", frame.id(), e);
    }

    kind
}

fn checked_payload(frame: &BusFrame) -> Result<&[u8], FrameError> {
    if frame.is_oversized() {
        return Err(FrameError::LengthMismatch {
            expected: MAX_DLC,
            actual: frame.len(),
        });
    }
    Ok(frame.payload())
}

fn store_payload(store: &mut CellStore, kind: FrameKind, payload: &[u8]) -> Result<(), FrameError> {
    match kind {
        FrameKind::Voltage { device, bank, offset } => {
            store.write_voltages(device, bank, offset, payload)?;
        }
        FrameKind::Temperature { device, bank, offset } => {
            store.write_temperatures(device, bank, offset, payload)?;
        }
        // We sent this, or nothing to store
        FrameKind::Heartbeat { .. } | FrameKind::Unknown { .. } | FrameKind::Invalid => {}
    }
    Ok(())
}
