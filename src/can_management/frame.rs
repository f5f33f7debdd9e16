use embedded_can::Id;

use crate::types::FrameError;

/// Maximum payload of a classic CAN frame.
pub const MAX_DLC: usize = 8;

/// A standard-id bus frame, independent of the HAL frame type so the decode
/// path can run (and be tested) without a CAN peripheral.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusFrame {
    id: u16,
    data: [u8; MAX_DLC],
    len: usize,
}

impl BusFrame {
    /// Builds a frame. `len()` keeps the length of `data` even when it is
    /// over 8 bytes; such a frame is oversized and never reaches the store.
    pub fn new(id: u16, data: &[u8]) -> Self {
        let mut frame_data = [0u8; MAX_DLC];
        let copied = data.len().min(MAX_DLC);

        frame_data[..copied].copy_from_slice(&data[..copied]);

        BusFrame {
            id,
            data: frame_data,
            len: data.len(),
        }
    }

    /// Maps a received HAL identifier. Slave modules only use 11-bit ids,
    /// extended frames belong to other nodes on the bus and are rejected.
    pub fn from_can_id(id: Id, data: &[u8]) -> Result<Self, FrameError> {
        match id {
            Id::Standard(id) => Ok(Self::new(id.as_raw(), data)),
            Id::Extended(id) => Err(FrameError::ExtendedId(id.as_raw())),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Payload bytes carried by the frame, at most 8.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(MAX_DLC)]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_oversized(&self) -> bool {
        self.len > MAX_DLC
    }
}
