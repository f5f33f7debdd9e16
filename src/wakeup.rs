//! Periodic poll of the slave BMS modules.
//!
//! Each sweep sends one frame per device carrying the mode flag, so slaves
//! both report fresh data and know whether readings are enabled.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;

use crate::can_management::{encode_id, BusFrame, Category};
use crate::types::N_BMS;

/// Transmit half of the bus.
#[allow(async_fn_in_trait)]
pub trait BusTx {
    type Error;

    async fn send(&mut self, frame: &BusFrame) -> Result<(), Self::Error>;
}

pub struct WakeupBroadcaster {
    interval_ms: u32,
}

impl WakeupBroadcaster {
    pub const fn new(interval_ms: u32) -> Self {
        WakeupBroadcaster { interval_ms }
    }

    /// Poll frame for the 0-based `device`: id `0xN00`, one byte of mode.
    pub fn poll_frame(device: usize, readings_enabled: bool) -> BusFrame {
        BusFrame::new(
            encode_id(device, Category::Heartbeat, 0),
            &[readings_enabled as u8],
        )
    }

    /// Polls every device once, in order, waiting the interval after each.
    /// Returns how many frames went out; send errors are logged and skipped.
    pub async fn sweep<M, T, D>(&self, bus: &mut T, delay: &mut D, mode: &Mutex<M, bool>) -> usize
    where
        M: RawMutex,
        T: BusTx,
        D: DelayNs,
    {
        let mut sent = 0;

        for device in 0..N_BMS {
            let readings_enabled = *mode.lock().await;
            let frame = Self::poll_frame(device, readings_enabled);

            match bus.send(&frame).await {
                Ok(()) => sent += 1,
                Err(_) => warn!("Wakeup to BMS {} failed", device + 1),
            }

            delay.delay_ms(self.interval_ms).await;
        }

        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[derive(Default)]
    struct MockBus {
        sent: heapless::Vec<BusFrame, 16>,
        fail_device: Option<u16>,
    }

    impl BusTx for MockBus {
        type Error = ();

        async fn send(&mut self, frame: &BusFrame) -> Result<(), ()> {
            if self.fail_device == Some(frame.id() >> 8) {
                return Err(());
            }
            self.sent.push(*frame).map_err(|_| ())
        }
    }

    #[derive(Default)]
    struct MockDelay {
        waited_ms: u32,
    }

    impl DelayNs for MockDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.waited_ms += ns / 1_000_000;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.waited_ms += ms;
        }
    }

    #[test]
    fn poll_frame_layout() {
        let frame = WakeupBroadcaster::poll_frame(0, true);
        assert_eq!(frame.id(), 0x100);
        assert_eq!(frame.payload(), &[1]);

        let frame = WakeupBroadcaster::poll_frame(4, false);
        assert_eq!(frame.id(), 0x500);
        assert_eq!(frame.payload(), &[0]);
    }

    #[test]
    fn sweep_polls_every_device_in_order() {
        let broadcaster = WakeupBroadcaster::new(100);
        let mode: Mutex<CriticalSectionRawMutex, bool> = Mutex::new(true);
        let mut bus = MockBus::default();
        let mut delay = MockDelay::default();

        let sent = block_on(broadcaster.sweep(&mut bus, &mut delay, &mode));

        assert_eq!(sent, N_BMS);
        let ids: heapless::Vec<u16, 16> = bus.sent.iter().map(|f| f.id()).collect();
        assert_eq!(&ids[..], &[0x100, 0x200, 0x300, 0x400, 0x500]);
        assert!(bus.sent.iter().all(|f| f.payload() == [1]));
        assert_eq!(delay.waited_ms, 500);
    }

    #[test]
    fn sweep_reports_charge_mode() {
        let broadcaster = WakeupBroadcaster::new(100);
        let mode: Mutex<CriticalSectionRawMutex, bool> = Mutex::new(false);
        let mut bus = MockBus::default();
        let mut delay = MockDelay::default();

        block_on(broadcaster.sweep(&mut bus, &mut delay, &mode));

        assert!(bus.sent.iter().all(|f| f.payload() == [0]));
    }

    #[test]
    fn send_error_does_not_stop_sweep() {
        let broadcaster = WakeupBroadcaster::new(100);
        let mode: Mutex<CriticalSectionRawMutex, bool> = Mutex::new(true);
        let mut bus = MockBus {
            fail_device: Some(3),
            ..MockBus::default()
        };
        let mut delay = MockDelay::default();

        let sent = block_on(broadcaster.sweep(&mut bus, &mut delay, &mode));

        assert_eq!(sent, N_BMS - 1);
        assert!(bus.sent.iter().all(|f| f.id() != 0x300));
        assert_eq!(delay.waited_ms, 500);
    }
}
