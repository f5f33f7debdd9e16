use embassy_stm32::can::filter::Mask32;
use embassy_stm32::can::{
    Can, CanRx, CanTx, Envelope, Fifo, Frame, Rx0InterruptHandler, Rx1InterruptHandler,
    SceInterruptHandler, TxInterruptHandler,
};
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{CAN1, PA11, PA12};
use embassy_stm32::bind_interrupts;
use embassy_time::{with_timeout, Duration};
use static_cell::StaticCell;

use bms_hv_rust::types::FrameError;
use bms_hv_rust::{BusFrame, BusTx};

bind_interrupts!(struct Irqs {
    CAN1_RX0 => Rx0InterruptHandler<CAN1>;
    CAN1_RX1 => Rx1InterruptHandler<CAN1>;
    CAN1_SCE => SceInterruptHandler<CAN1>;
    CAN1_TX => TxInterruptHandler<CAN1>;
});

static CAN: StaticCell<Can<'static>> = StaticCell::new();

const TX_TIMEOUT_MS: u64 = 50;

#[derive(Debug, Copy, Clone, Eq, PartialEq, defmt::Format)]
pub enum CanError {
    Timeout,
    InvalidFrame,
    ReadError,
    Rejected(FrameError),
}

/// Transmit half. Toggles the broadcast activity LED on every frame sent.
pub struct CanController {
    tx: CanTx<'static>,
    activity_led: Output<'static>,
}

/// Receive half, owned by the receive task.
pub struct CanReceiver {
    rx: CanRx<'static>,
}

impl CanController {
    /// Brings up CAN1 at `bitrate`, accepting every standard frame.
    pub async fn new_can1(
        peri: CAN1,
        rx_pin: PA11,
        tx_pin: PA12,
        bitrate: u32,
        activity_led: Output<'static>,
    ) -> (Self, CanReceiver) {
        let mut can = Can::new(peri, rx_pin, tx_pin, Irqs);

        can.modify_filters()
            .enable_bank(0, Fifo::Fifo0, Mask32::accept_all());
        can.modify_config()
            .set_loopback(false)
            .set_silent(false)
            .set_bitrate(bitrate);
        can.enable().await;

        let can = CAN.init(can);
        let (tx, rx) = can.split();

        (CanController { tx, activity_led }, CanReceiver { rx })
    }
}

impl BusTx for CanController {
    type Error = CanError;

    async fn send(&mut self, frame: &BusFrame) -> Result<(), CanError> {
        let hal_frame =
            Frame::new_standard(frame.id(), frame.payload()).map_err(|_| CanError::InvalidFrame)?;

        match with_timeout(Duration::from_millis(TX_TIMEOUT_MS), self.tx.write(&hal_frame)).await {
            Ok(_) => {
                self.activity_led.toggle();
                Ok(())
            }
            Err(_) => Err(CanError::Timeout),
        }
    }
}

impl CanReceiver {
    pub async fn read(&mut self) -> Result<BusFrame, CanError> {
        match self.rx.read().await {
            Ok(envelope) => from_envelope(&envelope),
            Err(_) => Err(CanError::ReadError),
        }
    }
}

fn from_envelope(envelope: &Envelope) -> Result<BusFrame, CanError> {
    let rx_frame = &envelope.frame;
    let len = (rx_frame.header().len() as usize).min(rx_frame.data().len());

    BusFrame::from_can_id(*rx_frame.id(), &rx_frame.data()[..len]).map_err(CanError::Rejected)
}
