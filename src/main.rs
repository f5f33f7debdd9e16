#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Ticker, Timer};
use libm::roundf;
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

use bms_hv_rust::{MonitorConfig, OutputController, PackMonitor, WakeupBroadcaster};

mod board;

use board::{prepare_config, CanController, CanError, CanReceiver};

static MONITOR: StaticCell<Mutex<CriticalSectionRawMutex, PackMonitor>> = StaticCell::new();
static READINGS_ENABLED: StaticCell<Mutex<CriticalSectionRawMutex, bool>> = StaticCell::new();

const CONFIG: MonitorConfig = MonitorConfig::new();
const MODE_SAMPLE_MILLISEC: u64 = 10;

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let p = embassy_stm32::init(prepare_config());

    // Pulled low for charge mode
    let en_readings = Input::new(p.PB0, Pull::Up);

    let ams_ok = Output::new(p.PA2, Level::Low, Speed::High);
    let all_clear_led = Output::new(p.PC11, Level::Low, Speed::High);
    let heartbeat_led = Output::new(p.PC13, Level::Low, Speed::High);
    let rx_led = Output::new(p.PC9, Level::Low, Speed::High);
    let info_led = Output::new(p.PC8, Level::Low, Speed::High);

    let outputs = OutputController::new(ams_ok, all_clear_led, heartbeat_led)
        .unwrap_or_else(|e| match e {});

    let readings_enabled = Mutex::new(en_readings.is_high());
    let readings_enabled = StaticCell::init(&READINGS_ENABLED, readings_enabled);

    let monitor = Mutex::new(PackMonitor::new(&CONFIG));
    let monitor = StaticCell::init(&MONITOR, monitor);

    let (can_tx, can_rx) =
        CanController::new_can1(p.CAN1, p.PA11, p.PA12, CONFIG.can_bitrate, info_led).await;

    spawner.spawn(mode_sense(en_readings, readings_enabled)).unwrap();
    spawner.spawn(read_can(can_rx, monitor, rx_led)).unwrap();
    spawner.spawn(wakeup(can_tx, readings_enabled)).unwrap();

    Timer::after_millis(CONFIG.settle_ms).await;

    spawner.spawn(cell_check(monitor, readings_enabled, outputs)).unwrap();

    loop {
        Timer::after_millis(10000).await;
    }
}

#[embassy_executor::task]
async fn mode_sense(
    en_readings: Input<'static>,
    readings_enabled: &'static Mutex<CriticalSectionRawMutex, bool>,
) {
    loop {
        let level = en_readings.is_high();
        let mut enabled = readings_enabled.lock().await;
        if *enabled != level {
            info!("Readings {}", if level { "enabled" } else { "disabled (charge mode)" });
        }
        *enabled = level;
        drop(enabled);

        Timer::after_millis(MODE_SAMPLE_MILLISEC).await;
    }
}

#[embassy_executor::task]
async fn read_can(
    mut can: CanReceiver,
    monitor: &'static Mutex<CriticalSectionRawMutex, PackMonitor>,
    mut rx_led: Output<'static>,
) {
    loop {
        match can.read().await {
            Ok(frame) => {
                rx_led.toggle();
                let mut monitor_data = monitor.lock().await;
                monitor_data.handle_frame(&frame);
                drop(monitor_data);
            }
            Err(CanError::Rejected(e)) => {
                defmt::debug!("Ignoring frame: {}", e);
            }
            Err(e) => {
                defmt::error!("CAN read failed: {}", e);
            }
        }
    }
}

#[embassy_executor::task]
async fn wakeup(
    mut can: CanController,
    readings_enabled: &'static Mutex<CriticalSectionRawMutex, bool>,
) {
    let broadcaster = WakeupBroadcaster::new(CONFIG.wakeup_interval_ms);
    let mut delay = Delay;

    loop {
        broadcaster.sweep(&mut can, &mut delay, readings_enabled).await;
    }
}

#[embassy_executor::task]
async fn cell_check(
    monitor: &'static Mutex<CriticalSectionRawMutex, PackMonitor>,
    readings_enabled: &'static Mutex<CriticalSectionRawMutex, bool>,
    mut outputs: OutputController<Output<'static>>,
) {
    let mut ticker = Ticker::every(Duration::from_millis(CONFIG.check_period_ms));

    loop {
        let mut monitor_data = monitor.lock().await;
        let tick = monitor_data.tick();
        let verdict = monitor_data.evaluate();
        let summary = monitor_data.summary();
        drop(monitor_data);

        let enabled = *readings_enabled.lock().await;
        let ams_ok = outputs
            .apply(verdict.ok, enabled)
            .unwrap_or_else(|e| match e {});

        info!(
            "Tick {}: ok={} ams_ok={} volt={} temp={} alive={}",
            tick, verdict.ok, ams_ok, verdict.voltages_ok, verdict.temperatures_ok, verdict.liveness_ok
        );
        info!(
            "Cells: min {} mV, max {} mV, max {} C",
            roundf(summary.min_volt as f32 / 10f32),
            roundf(summary.max_volt as f32 / 10f32),
            summary.max_temp as f32 / 100f32
        );

        ticker.next().await;
    }
}
