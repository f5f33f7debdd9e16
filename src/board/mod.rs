pub mod can_controller;

pub use can_controller::{CanController, CanError, CanReceiver};

use embassy_stm32::time::Hertz;
use embassy_stm32::Config;

/// Clock tree for the STM32F405RG master board: 12 MHz HSE crystal, PLL to a
/// 168 MHz system clock, APB1 at 42 MHz for bxCAN.
///
/// `prediv` assumes the 12 MHz crystal (12 / 6 = 2 MHz PLL input). Boards
/// fitted with another crystal need `freq` and `prediv` changed together.
pub fn prepare_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV6,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2),
            divq: Some(PllQDiv::DIV7),
            divr: None,
        });

        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        config.rcc.sys = Sysclk::PLL1_P;
    }
    config
}
