use std::thread;
use std::time::Duration;

use log::{debug, info};
use pidp8_core::constants::{COLUMNS, LED_ROWS, SWITCH_ROWS};
use pidp8_core::scan::pin_mask;

use crate::gpio::{Gpio, Pull};
use crate::mmio::registers::PADS_BANK0;
use crate::mmio::RegisterBlock;

// Pause between clocked pull-resistor steps (datasheet asks for 150 cycles)
pub const SETTLE: Duration = Duration::from_micros(1);

/// Wiring of the panel onto GPIO pins
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinMap {
    pub led_rows: [u8; LED_ROWS],       // row enables of the lamp matrix
    pub columns: [u8; COLUMNS],         // shared lamp/switch columns
    pub switch_rows: [u8; SWITCH_ROWS], // row selects of the switch matrix
    pub serial: bool,                   // GPIO 14/15 left to the UART
}

impl PinMap {
    /// Default wiring, columns on GPIO 4-15
    pub const fn standard() -> Self {
        PinMap {
            led_rows: [20, 21, 22, 23, 24, 25, 26, 27],
            columns: [13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 15, 14],
            switch_rows: [16, 17, 18],
            serial: false,
        }
    }

    /// Serial-mod wiring, columns on GPIO 2-13
    pub const fn serial() -> Self {
        PinMap {
            led_rows: [20, 21, 22, 23, 24, 25, 26, 27],
            columns: [13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2],
            switch_rows: [16, 17, 18],
            serial: true,
        }
    }

    pub fn column_mask(&self) -> u32 {
        pin_mask(&self.columns)
    }

    pub fn led_row_mask(&self) -> u32 {
        pin_mask(&self.led_rows)
    }

    pub fn switch_row_mask(&self) -> u32 {
        pin_mask(&self.switch_rows)
    }
}

impl Default for PinMap {
    fn default() -> Self {
        PinMap::standard()
    }
}

pub(crate) fn pause(duration: Duration) {
    if duration > Duration::from_secs(0) {
        thread::sleep(duration);
    }
}

/// Latches a pull mode onto the pins in `mask`
///
/// Hardware order: mode code, settle, clock strobe, settle, then clear the
/// code and the strobe with a settle after each.
pub fn program_pull<R: RegisterBlock>(gpio: &Gpio<R>, pull: Pull, mask: u32, settle: Duration) {
    debug!("Programming pull {:?} on mask 0x{:08x}", pull, mask);
    gpio.write_pull_code(pull);
    pause(settle);
    gpio.write_pull_clock(mask);
    pause(settle);
    gpio.write_pull_code(Pull::Off);
    pause(settle);
    gpio.write_pull_clock(0);
    pause(settle);
}

/// Puts every panel pin into its idle configuration
///
/// All pins become inputs, LED row latches are cleared so the rows come up
/// low when they are later made outputs, and the pulls are programmed:
/// columns up, LED rows down against ghosting, switch rows floating.
pub fn configure<R: RegisterBlock>(gpio: &Gpio<R>, pins: &PinMap, settle: Duration) {
    for pin in pins.led_rows.iter() {
        gpio.set_input(*pin);
        gpio.clear_bits(1 << pin);
    }
    for pin in pins.columns.iter() {
        gpio.set_input(*pin);
    }
    for pin in pins.switch_rows.iter() {
        gpio.set_input(*pin);
    }

    program_pull(gpio, Pull::Up, pins.column_mask(), settle);
    program_pull(gpio, Pull::Down, pins.led_row_mask(), settle);
    program_pull(gpio, Pull::Off, pins.switch_row_mask(), settle);

    info!(
        "Panel pins configured ({} layout)",
        if pins.serial { "serial mod" } else { "default" }
    );
}

/// Returns every panel pin to input, the safe idle state
pub fn release<R: RegisterBlock>(gpio: &Gpio<R>, pins: &PinMap) {
    for pin in pins
        .columns
        .iter()
        .chain(pins.led_rows.iter())
        .chain(pins.switch_rows.iter())
    {
        gpio.set_input(*pin);
    }
}

/// Disables input hysteresis on GPIO 0-27 to raise V_il
///
/// `pads` must be the pad control block. The top byte is a write password.
pub fn disable_hysteresis<R: RegisterBlock>(pads: &R) {
    let value = pads.read(PADS_BANK0);
    pads.write(PADS_BANK0, (value & 0xf7) | (0x5A << 24));
}
