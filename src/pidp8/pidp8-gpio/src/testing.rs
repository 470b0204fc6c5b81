//! Simulated GPIO register block wired to a virtual front panel
//!
//! Models function select, output latches and pull resistors for bank 0,
//! plus a switch matrix: a closed switch shorts its column to its row select
//! pin, so the column reads low while that row is driven low. Every write is
//! checked against the multiplexing rules and violations are counted.

use std::cell::RefCell;

use pidp8_core::constants::{COLUMNS, LED_ROWS, SWITCH_ROWS};

use crate::mmio::registers::*;
use crate::mmio::RegisterBlock;
use crate::pins::PinMap;

#[derive(Default)]
struct State {
    fsel: [u32; 6],
    latch: u32,
    pud: u32,
    pud_clock: u32,
    pulled_up: u32,
    pulled_down: u32,
    pull_log: Vec<(usize, u32)>,
    closed: [u16; SWITCH_ROWS],
    lamps_seen: [u16; LED_ROWS],
    asserted_led_rows: u32,
    led_row_overlaps: usize,
    switch_row_overlaps: usize,
    cross_phase: usize,
}

pub struct FakePanel {
    pins: PinMap,
    state: RefCell<State>,
}

impl FakePanel {
    pub fn new(pins: PinMap) -> Self {
        FakePanel {
            pins,
            state: RefCell::new(State::default()),
        }
    }

    /// Sets the closed switches of one row (bit `j` = column `j`)
    pub fn close_switches(&self, row: usize, columns: u16) {
        self.state.borrow_mut().closed[row] = columns;
    }

    pub fn pull_log(&self) -> Vec<(usize, u32)> {
        self.state.borrow().pull_log.clone()
    }

    pub fn pulled_up(&self) -> u32 {
        self.state.borrow().pulled_up
    }

    pub fn pulled_down(&self) -> u32 {
        self.state.borrow().pulled_down
    }

    /// Columns that were lit the last time each LED row was enabled
    pub fn lamps_seen(&self) -> [u16; LED_ROWS] {
        self.state.borrow().lamps_seen
    }

    pub fn led_row_overlaps(&self) -> usize {
        self.state.borrow().led_row_overlaps
    }

    pub fn switch_row_overlaps(&self) -> usize {
        self.state.borrow().switch_row_overlaps
    }

    pub fn cross_phase(&self) -> usize {
        self.state.borrow().cross_phase
    }

    /// Pins currently configured as outputs
    pub fn outputs(&self) -> u32 {
        let state = self.state.borrow();
        Self::output_mask(&state)
    }

    fn output_mask(state: &State) -> u32 {
        let mut mask = 0;
        for pin in 0..32u32 {
            let word = (pin / 10) as usize;
            if word < state.fsel.len() && (state.fsel[word] >> ((pin % 10) * 3)) & 0b111 == 0b001 {
                mask |= 1 << pin;
            }
        }
        mask
    }

    fn levels(&self, state: &State) -> u32 {
        let outputs = Self::output_mask(state);
        let mut levels = state.latch & outputs;

        // Inputs follow their pulls unless a closed switch sinks them
        levels |= state.pulled_up & !outputs;
        for (column, pin) in self.pins.columns.iter().enumerate() {
            let bit = 1 << pin;
            if outputs & bit != 0 {
                continue;
            }
            for (row, row_pin) in self.pins.switch_rows.iter().enumerate() {
                let row_bit = 1 << row_pin;
                let sinking = outputs & row_bit != 0 && state.latch & row_bit == 0;
                if sinking && state.closed[row] & (1 << column) != 0 {
                    levels &= !bit;
                }
            }
        }
        levels
    }

    fn check(&self, state: &mut State) {
        let outputs = Self::output_mask(state);

        let led_rows = state.latch & outputs & self.pins.led_row_mask();
        if led_rows.count_ones() > 1 {
            state.led_row_overlaps += 1;
        }
        let switch_rows = !state.latch & outputs & self.pins.switch_row_mask();
        if switch_rows.count_ones() > 1 {
            state.switch_row_overlaps += 1;
        }
        if led_rows != 0 && switch_rows != 0 {
            state.cross_phase += 1;
        }

        // Record the lamp pattern each time a row comes on
        let newly_on = led_rows & !state.asserted_led_rows;
        for (row, pin) in self.pins.led_rows.iter().enumerate() {
            if newly_on & (1 << pin) != 0 {
                let mut lit = 0;
                for (column, column_pin) in self.pins.columns.iter().enumerate() {
                    let bit = 1 << column_pin;
                    if outputs & bit != 0 && state.latch & bit == 0 {
                        lit |= 1 << column;
                    }
                }
                state.lamps_seen[row] = lit;
            }
        }
        state.asserted_led_rows = led_rows;
    }
}

impl RegisterBlock for FakePanel {
    fn read(&self, word: usize) -> u32 {
        let state = self.state.borrow();
        match word {
            GPFSEL0..=5 => state.fsel[word - GPFSEL0],
            GPLEV0 => self.levels(&state),
            GPPUD => state.pud,
            GPPUDCLK0 => state.pud_clock,
            _ => 0,
        }
    }

    fn write(&self, word: usize, value: u32) {
        let mut state = self.state.borrow_mut();
        match word {
            GPFSEL0..=5 => state.fsel[word - GPFSEL0] = value,
            GPSET0 => state.latch |= value,
            GPCLR0 => state.latch &= !value,
            GPPUD => {
                state.pud = value;
                state.pull_log.push((word, value));
            }
            GPPUDCLK0 => {
                state.pud_clock = value;
                state.pull_log.push((word, value));
                let pud = state.pud;
                match pud {
                    0b10 => {
                        state.pulled_up |= value;
                        state.pulled_down &= !value;
                    }
                    0b01 => {
                        state.pulled_down |= value;
                        state.pulled_up &= !value;
                    }
                    _ => {
                        state.pulled_up &= !value;
                        state.pulled_down &= !value;
                    }
                }
            }
            _ => {}
        }
        self.check(&mut state);
    }
}

#[cfg(test)]
mod fake_tests {
    use super::*;
    use crate::gpio::Gpio;

    #[test]
    fn test_closed_switch_sinks_column() {
        let pins = PinMap::standard();
        let fake = FakePanel::new(pins.clone());
        let gpio = Gpio::new(&fake);
        fake.close_switches(1, 0b10);

        gpio.write_pull_code(crate::gpio::Pull::Up);
        gpio.write_pull_clock(pins.column_mask());

        gpio.set_output(pins.switch_rows[1]);
        gpio.clear_bits(1 << pins.switch_rows[1]);
        assert!(!gpio.is_high(pins.columns[1]));
        assert!(gpio.is_high(pins.columns[0]));

        gpio.set_input(pins.switch_rows[1]);
        assert!(gpio.is_high(pins.columns[1]));
        assert_eq!(COLUMNS, pins.columns.len());
    }
}
