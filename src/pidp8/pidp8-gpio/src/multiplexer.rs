use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use pidp8_core::constants::{LED_ROWS, SWITCH_ROWS};
use pidp8_core::notes::{post, NoteProducer, ScanNote};
use pidp8_core::scan::{gather_columns, scatter_columns};
use pidp8_core::Panel;

use crate::gpio::Gpio;
use crate::mmio::RegisterBlock;
use crate::pins::{self, pause, PinMap};

/// Multiplexing intervals
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub dwell: Duration,   // each LED row stays lit this long
    pub row_gap: Duration, // dark gap between LED rows, against ghosting
    pub settle: Duration,  // switch row select to column read
}

impl Timing {
    pub fn with_dwell(dwell: Duration) -> Self {
        Timing {
            dwell,
            row_gap: Duration::from_micros(10),
            settle: dwell / 100,
        }
    }

    /// No pauses at all; for driving a simulated panel
    pub fn immediate() -> Self {
        let zero = Duration::from_secs(0);
        Timing {
            dwell: zero,
            row_gap: zero,
            settle: zero,
        }
    }

    /// Nominal duration of one full refresh and scan cycle
    pub fn cycle(&self) -> Duration {
        (self.dwell + self.row_gap) * LED_ROWS as u32 + self.settle * SWITCH_ROWS as u32
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::with_dwell(Duration::from_micros(300))
    }
}

// A cycle this many times over nominal is reported
const SLOW_CYCLE_FACTOR: u32 = 4;

/// Time-slices the shared column lines between the lamp and switch matrices
///
/// Sole reader of the lamp rows and sole writer of the switch rows, switch
/// events and DEP calibration in `Panel`.
pub struct Multiplexer<'a, R: RegisterBlock> {
    gpio: Gpio<R>,
    pins: PinMap,
    timing: Timing,
    panel: &'a Panel,
    notes: Option<NoteProducer<'a>>,
    cycles: u64,
}

impl<'a, R: RegisterBlock> Multiplexer<'a, R> {
    pub fn new(gpio: Gpio<R>, pins: PinMap, timing: Timing, panel: &'a Panel) -> Self {
        Multiplexer {
            gpio,
            pins,
            timing,
            panel,
            notes: None,
            cycles: 0,
        }
    }

    /// Diagnostics are posted here instead of being logged from the loop
    pub fn with_notes(mut self, notes: NoteProducer<'a>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn gpio(&self) -> &Gpio<R> {
        &self.gpio
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Lights the 8 LED rows one after the other
    pub fn refresh_leds(&mut self) {
        let columns = self.pins.column_mask();
        for pin in self.pins.columns.iter() {
            self.gpio.set_output(*pin);
        }

        for (row, pin) in self.pins.led_rows.iter().enumerate() {
            // Lamps are active low on the columns
            let lit = scatter_columns(self.panel.led_row(row), &self.pins.columns);
            self.gpio.set_bits(columns & !lit);
            self.gpio.clear_bits(lit);

            // Latch the level first so the row comes up already high
            let row_bit = 1 << pin;
            self.gpio.set_input(*pin);
            self.gpio.set_bits(row_bit);
            self.gpio.set_output(*pin);

            pause(self.timing.dwell);

            self.gpio.clear_bits(row_bit);
            self.gpio.set_input(*pin);
            pause(self.timing.row_gap);
        }
    }

    /// Reads the 3 switch rows into the panel
    pub fn scan_switches(&mut self) {
        // Columns idle high through their pull-ups
        for pin in self.pins.columns.iter() {
            self.gpio.set_input(*pin);
        }

        for (row, pin) in self.pins.switch_rows.iter().enumerate() {
            self.gpio.set_output(*pin);
            self.gpio.clear_bits(1 << pin);

            pause(self.timing.settle);

            let raw = gather_columns(self.gpio.levels(), &self.pins.columns);
            self.gpio.set_input(*pin);

            if let Some(orientation) = self.panel.apply_scan(row, raw) {
                post(&mut self.notes, ScanNote::DepCalibrated(orientation));
            }
        }
    }

    /// One LED refresh followed by one switch scan
    pub fn cycle(&mut self) {
        self.refresh_leds();
        self.scan_switches();
        self.cycles += 1;
    }

    /// Cycles until `terminate` is set, checked once per cycle
    pub fn run(&mut self, terminate: &AtomicBool) {
        let slow = self.timing.cycle() * SLOW_CYCLE_FACTOR;
        while !terminate.load(Ordering::Relaxed) {
            let started = Instant::now();
            self.cycle();

            let elapsed = started.elapsed();
            if slow > Duration::from_secs(0) && elapsed > slow {
                let micros = elapsed.as_micros().min(u32::MAX as u128) as u32;
                post(&mut self.notes, ScanNote::SlowCycle { micros });
            }
        }
        pins::release(&self.gpio, &self.pins);
    }
}
