use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use crate::constants::{control, fields, rows, LED_ROWS, ROW_MASK, SWITCH_ROWS};
use crate::scan::{logical_state, rising_edges};

/// Named switches of the panel, each living in exactly one switch row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    Start,
    LoadAdd,
    Dep,
    Exam,
    Cont,
    Stop,
    SingStep,
    SingInst,
    /// Switch register by bit number 0..=11; bit 11 is the leftmost switch
    Sr(u8),
}

impl Switch {
    pub fn row(self) -> usize {
        match self {
            Switch::Sr(_) => rows::SWITCH_REGISTER,
            _ => rows::CONTROL,
        }
    }

    pub fn mask(self) -> u16 {
        let bit = match self {
            Switch::Start => control::START,
            Switch::LoadAdd => control::LOAD_ADD,
            Switch::Dep => control::DEP,
            Switch::Exam => control::EXAM,
            Switch::Cont => control::CONT,
            Switch::Stop => control::STOP,
            Switch::SingStep => control::SING_STEP,
            Switch::SingInst => control::SING_INST,
            Switch::Sr(n) => return (1 << (n as u16 & 0xF)) & ROW_MASK,
        };
        1 << bit
    }
}

/// Multi-bit selector fields on the fields row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    DataField,
    InstField,
}

impl Field {
    pub fn shift(self) -> u16 {
        match self {
            Field::DataField => fields::DF_SHIFT,
            Field::InstField => fields::IF_SHIFT,
        }
    }

    /// Extracts the field value (0-7) from a fields-row word
    pub fn extract(self, row_word: u16) -> u8 {
        ((row_word >> self.shift()) & fields::FIELD_MASK) as u8
    }
}

/// Mounting polarity of the DEP switch, settled once on the first scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DepOrientation {
    Unknown = 0,
    Normal = 1,
    Inverted = 2,
}

impl DepOrientation {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => DepOrientation::Normal,
            2 => DepOrientation::Inverted,
            _ => DepOrientation::Unknown,
        }
    }
}

/// Shared front panel state
///
/// Lamps are written by the emulator and read by the multiplexer. Switch
/// state, switch events and the DEP calibration are written only by the
/// multiplexer. Every row is an independent atomic word, so a reader may see
/// rows from different scan cycles; no named switch spans two rows.
pub struct Panel {
    leds: [AtomicU16; LED_ROWS],
    switches: [AtomicU16; SWITCH_ROWS],
    events: [AtomicU16; SWITCH_ROWS],
    dep_orientation: AtomicU8,
}

#[allow(clippy::declare_interior_mutable_const)]
const ZERO_ROW: AtomicU16 = AtomicU16::new(0);

impl Panel {
    pub const fn new() -> Self {
        Self {
            leds: [ZERO_ROW; LED_ROWS],
            switches: [ZERO_ROW; SWITCH_ROWS],
            events: [ZERO_ROW; SWITCH_ROWS],
            dep_orientation: AtomicU8::new(DepOrientation::Unknown as u8),
        }
    }

    // Lamp side

    /// Sets a whole lamp row (bit `j` lights column `j`); out-of-range rows are ignored
    pub fn set_led_row(&self, row: usize, word: u16) {
        if let Some(slot) = self.leds.get(row) {
            slot.store(word & ROW_MASK, Ordering::Relaxed);
        }
    }

    pub fn led_row(&self, row: usize) -> u16 {
        self.leds
            .get(row)
            .map_or(0, |slot| slot.load(Ordering::Relaxed))
    }

    // Switch side

    pub fn switch_row(&self, row: usize) -> u16 {
        self.switches
            .get(row)
            .map_or(0, |slot| slot.load(Ordering::Relaxed))
    }

    /// Copies all three switch rows
    pub fn switch_rows(&self) -> [u16; SWITCH_ROWS] {
        [self.switch_row(0), self.switch_row(1), self.switch_row(2)]
    }

    pub fn is_set(&self, switch: Switch) -> bool {
        self.switch_row(switch.row()) & switch.mask() != 0
    }

    pub fn field(&self, field: Field) -> u8 {
        field.extract(self.switch_row(rows::FIELDS))
    }

    // Edge events

    pub fn event_row(&self, row: usize) -> u16 {
        self.events
            .get(row)
            .map_or(0, |slot| slot.load(Ordering::Acquire))
    }

    pub fn has_event(&self, switch: Switch) -> bool {
        self.event_row(switch.row()) & switch.mask() != 0
    }

    /// Clears one event bit and reports whether it was set; clearing a clear bit does nothing
    pub fn take_event(&self, switch: Switch) -> bool {
        let previous = self.events[switch.row()].fetch_and(!switch.mask(), Ordering::AcqRel);
        previous & switch.mask() != 0
    }

    /// Clears a whole event row, returning the bits that were pending
    pub fn take_event_row(&self, row: usize) -> u16 {
        self.events
            .get(row)
            .map_or(0, |slot| slot.swap(0, Ordering::AcqRel))
    }

    pub fn dep_orientation(&self) -> DepOrientation {
        DepOrientation::from_u8(self.dep_orientation.load(Ordering::Relaxed))
    }

    /// Publishes one raw switch-row sample (closed switch = 0 bit)
    ///
    /// Only the multiplexer calls this. The first sample of the control row
    /// fixes the DEP orientation, which is returned when that happens; the
    /// correction applies from that same sample on. State is stored before
    /// the rising edges are merged, so a reader that sees an event also sees
    /// the row that produced it.
    pub fn apply_scan(&self, row: usize, raw: u16) -> Option<DepOrientation> {
        if row >= SWITCH_ROWS {
            return None;
        }
        let mut raw = raw & ROW_MASK;
        let mut calibrated = None;

        if row == rows::CONTROL {
            let dep = Switch::Dep.mask();
            let mut orientation = self.dep_orientation();
            if orientation == DepOrientation::Unknown {
                // Assumes DEP is not held while the panel starts up
                orientation = if logical_state(raw) & dep != 0 {
                    DepOrientation::Inverted
                } else {
                    DepOrientation::Normal
                };
                self.dep_orientation
                    .store(orientation as u8, Ordering::Relaxed);
                calibrated = Some(orientation);
            }
            if orientation == DepOrientation::Inverted {
                raw ^= dep;
            }
        }

        let state = logical_state(raw);
        let previous = self.switches[row].load(Ordering::Relaxed);
        self.switches[row].store(state, Ordering::Relaxed);
        self.events[row].fetch_or(rising_edges(previous, state), Ordering::Release);
        calibrated
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod panel_tests {
    use super::*;

    // Raw sample with the given logical switches closed
    fn closed(bits: u16) -> u16 {
        !bits & ROW_MASK
    }

    #[test]
    fn test_switch_masks() {
        assert_eq!(Switch::Dep.mask(), 1 << 9);
        assert_eq!(Switch::SingStep.mask(), 0o0040);
        assert_eq!(Switch::SingInst.mask(), 0o0020);
        assert_eq!(Switch::Start.mask(), 0o4000);
        assert_eq!(Switch::Sr(11).mask(), 0o4000);
        assert_eq!(Switch::Sr(0).mask(), 0o0001);
        assert_eq!(Switch::Sr(0).row(), rows::SWITCH_REGISTER);
        assert_eq!(Switch::Stop.row(), rows::CONTROL);
    }

    #[test]
    fn test_fields() {
        assert_eq!(Field::DataField.extract(0o5000), 5);
        assert_eq!(Field::InstField.extract(0o0700), 7);
        assert_eq!(Field::InstField.extract(0o5000), 0);
    }

    #[test]
    fn test_held_switch_gives_one_edge() {
        let panel = Panel::new();
        let sr = Switch::Sr(3);

        for _ in 0..5 {
            panel.apply_scan(rows::SWITCH_REGISTER, closed(sr.mask()));
        }
        assert!(panel.is_set(sr));
        assert!(panel.take_event(sr));

        // still held: no new edge
        panel.apply_scan(rows::SWITCH_REGISTER, closed(sr.mask()));
        assert!(!panel.has_event(sr));

        // release then press again
        panel.apply_scan(rows::SWITCH_REGISTER, closed(0));
        assert!(!panel.has_event(sr));
        panel.apply_scan(rows::SWITCH_REGISTER, closed(sr.mask()));
        assert!(panel.has_event(sr));
    }

    #[test]
    fn test_events_accumulate_until_cleared() {
        let panel = Panel::new();
        panel.apply_scan(rows::CONTROL, closed(Switch::Stop.mask()));
        panel.apply_scan(rows::CONTROL, closed(0));
        panel.apply_scan(rows::CONTROL, closed(Switch::Exam.mask()));

        assert!(panel.has_event(Switch::Stop));
        assert!(panel.has_event(Switch::Exam));
        assert!(!panel.is_set(Switch::Stop));

        assert!(panel.take_event(Switch::Stop));
        assert!(!panel.has_event(Switch::Stop));
        assert!(panel.has_event(Switch::Exam));

        // idempotent
        assert!(!panel.take_event(Switch::Stop));
        assert!(!panel.has_event(Switch::Stop));
        assert!(panel.has_event(Switch::Exam));
    }

    #[test]
    fn test_dep_calibrated_once_normal() {
        let panel = Panel::new();
        assert_eq!(panel.dep_orientation(), DepOrientation::Unknown);

        let fixed = panel.apply_scan(rows::CONTROL, closed(0));
        assert_eq!(fixed, Some(DepOrientation::Normal));

        // later DEP presses do not recalibrate
        assert_eq!(panel.apply_scan(rows::CONTROL, closed(Switch::Dep.mask())), None);
        assert_eq!(panel.dep_orientation(), DepOrientation::Normal);
        assert!(panel.is_set(Switch::Dep));
    }

    #[test]
    fn test_dep_inverted_panel() {
        let panel = Panel::new();

        // upside-down DEP reads closed while released
        let fixed = panel.apply_scan(rows::CONTROL, closed(Switch::Dep.mask()));
        assert_eq!(fixed, Some(DepOrientation::Inverted));
        assert!(!panel.is_set(Switch::Dep));
        assert!(!panel.has_event(Switch::Dep));

        // pressing it opens the contact
        panel.apply_scan(rows::CONTROL, closed(0));
        assert!(panel.is_set(Switch::Dep));
        assert!(panel.take_event(Switch::Dep));
        assert_eq!(panel.dep_orientation(), DepOrientation::Inverted);
    }

    #[test]
    fn test_calibration_ignores_other_rows() {
        let panel = Panel::new();
        assert_eq!(panel.apply_scan(rows::SWITCH_REGISTER, closed(1 << 9)), None);
        assert_eq!(panel.dep_orientation(), DepOrientation::Unknown);
        assert!(panel.is_set(Switch::Sr(9)));
    }

    #[test]
    fn test_led_rows() {
        let panel = Panel::new();
        panel.set_led_row(3, 0xFFFF);
        assert_eq!(panel.led_row(3), 0o7777);
        panel.set_led_row(7, 0o4000);
        assert_eq!(panel.led_row(7), 0o4000);

        // out of range is ignored
        panel.set_led_row(8, 1);
        assert_eq!(panel.led_row(8), 0);
    }

    #[test]
    fn test_take_event_row() {
        let panel = Panel::new();
        panel.apply_scan(rows::FIELDS, closed(0o0700));
        assert_eq!(panel.field(Field::InstField), 7);
        assert_eq!(panel.take_event_row(rows::FIELDS), 0o0700);
        assert_eq!(panel.event_row(rows::FIELDS), 0);
    }
}
