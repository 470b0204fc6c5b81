// Lamp matrix: 8 rows of 12 lamps
pub const LED_ROWS: usize = 8;

// Switch matrix: 3 rows of 12 switches
pub const SWITCH_ROWS: usize = 3;

// Columns are shared by both matrices
pub const COLUMNS: usize = 12;

// Valid bits of a row word (bits 12-15 are unused)
pub const ROW_MASK: u16 = 0o7777;

pub mod rows {
    // Switch register (SR0..SR11)
    pub const SWITCH_REGISTER: usize = 0;
    // Data field and instruction field selectors
    pub const FIELDS: usize = 1;
    // Momentary and control switches
    pub const CONTROL: usize = 2;
}

pub mod fields {
    // Field selectors are 3 bits wide, values 0-7
    pub const FIELD_MASK: u16 = 0o7;
    pub const DF_SHIFT: u16 = 9;
    pub const IF_SHIFT: u16 = 6;
}

pub mod control {
    // Bit positions within the control row
    pub const START: u16 = 11;
    pub const LOAD_ADD: u16 = 10;
    pub const DEP: u16 = 9;
    pub const EXAM: u16 = 8;
    pub const CONT: u16 = 7;
    pub const STOP: u16 = 6;
    pub const SING_STEP: u16 = 5;
    pub const SING_INST: u16 = 4;
}
