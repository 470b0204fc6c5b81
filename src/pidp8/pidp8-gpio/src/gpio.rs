use crate::mmio::registers::*;
use crate::mmio::RegisterBlock;

/// Pin function select codes (3 bits per pin)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Function {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
    Alt1 = 0b101,
    Alt2 = 0b110,
    Alt3 = 0b111,
    Alt4 = 0b011,
    Alt5 = 0b010,
}

/// Pull resistor mode codes written to GPPUD
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Pull {
    Off = 0b00,
    Down = 0b01,
    Up = 0b10,
}

/// Bit-level view of the GPIO register block (bank 0, GPIO 0-31)
pub struct Gpio<R: RegisterBlock> {
    regs: R,
}

impl<R: RegisterBlock> Gpio<R> {
    pub fn new(regs: R) -> Self {
        Gpio { regs }
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn select(pin: u8) -> (usize, u32) {
        let word = GPFSEL0 + (pin / 10) as usize;
        let shift = (pin % 10) as u32 * 3;
        (word, shift)
    }

    /// Tri-states the pin
    pub fn set_input(&self, pin: u8) {
        let (word, shift) = Self::select(pin);
        let value = self.regs.read(word);
        self.regs.write(word, value & !(0b111 << shift));
    }

    /// Switches the pin to `function`, always passing through input first
    pub fn set_function(&self, pin: u8, function: Function) {
        self.set_input(pin);
        if function == Function::Input {
            return;
        }
        let (word, shift) = Self::select(pin);
        let value = self.regs.read(word);
        self.regs.write(word, value | ((function as u32) << shift));
    }

    pub fn set_output(&self, pin: u8) {
        self.set_function(pin, Function::Output);
    }

    pub fn function(&self, pin: u8) -> Function {
        let (word, shift) = Self::select(pin);
        match (self.regs.read(word) >> shift) & 0b111 {
            0b000 => Function::Input,
            0b001 => Function::Output,
            0b100 => Function::Alt0,
            0b101 => Function::Alt1,
            0b110 => Function::Alt2,
            0b111 => Function::Alt3,
            0b011 => Function::Alt4,
            _ => Function::Alt5,
        }
    }

    /// Drives every pin in `mask` high (output latches only)
    pub fn set_bits(&self, mask: u32) {
        self.regs.write(GPSET0, mask);
    }

    /// Drives every pin in `mask` low
    pub fn clear_bits(&self, mask: u32) {
        self.regs.write(GPCLR0, mask);
    }

    pub fn levels(&self) -> u32 {
        self.regs.read(GPLEV0)
    }

    pub fn is_high(&self, pin: u8) -> bool {
        self.levels() & (1 << pin) != 0
    }

    pub fn write_pull_code(&self, pull: Pull) {
        self.regs.write(GPPUD, pull as u32);
    }

    pub fn write_pull_clock(&self, mask: u32) {
        self.regs.write(GPPUDCLK0, mask);
    }
}
