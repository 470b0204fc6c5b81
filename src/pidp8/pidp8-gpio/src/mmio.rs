use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr;

#[cfg(all(target_os = "linux", target_env = "gnu"))]
use libc::{mmap64 as mmap, off64_t as off_t};
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
use libc::{mmap, off_t};
use log::debug;

use crate::error::GpioError;

// One page covers every register the panel touches
pub const BLOCK_SIZE: usize = 4 * 1024;

pub const DEV_MEM: &str = "/dev/mem";
pub const SOC_RANGES: &str = "/proc/device-tree/soc/ranges";

// Used when the device tree does not say otherwise (BCM2835)
pub const DEFAULT_PERIPHERAL_BASE: u32 = 0x2000_0000;

pub const GPIO_OFFSET: u32 = 0x0020_0000;
pub const PADS_OFFSET: u32 = 0x0010_0000;

pub mod registers {
    // Word offsets into the GPIO block
    pub const GPFSEL0: usize = 0; // function select, 10 pins per word
    pub const GPSET0: usize = 7; // write 1 to drive high
    pub const GPCLR0: usize = 10; // write 1 to drive low
    pub const GPLEV0: usize = 13; // input levels
    pub const GPPUD: usize = 37; // pull mode code
    pub const GPPUDCLK0: usize = 38; // pull clock strobe, one bit per pin

    // Word offset into the pads block: drive/hysteresis for GPIO 0-27
    pub const PADS_BANK0: usize = 0x2c / 4;
}

/// Word-addressed access to a hardware register block
pub trait RegisterBlock {
    fn read(&self, word: usize) -> u32;
    fn write(&self, word: usize, value: u32);
}

impl<T: RegisterBlock + ?Sized> RegisterBlock for &T {
    fn read(&self, word: usize) -> u32 {
        (**self).read(word)
    }

    fn write(&self, word: usize, value: u32) {
        (**self).write(word, value)
    }
}

/// A page of physical registers mapped through `/dev/mem`
pub struct MappedRegisters {
    map: *mut u32,
    _mem: File, // kept open for the lifetime of the mapping
}

// The mapping is plain device memory; it is owned by one thread at a time
unsafe impl Send for MappedRegisters {}

impl MappedRegisters {
    /// Maps `BLOCK_SIZE` bytes at physical address `base`
    pub fn open(base: u32) -> Result<Self, GpioError> {
        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(DEV_MEM)
            .map_err(|source| GpioError::OpenDevice {
                path: DEV_MEM,
                source,
            })?;

        let map = unsafe {
            // 64-bit offset where available; bases above 2 GiB overflow a 32-bit off_t
            mmap(
                ptr::null_mut(),
                BLOCK_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                mem.as_raw_fd(),
                base as off_t,
            )
        };
        if map == libc::MAP_FAILED {
            return Err(GpioError::Map {
                base,
                source: io::Error::last_os_error(),
            });
        }

        debug!("Mapped register block at 0x{:08x}", base);
        Ok(MappedRegisters {
            map: map as *mut u32,
            _mem: mem,
        })
    }
}

impl RegisterBlock for MappedRegisters {
    fn read(&self, word: usize) -> u32 {
        assert!(word < BLOCK_SIZE / 4);
        unsafe { ptr::read_volatile(self.map.add(word)) }
    }

    fn write(&self, word: usize, value: u32) {
        assert!(word < BLOCK_SIZE / 4);
        unsafe { ptr::write_volatile(self.map.add(word), value) }
    }
}

impl Drop for MappedRegisters {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.map as *mut libc::c_void, BLOCK_SIZE);
        }
    }
}

/// Physical base of the SoC peripherals, from the device tree
pub fn peripheral_base() -> u32 {
    peripheral_base_from(Path::new(SOC_RANGES))
}

/// Reads the big-endian base word at offset 4 of a `soc/ranges` file
///
/// Newer boards carry a zero there and the address at offset 8. Falls back to
/// `DEFAULT_PERIPHERAL_BASE` when the file is missing or too short, or when the
/// word is all ones.
pub fn peripheral_base_from(path: &Path) -> u32 {
    let ranges = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return DEFAULT_PERIPHERAL_BASE,
    };

    let address = match be_word(&ranges, 4) {
        Some(0) => be_word(&ranges, 8),
        word => word,
    };
    match address {
        Some(u32::MAX) | None => DEFAULT_PERIPHERAL_BASE,
        Some(address) => address,
    }
}

/// Physical address of the block at `offset` from `base`, if it fits in 32 bits
pub fn block_address(base: u32, offset: u32) -> Option<u32> {
    base.checked_add(offset)
        .filter(|address| address.checked_add(BLOCK_SIZE as u32).is_some())
}

fn be_word(bytes: &[u8], offset: usize) -> Option<u32> {
    let word = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
}

/// Human readable board family for a peripheral base
pub fn board_name(base: u32) -> &'static str {
    match base {
        0x2000_0000 => "RPi Plus/Zero (BCM2835)",
        0x3F00_0000 => "RPi 2/3 (BCM2836/7)",
        0xFE00_0000 => "RPi 4 (BCM2711)",
        _ => "unknown board",
    }
}
