use std::fmt;
use std::io;

/// Failures of the real-time panel driver
#[derive(Debug)]
pub enum GpioError {
    /// The physical memory device could not be opened
    OpenDevice { path: &'static str, source: io::Error },
    /// A register block would lie past the 32-bit physical address space
    Address { base: u32, offset: u32 },
    /// The register block could not be mapped
    Map { base: u32, source: io::Error },
    /// SCHED_FIFO was refused (errno value)
    Priority(i32),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::OpenDevice { path, source } => {
                write!(f, "failed to open {}, try checking permissions: {}", path, source)
            }
            GpioError::Address { base, offset } => {
                write!(f, "register block 0x{:x} past base 0x{:08x} is out of range", offset, base)
            }
            GpioError::Map { base, source } => {
                write!(f, "failed to map registers at 0x{:08x}: {}", base, source)
            }
            GpioError::Priority(errno) => {
                write!(f, "failed to set RT priority: {}", io::Error::from_raw_os_error(*errno))
            }
        }
    }
}

impl std::error::Error for GpioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpioError::OpenDevice { source, .. } | GpioError::Map { source, .. } => Some(source),
            GpioError::Address { .. } | GpioError::Priority(_) => None,
        }
    }
}
