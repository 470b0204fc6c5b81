pub mod driver;
pub mod error;
pub mod gpio;
pub mod mmio;
pub mod multiplexer;
pub mod pins;

#[cfg(test)]
pub mod testing;

pub use driver::{run_driver, DriverConfig};
pub use error::GpioError;
pub use multiplexer::{Multiplexer, Timing};
pub use pins::PinMap;
