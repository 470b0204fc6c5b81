use std::sync::atomic::AtomicBool;

use log::{error, info, warn};
use pidp8_core::notes::NoteProducer;
use pidp8_core::Panel;

use crate::error::GpioError;
use crate::gpio::Gpio;
use crate::mmio::{self, MappedRegisters};
use crate::multiplexer::{Multiplexer, Timing};
use crate::pins::{self, PinMap};

// SCHED_FIFO priority requested for the multiplexing thread
pub const RT_PRIORITY: i32 = 98;

/// Settings for the panel driver thread
#[derive(Clone, Debug, Default)]
pub struct DriverConfig {
    pub pins: PinMap,
    pub timing: Timing,
}

/// Moves the calling thread to SCHED_FIFO at `priority`
pub fn set_realtime_priority(priority: i32) -> Result<(), GpioError> {
    let result = unsafe {
        let mut param: libc::sched_param = std::mem::zeroed();
        param.sched_priority = priority;
        libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param)
    };
    match result {
        0 => Ok(()),
        errno => Err(GpioError::Priority(errno)),
    }
}

fn map_block(base: u32, offset: u32) -> Result<MappedRegisters, GpioError> {
    let address =
        mmio::block_address(base, offset).ok_or(GpioError::Address { base, offset })?;
    MappedRegisters::open(address)
}

/// Body of the real-time panel thread
///
/// Maps the GPIO block, configures the pins and multiplexes until
/// `terminate` is set. Failing to map the registers ends the thread; failing
/// to get real-time priority only costs smoothness.
pub fn run_driver(
    panel: &Panel,
    config: &DriverConfig,
    notes: Option<NoteProducer<'_>>,
    terminate: &AtomicBool,
) -> Result<(), GpioError> {
    let base = mmio::peripheral_base();
    info!(
        "{} detected - {} version",
        mmio::board_name(base),
        if config.pins.serial { "serial mod" } else { "default" }
    );

    if let Err(e) = set_realtime_priority(RT_PRIORITY) {
        warn!("{}", e);
    }

    if config.pins.serial {
        match map_block(base, mmio::PADS_OFFSET) {
            Ok(pads) => pins::disable_hysteresis(&pads),
            Err(e) => warn!("Could not disable input hysteresis: {}", e),
        }
    }

    let regs = map_block(base, mmio::GPIO_OFFSET).map_err(|e| {
        error!(
            "Failed to map the physical GPIO registers into the virtual memory space: {}",
            e
        );
        e
    })?;

    let gpio = Gpio::new(regs);
    pins::configure(&gpio, &config.pins, pins::SETTLE);

    let mut mux = Multiplexer::new(gpio, config.pins.clone(), config.timing, panel);
    if let Some(producer) = notes {
        mux = mux.with_notes(producer);
    }
    mux.run(terminate);

    info!("Panel driver stopped after {} cycles", mux.cycles());
    Ok(())
}
