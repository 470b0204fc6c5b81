extern crate clap;
use crossbeam_channel::bounded; // Ctrl-C notification
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use pidp8_cmds::{AutoMounter, DispatchConfig, Dispatcher, MountPoints, PanelSignal};
use pidp8_core::constants::{LED_ROWS, ROW_MASK, SWITCH_ROWS};
use pidp8_core::notes::{NoteConsumer, NoteQueue, ScanNote};
use pidp8_core::Panel;
use pidp8_gpio::{run_driver, DriverConfig, PinMap, Timing};

mod host;
mod link;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Run,
    LampTest,
}

/// Everything taken from the command line
#[derive(Clone, Debug, PartialEq)]
struct Settings {
    mode: Mode,
    timing: Timing,
    poll: Duration,
    prefix: PathBuf,
    media: PathBuf,
    link: String,
    serial: bool,
}

impl Settings {
    fn from_matches(matches: &clap::ArgMatches<'_>) -> Result<Settings, String> {
        let number = |name: &str| -> Result<u64, String> {
            let value = matches.value_of(name).unwrap_or("");
            value
                .parse::<u64>()
                .map_err(|e| format!("Invalid --{} value \"{}\": {}", name, value, e))
        };

        let mode = match matches.subcommand_name() {
            Some("lamptest") => Mode::LampTest,
            _ => Mode::Run,
        };

        Ok(Settings {
            mode,
            timing: Timing::with_dwell(Duration::from_micros(number("dwell")?)),
            poll: Duration::from_millis(number("poll")?),
            prefix: PathBuf::from(matches.value_of("prefix").unwrap_or("/opt/pidp8")),
            media: PathBuf::from(matches.value_of("media").unwrap_or("/media")),
            link: matches.value_of("link").unwrap_or("127.0.0.1:19801").to_string(),
            serial: matches.is_present("serial"),
        })
    }

    fn pins(&self) -> PinMap {
        if self.serial {
            PinMap::serial()
        } else {
            PinMap::standard()
        }
    }
}

fn cli_app<'a, 'b>() -> clap::App<'a, 'b> {
    let description = "Front panel driver for the PiDP-8/I";
    clap::App::new("PiDP-8/I panel driver")
        .version("0.1")
        .about(description)
        .arg(
            clap::Arg::with_name("dwell")
                .long("dwell")
                .takes_value(true)
                .value_name("MICROS")
                .default_value("300")
                .help("Time each LED row stays lit"),
        )
        .arg(
            clap::Arg::with_name("poll")
                .long("poll")
                .takes_value(true)
                .value_name("MILLIS")
                .default_value("10")
                .help("Switch dispatcher poll period"),
        )
        .arg(
            clap::Arg::with_name("prefix")
                .long("prefix")
                .takes_value(true)
                .value_name("DIR")
                .default_value("/opt/pidp8")
                .help("Install prefix holding bootscripts/ and bin/"),
        )
        .arg(
            clap::Arg::with_name("media")
                .long("media")
                .takes_value(true)
                .value_name("DIR")
                .default_value("/media")
                .help("Root of the usb0..usb7 mount points"),
        )
        .arg(
            clap::Arg::with_name("link")
                .long("link")
                .takes_value(true)
                .value_name("ADDR")
                .default_value("127.0.0.1:19801")
                .help("Address the emulator console link listens on"),
        )
        .arg(
            clap::Arg::with_name("serial")
                .long("serial")
                .help("Use the serial mod pin layout (GPIO 14/15 left free)"),
        )
        .subcommand(
            clap::SubCommand::with_name("run")
                .about("Drive the panel and act on SING_STEP commands (default)"),
        )
        .subcommand(
            clap::SubCommand::with_name("lamptest")
                .about("Light every lamp and log switch presses"),
        )
}

/// Configures command-line interface using clap
fn get_cli_config<'a>() -> clap::ArgMatches<'a> {
    cli_app().get_matches()
}

fn drain_notes(notes: &mut NoteConsumer<'_>) {
    while let Some(note) = notes.dequeue() {
        match note {
            ScanNote::DepCalibrated(orientation) => {
                info!("DEP switch orientation: {:?}", orientation)
            }
            ScanNote::SlowCycle { micros } => debug!("Slow multiplex cycle: {} us", micros),
        }
    }
}

// Stand-in for an emulator: the switch rows show up on the first LED rows
fn echo_switches(panel: &Panel) {
    for row in 0..SWITCH_ROWS {
        panel.set_led_row(row, panel.switch_row(row));
    }
}

fn log_switch_edges(panel: &Panel) {
    for row in 0..SWITCH_ROWS {
        let pressed = panel.take_event_row(row);
        if pressed != 0 {
            info!(
                "Switch row {}: pressed {:04o}, held {:04o}",
                row,
                pressed,
                panel.switch_row(row)
            );
        }
    }
}

/// Main entry point for the panel driver
fn main() {
    env_logger::init();

    // Set up Ctrl-C handler with channel communication
    let (signal_sender, signal_receiver) = bounded(1);
    let handler_result = ctrlc::set_handler(move || {
        if signal_sender.is_full() {
            std::process::exit(-1); // Second Ctrl-C while still shutting down
        }
        let _send_result = signal_sender.send(());
    });

    if let Err(e) = handler_result {
        error!("Signal handler failed: {:?}", e);
        return;
    }

    let settings = match Settings::from_matches(&get_cli_config()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    debug!("{:?}", settings);

    let mut dispatch = match settings.mode {
        Mode::Run => {
            let mounter = AutoMounter::new(MountPoints::under(&settings.media));
            let dispatcher =
                Dispatcher::new(DispatchConfig::with_prefix(&settings.prefix), mounter);
            let executor = host::HostExecutor::new(link::console_link(&settings.link));
            Some((dispatcher, executor))
        }
        Mode::LampTest => None,
    };

    let panel = Panel::new();
    if settings.mode == Mode::LampTest {
        for row in 0..LED_ROWS {
            panel.set_led_row(row, ROW_MASK);
        }
    }

    let terminate = AtomicBool::new(false);
    let mut notes: NoteQueue = heapless::spsc::Queue::new();
    let (producer, mut consumer) = notes.split();
    let driver_config = DriverConfig {
        pins: settings.pins(),
        timing: settings.timing,
    };

    thread::scope(|scope| {
        let (panel, terminate, driver_config) = (&panel, &terminate, &driver_config);
        let driver = match thread::Builder::new()
            .name("panel-mux".to_string())
            .spawn_scoped(scope, move || {
                run_driver(panel, driver_config, Some(producer), terminate)
            }) {
            Ok(driver) => driver,
            Err(e) => {
                error!("Failed to start the panel thread: {}", e);
                return;
            }
        };

        loop {
            if !signal_receiver.is_empty() {
                info!("Interrupted, stopping the panel");
                break;
            }
            if driver.is_finished() {
                break;
            }

            drain_notes(&mut consumer);

            match dispatch.as_mut() {
                Some((dispatcher, executor)) => {
                    echo_switches(panel);
                    match dispatcher.handle_sing_step(panel, executor) {
                        PanelSignal::Exit => break,
                        PanelSignal::Halt => info!("Boot script started"),
                        PanelSignal::Continue => {}
                    }
                }
                None => log_switch_edges(panel),
            }

            thread::sleep(settings.poll);
        }

        terminate.store(true, Ordering::Relaxed);
        match driver.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Panel driver failed: {}", e),
            Err(_) => error!("Panel driver thread panicked"),
        }
        drain_notes(&mut consumer);
    });
}
