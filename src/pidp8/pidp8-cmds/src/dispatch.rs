use std::path::{Path, PathBuf};

use log::info;
use pidp8_core::{ConsoleRequest, Panel, Switch};

use crate::automount::AutoMounter;
use crate::executor::{execute, CommandExecutor};

/// What the caller should do after a dispatch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelSignal {
    Continue,
    /// A boot script was started; the running program should stop
    Halt,
    /// The host is going down
    Exit,
}

/// Host commands issued from the panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    pub script_dir: PathBuf,
    pub mount_helper: String,
    pub unmount_helper: String,
    pub shutdown: String,
    pub reboot: String,
}

impl DispatchConfig {
    /// Scripts and helpers under an install prefix such as `/opt/pidp8`
    pub fn with_prefix(prefix: &Path) -> Self {
        DispatchConfig {
            script_dir: prefix.join("bootscripts"),
            mount_helper: format!("! {}", prefix.join("bin").join("automount").display()),
            unmount_helper: format!("! {}", prefix.join("bin").join("unmount").display()),
            shutdown: "! shutdown -h -t 1 now".to_string(),
            reboot: "! reboot".to_string(),
        }
    }

    pub fn boot_script(&self, number: u8) -> PathBuf {
        self.script_dir.join(format!("{}.script", number))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig::with_prefix(Path::new("/opt/pidp8"))
    }
}

/// Turns SING_STEP presses into console commands
pub struct Dispatcher {
    config: DispatchConfig,
    mounter: AutoMounter,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig, mounter: AutoMounter) -> Self {
        Dispatcher { config, mounter }
    }

    pub fn mounter(&self) -> &AutoMounter {
        &self.mounter
    }

    /// Acts on a pending SING_STEP press, if any
    ///
    /// The event is consumed before anything runs, so one press is one
    /// action. The switches held at this moment choose the action.
    pub fn handle_sing_step(
        &mut self,
        panel: &Panel,
        executor: &mut dyn CommandExecutor,
    ) -> PanelSignal {
        if !panel.take_event(Switch::SingStep) {
            return PanelSignal::Continue;
        }

        match ConsoleRequest::decode(&panel.switch_rows()) {
            ConsoleRequest::Shutdown => {
                info!("Shutdown request");
                execute(executor, &self.config.shutdown);
                PanelSignal::Exit
            }
            ConsoleRequest::Reboot => {
                info!("Reboot request");
                execute(executor, &self.config.reboot);
                PanelSignal::Exit
            }
            ConsoleRequest::MountHelper => {
                execute(executor, &self.config.mount_helper);
                PanelSignal::Continue
            }
            ConsoleRequest::UnmountHelper => {
                execute(executor, &self.config.unmount_helper);
                PanelSignal::Continue
            }
            ConsoleRequest::Mount(device) => {
                self.mounter.mount(device, executor);
                PanelSignal::Continue
            }
            ConsoleRequest::BootScript(number) => {
                let script = self.config.boot_script(number);
                execute(executor, &format!("DO {}", script.display()));
                PanelSignal::Halt
            }
            ConsoleRequest::Nothing => PanelSignal::Continue,
        }
    }
}
