pub mod automount;
pub mod dispatch;
pub mod executor;
pub mod status;

pub use automount::{AutoMounter, MountOutcome, MountPoints, MountedDeviceTable};
pub use dispatch::{DispatchConfig, Dispatcher, PanelSignal};
pub use executor::{execute, shell_command, CommandExecutor};
pub use status::CommandStatus;
