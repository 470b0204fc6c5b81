use std::fmt;

/// Status code returned by the emulator command interpreter
///
/// Codes at or above `BASE` are failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandStatus(pub u32);

impl CommandStatus {
    pub const BASE: u32 = 64;

    pub const OK: CommandStatus = CommandStatus(0);
    pub const UNATTACHED: CommandStatus = CommandStatus(Self::BASE + 1);
    pub const IO_ERROR: CommandStatus = CommandStatus(Self::BASE + 2);
    pub const OPEN_ERROR: CommandStatus = CommandStatus(Self::BASE + 6);
    pub const MEMORY: CommandStatus = CommandStatus(Self::BASE + 7);
    pub const ARGUMENT: CommandStatus = CommandStatus(Self::BASE + 8);
    pub const UNKNOWN: CommandStatus = CommandStatus(Self::BASE + 10);
    pub const SHELL: CommandStatus = CommandStatus(Self::BASE + 30);
    pub const NO_LINK: CommandStatus = CommandStatus(Self::BASE + 31);

    pub fn is_error(self) -> bool {
        self.0 >= Self::BASE
    }

    /// Human readable text for a failure code
    pub fn message(self) -> &'static str {
        match self {
            CommandStatus::OK => "Ok",
            CommandStatus::UNATTACHED => "Unit not attached",
            CommandStatus::IO_ERROR => "I/O error",
            CommandStatus::OPEN_ERROR => "File open error",
            CommandStatus::MEMORY => "Memory exhausted",
            CommandStatus::ARGUMENT => "Invalid argument",
            CommandStatus::UNKNOWN => "Unknown command",
            CommandStatus::SHELL => "Host command failed",
            CommandStatus::NO_LINK => "Emulator console not connected",
            CommandStatus(code) if code < Self::BASE => "Stopped",
            _ => "Unknown error",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.0)
    }
}
