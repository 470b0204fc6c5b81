use std::process::Command;

use log::debug;
use pidp8_cmds::{shell_command, CommandExecutor, CommandStatus};

use crate::link::ConsoleLink;

/// Runs `!` lines through the host shell and sends the rest to the emulator
pub struct HostExecutor {
    link: ConsoleLink,
}

impl HostExecutor {
    pub fn new(link: ConsoleLink) -> Self {
        HostExecutor { link }
    }

    fn run_shell(&self, command: &str) -> CommandStatus {
        match Command::new("sh").arg("-c").arg(command).status() {
            Ok(status) if status.success() => CommandStatus::OK,
            Ok(status) => {
                debug!("`{}` exited with {}", command, status);
                CommandStatus::SHELL
            }
            Err(e) => {
                debug!("Could not start `{}`: {}", command, e);
                CommandStatus::IO_ERROR
            }
        }
    }
}

impl CommandExecutor for HostExecutor {
    fn run(&mut self, line: &str) -> CommandStatus {
        if let Some(command) = shell_command(line) {
            return self.run_shell(command);
        }
        if self.link.deliver(line) {
            CommandStatus::OK
        } else {
            CommandStatus::NO_LINK
        }
    }
}
