use log::{info, warn};

use crate::status::CommandStatus;

/// Runs one console command line
///
/// A line starting with `!` is a host shell command; anything else goes to
/// the emulator command interpreter.
pub trait CommandExecutor {
    fn run(&mut self, line: &str) -> CommandStatus;
}

/// Host command part of a `!` line
pub fn shell_command(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix('!')
        .map(str::trim)
}

/// Logs and runs a command line, reporting failures
pub fn execute(executor: &mut dyn CommandExecutor, line: &str) -> CommandStatus {
    info!("Executing command: {}", line);
    let status = executor.run(line);
    if status.is_error() {
        warn!("{}", status.message());
    }
    status
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records every line and answers with a fixed status
    pub struct Recorder {
        pub lines: Vec<String>,
        pub status: CommandStatus,
    }

    impl Recorder {
        pub fn new() -> Self {
            Recorder {
                lines: Vec::new(),
                status: CommandStatus::OK,
            }
        }

        pub fn failing(status: CommandStatus) -> Self {
            Recorder {
                lines: Vec::new(),
                status,
            }
        }
    }

    impl CommandExecutor for Recorder {
        fn run(&mut self, line: &str) -> CommandStatus {
            self.lines.push(line.to_string());
            self.status
        }
    }
}

#[cfg(test)]
mod executor_tests {
    use super::testing::Recorder;
    use super::*;

    #[test]
    fn test_shell_command() {
        assert_eq!(shell_command("! reboot"), Some("reboot"));
        assert_eq!(shell_command("!/opt/pidp8/bin/unmount"), Some("/opt/pidp8/bin/unmount"));
        assert_eq!(shell_command("ATTACH rl0 x.rl"), None);
    }

    #[test]
    fn test_execute_passes_status_through() {
        let mut recorder = Recorder::failing(CommandStatus::UNKNOWN);
        let status = execute(&mut recorder, "FROB");
        assert_eq!(status, CommandStatus::UNKNOWN);
        assert_eq!(recorder.lines, vec!["FROB".to_string()]);
    }
}
