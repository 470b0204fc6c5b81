use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::executor::{execute, CommandExecutor};
use crate::status::CommandStatus;

/// Removable-media devices selectable from the DF switches, device 1 first
pub const DEVICE_CODES: [&str; 7] = [
    "ptr", // PC04 paper tape reader
    "ptp", // PC04 paper tape punch
    "dt0", // TC08 DECtape
    "dt1",
    "rx0", // RX8E floppy
    "rx1",
    "rl0", // RL8A disk
];

pub const MOUNT_POINT_COUNT: usize = 8;

// Slot 0 is never used; devices are numbered 1-7
pub const DEVICE_SLOTS: usize = 8;

/// One entry of the device table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaDevice {
    pub number: u8,
    pub code: &'static str,
}

impl MediaDevice {
    pub fn from_number(number: u8) -> Option<MediaDevice> {
        let index = (number as usize).checked_sub(1)?;
        DEVICE_CODES.get(index).map(|code| MediaDevice { number, code })
    }

    /// File extension accepted for this device: first two letters of the code
    pub fn extension(&self) -> &'static str {
        &self.code[..2]
    }
}

/// Directories searched for media, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountPoints {
    dirs: Vec<PathBuf>,
}

impl MountPoints {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        MountPoints { dirs }
    }

    /// `usb0`..`usb7` under `root`
    pub fn under(root: &Path) -> Self {
        let dirs = (0..MOUNT_POINT_COUNT)
            .map(|i| root.join(format!("usb{}", i)))
            .collect();
        MountPoints { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl Default for MountPoints {
    fn default() -> Self {
        MountPoints::under(Path::new("/media"))
    }
}

/// Files currently attached, indexed by device number
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MountedDeviceTable {
    slots: [Option<PathBuf>; DEVICE_SLOTS],
}

impl MountedDeviceTable {
    pub fn get(&self, number: u8) -> Option<&Path> {
        self.slots
            .get(number as usize)
            .and_then(|slot| slot.as_deref())
    }

    /// Whether `path` is attached to any device
    pub fn contains(&self, path: &Path) -> bool {
        self.slots.iter().any(|slot| slot.as_deref() == Some(path))
    }

    /// Stores `path` for `number`, returning the file it replaces
    pub fn record(&mut self, number: u8, path: PathBuf) -> Option<PathBuf> {
        self.slots
            .get_mut(number as usize)
            .and_then(|slot| slot.replace(path))
    }
}

/// Result of one auto-mount attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountOutcome {
    Attached(PathBuf),
    NoFile,
    AttachFailed(CommandStatus),
    UnknownDevice,
}

/// Finds media files on the mount points and attaches them
pub struct AutoMounter {
    points: MountPoints,
    mounted: MountedDeviceTable,
}

// Text after the last dot of the file name, so `.rl` has extension `rl`
fn file_extension(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    name.rsplit_once('.').map(|(_, extension)| extension)
}

fn is_readable_file(path: &Path) -> bool {
    File::open(path)
        .and_then(|file| file.metadata())
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

impl AutoMounter {
    pub fn new(points: MountPoints) -> Self {
        AutoMounter {
            points,
            mounted: MountedDeviceTable::default(),
        }
    }

    pub fn mounted(&self) -> &MountedDeviceTable {
        &self.mounted
    }

    /// First usable file for `device`, in mount point then directory order
    pub fn find_candidate(&self, device: &MediaDevice) -> Option<PathBuf> {
        let extension = device.extension();
        for dir in self.points.dirs() {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Couldn't open dir {}: {}", dir.display(), e);
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if file_extension(&path) != Some(extension) {
                    continue;
                }
                if self.mounted.contains(&path) {
                    continue;
                }
                if !is_readable_file(&path) {
                    continue;
                }
                return Some(path);
            }
        }
        None
    }

    /// Attaches the first matching file to device `number` (1-7)
    pub fn mount(&mut self, number: u8, executor: &mut dyn CommandExecutor) -> MountOutcome {
        let device = match MediaDevice::from_number(number) {
            Some(device) => device,
            None => {
                warn!("No media device {}", number);
                return MountOutcome::UnknownDevice;
            }
        };

        let file = match self.find_candidate(&device) {
            Some(file) => file,
            None => {
                info!("No file found to mount on {}", device.code);
                return MountOutcome::NoFile;
            }
        };

        let status = execute(executor, &format!("ATTACH {} {}", device.code, file.display()));
        if status.is_error() {
            warn!("Failed to attach file {}", file.display());
            return MountOutcome::AttachFailed(status);
        }

        if let Some(previous) = self.mounted.record(number, file.clone()) {
            info!("{} replaces {} on {}", file.display(), previous.display(), device.code);
        }
        MountOutcome::Attached(file)
    }
}
