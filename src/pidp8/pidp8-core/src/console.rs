use log::debug;

use crate::constants::{rows, SWITCH_ROWS};
use crate::panel::{Field, Switch};

/// What a SING_STEP press asks for, given the switches held at that moment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleRequest {
    Shutdown,       // SING_INST + START
    Reboot,         // SING_INST + CONT
    MountHelper,    // SING_INST + LOAD_ADD
    UnmountHelper,  // SING_INST + DEP
    Mount(u8),      // DF selects a media device 1-7
    BootScript(u8), // IF selects a boot script 1-7
    Nothing,
}

impl ConsoleRequest {
    /// Decodes held switches in fixed priority order
    pub fn decode(switch_rows: &[u16; SWITCH_ROWS]) -> ConsoleRequest {
        let held = |switch: Switch| switch_rows[switch.row()] & switch.mask() != 0;

        let request = if held(Switch::SingInst) && held(Switch::Start) {
            ConsoleRequest::Shutdown
        } else if held(Switch::SingInst) && held(Switch::Cont) {
            ConsoleRequest::Reboot
        } else if held(Switch::SingInst) && held(Switch::LoadAdd) {
            ConsoleRequest::MountHelper
        } else if held(Switch::SingInst) && held(Switch::Dep) {
            ConsoleRequest::UnmountHelper
        } else {
            let fields = switch_rows[rows::FIELDS];
            match (
                Field::DataField.extract(fields),
                Field::InstField.extract(fields),
            ) {
                (0, 0) => ConsoleRequest::Nothing,
                (0, inst_field) => ConsoleRequest::BootScript(inst_field),
                (data_field, _) => ConsoleRequest::Mount(data_field),
            }
        };

        debug!("Console request {:?} (control row {:04o})", request, switch_rows[rows::CONTROL]);
        request
    }
}
