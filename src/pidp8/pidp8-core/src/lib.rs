#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod constants;
pub mod notes;
pub mod panel;
pub mod scan;

pub use console::ConsoleRequest;
pub use panel::{DepOrientation, Field, Panel, Switch};
