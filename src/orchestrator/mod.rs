//! Application-level orchestration.
//!
//! This module owns the dashboard state (the last known-good server list and the
//! observable view state derived from it) and the controller that drives it from
//! UI commands. UI/CLI layers only send commands and read the observable outputs.

mod controller;
mod store;

pub(crate) use controller::{load_once, run_controller, UiCommand};
pub(crate) use store::{DashboardStore, DashboardView};
