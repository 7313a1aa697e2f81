//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod program;
pub mod status;
pub mod util;
pub mod watch;

use watts_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command against a started session's coordinator.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::list(coordinator, global),
        Command::Show(target) => status::show(coordinator, &target.device, global),
        Command::Watch => watch::handle(coordinator, global).await,
        Command::Mode(args) => control::set_mode(coordinator, args, global).await,
        Command::Setpoint(args) => control::set_setpoint(coordinator, args, global).await,
        Command::Boost(args) => control::boost(coordinator, args, global).await,
        Command::Program(args) => program::handle(coordinator, args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
    }
}
