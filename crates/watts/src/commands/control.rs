//! Device write commands: mode, setpoint, boost.

use tracing::info;
use watts_core::command::{parse_mode, parse_setpoint_key};
use watts_core::{Coordinator, Device};

use crate::cli::{BoostArgs, GlobalOpts, ModeArgs, SetpointArgs};
use crate::error::CliError;

use super::{status, util};

pub async fn set_mode(
    coordinator: &Coordinator,
    args: ModeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_device(coordinator, &args.target.device)?;
    let mode = parse_mode(&args.mode)?;

    coordinator
        .set_mode(&device.smarthome_id, &device.id_device, mode)
        .await?;
    info!(device = %device.id, %mode, "mode changed");
    print_updated(coordinator, &device, global)
}

pub async fn set_setpoint(
    coordinator: &Coordinator,
    args: SetpointArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_device(coordinator, &args.target.device)?;
    let key = parse_setpoint_key(&args.key)?;

    coordinator
        .set_setpoint(&device.smarthome_id, &device.id_device, key, args.celsius)
        .await?;
    info!(device = %device.id, %key, celsius = args.celsius, "setpoint changed");
    print_updated(coordinator, &device, global)
}

pub async fn boost(
    coordinator: &Coordinator,
    args: BoostArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_device(coordinator, &args.target.device)?;

    coordinator
        .set_boost_timer(&device.smarthome_id, &device.id_device, args.seconds)
        .await?;
    info!(device = %device.id, seconds = args.seconds, "boost timer changed");
    print_updated(coordinator, &device, global)
}

/// Print the device as the post-write refresh left it.
fn print_updated(
    coordinator: &Coordinator,
    before: &Device,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = coordinator
        .get_device(&before.smarthome_id, &before.id_device)
        .unwrap_or_else(|| before.clone());
    status::print_device(&device, global)
}
