// ── Command API ──
//
// Device writes flow through a single `Command` enum. The coordinator
// resolves the target device from its snapshot, turns the command into a
// `WriteRequest` and pushes it.

pub mod requests;

use crate::error::CoreError;
use crate::model::{Device, Mode, SetpointKey};

pub use requests::{
    DEFAULT_BOOST_SECONDS, WriteRequest, build_boost_timer_write_request,
    build_mode_write_request, build_setpoint_write_request, parse_mode, parse_setpoint_key,
};

/// All write operations against a single device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetMode { mode: Mode },
    SetSetpoint { key: SetpointKey, celsius: f64 },
    SetBoostTimer { seconds: i64 },
}

impl Command {
    /// Build the push payload for `device`.
    pub fn build(self, device: &Device) -> Result<WriteRequest, CoreError> {
        match self {
            Self::SetMode { mode } => Ok(build_mode_write_request(device, mode)),
            Self::SetSetpoint { key, celsius } => build_setpoint_write_request(device, key, celsius),
            Self::SetBoostTimer { seconds } => Ok(build_boost_timer_write_request(device, seconds)),
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMode { .. } => "set_mode",
            Self::SetSetpoint { .. } => "set_setpoint",
            Self::SetBoostTimer { .. } => "set_boost_timer",
        }
    }
}
