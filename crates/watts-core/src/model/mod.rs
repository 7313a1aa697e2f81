// ── Domain model ──
//
// Immutable parsed representations of the account, its smarthomes and
// their devices. Built by `convert`, read by consumers, consumed by the
// write builders in `command`.

pub mod device;
pub mod mode;
pub mod smarthome;
pub mod state;

pub use device::{Device, DeviceError, HeatingStatus};
pub use mode::{
    BOOST_TIMER_FIELD, Mode, SetpointKey, UNKNOWN_MODE_PREFIX, label_to_mode_code,
    mode_code_to_label,
};
pub use smarthome::{ModeInfo, Smarthome, SmarthomeSummary, UserProfile, UserRef, Zone};
pub use state::WattsState;
