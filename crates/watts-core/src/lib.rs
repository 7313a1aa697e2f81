// watts-core: Domain model, value codec and polling coordinator for Watts SmartHome.

pub mod codec;
pub mod command;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod program;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codec::{RawUnit, TemperatureCodec};
pub use command::{Command, WriteRequest};
pub use config::CoordinatorConfig;
pub use convert::{parse_smarthome, parse_smarthome_errors, parse_state, parse_user_profile};
pub use coordinator::{Coordinator, RefreshState};
pub use error::CoreError;
pub use program::normalize_program;
pub use session::Session;
pub use store::DataStore;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Device, DeviceError, HeatingStatus, Mode, SetpointKey, Smarthome, SmarthomeSummary,
    UserProfile, WattsState, Zone, label_to_mode_code, mode_code_to_label,
};
