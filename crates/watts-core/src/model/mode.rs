// ── Operating modes and setpoint keys ──
//
// The vendor encodes modes as small integer strings in `gv_mode` /
// `nv_mode` and stores one target temperature per mode in a dedicated
// `consigne_*` field. Both mappings are closed sets.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Prefix used to render vendor codes outside the known set.
pub const UNKNOWN_MODE_PREFIX: &str = "Mode ";

/// Field carrying the boost countdown, in seconds.
pub const BOOST_TIMER_FIELD: &str = "time_boost";

/// A known operating mode.
///
/// Labels are snake_case (`anti_frost`, `program_on`). `auto_comfort` is
/// accepted as an alias for [`Mode::ProgramOn`] and `frost` for
/// [`Mode::AntiFrost`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Comfort,
    Off,
    #[strum(to_string = "anti_frost", serialize = "frost")]
    AntiFrost,
    Eco,
    Boost,
    #[strum(to_string = "program_on", serialize = "auto_comfort")]
    ProgramOn,
    AutoEco,
    On,
    Auto,
    Disabled,
}

impl Mode {
    /// Vendor code written to `gv_mode` / `nv_mode`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Comfort => "0",
            Self::Off => "1",
            Self::AntiFrost => "2",
            Self::Eco => "3",
            Self::Boost => "4",
            Self::ProgramOn => "8",
            Self::AutoEco => "11",
            Self::On => "12",
            Self::Auto => "13",
            Self::Disabled => "14",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::iter().find(|m| m.code() == code)
    }

    /// Setpoint that drives the target temperature while in this mode.
    pub fn setpoint_key(self) -> Option<SetpointKey> {
        match self {
            Self::Comfort => Some(SetpointKey::Comfort),
            Self::Eco => Some(SetpointKey::Eco),
            Self::AntiFrost => Some(SetpointKey::AntiFrost),
            Self::Boost => Some(SetpointKey::Boost),
            _ => None,
        }
    }
}

/// Label for a vendor mode code. Unknown codes render as `"Mode <code>"`.
pub fn mode_code_to_label(code: &str) -> String {
    match Mode::from_code(code) {
        Some(mode) => mode.to_string(),
        None => format!("{UNKNOWN_MODE_PREFIX}{}", code.trim()),
    }
}

/// Inverse of [`mode_code_to_label`]. `"Mode <code>"` yields `<code>`.
pub fn label_to_mode_code(label: &str) -> Option<String> {
    let label = label.trim();
    if let Ok(mode) = label.parse::<Mode>() {
        return Some(mode.code().to_owned());
    }
    label
        .strip_prefix(UNKNOWN_MODE_PREFIX)
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_owned)
}

/// One of the per-mode target temperatures.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum SetpointKey {
    #[strum(to_string = "comfort", serialize = "consigne_confort")]
    Comfort,
    #[strum(to_string = "eco", serialize = "consigne_eco")]
    Eco,
    #[strum(to_string = "anti_frost", serialize = "consigne_hg")]
    AntiFrost,
    #[strum(to_string = "boost", serialize = "consigne_boost")]
    Boost,
    /// Mirrors whichever setpoint is currently active. Not directly writable.
    #[strum(to_string = "manual", serialize = "consigne_manuel")]
    Manual,
}

impl SetpointKey {
    /// Keys a caller may write.
    pub const WRITABLE: [Self; 4] = [Self::Comfort, Self::Eco, Self::AntiFrost, Self::Boost];

    /// Vendor field name.
    pub fn field(self) -> &'static str {
        match self {
            Self::Comfort => "consigne_confort",
            Self::Eco => "consigne_eco",
            Self::AntiFrost => "consigne_hg",
            Self::Boost => "consigne_boost",
            Self::Manual => "consigne_manuel",
        }
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Manual)
    }
}
