// ── Device domain types ──

use std::collections::BTreeMap;

use serde::Serialize;
use strum::Display;

use super::mode::{BOOST_TIMER_FIELD, Mode, SetpointKey, mode_code_to_label};
use crate::codec::TemperatureCodec;

/// One entry from `smarthome/get_errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceError {
    pub code: String,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HeatingStatus {
    Heating,
    Idle,
}

/// A thermostat as merged from `smarthome/read` and `smarthome/get_errors`.
///
/// Temperature fields hold the vendor's raw fixed-point integers. Use the
/// decoded accessors, which apply the codec the device was parsed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub smarthome_id: String,
    /// Composite id, `"<smarthome_id>#<id_device>"`.
    pub id: String,
    /// Short id, unique within the smarthome.
    pub id_device: String,
    pub name: String,
    pub zone_id: String,
    pub zone_name: String,
    pub bundle_id: String,
    pub gv_mode: String,
    pub nv_mode: String,
    pub temperature_air_raw: Option<i64>,
    pub temperature_floor_raw: Option<i64>,
    pub heating_up: bool,
    pub error_code: i64,
    pub min_set_point_raw: Option<i64>,
    pub max_set_point_raw: Option<i64>,
    pub time_boost_seconds: i64,
    /// Only keys present in the payload; absent is not zero.
    pub setpoints_raw: BTreeMap<SetpointKey, i64>,
    pub errors: Vec<DeviceError>,
    #[serde(skip)]
    pub codec: TemperatureCodec,
}

impl Device {
    /// Name, falling back to the zone label and then the short id.
    pub fn display_name(&self) -> &str {
        [&self.name, &self.zone_name]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or(&self.id_device)
    }

    /// The known mode for `gv_mode`, if any.
    pub fn current_mode(&self) -> Option<Mode> {
        Mode::from_code(&self.gv_mode)
    }

    /// Label for `gv_mode`, including the `"Mode <code>"` fallback.
    pub fn current_mode_label(&self) -> String {
        mode_code_to_label(&self.gv_mode)
    }

    /// Setpoint that the current mode drives, if it has one.
    pub fn active_setpoint_key(&self) -> Option<SetpointKey> {
        self.current_mode().and_then(Mode::setpoint_key)
    }

    pub fn heating_status(&self) -> HeatingStatus {
        if self.heating_up {
            HeatingStatus::Heating
        } else {
            HeatingStatus::Idle
        }
    }

    pub fn current_air_temperature(&self) -> Option<f64> {
        self.temperature_air_raw.and_then(|r| self.codec.decode(r))
    }

    pub fn current_floor_temperature(&self) -> Option<f64> {
        self.temperature_floor_raw.and_then(|r| self.codec.decode(r))
    }

    pub fn min_set_point(&self) -> Option<f64> {
        self.min_set_point_raw.and_then(|r| self.codec.decode(r))
    }

    pub fn max_set_point(&self) -> Option<f64> {
        self.max_set_point_raw.and_then(|r| self.codec.decode(r))
    }

    pub fn setpoint(&self, key: SetpointKey) -> Option<f64> {
        self.setpoints_raw
            .get(&key)
            .and_then(|r| self.codec.decode(*r))
    }

    pub fn setpoint_raw(&self, key: SetpointKey) -> Option<String> {
        self.setpoints_raw.get(&key).map(ToString::to_string)
    }

    /// Full current-state query: every field `query/push` needs to leave
    /// the device as it is.
    ///
    /// When the payload carried no manual setpoint, the setpoint of the
    /// current mode stands in for it.
    pub fn base_query(&self) -> BTreeMap<String, String> {
        let mut query = BTreeMap::from([
            ("id_device".to_owned(), self.id_device.clone()),
            ("gv_mode".to_owned(), self.gv_mode.clone()),
            ("nv_mode".to_owned(), self.nv_mode.clone()),
            (
                BOOST_TIMER_FIELD.to_owned(),
                self.time_boost_seconds.to_string(),
            ),
        ]);

        for (key, raw) in &self.setpoints_raw {
            query.insert(key.field().to_owned(), raw.to_string());
        }

        let manual = SetpointKey::Manual.field();
        if !query.contains_key(manual) {
            if let Some(raw) = self
                .active_setpoint_key()
                .and_then(|key| self.setpoint_raw(key))
            {
                query.insert(manual.to_owned(), raw);
            }
        }

        query
    }

    /// Copy with the error list replaced wholesale.
    pub fn with_errors(self, errors: Vec<DeviceError>) -> Self {
        Self { errors, ..self }
    }
}
