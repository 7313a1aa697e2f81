// ── Smarthome, zone and account types ──

use std::collections::HashMap;

use serde::Serialize;

use super::device::{Device, DeviceError};

/// Smarthome summary as listed by `user/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmarthomeSummary {
    pub smarthome_id: String,
    pub label: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub mac_address: String,
    pub general_mode: String,
    pub holiday_mode: String,
    /// `param_c_f`: the display unit chosen in the vendor app.
    pub unit_mode: String,
}

/// The account behind the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub lang_code: String,
    pub cgu_id: String,
    pub optin_stats: String,
    pub smarthomes: Vec<SmarthomeSummary>,
}

impl UserProfile {
    pub fn smarthome_ids(&self) -> impl Iterator<Item = &str> {
        self.smarthomes.iter().map(|s| s.smarthome_id.as_str())
    }
}

/// A user sharing a smarthome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub user_id: String,
    pub user_email: String,
}

/// Mode metadata attached to a smarthome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub smarthome_id: String,
    pub mode_type_id: String,
    pub bundle_id: String,
    pub nvgv_mode_id: String,
}

/// A heating zone. Only used to label devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub num_zone: String,
    pub zone_label: String,
    pub zone_type_label: String,
    pub zone_type_icon: String,
    pub zone_image_id: String,
    pub device_ids: Vec<String>,
}

/// One installation, with its merged device list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Smarthome {
    pub smarthome_id: String,
    pub label: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub mac_address: String,
    pub general_mode: String,
    pub holiday_mode: String,
    pub unit_mode: String,
    pub holiday_start: String,
    pub holiday_end: String,
    pub jet_lag: i64,
    pub users: Vec<UserRef>,
    pub modes: Vec<ModeInfo>,
    pub zones: Vec<Zone>,
    pub devices: Vec<Device>,
}

impl Smarthome {
    /// Look a device up by short id.
    pub fn get_device(&self, id_device: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id_device == id_device)
    }

    /// Replace every device's error list from `error_map`. Devices with no
    /// entry end up with no errors.
    pub fn with_error_map(self, error_map: &HashMap<String, Vec<DeviceError>>) -> Self {
        let devices = self
            .devices
            .into_iter()
            .map(|device| {
                let errors = error_map.get(&device.id_device).cloned().unwrap_or_default();
                device.with_errors(errors)
            })
            .collect();
        Self { devices, ..self }
    }
}
