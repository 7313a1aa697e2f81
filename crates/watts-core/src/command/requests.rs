// ── Write-request builders ──
//
// Pure functions from a device snapshot plus parameters to a complete
// `query/push` payload. `query/push` overwrites the whole device state,
// so every builder starts from `Device::base_query` and changes only
// what the command is about.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::model::{BOOST_TIMER_FIELD, Device, Mode, SetpointKey};

/// Timer written when boost is selected on a device with no timer running.
pub const DEFAULT_BOOST_SECONDS: i64 = 3600;

/// A fully-formed device command ready for `query/push`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteRequest {
    pub smarthome_id: String,
    pub id_device: String,
    /// Field name → value, sent as `query[<field>]`.
    pub query: BTreeMap<String, String>,
}

impl WriteRequest {
    fn from_device(device: &Device, query: BTreeMap<String, String>) -> Self {
        Self {
            smarthome_id: device.smarthome_id.clone(),
            id_device: device.id_device.clone(),
            query,
        }
    }
}

/// Switch `device` to `mode`.
///
/// If the mode has its own setpoint, that value is also written to the
/// manual field so the thermostat targets it right away. Boost on a
/// device with no timer running gets [`DEFAULT_BOOST_SECONDS`].
pub fn build_mode_write_request(device: &Device, mode: Mode) -> WriteRequest {
    let mut query = device.base_query();
    query.insert("gv_mode".into(), mode.code().into());
    query.insert("nv_mode".into(), mode.code().into());

    if let Some(key) = mode.setpoint_key() {
        if let Some(raw) = device.setpoint_raw(key) {
            query.insert(key.field().into(), raw.clone());
            query.insert(SetpointKey::Manual.field().into(), raw);
        }
    }

    if mode == Mode::Boost && device.time_boost_seconds <= 0 {
        query.insert(BOOST_TIMER_FIELD.into(), DEFAULT_BOOST_SECONDS.to_string());
    }

    WriteRequest::from_device(device, query)
}

/// Set one per-mode setpoint to `celsius`.
///
/// When `key` is the setpoint of the device's current mode the manual
/// field receives the same value. [`SetpointKey::Manual`] itself is not
/// writable.
pub fn build_setpoint_write_request(
    device: &Device,
    key: SetpointKey,
    celsius: f64,
) -> Result<WriteRequest, CoreError> {
    if !key.is_writable() {
        return Err(CoreError::validation(format!(
            "setpoint '{key}' cannot be written directly"
        )));
    }
    if !celsius.is_finite() {
        return Err(CoreError::validation(format!(
            "setpoint temperature must be a finite number, got {celsius}"
        )));
    }

    let raw = device.codec.encode_setpoint(celsius);
    let mut query = device.base_query();
    query.insert(key.field().into(), raw.clone());

    if device.active_setpoint_key() == Some(key) {
        query.insert(SetpointKey::Manual.field().into(), raw);
    }

    Ok(WriteRequest::from_device(device, query))
}

/// Set the boost countdown. Negative values are clamped to zero.
pub fn build_boost_timer_write_request(device: &Device, seconds: i64) -> WriteRequest {
    let mut query = device.base_query();
    query.insert(BOOST_TIMER_FIELD.into(), seconds.max(0).to_string());
    WriteRequest::from_device(device, query)
}

/// Parse a mode label (`"eco"`, `"auto_comfort"`) for a write.
pub fn parse_mode(label: &str) -> Result<Mode, CoreError> {
    label
        .trim()
        .parse()
        .map_err(|_| CoreError::validation(format!("unsupported mode: {label}")))
}

/// Parse a writable setpoint key, by label or vendor field name.
pub fn parse_setpoint_key(label: &str) -> Result<SetpointKey, CoreError> {
    label
        .trim()
        .parse::<SetpointKey>()
        .ok()
        .filter(|k| k.is_writable())
        .ok_or_else(|| CoreError::validation(format!("unsupported setpoint key: {label}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::device::fixtures::comfort_device;

    #[test]
    fn boost_mode_injects_default_timer() {
        let mut device = comfort_device();
        device.setpoints_raw.insert(SetpointKey::Boost, 704);

        let req = build_mode_write_request(&device, Mode::Boost);
        assert_eq!(req.smarthome_id, "SH1");
        assert_eq!(req.id_device, "C001-000");
        assert_eq!(req.query["gv_mode"], "4");
        assert_eq!(req.query["nv_mode"], "4");
        assert_eq!(req.query["time_boost"], "3600");
        assert_eq!(req.query["consigne_boost"], "704");
        assert_eq!(req.query["consigne_manuel"], "704");
    }

    #[test]
    fn boost_mode_keeps_running_timer() {
        let mut device = comfort_device();
        device.time_boost_seconds = 900;
        let req = build_mode_write_request(&device, Mode::Boost);
        assert_eq!(req.query["time_boost"], "900");
    }

    #[test]
    fn mode_without_setpoint_keeps_manual_fallback() {
        let req = build_mode_write_request(&comfort_device(), Mode::ProgramOn);
        assert_eq!(req.query["gv_mode"], "8");
        // Manual still mirrors the comfort value the device was running on.
        assert_eq!(req.query["consigne_manuel"], "624");
    }

    #[test]
    fn eco_mode_mirrors_eco_setpoint() {
        let req = build_mode_write_request(&comfort_device(), Mode::Eco);
        assert_eq!(req.query["consigne_eco"], "544");
        assert_eq!(req.query["consigne_manuel"], "544");
    }

    #[test]
    fn active_setpoint_mirrors_into_manual() {
        let req = build_setpoint_write_request(&comfort_device(), SetpointKey::Comfort, 21.8)
            .unwrap();
        assert_eq!(req.query["consigne_confort"], "698");
        assert_eq!(req.query["consigne_manuel"], "698");
    }

    #[test]
    fn inactive_setpoint_leaves_manual_alone() {
        let device = comfort_device();
        let req = build_setpoint_write_request(&device, SetpointKey::Eco, 16.0).unwrap();
        assert_eq!(req.query["consigne_eco"], "512");
        assert_eq!(req.query["consigne_manuel"], "624");

        let mut expected = device.base_query();
        expected.insert("consigne_eco".into(), "512".into());
        assert_eq!(req.query, expected);
    }

    #[test]
    fn manual_setpoint_is_rejected() {
        let result = build_setpoint_write_request(&comfort_device(), SetpointKey::Manual, 20.0);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert!(parse_setpoint_key("consigne_manuel").is_err());
        assert_eq!(parse_setpoint_key("eco").unwrap(), SetpointKey::Eco);
    }

    #[test]
    fn boost_timer_is_clamped() {
        let device = comfort_device();
        assert_eq!(build_boost_timer_write_request(&device, -5).query["time_boost"], "0");
        assert_eq!(build_boost_timer_write_request(&device, 1800).query["time_boost"], "1800");
    }

    #[test]
    fn unknown_mode_label_is_rejected() {
        assert!(matches!(parse_mode("turbo"), Err(CoreError::Validation { .. })));
        assert_eq!(parse_mode(" Auto_Comfort ").unwrap(), Mode::ProgramOn);
    }

    #[test]
    fn builders_do_not_mutate_device() {
        let device = comfort_device();
        let before = device.clone();
        let _ = build_mode_write_request(&device, Mode::Off);
        let _ = build_setpoint_write_request(&device, SetpointKey::Comfort, 22.0);
        assert_eq!(device, before);
    }
}
