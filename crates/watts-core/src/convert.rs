// ── API-to-domain conversions ──
//
// Builds the domain model from the raw JSON bodies `watts-api` returns.
// Parsing is tolerant: a missing or oddly-typed field becomes an empty
// string, zero or `None`. Only a body that is not a JSON object at all is
// an error.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::codec::{TemperatureCodec, parse_raw};
use crate::error::CoreError;
use crate::model::{
    BOOST_TIMER_FIELD, Device, DeviceError, ModeInfo, SetpointKey, Smarthome, SmarthomeSummary,
    UserProfile, UserRef, WattsState, Zone,
};

// ── Helpers ────────────────────────────────────────────────────────

static EMPTY: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);

/// Trimmed text of a scalar. Null, missing and structured values are "".
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Integer of a number or numeric string; fractions are truncated.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_raw(s),
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true))) || text(value) == "1"
}

fn list<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn object<'a>(value: Option<&'a Value>) -> &'a Map<String, Value> {
    value.and_then(Value::as_object).unwrap_or(&EMPTY)
}

/// The `data` object of an envelope, or an empty map.
fn envelope_data<'a>(payload: &'a Value, context: &str) -> Result<&'a Map<String, Value>, CoreError> {
    let root = payload.as_object().ok_or_else(|| CoreError::InvalidPayload {
        context: context.to_owned(),
        message: format!("expected a JSON object, got {}", kind(payload)),
    })?;
    Ok(object(root.get("data")))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── user/read ──────────────────────────────────────────────────────

/// Parse a `user/read` body. Smarthome entries without an id are dropped.
pub fn parse_user_profile(payload: &Value) -> Result<UserProfile, CoreError> {
    let data = envelope_data(payload, "user/read")?;

    // A smarthome listed twice is fetched and reported once; first entry wins.
    let mut smarthomes: IndexMap<String, SmarthomeSummary> = IndexMap::new();
    for raw in list(data, "smarthomes").iter().filter_map(Value::as_object) {
        let smarthome_id = text(raw.get("smarthome_id"));
        if smarthome_id.is_empty() {
            continue;
        }
        if smarthomes.contains_key(&smarthome_id) {
            debug!(smarthome_id = %smarthome_id, "duplicate smarthome in profile, ignoring");
            continue;
        }
        let summary = SmarthomeSummary {
            smarthome_id: smarthome_id.clone(),
            label: text(raw.get("label")),
            address: text(raw.get("address_position")),
            latitude: text(raw.get("latitude")),
            longitude: text(raw.get("longitude")),
            mac_address: text(raw.get("mac_address")),
            general_mode: text(raw.get("general_mode")),
            holiday_mode: text(raw.get("holiday_mode")),
            unit_mode: text(raw.get("param_c_f")),
        };
        smarthomes.insert(smarthome_id, summary);
    }

    Ok(UserProfile {
        user_id: text(data.get("user_id")),
        email: text(data.get("email")),
        lang_code: text(data.get("lang_code")),
        cgu_id: text(data.get("cgu_id")),
        optin_stats: text(data.get("optin_stats")),
        smarthomes: smarthomes.into_values().collect(),
    })
}

// ── smarthome/read ─────────────────────────────────────────────────

fn parse_zone(raw: &Map<String, Value>) -> Zone {
    let device_ids = list(raw, "devices")
        .iter()
        .filter_map(Value::as_object)
        .map(|d| text(d.get("id_device")))
        .filter(|id| !id.is_empty())
        .collect();

    Zone {
        num_zone: text(raw.get("num_zone")),
        zone_label: text(raw.get("zone_label")),
        zone_type_label: text(raw.get("label_zone_type")),
        zone_type_icon: text(raw.get("picto_zone_type")),
        zone_image_id: text(raw.get("zone_img_id")),
        device_ids,
    }
}

fn parse_device(
    raw: &Map<String, Value>,
    id_device: String,
    smarthome_id: &str,
    zone: Option<&Zone>,
    codec: TemperatureCodec,
) -> Device {
    let setpoints_raw = [
        SetpointKey::Comfort,
        SetpointKey::Eco,
        SetpointKey::AntiFrost,
        SetpointKey::Boost,
        SetpointKey::Manual,
    ]
    .into_iter()
    .filter_map(|key| int(raw.get(key.field())).map(|v| (key, v)))
    .collect();

    let id = Some(text(raw.get("id")))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{smarthome_id}#{id_device}"));

    Device {
        smarthome_id: smarthome_id.to_owned(),
        id,
        name: text(raw.get("nom_appareil")),
        zone_id: zone.map_or_else(|| text(raw.get("num_zone")), |z| z.num_zone.clone()),
        zone_name: zone.map(|z| z.zone_label.clone()).unwrap_or_default(),
        bundle_id: text(raw.get("bundle_id")),
        gv_mode: text(raw.get("gv_mode")),
        nv_mode: text(raw.get("nv_mode")),
        temperature_air_raw: int(raw.get("temperature_air")),
        temperature_floor_raw: int(raw.get("temperature_sol")),
        heating_up: flag(raw.get("heating_up")),
        error_code: int(raw.get("error_code")).unwrap_or(0),
        min_set_point_raw: int(raw.get("min_set_point")),
        max_set_point_raw: int(raw.get("max_set_point")),
        time_boost_seconds: int(raw.get(BOOST_TIMER_FIELD)).unwrap_or(0),
        setpoints_raw,
        errors: Vec::new(),
        codec,
        id_device,
    }
}

/// Parse a `smarthome/read` body.
///
/// Devices come from the flat `devices` list and from every
/// `zones[].devices` list. A short id seen twice keeps its first record;
/// zone labels are applied whichever list the record came from.
/// `smarthome_id` is used when the body does not name its smarthome.
pub fn parse_smarthome(
    payload: &Value,
    smarthome_id: &str,
    codec: TemperatureCodec,
) -> Result<Smarthome, CoreError> {
    let data = envelope_data(payload, "smarthome/read")?;
    let resolved_id = Some(text(data.get("smarthome_id")))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| smarthome_id.to_owned());

    let raw_zones: Vec<&Map<String, Value>> = list(data, "zones")
        .iter()
        .filter_map(Value::as_object)
        .collect();
    let zones: Vec<Zone> = raw_zones.iter().copied().map(parse_zone).collect();

    let mut zone_of: HashMap<&str, &Zone> = HashMap::new();
    for zone in &zones {
        for id_device in &zone.device_ids {
            zone_of.insert(id_device.as_str(), zone);
        }
    }

    let nested = raw_zones.iter().copied().flat_map(|z| list(z, "devices"));
    let mut devices: IndexMap<String, Device> = IndexMap::new();
    for raw in list(data, "devices").iter().chain(nested).filter_map(Value::as_object) {
        let id_device = text(raw.get("id_device"));
        if id_device.is_empty() || devices.contains_key(&id_device) {
            continue;
        }
        let zone = zone_of.get(id_device.as_str()).copied();
        let device = parse_device(raw, id_device.clone(), &resolved_id, zone, codec);
        devices.insert(id_device, device);
    }

    let users = list(data, "users")
        .iter()
        .filter_map(Value::as_object)
        .map(|u| UserRef {
            user_id: text(u.get("user_id")),
            user_email: text(u.get("user_email")),
        })
        .collect();

    let modes = list(data, "modes")
        .iter()
        .filter_map(Value::as_object)
        .map(|m| ModeInfo {
            smarthome_id: text(m.get("smarthome_id")),
            mode_type_id: text(m.get("smarthome_mode_type_id")),
            bundle_id: text(m.get("bundle_id")),
            nvgv_mode_id: text(m.get("nvgv_mode_id")),
        })
        .collect();

    debug!(
        smarthome_id = %resolved_id,
        zones = zones.len(),
        devices = devices.len(),
        "parsed smarthome"
    );

    Ok(Smarthome {
        label: text(data.get("label")),
        address: text(data.get("address_position")),
        latitude: text(data.get("latitude")),
        longitude: text(data.get("longitude")),
        mac_address: text(data.get("mac_address")),
        general_mode: text(data.get("general_mode")),
        holiday_mode: text(data.get("holiday_mode")),
        unit_mode: text(data.get("param_c_f")),
        holiday_start: text(data.get("holiday_start")),
        holiday_end: text(data.get("holiday_end")),
        jet_lag: int(data.get("jet_lag")).unwrap_or(0),
        users,
        modes,
        zones,
        devices: devices.into_values().collect(),
        smarthome_id: resolved_id,
    })
}

// ── smarthome/get_errors ───────────────────────────────────────────

/// Parse a `smarthome/get_errors` body into short id → errors.
///
/// Reads `data.results.by_device.<smarthome>.<device>`. A device listed
/// without an `errors` array maps to an empty list.
pub fn parse_smarthome_errors(
    payload: &Value,
) -> Result<HashMap<String, Vec<DeviceError>>, CoreError> {
    let data = envelope_data(payload, "smarthome/get_errors")?;
    let by_device = object(object(data.get("results")).get("by_device"));

    let mut parsed = HashMap::new();
    for raw_device in by_device
        .values()
        .filter_map(Value::as_object)
        .flat_map(Map::values)
        .filter_map(Value::as_object)
    {
        let id_device = text(raw_device.get("id_device"));
        if id_device.is_empty() {
            continue;
        }
        let errors = list(raw_device, "errors")
            .iter()
            .filter_map(Value::as_object)
            .map(|e| DeviceError {
                code: text(e.get("code")),
                title: text(e.get("title")),
                message: text(e.get("error")),
            })
            .collect();
        parsed.insert(id_device, errors);
    }

    Ok(parsed)
}

// ── Full snapshot ──────────────────────────────────────────────────

/// Assemble a snapshot from one refresh cycle's payloads.
///
/// Smarthomes listed by the profile but missing from `smarthome_payloads`
/// (or with an unreadable body) are left out. Error payloads are optional
/// per smarthome.
pub fn parse_state(
    user_payload: &Value,
    smarthome_payloads: &HashMap<String, Value>,
    smarthome_error_payloads: &HashMap<String, Value>,
    codec: TemperatureCodec,
) -> Result<WattsState, CoreError> {
    let user = parse_user_profile(user_payload)?;

    let mut smarthomes = Vec::with_capacity(user.smarthomes.len());
    for smarthome_id in user.smarthome_ids() {
        let Some(payload) = smarthome_payloads.get(smarthome_id) else {
            debug!(smarthome_id, "no detail payload, skipping smarthome");
            continue;
        };

        let mut smarthome = match parse_smarthome(payload, smarthome_id, codec) {
            Ok(s) => s,
            Err(e) => {
                warn!(smarthome_id, error = %e, "skipping unreadable smarthome");
                continue;
            }
        };

        if let Some(error_payload) = smarthome_error_payloads.get(smarthome_id) {
            match parse_smarthome_errors(error_payload) {
                Ok(error_map) => smarthome = smarthome.with_error_map(&error_map),
                Err(e) => warn!(smarthome_id, error = %e, "ignoring unreadable error list"),
            }
        }
        smarthomes.push(smarthome);
    }

    Ok(WattsState { user, smarthomes })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::Mode;

    const CODEC: TemperatureCodec = TemperatureCodec::SCALED_CELSIUS;

    fn user_payload() -> Value {
        json!({
            "code": {"code": "1", "key": "OK", "value": "OK"},
            "data": {
                "user_id": 42,
                "email": " user@example.com ",
                "lang_code": "fr_FR",
                "smarthomes": [
                    {"smarthome_id": "SH1", "label": "Home", "param_c_f": "0"},
                    {"smarthome_id": "SH2", "label": "Cottage"},
                    {"label": "no id"},
                ],
            },
        })
    }

    fn smarthome_payload() -> Value {
        json!({
            "data": {
                "smarthome_id": "SH1",
                "label": "Home",
                "jet_lag": "60",
                "zones": [{
                    "num_zone": "1",
                    "zone_label": "Ground floor",
                    "label_zone_type": "Living",
                    "devices": [
                        {"id_device": "C001-000", "nom_appareil": "Duplicate", "gv_mode": "3"},
                        {"id_device": "C002-000", "nom_appareil": "Kitchen", "gv_mode": "3",
                         "consigne_eco": "544", "heating_up": "0"},
                    ],
                }],
                "devices": [{
                    "id": "SH1#C001-000",
                    "id_device": "C001-000",
                    "nom_appareil": "Living Room",
                    "gv_mode": "0",
                    "nv_mode": "0",
                    "temperature_air": "692",
                    "temperature_sol": "2124",
                    "heating_up": "1",
                    "consigne_confort": 624,
                    "consigne_eco": "544",
                    "time_boost": "",
                }],
                "users": [{"user_id": "42", "user_email": "user@example.com"}],
            },
        })
    }

    #[test]
    fn user_profile_is_tolerant() {
        let user = parse_user_profile(&user_payload()).unwrap();
        assert_eq!(user.user_id, "42");
        assert_eq!(user.email, "user@example.com");
        assert_eq!(user.cgu_id, "");
        assert_eq!(user.smarthome_ids().collect::<Vec<_>>(), vec!["SH1", "SH2"]);
        assert_eq!(user.smarthomes[0].unit_mode, "0");
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(
            parse_user_profile(&json!([1, 2])),
            Err(CoreError::InvalidPayload { .. })
        ));
        // An object with garbage inside is still accepted.
        let user = parse_user_profile(&json!({"data": "oops"})).unwrap();
        assert!(user.smarthomes.is_empty());
    }

    #[test]
    fn devices_are_deduplicated_first_seen_wins() {
        let home = parse_smarthome(&smarthome_payload(), "SH1", CODEC).unwrap();
        assert_eq!(home.devices.len(), 2);

        let living = home.get_device("C001-000").unwrap();
        assert_eq!(living.name, "Living Room");
        assert_eq!(living.current_mode(), Some(Mode::Comfort));
        // Zone metadata reaches the flat-list record too.
        assert_eq!(living.zone_name, "Ground floor");
        assert_eq!(living.zone_id, "1");

        let kitchen = home.get_device("C002-000").unwrap();
        assert_eq!(kitchen.id, "SH1#C002-000");
        assert!(!kitchen.heating_up);
    }

    #[test]
    fn setpoints_only_for_present_keys() {
        let home = parse_smarthome(&smarthome_payload(), "SH1", CODEC).unwrap();
        let living = home.get_device("C001-000").unwrap();
        assert_eq!(living.setpoints_raw.len(), 2);
        assert_eq!(living.setpoints_raw[&SetpointKey::Comfort], 624);
        assert!(!living.setpoints_raw.contains_key(&SetpointKey::Boost));
        assert_eq!(living.time_boost_seconds, 0);
        assert_eq!(living.current_air_temperature(), Some(21.6));
        assert_eq!(living.current_floor_temperature(), None);
        assert_eq!(home.jet_lag, 60);
    }

    #[test]
    fn smarthome_id_falls_back_to_argument() {
        let home = parse_smarthome(&json!({"data": {"devices": [{"id_device": "X"}]}}), "SH9", CODEC)
            .unwrap();
        assert_eq!(home.smarthome_id, "SH9");
        assert_eq!(home.devices[0].id, "SH9#X");
    }

    #[test]
    fn error_map_descends_by_device() {
        let payload = json!({
            "data": {"results": {"by_device": {"SH1": {
                "C001-000": {"id_device": "C001-000", "errors": [
                    {"code": "E12", "title": "Sensor", "error": "Floor probe missing"},
                ]},
                "C002-000": {"id_device": "C002-000"},
            }}}},
        });
        let map = parse_smarthome_errors(&payload).unwrap();
        assert_eq!(map["C001-000"][0].message, "Floor probe missing");
        assert!(map["C002-000"].is_empty());
    }

    #[test]
    fn state_skips_missing_smarthomes() {
        let smarthomes = HashMap::from([("SH1".to_owned(), smarthome_payload())]);
        let errors = HashMap::from([(
            "SH1".to_owned(),
            json!({"data": {"results": {"by_device": {"SH1": {
                "C002-000": {"id_device": "C002-000", "errors": [{"code": "1"}]},
            }}}}}),
        )]);

        let state = parse_state(&user_payload(), &smarthomes, &errors, CODEC).unwrap();
        assert_eq!(state.smarthomes.len(), 1);
        assert!(state.get_smarthome("SH2").is_none());
        assert_eq!(state.get_device("SH1", "C002-000").unwrap().errors.len(), 1);
        assert!(state.get_device("SH1", "C001-000").unwrap().errors.is_empty());
        assert_eq!(state.device_keys().len(), 2);
    }

    #[test]
    fn repeated_smarthome_is_listed_once() {
        let payload = json!({
            "data": {
                "user_id": "42",
                "smarthomes": [
                    {"smarthome_id": "SH1", "label": "Home"},
                    {"smarthome_id": "SH1", "label": "Home again"},
                ],
            },
        });
        let user = parse_user_profile(&payload).unwrap();
        assert_eq!(user.smarthome_ids().collect::<Vec<_>>(), vec!["SH1"]);
        assert_eq!(user.smarthomes[0].label, "Home");

        let smarthomes = HashMap::from([("SH1".to_owned(), smarthome_payload())]);
        let state = parse_state(&payload, &smarthomes, &HashMap::new(), CODEC).unwrap();
        assert_eq!(state.smarthomes.len(), 1);
        assert_eq!(state.devices().count(), 2);
    }
}
