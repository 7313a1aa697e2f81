//! Status views: device table and single-device detail.

use tabled::Tabled;
use watts_core::{Coordinator, CoreError, Device, SetpointKey};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, temperature};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Air °C")]
    air: String,
    #[tabled(rename = "Floor °C")]
    floor: String,
    #[tabled(rename = "Target °C")]
    target: String,
    #[tabled(rename = "Heating")]
    heating: String,
    #[tabled(rename = "Errors")]
    errors: usize,
}

impl From<&&Device> for DeviceRow {
    fn from(d: &&Device) -> Self {
        Self {
            id: d.id.clone(),
            name: d.display_name().to_owned(),
            mode: d.current_mode_label(),
            air: temperature(d.current_air_temperature()),
            floor: temperature(d.current_floor_temperature()),
            target: temperature(target_temperature(d)),
            heating: d.heating_status().to_string(),
            errors: d.errors.len(),
        }
    }
}

/// Temperature the device is regulating to: the current mode's setpoint,
/// else the manual one.
pub(crate) fn target_temperature(device: &Device) -> Option<f64> {
    device
        .active_setpoint_key()
        .and_then(|key| device.setpoint(key))
        .or_else(|| device.setpoint(SetpointKey::Manual))
}

fn detail(d: &Device) -> String {
    let mut lines = vec![
        format!("ID:        {}", d.id),
        format!("Name:      {}", d.display_name()),
        format!(
            "Zone:      {}",
            if d.zone_name.is_empty() { "-" } else { d.zone_name.as_str() }
        ),
        format!("Mode:      {} (code {})", d.current_mode_label(), d.gv_mode),
        format!("Heating:   {}", d.heating_status()),
        format!("Air:       {} °C", temperature(d.current_air_temperature())),
        format!("Floor:     {} °C", temperature(d.current_floor_temperature())),
        format!(
            "Range:     {} .. {} °C",
            temperature(d.min_set_point()),
            temperature(d.max_set_point())
        ),
    ];

    for key in [
        SetpointKey::Comfort,
        SetpointKey::Eco,
        SetpointKey::AntiFrost,
        SetpointKey::Boost,
        SetpointKey::Manual,
    ] {
        if let Some(value) = d.setpoint(key) {
            lines.push(format!("  {:<10} {value:.1} °C", format!("{key}:")));
        }
    }
    if d.time_boost_seconds > 0 {
        lines.push(format!("Boost:     {} s left", d.time_boost_seconds));
    }
    for e in &d.errors {
        lines.push(format!("Error:     [{}] {} {}", e.code, e.title, e.message));
    }
    lines.join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn list(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let state = coordinator.data().ok_or(CoreError::NoData)?;
    let devices: Vec<&Device> = state.devices().collect();
    let out = output::render_list(global.output, &devices, |d| DeviceRow::from(d), |d| d.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn show(coordinator: &Coordinator, reference: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::resolve_device(coordinator, reference)?;
    print_device(&device, global)
}

pub(crate) fn print_device(device: &Device, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, device, detail, |d| d.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
