//! Host polling loop.
//!
//! Sleeps for the coordinator's current update interval, refreshes and
//! prints one line per device. The interval is re-read every cycle so
//! the fast-poll window after a write takes effect. Transient failures
//! are logged and retried on the next cycle; an authentication failure
//! ends the loop.

use chrono::Local;
use tracing::{debug, info, warn};
use watts_core::{Coordinator, CoreError, WattsState};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, temperature};

use super::status::target_temperature;

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let state = coordinator.data().ok_or(CoreError::NoData)?;
    print_cycle(&state, global)?;

    loop {
        let delay = coordinator.update_interval();
        debug!(interval_secs = delay.as_secs(), "next refresh scheduled");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                return Ok(());
            }
            () = tokio::time::sleep(delay) => {}
        }

        match coordinator.refresh().await {
            Ok(state) => print_cycle(&state, global)?,
            Err(e) if e.is_auth() => return Err(e.into()),
            Err(e) => warn!(
                error = %e,
                snapshot_age_secs = coordinator.store().data_age().map(|age| age.num_seconds()),
                "refresh failed, retrying next cycle"
            ),
        }
    }
}

fn print_cycle(state: &WattsState, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(state)?,
        OutputFormat::Table | OutputFormat::Plain => summary(state),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn summary(state: &WattsState) -> String {
    let now = Local::now().format("%H:%M:%S");
    state
        .devices()
        .map(|d| {
            format!(
                "[{now}] {} ({}): {}, air {} °C, target {} °C, {}{}",
                d.display_name(),
                d.id,
                d.current_mode_label(),
                temperature(d.current_air_temperature()),
                temperature(target_temperature(d)),
                d.heating_status(),
                if d.errors.is_empty() {
                    String::new()
                } else {
                    format!(", {} error(s)", d.errors.len())
                },
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
