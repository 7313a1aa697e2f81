// ── Coordinator snapshot ──

use std::collections::BTreeSet;

use serde::Serialize;

use super::device::Device;
use super::smarthome::{Smarthome, UserProfile};

/// Everything one refresh cycle learned. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WattsState {
    pub user: UserProfile,
    pub smarthomes: Vec<Smarthome>,
}

impl WattsState {
    pub fn get_smarthome(&self, smarthome_id: &str) -> Option<&Smarthome> {
        self.smarthomes
            .iter()
            .find(|s| s.smarthome_id == smarthome_id)
    }

    pub fn get_device(&self, smarthome_id: &str, id_device: &str) -> Option<&Device> {
        self.get_smarthome(smarthome_id)?.get_device(id_device)
    }

    /// `(smarthome_id, id_device)` for every device in the snapshot.
    pub fn device_keys(&self) -> BTreeSet<(String, String)> {
        self.devices()
            .map(|d| (d.smarthome_id.clone(), d.id_device.clone()))
            .collect()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.smarthomes.iter().flat_map(|s| s.devices.iter())
    }

    pub fn device_count(&self) -> usize {
        self.smarthomes.iter().map(|s| s.devices.len()).sum()
    }

    /// Resolve a device reference to its composite id.
    ///
    /// Composite ids (`SH#C001-000`) and references matching no device are
    /// returned unchanged; a short id is expanded from the first device
    /// that carries it.
    pub fn resolve_device_id(&self, reference: &str) -> String {
        let reference = reference.trim();
        if reference.contains('#') {
            return reference.to_owned();
        }
        self.devices()
            .find(|d| d.id_device == reference)
            .map_or_else(|| reference.to_owned(), |d| d.id.clone())
    }
}
