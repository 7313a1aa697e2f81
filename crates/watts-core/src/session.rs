// ── Per-account session ──
//
// Bundles the API client and coordinator for one account. The host
// keeps the `Session` and hands it to whatever needs the account; it
// lives from `start()` to `stop()`.

use std::sync::Arc;

use tracing::info;
use watts_api::{Credentials, WattsClient};

use crate::config::CoordinatorConfig;
use crate::coordinator::Coordinator;
use crate::error::CoreError;

/// One authenticated account with its coordinator.
pub struct Session {
    client: Arc<WattsClient>,
    coordinator: Coordinator,
}

impl Session {
    /// Authenticate, load the first snapshot and return the live session.
    ///
    /// Fails with [`CoreError::AuthenticationFailed`] on bad credentials
    /// and with the refresh error if the first snapshot cannot be built.
    pub async fn start(config: &CoordinatorConfig) -> Result<Self, CoreError> {
        let credentials = Credentials {
            username: config.username.clone(),
            password: config.password.clone(),
        };
        let client = Arc::new(WattsClient::new(
            credentials,
            config.lang.clone(),
            &config.transport,
        )?);
        client.login().await?;

        let coordinator = Coordinator::new(Arc::clone(&client), config);
        let state = coordinator.refresh().await?;
        info!(
            username = %config.username,
            smarthomes = state.smarthomes.len(),
            devices = state.device_count(),
            "session started"
        );

        Ok(Self {
            client,
            coordinator,
        })
    }

    pub fn client(&self) -> &Arc<WattsClient> {
        &self.client
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// End the session. The token is dropped; clones of the coordinator
    /// held elsewhere will have to log in again.
    pub async fn stop(self) {
        self.client.invalidate_token().await;
        info!(username = %self.client.username(), "session stopped");
    }
}
