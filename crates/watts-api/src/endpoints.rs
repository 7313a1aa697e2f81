// Endpoint wrappers
//
// Thin parameter-shaping helpers over `WattsClient::post_form`. Every call
// is a bearer-authenticated form POST under `/api/v0.1/human/` and returns
// the validated JSON body untouched.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::client::{Form, WattsClient};
use crate::error::Error;

pub const USER_READ: &str = "/api/v0.1/human/user/read/";
pub const SMARTHOME_READ: &str = "/api/v0.1/human/smarthome/read/";
pub const SMARTHOME_GET_ERRORS: &str = "/api/v0.1/human/smarthome/get_errors/";
pub const SMARTHOME_TIME_OFFSET: &str = "/api/v0.1/human/smarthome/time_offset/";
pub const CHECK_LAST_CONNEXION: &str = "/api/v0.1/human/sandbox/check_last_connexion/";
pub const CONVERT_PROGRAM: &str = "/api/v0.1/human/sandbox/convert_program/";
pub const QUERY_CHECK_FAILURE: &str = "/api/v0.1/human/query/check_failure/";
pub const QUERY_PUSH: &str = "/api/v0.1/human/query/push/";
pub const APPLY_PROGRAM: &str = "/api/v0.1/human/device/apply_program/";
pub const STATS_READ: &str = "/api/v0.1/human/stats/read/";

/// Validity window, in milliseconds, attached to every pushed query.
pub const PUSH_PEREMPTION_MS: &str = "15000";
/// Push context marker the vendor app sends for user-initiated commands.
pub const PUSH_CONTEXT: &str = "1";

/// Vendor code meaning "no data yet", tolerated by `check_failure`.
const NO_DATA_CODE: &str = "2";

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_owned(), value.to_owned())
}

impl WattsClient {
    fn smarthome_form(&self, smarthome_id: &str, lang: Option<&str>) -> Form {
        vec![
            pair("smarthome_id", smarthome_id),
            pair("lang", self.lang(lang)),
        ]
    }

    // ── Account ──────────────────────────────────────────────────────

    /// Read the user profile and its smarthome summaries.
    pub async fn get_user_data(&self, lang: Option<&str>) -> Result<Value, Error> {
        let form = vec![pair("lang", self.lang(lang))];
        self.post_form(USER_READ, &form, &[]).await
    }

    // ── Smarthome reads ──────────────────────────────────────────────

    /// Read one smarthome's full state: zones, devices, setpoints.
    pub async fn get_smarthome_data(
        &self,
        smarthome_id: &str,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        let form = self.smarthome_form(smarthome_id, lang);
        self.post_form(SMARTHOME_READ, &form, &[]).await
    }

    /// Read the per-device error list of one smarthome.
    pub async fn get_errors(&self, smarthome_id: &str, lang: Option<&str>) -> Result<Value, Error> {
        let form = self.smarthome_form(smarthome_id, lang);
        self.post_form(SMARTHOME_GET_ERRORS, &form, &[]).await
    }

    pub async fn get_time_offset(
        &self,
        smarthome_id: &str,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        let form = self.smarthome_form(smarthome_id, lang);
        self.post_form(SMARTHOME_TIME_OFFSET, &form, &[]).await
    }

    /// Ask when the smarthome's gateway last reached the cloud.
    pub async fn check_last_connection(
        &self,
        smarthome_id: &str,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        let form = self.smarthome_form(smarthome_id, lang);
        self.post_form(CHECK_LAST_CONNEXION, &form, &[]).await
    }

    /// Poll for failed pushes. Vendor code `"2"` (nothing to report) is
    /// accepted as success.
    pub async fn check_failure(&self, smarthome_id: &str, lang: Option<&str>) -> Result<Value, Error> {
        let form = self.smarthome_form(smarthome_id, lang);
        self.post_form(QUERY_CHECK_FAILURE, &form, &[NO_DATA_CODE])
            .await
    }

    pub async fn read_stats(&self, smarthome_id: &str, lang: Option<&str>) -> Result<Value, Error> {
        let form = self.smarthome_form(smarthome_id, lang);
        self.post_form(STATS_READ, &form, &[]).await
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Push a device command. Each `query` entry is sent as
    /// `query[<field>]=<value>`.
    pub async fn push_query(
        &self,
        smarthome_id: &str,
        query: &BTreeMap<String, String>,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        let mut form = self.smarthome_form(smarthome_id, lang);
        form.push(pair("context", PUSH_CONTEXT));
        form.push(pair("peremption", PUSH_PEREMPTION_MS));
        form.extend(
            query
                .iter()
                .map(|(field, value)| (format!("query[{field}]"), value.clone())),
        );

        debug!(smarthome_id, fields = query.len(), "pushing query");
        self.post_form(QUERY_PUSH, &form, &[]).await
    }

    /// Apply a weekly program to a device addressed by its composite id.
    /// `fields` are already-flattened `program[...]` form fields.
    pub async fn apply_program(
        &self,
        device_id: &str,
        fields: &BTreeMap<String, String>,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        let mut form = vec![pair("device_id", device_id), pair("lang", self.lang(lang))];
        form.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));

        debug!(device_id, fields = fields.len(), "applying program");
        self.post_form(APPLY_PROGRAM, &form, &[]).await
    }

    /// Ask the API to convert a device program into display blocks.
    pub async fn convert_program(
        &self,
        fields: &BTreeMap<String, String>,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        let mut form = vec![pair("lang", self.lang(lang))];
        form.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.post_form(CONVERT_PROGRAM, &form, &[]).await
    }
}
