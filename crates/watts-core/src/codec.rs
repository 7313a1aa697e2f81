// ── Value codec ──
//
// Conversion between the vendor's fixed-point temperature integers and
// degrees Celsius. Two encodings have been seen in the field, so the
// scale, unit and validity rules are parameters rather than constants.

use serde::Serialize;

/// Physical unit of a raw value once the divisor has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawUnit {
    Celsius,
    Fahrenheit,
}

/// Parameter set for one temperature encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureCodec {
    /// Raw value divided by this yields degrees in `unit`.
    pub divisor: f64,
    pub unit: RawUnit,
    /// Raw value meaning "no reading".
    pub invalid_raw: Option<i64>,
    /// Scaled values above this (in `unit`) are treated as no reading.
    pub max_valid: Option<f64>,
}

impl TemperatureCodec {
    /// Celsius / 32 with 2124 as the "no reading" sentinel. `624` is 19.5 °C.
    pub const SCALED_CELSIUS: Self = Self {
        divisor: 32.0,
        unit: RawUnit::Celsius,
        invalid_raw: Some(2124),
        max_valid: None,
    };

    /// Deci-Fahrenheit: `698` is 69.8 °F, i.e. 21.0 °C. Anything above
    /// 99 °F is a sensor fault.
    pub const DECI_FAHRENHEIT: Self = Self {
        divisor: 10.0,
        unit: RawUnit::Fahrenheit,
        invalid_raw: None,
        max_valid: Some(99.0),
    };

    /// Decode a raw integer to °C rounded to one decimal.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn decode(&self, raw: i64) -> Option<f64> {
        if self.invalid_raw == Some(raw) {
            return None;
        }

        let scaled = raw as f64 / self.divisor;
        if !scaled.is_finite() || self.max_valid.is_some_and(|max| scaled > max) {
            return None;
        }

        let celsius = match self.unit {
            RawUnit::Celsius => scaled,
            RawUnit::Fahrenheit => (scaled - 32.0) / 1.8,
        };
        Some(round_tenth(celsius))
    }

    /// Decode a textual raw value (`"624"`, `" 624.0 "`). Non-numeric
    /// input decodes to `None`.
    pub fn decode_str(&self, raw: &str) -> Option<f64> {
        parse_raw(raw).and_then(|r| self.decode(r))
    }

    /// Encode °C to the nearest raw integer.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn encode(&self, celsius: f64) -> i64 {
        let scaled = match self.unit {
            RawUnit::Celsius => celsius,
            RawUnit::Fahrenheit => celsius * 1.8 + 32.0,
        };
        (scaled * self.divisor).round() as i64
    }

    /// Encode °C as the string form `query/push` expects.
    pub fn encode_setpoint(&self, celsius: f64) -> String {
        self.encode(celsius).to_string()
    }
}

impl Default for TemperatureCodec {
    fn default() -> Self {
        Self::SCALED_CELSIUS
    }
}

/// Parse vendor integer text, truncating a fractional part the way the
/// vendor app does. Empty or non-numeric text yields `None`.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn parse_raw(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(v) = text.parse::<i64>() {
        return Some(v);
    }
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
