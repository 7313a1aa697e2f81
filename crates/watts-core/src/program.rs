// ── Weekly program payloads ──
//
// `device/apply_program` takes flattened form fields of the shape
// `program[<day>][<index>][start|end|value]`. Callers may hand those in
// directly or as a structured per-day block list.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

const DAYS: [(&str, &str); 7] = [
    ("mon", "monday"),
    ("tue", "tuesday"),
    ("wed", "wednesday"),
    ("thu", "thursday"),
    ("fri", "friday"),
    ("sat", "saturday"),
    ("sun", "sunday"),
];

/// Full lower-case day name for `day`; unknown names are only lower-cased.
pub fn normalize_day(day: &str) -> String {
    let day = day.trim().to_lowercase();
    DAYS.iter()
        .find(|(short, _)| *short == day)
        .map_or(day, |(_, full)| (*full).to_owned())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_fields(input: &Map<String, Value>, keep: impl Fn(&str) -> bool) -> BTreeMap<String, String> {
    input
        .iter()
        .filter(|(key, _)| keep(key))
        .filter_map(|(key, value)| scalar(value).map(|v| (key.clone(), v)))
        .collect()
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value.and_then(scalar).filter(|s| !s.is_empty())
}

/// Flatten a weekly program into `device/apply_program` form fields.
///
/// Accepted shapes:
/// - already flattened: any `program[...]` key means the input is passed
///   through as is;
/// - `{"program": {"monday": [{"start", "end", "value"}], ...}}`;
/// - the same day map without the `program` wrapper.
///
/// `mode` is accepted in place of `value`. Blocks missing start, end or
/// value are dropped but keep their index slot. Scalar keys outside the
/// program (e.g. `device_id`) are passed through.
pub fn normalize_program(input: &Map<String, Value>) -> BTreeMap<String, String> {
    if input.keys().any(|k| k.starts_with("program[")) {
        return scalar_fields(input, |_| true);
    }

    let source = match input.get("program") {
        Some(Value::Object(days)) => days,
        Some(_) => return scalar_fields(input, |_| true),
        None => input,
    };

    let mut fields = scalar_fields(input, |key| key != "program");
    for (raw_day, blocks) in source {
        let Some(blocks) = blocks.as_array() else {
            continue;
        };
        let day = normalize_day(raw_day);

        for (index, block) in blocks.iter().enumerate() {
            let Some(block) = block.as_object() else {
                continue;
            };
            let start = non_empty(block.get("start"));
            let end = non_empty(block.get("end"));
            // `mode` only stands in when `value` is absent; an empty `value` skips the block.
            let value = non_empty(block.get("value").or_else(|| block.get("mode")));
            let (Some(start), Some(end), Some(value)) = (start, end, value) else {
                continue;
            };

            fields.insert(format!("program[{day}][{index}][start]"), start);
            fields.insert(format!("program[{day}][{index}][end]"), end);
            fields.insert(format!("program[{day}][{index}][value]"), value);
        }
    }

    fields
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn flattened_input_passes_through() {
        let input = json!({
            "program[monday][0][start]": "06:00",
            "program[monday][0][end]": "08:00",
            "program[monday][0][value]": "comfort",
        });
        let out = normalize_program(input.as_object().unwrap());
        assert_eq!(
            out,
            fields(&[
                ("program[monday][0][end]", "08:00"),
                ("program[monday][0][start]", "06:00"),
                ("program[monday][0][value]", "comfort"),
            ])
        );
    }

    #[test]
    fn structured_program_is_flattened() {
        let input = json!({
            "device_id": "SH1#C001-000",
            "program": {
                "Mon": [
                    {"start": "06:00", "end": "08:00", "value": "comfort"},
                    {"start": "08:00", "end": "", "value": "eco"},
                    {"start": "18:00", "end": "22:00", "mode": "eco"},
                ],
            },
        });
        let out = normalize_program(input.as_object().unwrap());
        assert_eq!(
            out,
            fields(&[
                ("device_id", "SH1#C001-000"),
                ("program[monday][0][end]", "08:00"),
                ("program[monday][0][start]", "06:00"),
                ("program[monday][0][value]", "comfort"),
                ("program[monday][2][end]", "22:00"),
                ("program[monday][2][start]", "18:00"),
                ("program[monday][2][value]", "eco"),
            ])
        );
    }

    #[test]
    fn empty_value_does_not_fall_back_to_mode() {
        let input = json!({
            "program": {
                "tuesday": [
                    {"start": "06:00", "end": "08:00", "value": "", "mode": "eco"},
                    {"start": "08:00", "end": "18:00", "value": null, "mode": "eco"},
                    {"start": "18:00", "end": "22:00", "mode": "comfort"},
                ],
            },
        });
        let out = normalize_program(input.as_object().unwrap());
        assert_eq!(
            out,
            fields(&[
                ("program[tuesday][2][end]", "22:00"),
                ("program[tuesday][2][start]", "18:00"),
                ("program[tuesday][2][value]", "comfort"),
            ])
        );
    }

    #[test]
    fn bare_day_map_is_flattened() {
        let input = json!({"sun": [{"start": "00:00", "end": "24:00", "value": 2}]});
        let out = normalize_program(input.as_object().unwrap());
        assert_eq!(
            out,
            fields(&[
                ("program[sunday][0][end]", "24:00"),
                ("program[sunday][0][start]", "00:00"),
                ("program[sunday][0][value]", "2"),
            ])
        );
    }

    #[test]
    fn day_aliases() {
        assert_eq!(normalize_day(" THU "), "thursday");
        assert_eq!(normalize_day("holiday"), "holiday");
    }
}
