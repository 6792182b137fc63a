//! Completion response parser
//!
//! Two-stage recovery, first success wins:
//! 1. **strict**: decode the whole trimmed text as the record
//! 2. **lenient**: decode the first brace-bounded span (first `{` to last `}`)
//!
//! Both stages enforce the numeric contract on `alt_forecasts`: every value is
//! a non-negative finite number. Numbers quoted as strings are repaired when
//! they only carry thousand separators, a trailing percent sign, or a simple
//! fraction; anything else is rejected.

use crate::error::{ScenarioError, ScenarioResult};
use crate::types::{AltForecast, GeneratedScenario};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("object span pattern"));

static GROUPED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}(?:,\d{3})+(?:\.\d+)?$").expect("grouped number pattern")
});

type Stage = fn(&str) -> Result<GeneratedScenario, String>;

const STAGES: [(&str, Stage); 2] = [("strict", try_strict), ("lenient", try_lenient)];

/// Parse raw completion text into a generated scenario
///
/// # Errors
/// `ScenarioError::MalformedCompletion` when neither stage recovers a valid
/// record; the error carries the last stage's reason and an excerpt of `raw`.
pub fn parse_completion(raw: &str) -> ScenarioResult<GeneratedScenario> {
    let mut last_reason = String::from("empty completion");

    for (name, stage) in STAGES {
        match stage(raw) {
            Ok(record) => {
                tracing::debug!(stage = name, "Recovered scenario from completion");
                return Ok(record);
            }
            Err(reason) => {
                tracing::debug!(stage = name, %reason, "Parse stage failed");
                last_reason = reason;
            }
        }
    }

    Err(ScenarioError::malformed(last_reason, raw))
}

/// Decode the full trimmed text
pub fn try_strict(raw: &str) -> Result<GeneratedScenario, String> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| format!("not JSON: {e}"))?;
    decode_record(value)
}

/// Decode the first brace-bounded span of the text
pub fn try_lenient(raw: &str) -> Result<GeneratedScenario, String> {
    let span = OBJECT_SPAN
        .find(raw)
        .ok_or_else(|| "no brace-delimited object found".to_string())?;
    let value: Value =
        serde_json::from_str(span.as_str()).map_err(|e| format!("embedded object invalid: {e}"))?;
    decode_record(value)
}

fn decode_record(value: Value) -> Result<GeneratedScenario, String> {
    let Value::Object(mut map) = value else {
        return Err("completion is not a JSON object".to_string());
    };

    let theme = take_text(&mut map, "theme")?;
    let narrative = take_text(&mut map, "narrative")?;
    let alt_forecasts = match map.remove("alt_forecasts") {
        Some(Value::Object(fields)) => decode_forecast(&fields)?,
        None | Some(Value::Null) => AltForecast::default(),
        Some(_) => return Err("alt_forecasts is not an object".to_string()),
    };

    Ok(GeneratedScenario {
        theme,
        alt_forecasts,
        narrative,
    })
}

/// Absent text fields pass through as empty; paragraph arrays are joined.
fn take_text(map: &mut Map<String, Value>, key: &str) -> Result<String, String> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(format!("{key} contains a non-text paragraph")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|paragraphs| paragraphs.join("\n\n")),
        Some(_) => Err(format!("{key} is not text")),
    }
}

fn decode_forecast(fields: &Map<String, Value>) -> Result<AltForecast, String> {
    let mut forecast = AltForecast::default();

    for (name, value) in fields {
        let Some(slot) = forecast.slot_mut(name) else {
            tracing::debug!(field = %name, "Ignoring unknown forecast field");
            continue;
        };
        *slot = coerce_number(name, value)?;
    }

    Ok(forecast)
}

fn coerce_number(name: &str, value: &Value) -> Result<Option<f64>, String> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{name}: {n} is not representable"))?,
        Value::String(s) => repair_numeric_text(s)
            .ok_or_else(|| format!("{name}: unparseable value {s:?}"))?,
        _ => return Err(format!("{name}: expected a number")),
    };

    if !number.is_finite() || number < 0.0 {
        return Err(format!("{name}: {number} is negative or non-finite"));
    }
    Ok(Some(number))
}

/// Repair a number the model quoted as text
fn repair_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();

    if GROUPED_NUMBER.is_match(trimmed) {
        return trimmed.replace(',', "").parse().ok();
    }

    if let Some((num, den)) = trimmed.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        return (den != 0.0).then(|| num / den);
    }

    trimmed.parse().ok()
}
