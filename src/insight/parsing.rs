//! Validation of model responses
//!
//! Models wrap JSON in prose or code fences, so the object between the first
//! `{` and the last `}` is taken. Suggested values are merged field by field
//! onto the current inputs; nothing from the payload is trusted by shape.

use serde::Deserialize;
use serde_json::Value;

use crate::calculator::CalculatorInput;
use crate::error::{Error, Result};

use super::Optimization;

const RAW_PREVIEW_LEN: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptimization {
    optimized_data: Option<Value>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    impact: Option<String>,
}

fn preview(text: &str) -> String {
    if text.chars().count() > RAW_PREVIEW_LEN {
        let head: String = text.chars().take(RAW_PREVIEW_LEN).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// The outermost JSON object in a response
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            preview(response)
        ))),
    }
}

/// Parse an optimization response against the inputs it was requested for
///
/// Known fields holding finite numbers replace the current values (through
/// the same normalization as user edits). Fields the model omitted keep their
/// current values. Unknown keys and non-numeric values are reported in
/// `rejected_fields`. A payload with no usable field at all is an error.
pub fn parse_optimization(response: &str, current: &CalculatorInput) -> Result<Optimization> {
    let json_str = extract_json_object(response)?;
    let raw: RawOptimization = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!("Invalid JSON from AI: {} | Raw: {}", e, preview(json_str)))
    })?;

    let suggested = match raw.optimized_data {
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(Error::InvalidData(format!(
                "optimizedData is not an object: {}",
                preview(&other.to_string())
            )))
        }
        None => return Err(Error::InvalidData("Response has no optimizedData".into())),
    };

    let mut optimized = current.clone();
    let mut accepted = 0usize;
    let mut rejected_fields = Vec::new();

    for (key, value) in &suggested {
        if !current.field_names().contains(&key.as_str()) {
            rejected_fields.push(key.clone());
            continue;
        }
        match value.as_f64().filter(|v| v.is_finite()) {
            Some(number) => {
                optimized.set(key, number)?;
                accepted += 1;
            }
            None => rejected_fields.push(key.clone()),
        }
    }

    if accepted == 0 {
        return Err(Error::InvalidData(format!(
            "optimizedData has no usable fields for {}",
            current.kind()
        )));
    }
    if !rejected_fields.is_empty() {
        log::warn!("ignoring suggested fields {:?} for {}", rejected_fields, current.kind());
    }

    Ok(Optimization {
        optimized,
        explanation: raw.explanation.unwrap_or_default(),
        impact: raw.impact.unwrap_or_default(),
        rejected_fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::CalculatorKind;

    fn unit_economics() -> CalculatorInput {
        CalculatorInput::default_for(CalculatorKind::UnitEconomics)
    }

    #[test]
    fn test_extract_from_fenced_text() {
        let text = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```";
        assert_eq!(extract_json_object(text).unwrap(), "{\"a\": {\"b\": 1}}");
        assert!(extract_json_object("no json here").is_err());
        assert!(extract_json_object("} backwards {").is_err());
    }

    #[test]
    fn test_full_suggestion() {
        let response = r#"{"optimizedData":{"sellingPrice":1699,"cogs":430,"shipping":80,"packaging":35,
            "marketingCpa":360,"paymentGatewayPercent":2,"returnsPercent":10},
            "explanation":"Raise price","impact":"+120 per order"}"#;
        let opt = parse_optimization(response, &unit_economics()).unwrap();

        assert_eq!(opt.optimized.get("sellingPrice"), Some(1699.0));
        assert_eq!(opt.optimized.get("returnsPercent"), Some(10.0));
        assert_eq!(opt.explanation, "Raise price");
        assert_eq!(opt.impact, "+120 per order");
        assert!(opt.rejected_fields.is_empty());
    }

    #[test]
    fn test_partial_suggestion_keeps_current_values() {
        let response = r#"{"optimizedData":{"sellingPrice":1800,"cogs":"cheaper","dream":1},"explanation":"x"}"#;
        let opt = parse_optimization(response, &unit_economics()).unwrap();

        assert_eq!(opt.optimized.get("sellingPrice"), Some(1800.0));
        assert_eq!(opt.optimized.get("cogs"), Some(450.0));
        assert_eq!(opt.impact, "");
        let mut rejected = opt.rejected_fields.clone();
        rejected.sort();
        assert_eq!(rejected, vec!["cogs".to_string(), "dream".to_string()]);
    }

    #[test]
    fn test_percentages_are_clamped() {
        let response = r#"{"optimizedData":{"returnsPercent":250}}"#;
        let opt = parse_optimization(response, &unit_economics()).unwrap();
        assert_eq!(opt.optimized.get("returnsPercent"), Some(100.0));
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        let current = unit_economics();
        let cases = [
            "Sorry, I can't help with that.",
            r#"{"explanation":"no data"}"#,
            r#"{"optimizedData":[1,2,3]}"#,
            r#"{"optimizedData":{"aov":2000,"cpc":25}}"#,
            r#"{"optimizedData":{"sellingPrice":null}}"#,
            r#"{"optimizedData":{"sellingPrice":1800,}"#,
        ];
        for case in cases {
            assert!(
                matches!(parse_optimization(case, &current), Err(Error::InvalidData(_))),
                "accepted {}",
                case
            );
        }
    }
}
