//! Prompt text for insight and optimization requests

use serde_json::Value;

use crate::calculator::CalculatorInput;

use super::GenerationRequest;

pub const SYSTEM_INSTRUCTION: &str = "You are a financial advisor for e-commerce brands.";

/// Free-text recommendations for the current inputs and results
pub fn insight_request(context: &str, snapshot: &Value) -> GenerationRequest {
    let data = serde_json::to_string_pretty(snapshot).unwrap_or_else(|_| snapshot.to_string());
    let prompt = format!(
        "Act as an expert CFO for direct-to-consumer (D2C) brands in India.\n\
         Analyze the following {context} figures and give exactly 3 concise, high-impact \
         strategic recommendations as bullet points. Focus on profitability, cash flow and \
         operational efficiency. Be specific about numbers. All amounts are in INR.\n\n\
         Data:\n{data}"
    );

    GenerationRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        prompt,
        json_output: false,
        inputs: None,
    }
}

/// Structured suggestion for better inputs
pub fn optimization_request(goal: &str, current: &CalculatorInput) -> GenerationRequest {
    let fields = current.to_fields_json();
    let data = serde_json::to_string_pretty(&fields).unwrap_or_else(|_| fields.to_string());
    let keys = current.field_names().join(", ");
    let percent: Vec<&str> = current
        .field_names()
        .iter()
        .copied()
        .filter(|f| current.is_percent_field(f))
        .collect();
    let percent_note = if percent.is_empty() {
        String::new()
    } else {
        format!(" Percentages ({}) are numbers between 0 and 100.", percent.join(", "))
    };

    let prompt = format!(
        "You are optimizing the inputs of a D2C brand's {goal} model. Amounts are in INR.\n\
         Current inputs:\n{data}\n\n\
         Suggest realistic, achievable adjustments that improve the outcome. Respond with a \
         single JSON object of the form \
         {{\"optimizedData\": {{...}}, \"explanation\": \"...\", \"impact\": \"...\"}}. \
         optimizedData must use exactly these numeric keys: {keys}.{percent_note} \
         Keep explanation to two sentences and impact to one."
    );

    GenerationRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        prompt,
        json_output: true,
        inputs: Some(fields),
    }
}
