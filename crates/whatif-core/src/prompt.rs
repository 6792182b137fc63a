//! Prompt construction for the completion service
//!
//! The scenario prompt over-specifies its output: an exhaustive field list,
//! a worked example and explicit formatting rules. It is the first line of
//! defense against malformed completions; the parser is the second.

use crate::types::{BaselineData, HumanImpactSnapshot, ALT_FORECAST_FIELDS};
use std::fmt::Write;

/// Example values shown to the model, in `ALT_FORECAST_FIELDS` order
const EXAMPLE_VALUES: [&str; 10] = [
    "180000", "8300000000", "0.4", "15000000", "1.8", "7.5", "2.6", "1.9", "12.5", "0.45",
];

/// Build the scenario-generation prompt
///
/// Pure function of its inputs. `user_input` must already be non-empty.
#[must_use]
pub fn build_scenario_prompt(
    user_input: &str,
    climate: &BaselineData,
    impacts: &HumanImpactSnapshot,
) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are a climate futurist. Write a speculative alternate-history scenario \
         answering the question below, grounded in the current baseline figures.\n\n",
    );
    let _ = writeln!(prompt, "QUESTION: {}", user_input.trim());
    prompt.push('\n');

    prompt.push_str("CURRENT BASELINE:\n");
    let _ = writeln!(
        prompt,
        "- Global temperature anomaly: {}°C (baseline 2100: {}°C)",
        climate.global_temperature.current,
        climate.global_temperature.final_value()
    );
    let _ = writeln!(
        prompt,
        "- Sea-level rise: {} m (baseline 2100: {} m)",
        climate.sea_level_rise.current,
        climate.sea_level_rise.final_value()
    );
    let _ = writeln!(prompt, "- Annual climate death toll: {}", impacts.death_toll);
    let _ = writeln!(prompt, "- Climate refugees: {}", impacts.refugees);
    let _ = writeln!(prompt, "- GDP loss: {}%", impacts.gdp_loss_percent);
    prompt.push('\n');

    prompt.push_str(
        "Respond with ONE JSON object with exactly these keys: \"theme\" (one sentence), \
         \"alt_forecasts\" (object), \"narrative\" (three to five paragraphs).\n",
    );
    prompt.push_str("\"alt_forecasts\" must contain exactly these fields:\n");
    for field in ALT_FORECAST_FIELDS {
        let _ = writeln!(prompt, "- {field}");
    }
    prompt.push('\n');

    prompt.push_str("EXAMPLE:\n");
    prompt.push_str(&example_object());
    prompt.push_str("\n\n");

    prompt.push_str(
        "RULES:\n\
         1. Every alt_forecasts value is a plain decimal number (e.g. 1.9 or 15000000)\n\
         2. No units, no percent signs, no thousand separators, no fractions, no quotes around numbers\n\
         3. No negative numbers\n\
         4. No extra fields\n\
         5. No explanatory text before or after the JSON object\n",
    );

    prompt
}

fn example_object() -> String {
    let fields: Vec<String> = ALT_FORECAST_FIELDS
        .iter()
        .zip(EXAMPLE_VALUES)
        .map(|(name, value)| format!("    \"{name}\": {value}"))
        .collect();
    format!(
        "{{\n  \"theme\": \"A single sentence describing the alternate world.\",\n  \
         \"alt_forecasts\": {{\n{}\n  }},\n  \
         \"narrative\": \"First paragraph...\\n\\nSecond paragraph...\"\n}}",
        fields.join(",\n")
    )
}

/// Build a news-bulletin prompt over the baseline figures
#[must_use]
pub fn build_bulletin_prompt(climate: &BaselineData, impacts: &HumanImpactSnapshot) -> String {
    let mut prompt = String::from(
        "Write a short, sober climate news bulletin (two paragraphs) for the year ahead, \
         based on these figures:\n",
    );
    push_figures(&mut prompt, climate, impacts);
    prompt.push_str("Plain prose only, no headings, no lists.\n");
    prompt
}

/// Build a question-answering prompt over the baseline figures
#[must_use]
pub fn build_question_prompt(
    question: &str,
    climate: &BaselineData,
    impacts: &HumanImpactSnapshot,
) -> String {
    let mut prompt = String::from(
        "Answer the question below in one or two paragraphs, using these climate figures:\n",
    );
    push_figures(&mut prompt, climate, impacts);
    let _ = writeln!(prompt, "QUESTION: {}", question.trim());
    prompt
}

fn push_figures(prompt: &mut String, climate: &BaselineData, impacts: &HumanImpactSnapshot) {
    let _ = writeln!(
        prompt,
        "- Global temperature anomaly: {}°C",
        climate.global_temperature.current
    );
    let _ = writeln!(
        prompt,
        "- CO2 emissions: {} Gt/year",
        climate.carbon_emissions.current
    );
    let _ = writeln!(prompt, "- Sea-level rise: {} m", climate.sea_level_rise.current);
    let _ = writeln!(prompt, "- Forest loss: {} Mha/year", climate.forest_loss.current);
    let _ = writeln!(prompt, "- Climate death toll: {}/year", impacts.death_toll);
    let _ = writeln!(prompt, "- Climate refugees: {}", impacts.refugees);
    let _ = writeln!(prompt, "- Biodiversity loss: {}%", impacts.biodiversity_loss_percent);
}
