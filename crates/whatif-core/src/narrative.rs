//! Narrative generation modes
//!
//! A narrative request either asks a question (Q&A mode) or asks for a news
//! bulletin over the baseline. Unlike scenario creation, narrative generation
//! never fails: when the completion service is unavailable a templated text
//! is returned instead.

use crate::prompt::{build_bulletin_prompt, build_question_prompt};
use crate::types::{BaselineData, BaselineOverride, HumanImpactOverride, HumanImpactSnapshot};
use serde::{Deserialize, Serialize};

/// Narrative request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    #[serde(default)]
    pub baseline_data: Option<BaselineOverride>,
    #[serde(default)]
    pub human_impacts: Option<HumanImpactOverride>,
    #[serde(default)]
    pub question: Option<String>,
}

/// Narrative response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    pub narrative: String,
}

/// Which kind of narrative to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeMode {
    /// News bulletin over the baseline
    Bulletin,
    /// Answer to a user question
    Question(String),
}

impl NarrativeMode {
    /// Q&A when a non-blank question is present, bulletin otherwise
    #[must_use]
    pub fn from_question(question: Option<&str>) -> Self {
        match question.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => Self::Question(q.to_string()),
            None => Self::Bulletin,
        }
    }

    /// Completion prompt for this mode
    #[must_use]
    pub fn prompt(&self, climate: &BaselineData, impacts: &HumanImpactSnapshot) -> String {
        match self {
            Self::Bulletin => build_bulletin_prompt(climate, impacts),
            Self::Question(q) => build_question_prompt(q, climate, impacts),
        }
    }

    /// Templated text used when the completion service is unavailable
    #[must_use]
    pub fn fallback_text(&self, climate: &BaselineData, impacts: &HumanImpactSnapshot) -> String {
        let situation = format!(
            "Global temperatures are running {:.1}°C above pre-industrial levels, seas have risen \
             {:.2} m, and an estimated {} people have been displaced by climate impacts.",
            climate.global_temperature.current,
            climate.sea_level_rise.current,
            format_count(impacts.refugees),
        );

        match self {
            Self::Bulletin => format!(
                "Climate bulletin. {situation} Without faster cuts to emissions, current \
                 projections put warming near {:.1}°C by 2100.",
                climate.global_temperature.final_value()
            ),
            Self::Question(q) => format!(
                "We could not reach the forecasting model to answer \"{q}\" right now. \
                 For context: {situation} Please try again shortly."
            ),
        }
    }
}

/// Whole number with thousand separators, for prose
fn format_count(value: f64) -> String {
    let digits = format!("{:.0}", value.max(0.0));
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
