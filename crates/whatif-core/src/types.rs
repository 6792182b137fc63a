//! Core types for the scenario pipeline
//!
//! Defines the data model shared by every stage:
//! - Baseline series and the human-impact snapshot
//! - Scenario requests and their partial overrides
//! - AI-supplied alternate forecasts
//! - Generated drafts and persisted scenarios

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique scenario identifier (monotonic, assigned by the store)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScenarioId(pub u64);

impl ScenarioId {
    /// Raw numeric value
    #[inline]
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Identifier following this one
    #[inline]
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One sample of a forecast curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    /// Calendar year
    pub year: i32,
    /// Indicator value for that year
    pub value: f64,
}

impl YearValue {
    #[inline]
    #[must_use]
    pub fn new(year: i32, value: f64) -> Self {
        Self { year, value }
    }
}

/// Current value plus per-decade forecast for one tracked indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSeries {
    /// Present-day value
    pub current: f64,
    /// Ordered forecast samples
    pub forecast: Vec<YearValue>,
}

impl BaselineSeries {
    /// Create new series
    #[inline]
    #[must_use]
    pub fn new(current: f64, forecast: Vec<YearValue>) -> Self {
        Self { current, forecast }
    }

    /// Last forecast value, or the current value when the forecast is empty
    #[must_use]
    pub fn final_value(&self) -> f64 {
        self.forecast.last().map_or(self.current, |p| p.value)
    }

    /// Forecast value at `index`, or the current value when out of range
    #[inline]
    #[must_use]
    pub fn value_at(&self, index: usize) -> f64 {
        self.forecast.get(index).map_or(self.current, |p| p.value)
    }
}

/// The full set of tracked baseline indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineData {
    /// Global mean temperature anomaly (°C above pre-industrial)
    pub global_temperature: BaselineSeries,
    /// Annual CO2 emissions (Gt)
    pub carbon_emissions: BaselineSeries,
    /// Sea-level rise since 1900 (m)
    pub sea_level_rise: BaselineSeries,
    /// Annual forest loss (Mha)
    pub forest_loss: BaselineSeries,
}

/// Partial baseline supplied by a client; absent series fall back to defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineOverride {
    #[serde(default)]
    pub global_temperature: Option<BaselineSeries>,
    #[serde(default)]
    pub carbon_emissions: Option<BaselineSeries>,
    #[serde(default)]
    pub sea_level_rise: Option<BaselineSeries>,
    #[serde(default)]
    pub forest_loss: Option<BaselineSeries>,
}

/// Named human-impact indicators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanImpactSnapshot {
    pub death_toll: f64,
    pub population: f64,
    pub land_loss_percent: f64,
    pub refugees: f64,
    pub gdp_loss_percent: f64,
    pub biodiversity_loss_percent: f64,
    pub conflict_index: f64,
}

/// Partial impact snapshot supplied by a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanImpactOverride {
    #[serde(default)]
    pub death_toll: Option<f64>,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub land_loss_percent: Option<f64>,
    #[serde(default)]
    pub refugees: Option<f64>,
    #[serde(default)]
    pub gdp_loss_percent: Option<f64>,
    #[serde(default)]
    pub biodiversity_loss_percent: Option<f64>,
    #[serde(default)]
    pub conflict_index: Option<f64>,
}

/// Incoming request to generate a scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRequest {
    /// Free-text "what if" question
    #[serde(default)]
    pub user_input: String,
    /// Optional baseline override
    #[serde(default)]
    pub baseline_data: Option<BaselineOverride>,
    /// Optional impact override
    #[serde(default)]
    pub human_impacts: Option<HumanImpactOverride>,
}

impl ScenarioRequest {
    /// Create request without overrides
    #[inline]
    #[must_use]
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            baseline_data: None,
            human_impacts: None,
        }
    }
}

/// Field names of [`AltForecast`], in prompt order
pub const ALT_FORECAST_FIELDS: [&str; 10] = [
    "death_toll",
    "population",
    "land_loss_percent",
    "refugees",
    "gdp_loss_percent",
    "biodiversity_loss_percent",
    "conflict_index",
    "global_temp_2100",
    "carbon_emissions_2100",
    "sea_level_rise_2100",
];

/// AI-supplied alternate forecast
///
/// Absent fields mean "no target provided for this indicator", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AltForecast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_toll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_loss_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refugees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdp_loss_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biodiversity_loss_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_temp_2100: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_emissions_2100: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_level_rise_2100: Option<f64>,
}

impl AltForecast {
    /// Field values paired with their names, in [`ALT_FORECAST_FIELDS`] order
    #[must_use]
    pub fn entries(&self) -> [(&'static str, Option<f64>); 10] {
        [
            ("death_toll", self.death_toll),
            ("population", self.population),
            ("land_loss_percent", self.land_loss_percent),
            ("refugees", self.refugees),
            ("gdp_loss_percent", self.gdp_loss_percent),
            ("biodiversity_loss_percent", self.biodiversity_loss_percent),
            ("conflict_index", self.conflict_index),
            ("global_temp_2100", self.global_temp_2100),
            ("carbon_emissions_2100", self.carbon_emissions_2100),
            ("sea_level_rise_2100", self.sea_level_rise_2100),
        ]
    }

    /// Mutable slot for a named field
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut Option<f64>> {
        let slot = match name {
            "death_toll" => &mut self.death_toll,
            "population" => &mut self.population,
            "land_loss_percent" => &mut self.land_loss_percent,
            "refugees" => &mut self.refugees,
            "gdp_loss_percent" => &mut self.gdp_loss_percent,
            "biodiversity_loss_percent" => &mut self.biodiversity_loss_percent,
            "conflict_index" => &mut self.conflict_index,
            "global_temp_2100" => &mut self.global_temp_2100,
            "carbon_emissions_2100" => &mut self.carbon_emissions_2100,
            "sea_level_rise_2100" => &mut self.sea_level_rise_2100,
            _ => return None,
        };
        Some(slot)
    }

    /// First field that is negative or non-finite
    #[must_use]
    pub fn first_invalid(&self) -> Option<(&'static str, f64)> {
        self.entries().into_iter().find_map(|(name, value)| match value {
            Some(v) if !v.is_finite() || v < 0.0 => Some((name, v)),
            _ => None,
        })
    }

    /// Check that every present value is a non-negative finite number
    #[inline]
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.first_invalid().is_none()
    }
}

/// Scenario content produced by the completion service or the fallback table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScenario {
    /// One-sentence theme
    pub theme: String,
    /// Alternate forecast targets
    pub alt_forecasts: AltForecast,
    /// Multi-paragraph narrative
    pub narrative: String,
}

impl GeneratedScenario {
    /// Attach the originating user input
    #[must_use]
    pub fn into_draft(self, user_input: impl Into<String>) -> ScenarioDraft {
        ScenarioDraft {
            user_input: user_input.into(),
            theme: self.theme,
            alt_forecasts: self.alt_forecasts,
            narrative: self.narrative,
        }
    }
}

/// Pre-insert scenario record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDraft {
    pub user_input: String,
    pub theme: String,
    pub alt_forecasts: AltForecast,
    pub narrative: String,
}

/// Persisted scenario record (immutable once stored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub user_input: String,
    pub theme: String,
    pub alt_forecasts: AltForecast,
    pub narrative: String,
    pub created_at: DateTime<Utc>,
}

impl Scenario {
    /// Materialise a draft with its assigned identity
    #[must_use]
    pub fn from_draft(id: ScenarioId, draft: ScenarioDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_input: draft.user_input,
            theme: draft.theme,
            alt_forecasts: draft.alt_forecasts,
            narrative: draft.narrative,
            created_at,
        }
    }
}
