//! Baseline data provider
//!
//! Fixed climate and human-impact figures, injected into the pipeline as a
//! read-only value so tests can substitute their own fixtures.

use crate::types::{
    BaselineData, BaselineOverride, BaselineSeries, HumanImpactOverride, HumanImpactSnapshot,
    YearValue,
};
use serde::Serialize;

/// Read-only source of baseline data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineProvider {
    climate: BaselineData,
    impacts: HumanImpactSnapshot,
}

impl BaselineProvider {
    /// Create provider from explicit data
    #[inline]
    #[must_use]
    pub fn new(climate: BaselineData, impacts: HumanImpactSnapshot) -> Self {
        Self { climate, impacts }
    }

    /// Baseline climate series
    #[inline]
    #[must_use]
    pub fn climate(&self) -> &BaselineData {
        &self.climate
    }

    /// Baseline human-impact snapshot
    #[inline]
    #[must_use]
    pub fn impacts(&self) -> &HumanImpactSnapshot {
        &self.impacts
    }

    /// Fill every absent override field from the defaults
    #[must_use]
    pub fn resolve(
        &self,
        climate: Option<&BaselineOverride>,
        impacts: Option<&HumanImpactOverride>,
    ) -> (BaselineData, HumanImpactSnapshot) {
        let climate = match climate {
            Some(o) => merge_climate(&self.climate, o),
            None => self.climate.clone(),
        };
        let impacts = match impacts {
            Some(o) => merge_impacts(&self.impacts, o),
            None => self.impacts,
        };
        (climate, impacts)
    }
}

impl Default for BaselineProvider {
    fn default() -> Self {
        Self::new(default_climate(), default_impacts())
    }
}

fn merge_climate(base: &BaselineData, o: &BaselineOverride) -> BaselineData {
    BaselineData {
        global_temperature: o
            .global_temperature
            .clone()
            .unwrap_or_else(|| base.global_temperature.clone()),
        carbon_emissions: o
            .carbon_emissions
            .clone()
            .unwrap_or_else(|| base.carbon_emissions.clone()),
        sea_level_rise: o
            .sea_level_rise
            .clone()
            .unwrap_or_else(|| base.sea_level_rise.clone()),
        forest_loss: o.forest_loss.clone().unwrap_or_else(|| base.forest_loss.clone()),
    }
}

fn merge_impacts(base: &HumanImpactSnapshot, o: &HumanImpactOverride) -> HumanImpactSnapshot {
    HumanImpactSnapshot {
        death_toll: o.death_toll.unwrap_or(base.death_toll),
        population: o.population.unwrap_or(base.population),
        land_loss_percent: o.land_loss_percent.unwrap_or(base.land_loss_percent),
        refugees: o.refugees.unwrap_or(base.refugees),
        gdp_loss_percent: o.gdp_loss_percent.unwrap_or(base.gdp_loss_percent),
        biodiversity_loss_percent: o
            .biodiversity_loss_percent
            .unwrap_or(base.biodiversity_loss_percent),
        conflict_index: o.conflict_index.unwrap_or(base.conflict_index),
    }
}

fn decades(values: [f64; 8]) -> Vec<YearValue> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| YearValue::new(2030 + 10 * i as i32, *v))
        .collect()
}

/// Built-in climate baseline (decade samples 2030..=2100)
#[must_use]
pub fn default_climate() -> BaselineData {
    BaselineData {
        global_temperature: BaselineSeries::new(
            1.2,
            decades([1.5, 1.7, 2.0, 2.2, 2.5, 2.7, 2.9, 3.2]),
        ),
        carbon_emissions: BaselineSeries::new(
            36.8,
            decades([38.5, 40.1, 41.0, 41.6, 42.0, 42.3, 42.5, 42.7]),
        ),
        sea_level_rise: BaselineSeries::new(
            0.21,
            decades([0.28, 0.34, 0.41, 0.48, 0.56, 0.64, 0.72, 0.81]),
        ),
        forest_loss: BaselineSeries::new(
            10.0,
            decades([10.6, 11.1, 11.5, 11.8, 12.0, 12.2, 12.3, 12.4]),
        ),
    }
}

/// Built-in human-impact snapshot
#[must_use]
pub fn default_impacts() -> HumanImpactSnapshot {
    HumanImpactSnapshot {
        death_toll: 250_000.0,
        population: 8_100_000_000.0,
        land_loss_percent: 0.5,
        refugees: 21_500_000.0,
        gdp_loss_percent: 2.5,
        biodiversity_loss_percent: 10.0,
        conflict_index: 3.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_forecasts_reach_2100() {
        let climate = default_climate();
        for series in [
            &climate.global_temperature,
            &climate.carbon_emissions,
            &climate.sea_level_rise,
            &climate.forest_loss,
        ] {
            assert_eq!(series.forecast.first().map(|p| p.year), Some(2030));
            assert_eq!(series.forecast.last().map(|p| p.year), Some(2100));
        }
    }

    #[test]
    fn resolve_without_overrides_returns_defaults() {
        let provider = BaselineProvider::default();
        let (climate, impacts) = provider.resolve(None, None);
        assert_eq!(&climate, provider.climate());
        assert_eq!(&impacts, provider.impacts());
    }

    #[test]
    fn resolve_fills_partial_overrides() {
        let provider = BaselineProvider::default();
        let climate_override = BaselineOverride {
            global_temperature: Some(BaselineSeries::new(1.4, vec![])),
            ..BaselineOverride::default()
        };
        let impact_override = HumanImpactOverride {
            refugees: Some(1.0),
            ..HumanImpactOverride::default()
        };

        let (climate, impacts) =
            provider.resolve(Some(&climate_override), Some(&impact_override));

        assert_eq!(climate.global_temperature.current, 1.4);
        assert_eq!(climate.sea_level_rise, provider.climate().sea_level_rise);
        assert_eq!(impacts.refugees, 1.0);
        assert_eq!(impacts.death_toll, provider.impacts().death_toll);
    }

    #[test]
    fn climate_serializes_camel_case() {
        let json = serde_json::to_value(default_climate()).unwrap();
        assert!(json.get("globalTemperature").is_some());
        assert!(json.get("seaLevelRise").is_some());
    }
}
