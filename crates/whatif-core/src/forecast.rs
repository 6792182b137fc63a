//! Forecast constraint engine
//!
//! Blends a baseline curve toward an AI-supplied 2100 target, sampled every
//! decade from the present year, under physical floors:
//! - temperature never targets less than `current + COMMITTED_WARMING`
//! - emissions without a target decay toward a residual floor with a
//!   deployment-lag adjusted progress
//! - sea level without a target rises at least `COMMITTED_SEA_LEVEL_RISE`
//!
//! Perturbations are non-negative and bounded, and the entropy source is
//! supplied by the caller.

use crate::types::{AltForecast, BaselineData, BaselineSeries};
use chrono::Datelike;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Final year of every projection
pub const HORIZON_YEAR: i32 = 2100;
/// Spacing of projection samples in years
pub const SAMPLE_STEP_YEARS: i32 = 10;
/// Warming already committed above the current temperature (°C)
pub const COMMITTED_WARMING: f64 = 1.5;
/// Maximum temperature perturbation (°C)
pub const MAX_TEMPERATURE_NOISE: f64 = 0.3;
/// Share of current emissions that remains without an explicit target
pub const RESIDUAL_EMISSIONS_SHARE: f64 = 0.15;
/// Years over which technology rollout accelerates progress
pub const DEPLOYMENT_LAG_YEARS: f64 = 20.0;
/// Sea-level rise already committed by thermal expansion (m)
pub const COMMITTED_SEA_LEVEL_RISE: f64 = 0.3;
/// Maximum sea-level perturbation (m)
pub const MAX_SEA_LEVEL_NOISE: f64 = 0.05;
/// Paired temperature separating the low and high sea-level scalings (°C)
pub const SEA_LEVEL_TEMPERATURE_THRESHOLD: f64 = 2.0;
const SEA_LEVEL_SCALE_LOW: f64 = 1.2;
const SEA_LEVEL_SCALE_HIGH: f64 = 1.8;

/// Indicator being projected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorKind {
    /// Global temperature anomaly
    Temperature,
    /// Annual carbon emissions
    Emissions,
    /// Sea-level rise, scaled by the scenario's temperature target
    SeaLevel { paired_temperature: Option<f64> },
}

/// One projected year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: i32,
    pub baseline: f64,
    pub speculative: f64,
}

/// Projected curves for a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub temperature: Vec<ProjectionPoint>,
    pub emissions: Vec<ProjectionPoint>,
    pub sea_level: Vec<ProjectionPoint>,
}

/// Interpolation engine anchored to a present year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastEngine {
    present_year: i32,
}

impl ForecastEngine {
    /// Create engine anchored to `present_year`
    #[inline]
    #[must_use]
    pub fn new(present_year: i32) -> Self {
        Self { present_year }
    }

    /// Engine anchored to the current UTC year
    #[must_use]
    pub fn current() -> Self {
        Self::new(chrono::Utc::now().year())
    }

    /// Anchor year
    #[inline]
    #[must_use]
    pub fn present_year(&self) -> i32 {
        self.present_year
    }

    /// Decade samples from the present year, always ending at the horizon
    #[must_use]
    pub fn sample_years(&self) -> Vec<i32> {
        if self.present_year >= HORIZON_YEAR {
            return vec![self.present_year];
        }
        let mut years: Vec<i32> = (self.present_year..HORIZON_YEAR)
            .step_by(SAMPLE_STEP_YEARS as usize)
            .collect();
        years.push(HORIZON_YEAR);
        years
    }

    /// Fraction of the way from the present year to the horizon, in [0, 1]
    #[must_use]
    pub fn progress(&self, year: i32) -> f64 {
        let span = HORIZON_YEAR - self.present_year;
        if span <= 0 {
            return 1.0;
        }
        (f64::from(year - self.present_year) / f64::from(span)).clamp(0.0, 1.0)
    }

    /// Interpolate one indicator toward its 2100 target
    pub fn interpolate<R: Rng + ?Sized>(
        &self,
        series: &BaselineSeries,
        target_2100: Option<f64>,
        kind: IndicatorKind,
        rng: &mut R,
    ) -> Vec<ProjectionPoint> {
        let current = series.current;

        self.sample_years()
            .into_iter()
            .enumerate()
            .map(|(index, year)| {
                let progress = self.progress(year);
                let speculative = match kind {
                    IndicatorKind::Temperature => {
                        let target = target_2100
                            .unwrap_or_else(|| series.final_value())
                            .max(current + COMMITTED_WARMING);
                        blend(current, target, progress) + noise(rng, MAX_TEMPERATURE_NOISE)
                    }
                    IndicatorKind::Emissions => match target_2100 {
                        Some(target) => blend(current, target, progress),
                        None => {
                            let floor = current * RESIDUAL_EMISSIONS_SHARE;
                            let elapsed = f64::from(year - self.present_year).max(0.0);
                            let adjusted = (progress + elapsed / DEPLOYMENT_LAG_YEARS).min(1.0);
                            blend(current, floor, adjusted)
                        }
                    },
                    IndicatorKind::SeaLevel { paired_temperature } => match target_2100 {
                        Some(target) => blend(current, target, progress),
                        None => {
                            let scale = match paired_temperature {
                                Some(t) if t < SEA_LEVEL_TEMPERATURE_THRESHOLD => {
                                    SEA_LEVEL_SCALE_LOW
                                }
                                _ => SEA_LEVEL_SCALE_HIGH,
                            };
                            let target = (current + COMMITTED_SEA_LEVEL_RISE) * scale;
                            blend(current, target, progress) + noise(rng, MAX_SEA_LEVEL_NOISE)
                        }
                    },
                };

                ProjectionPoint {
                    year,
                    baseline: series.value_at(index),
                    speculative,
                }
            })
            .collect()
    }

    /// Project temperature, emissions and sea level for a scenario
    pub fn project<R: Rng + ?Sized>(
        &self,
        climate: &BaselineData,
        alt: &AltForecast,
        rng: &mut R,
    ) -> ScenarioProjection {
        ScenarioProjection {
            temperature: self.interpolate(
                &climate.global_temperature,
                alt.global_temp_2100,
                IndicatorKind::Temperature,
                rng,
            ),
            emissions: self.interpolate(
                &climate.carbon_emissions,
                alt.carbon_emissions_2100,
                IndicatorKind::Emissions,
                rng,
            ),
            sea_level: self.interpolate(
                &climate.sea_level_rise,
                alt.sea_level_rise_2100,
                IndicatorKind::SeaLevel {
                    paired_temperature: alt.global_temp_2100,
                },
                rng,
            ),
        }
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::current()
    }
}

#[inline]
fn blend(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

#[inline]
fn noise<R: Rng + ?Sized>(rng: &mut R, max: f64) -> f64 {
    rng.gen::<f64>() * max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::default_climate;
    use proptest::prelude::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet() -> StepRng {
        StepRng::new(0, 0)
    }

    fn last(points: &[ProjectionPoint]) -> ProjectionPoint {
        *points.last().unwrap()
    }

    #[test]
    fn samples_every_decade_to_horizon() {
        let engine = ForecastEngine::new(2026);
        assert_eq!(
            engine.sample_years(),
            vec![2026, 2036, 2046, 2056, 2066, 2076, 2086, 2096, 2100]
        );
        assert_eq!(ForecastEngine::new(2030).sample_years().last(), Some(&2100));
        assert_eq!(ForecastEngine::new(2100).sample_years(), vec![2100]);
    }

    #[test]
    fn progress_is_clamped() {
        let engine = ForecastEngine::new(2025);
        assert_eq!(engine.progress(2025), 0.0);
        assert_eq!(engine.progress(2100), 1.0);
        assert_eq!(engine.progress(2000), 0.0);
        assert_eq!(engine.progress(2200), 1.0);
        assert_eq!(ForecastEngine::new(2150).progress(2150), 1.0);
    }

    #[test]
    fn temperature_target_respects_committed_floor() {
        let engine = ForecastEngine::new(2026);
        let series = default_climate().global_temperature;

        let points =
            engine.interpolate(&series, Some(0.5), IndicatorKind::Temperature, &mut quiet());
        assert_eq!(points[0].speculative, series.current);
        assert!((last(&points).speculative - (series.current + COMMITTED_WARMING)).abs() < 1e-9);

        let points =
            engine.interpolate(&series, Some(4.0), IndicatorKind::Temperature, &mut quiet());
        assert!((last(&points).speculative - 4.0).abs() < 1e-9);
    }

    #[test]
    fn temperature_without_target_uses_baseline_end() {
        let engine = ForecastEngine::new(2026);
        let series = default_climate().global_temperature;
        let points = engine.interpolate(&series, None, IndicatorKind::Temperature, &mut quiet());
        assert!((last(&points).speculative - series.final_value()).abs() < 1e-9);
    }

    #[test]
    fn temperature_noise_is_bounded_and_additive() {
        let engine = ForecastEngine::new(2026);
        let series = default_climate().global_temperature;
        let mut loud = StepRng::new(u64::MAX, 0);
        let points = engine.interpolate(&series, Some(2.0), IndicatorKind::Temperature, &mut loud);
        let quiet_points =
            engine.interpolate(&series, Some(2.0), IndicatorKind::Temperature, &mut quiet());
        for (noisy, calm) in points.iter().zip(&quiet_points) {
            let delta = noisy.speculative - calm.speculative;
            assert!(delta > -1e-9 && delta < MAX_TEMPERATURE_NOISE + 1e-9);
        }
    }

    #[test]
    fn emissions_trust_explicit_target() {
        let engine = ForecastEngine::new(2026);
        let series = default_climate().carbon_emissions;
        let points = engine.interpolate(&series, Some(0.0), IndicatorKind::Emissions, &mut quiet());
        assert_eq!(last(&points).speculative, 0.0);
    }

    #[test]
    fn emissions_without_target_decay_to_residual_floor() {
        let engine = ForecastEngine::new(2026);
        let series = default_climate().carbon_emissions;
        let points = engine.interpolate(&series, None, IndicatorKind::Emissions, &mut quiet());

        let floor = series.current * RESIDUAL_EMISSIONS_SHARE;
        assert_eq!(points[0].speculative, series.current);
        // 2036: half the rollout lag on top of ten years of progress.
        let adjusted = 10.0 / 74.0 + 0.5;
        let expected = series.current + (floor - series.current) * adjusted;
        assert_eq!(points[1].year, 2036);
        assert!((points[1].speculative - expected).abs() < 1e-9);
        // 2046: twenty years in, rollout has completed.
        assert!((points[2].speculative - floor).abs() < 1e-9);
        assert!((last(&points).speculative - floor).abs() < 1e-9);
    }

    #[test]
    fn sea_level_scales_with_paired_temperature() {
        let engine = ForecastEngine::new(2026);
        let series = default_climate().sea_level_rise;
        let floor = series.current + COMMITTED_SEA_LEVEL_RISE;

        let cool = engine.interpolate(
            &series,
            None,
            IndicatorKind::SeaLevel { paired_temperature: Some(1.8) },
            &mut quiet(),
        );
        assert!((last(&cool).speculative - floor * 1.2).abs() < 1e-9);

        let hot = engine.interpolate(
            &series,
            None,
            IndicatorKind::SeaLevel { paired_temperature: Some(2.5) },
            &mut quiet(),
        );
        assert!((last(&hot).speculative - floor * 1.8).abs() < 1e-9);

        let explicit = engine.interpolate(
            &series,
            Some(0.4),
            IndicatorKind::SeaLevel { paired_temperature: Some(2.5) },
            &mut quiet(),
        );
        assert!((last(&explicit).speculative - 0.4).abs() < 1e-9);
    }

    #[test]
    fn sea_level_noise_is_bounded_and_additive() {
        let engine = ForecastEngine::new(2026);
        let series = default_climate().sea_level_rise;
        let kind = IndicatorKind::SeaLevel {
            paired_temperature: Some(2.5),
        };

        let mut loud = StepRng::new(u64::MAX, 0);
        let points = engine.interpolate(&series, None, kind, &mut loud);
        let quiet_points = engine.interpolate(&series, None, kind, &mut quiet());
        for (noisy, calm) in points.iter().zip(&quiet_points) {
            let delta = noisy.speculative - calm.speculative;
            assert!(delta > -1e-9 && delta < MAX_SEA_LEVEL_NOISE + 1e-9);
        }
        assert!(points
            .iter()
            .zip(&quiet_points)
            .any(|(noisy, calm)| noisy.speculative > calm.speculative));
    }

    #[test]
    fn baseline_is_looked_up_by_index() {
        let engine = ForecastEngine::new(2026);
        let series = BaselineSeries::new(1.0, vec![crate::types::YearValue::new(2030, 1.1)]);
        let points = engine.interpolate(&series, None, IndicatorKind::Emissions, &mut quiet());
        assert_eq!(points[0].baseline, 1.1);
        assert_eq!(points[1].baseline, 1.0);
    }

    #[test]
    fn projection_covers_three_indicators() {
        let engine = ForecastEngine::new(2026);
        let alt = AltForecast {
            global_temp_2100: Some(1.8),
            ..AltForecast::default()
        };
        let projection = engine.project(&default_climate(), &alt, &mut StdRng::seed_from_u64(42));
        let years = engine.sample_years().len();
        assert_eq!(projection.temperature.len(), years);
        assert_eq!(projection.emissions.len(), years);
        assert_eq!(projection.sea_level.len(), years);
    }

    proptest! {
        #[test]
        fn prop_temperature_never_below_committed_floor(
            current in -1.0f64..5.0,
            shortfall in 0.0f64..10.0,
            seed in any::<u64>(),
            present in 2000i32..2099,
        ) {
            let engine = ForecastEngine::new(present);
            let series = BaselineSeries::new(current, vec![]);
            let target = current + COMMITTED_WARMING - shortfall;
            let mut rng = StdRng::seed_from_u64(seed);
            let points =
                engine.interpolate(&series, Some(target), IndicatorKind::Temperature, &mut rng);
            let end = points.last().unwrap();
            prop_assert_eq!(end.year, HORIZON_YEAR);
            prop_assert!(end.speculative >= current + COMMITTED_WARMING - 1e-9);
            prop_assert!(
                end.speculative <= current + COMMITTED_WARMING + MAX_TEMPERATURE_NOISE + 1e-9
            );
        }
    }
}
