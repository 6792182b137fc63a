//! Keyword fallback scenarios
//!
//! Used only when the completion service is unavailable. An ordered table maps
//! keyword sets to pre-authored scenarios; the first class with a matching
//! keyword wins. No match is an explicit failure.

use crate::error::{ScenarioError, ScenarioResult};
use crate::types::{AltForecast, GeneratedScenario};

/// One keyword class of the fallback table
#[derive(Debug, Clone, Copy)]
pub struct FallbackClass {
    /// Class name (for logs)
    pub name: &'static str,
    /// Lower-case keywords; any substring match selects the class
    pub keywords: &'static [&'static str],
    /// Producer of the pre-authored scenario
    pub build: fn() -> GeneratedScenario,
}

impl FallbackClass {
    /// Check `input` (already lower-cased) against this class
    #[inline]
    #[must_use]
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Classes in priority order
pub const FALLBACK_TABLE: [FallbackClass; 6] = [
    FallbackClass {
        name: "fusion-energy",
        keywords: &["fusion", "energy"],
        build: fusion_energy,
    },
    FallbackClass {
        name: "decarbonization",
        keywords: &["decarbon", "net zero", "net-zero", "carbon", "emission"],
        build: decarbonization,
    },
    FallbackClass {
        name: "geoengineering",
        keywords: &[
            "geoengineer",
            "solar radiation",
            "aerosol",
            "cloud seeding",
            "cloud brightening",
        ],
        build: geoengineering,
    },
    FallbackClass {
        name: "superhero",
        keywords: &["superhero", "hero", "superpower"],
        build: superhero,
    },
    FallbackClass {
        name: "time-travel",
        keywords: &["time travel", "time-travel", "time machine", "back in time"],
        build: time_travel,
    },
    FallbackClass {
        name: "extraterrestrial",
        keywords: &["alien", "extraterrestrial", "ufo"],
        build: extraterrestrial,
    },
];

/// Select a pre-authored scenario for `user_input`
///
/// # Errors
/// `ScenarioError::NoFallbackMatch` when no keyword class matches.
pub fn fallback_scenario(user_input: &str) -> ScenarioResult<GeneratedScenario> {
    let lowered = user_input.to_lowercase();

    FALLBACK_TABLE
        .iter()
        .find(|class| class.matches(&lowered))
        .map(|class| {
            tracing::info!(class = class.name, "Using fallback scenario");
            (class.build)()
        })
        .ok_or_else(|| ScenarioError::NoFallbackMatch {
            user_input: user_input.to_string(),
        })
}

#[allow(clippy::too_many_arguments)]
fn forecast(
    death_toll: f64,
    population: f64,
    land_loss_percent: f64,
    refugees: f64,
    gdp_loss_percent: f64,
    biodiversity_loss_percent: f64,
    conflict_index: f64,
    targets: [f64; 3],
) -> AltForecast {
    AltForecast {
        death_toll: Some(death_toll),
        population: Some(population),
        land_loss_percent: Some(land_loss_percent),
        refugees: Some(refugees),
        gdp_loss_percent: Some(gdp_loss_percent),
        biodiversity_loss_percent: Some(biodiversity_loss_percent),
        conflict_index: Some(conflict_index),
        global_temp_2100: Some(targets[0]),
        carbon_emissions_2100: Some(targets[1]),
        sea_level_rise_2100: Some(targets[2]),
    }
}

fn fusion_energy() -> GeneratedScenario {
    GeneratedScenario {
        theme: "Commercial fusion energy arrives before 2025 and reshapes the global power grid."
            .to_string(),
        alt_forecasts: forecast(
            90_000.0,
            8_600_000_000.0,
            0.2,
            6_000_000.0,
            0.8,
            4.0,
            1.9,
            [1.8, 4.5, 0.38],
        ),
        narrative: "The first grid-connected fusion plant came online in a quiet industrial park, \
and within a decade its successors were being poured in concrete on every continent. Coal \
plants closed faster than any treaty had ever demanded, simply because they could no longer \
compete.\n\n\
Cheap, abundant power changed more than the electricity mix. Desalination plants turned \
drought-stricken coasts green, and synthetic fuels displaced oil in shipping and aviation. \
Emissions fell steeply through the 2030s.\n\n\
The warming already locked into the oceans could not be undone. Temperatures still crept \
upward before levelling off near 1.8°C, and the world spent the rest of the century adapting \
to the changes it had committed to before the breakthrough."
            .to_string(),
    }
}

fn decarbonization() -> GeneratedScenario {
    GeneratedScenario {
        theme: "A coordinated global push reaches net-zero emissions by 2050.".to_string(),
        alt_forecasts: forecast(
            120_000.0,
            8_500_000_000.0,
            0.3,
            9_000_000.0,
            1.2,
            5.5,
            2.2,
            [2.0, 6.0, 0.45],
        ),
        narrative: "The turning point was not a single summit but a cascade of carbon border \
taxes that made pollution expensive everywhere at once. Utilities, automakers and steelmakers \
raced to decarbonize rather than pay.\n\n\
Solar, wind and storage were built at wartime pace. By 2050 the remaining emissions came \
mostly from agriculture and a handful of hard-to-abate industries, offset by restored \
forests and direct air capture.\n\n\
Warming peaked around 2.0°C. Heatwaves and floods still tested the world's cities, but the \
worst tipping points were avoided and adaptation budgets, not disaster relief, dominated the \
late-century agenda."
            .to_string(),
    }
}

fn geoengineering() -> GeneratedScenario {
    GeneratedScenario {
        theme: "Stratospheric aerosol injection masks warming while emissions stay high."
            .to_string(),
        alt_forecasts: forecast(
            160_000.0,
            8_300_000_000.0,
            0.4,
            14_000_000.0,
            2.0,
            12.0,
            4.1,
            [1.9, 30.0, 0.55],
        ),
        narrative: "After a catastrophic summer of crop failures, a coalition of nations began \
releasing reflective aerosols into the stratosphere. Global temperatures dipped within two \
years.\n\n\
The cooling came at a price. Monsoon patterns shifted, ocean acidification continued \
unabated, and the world became dependent on a program that could never safely be switched \
off.\n\n\
By 2100 the thermometer read close to 1.9°C, but the carbon remained in the air, and every \
diplomatic dispute carried the quiet threat of termination shock."
            .to_string(),
    }
}

fn superhero() -> GeneratedScenario {
    GeneratedScenario {
        theme: "A generation of superpowered heroes turns their abilities to climate repair."
            .to_string(),
        alt_forecasts: forecast(
            70_000.0,
            8_700_000_000.0,
            0.1,
            4_000_000.0,
            0.5,
            3.0,
            1.5,
            [1.7, 3.0, 0.33],
        ),
        narrative: "When the first heroes emerged, they fought bank robbers and supervillains. \
It took a drowned city for them to notice the larger enemy.\n\n\
Speedsters rebuilt levees overnight, telekinetics replanted burned forests, and a reclusive \
genius with control over matter began pulling carbon straight from the sky. Governments \
struggled to regulate power they could not match.\n\n\
The heroes could not reverse the heat already stored in the seas, but with their help the \
century closed near 1.7°C, and the hardest question became who should decide where they \
were needed most."
            .to_string(),
    }
}

fn time_travel() -> GeneratedScenario {
    GeneratedScenario {
        theme: "A time traveller warns the 1970s about climate change, and they listen."
            .to_string(),
        alt_forecasts: forecast(
            60_000.0,
            8_800_000_000.0,
            0.1,
            3_000_000.0,
            0.4,
            2.5,
            1.4,
            [1.6, 2.0, 0.3],
        ),
        narrative: "She arrived in 1975 carrying temperature charts no one could have drawn. \
Skeptics called it a hoax until her predictions about the next decade began to come true.\n\n\
The energy transition started fifty years early. Nuclear and solar research received the \
funding that went to offshore oil, and cities were designed around trains rather than \
highways.\n\n\
The present she returned to was cooler, greener and strangely unfamiliar. Warming was held \
near 1.6°C, yet some of the damage from the decades before her visit could not be erased."
            .to_string(),
    }
}

fn extraterrestrial() -> GeneratedScenario {
    GeneratedScenario {
        theme: "An extraterrestrial civilization shares atmospheric restoration technology."
            .to_string(),
        alt_forecasts: forecast(
            80_000.0,
            8_600_000_000.0,
            0.2,
            5_000_000.0,
            0.7,
            4.5,
            3.0,
            [1.7, 1.0, 0.35],
        ),
        narrative: "The signal repeated for three days before anyone decoded it: schematics for \
a device that could split carbon dioxide at planetary scale, and a polite note about the \
state of the atmosphere.\n\n\
Building the machines united rivals and divided allies. Every nation wanted one, and the \
question of who controlled the alien technology dominated politics for a generation.\n\n\
Atmospheric carbon fell to pre-industrial levels by the end of the century, though the \
oceans remembered the heat for longer. Temperatures settled near 1.7°C as humanity waited \
for the next message."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_question_matches_fusion_class() {
        let scenario = fallback_scenario("What if we master fusion energy before 2025?").unwrap();
        assert!(scenario.theme.to_lowercase().contains("fusion"));
        assert_eq!(scenario.alt_forecasts.global_temp_2100, Some(1.8));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let scenario = fallback_scenario("WHAT IF ALIENS LANDED?").unwrap();
        assert!(scenario.theme.contains("extraterrestrial"));
    }

    #[test]
    fn priority_order_first_match_wins() {
        // Mentions both energy and aliens: energy is earlier in the table.
        let scenario = fallback_scenario("What if aliens gave us free energy?").unwrap();
        assert!(scenario.theme.contains("fusion"));

        let scenario = fallback_scenario("What if a superhero could time travel?").unwrap();
        assert!(scenario.theme.contains("superpowered"));
    }

    #[test]
    fn each_class_is_reachable() {
        let inputs = [
            ("fusion-energy", "fusion"),
            ("decarbonization", "net zero by 2040"),
            ("geoengineering", "geoengineering the sky"),
            ("superhero", "a hero saves us"),
            ("time-travel", "we go back in time"),
            ("extraterrestrial", "a UFO lands"),
        ];
        for (class, input) in inputs {
            let lowered = input.to_lowercase();
            let found = FALLBACK_TABLE.iter().find(|c| c.matches(&lowered)).unwrap();
            assert_eq!(found.name, class);
        }
    }

    #[test]
    fn every_fallback_is_well_formed() {
        for class in FALLBACK_TABLE {
            let scenario = (class.build)();
            assert!(scenario.alt_forecasts.is_well_formed(), "{}", class.name);
            assert!(!scenario.theme.is_empty());
            assert!(scenario.narrative.contains("\n\n"));
        }
    }

    #[test]
    fn unmatched_input_fails() {
        let err = fallback_scenario("What if cats ruled the world?").unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::NoFallbackMatch { ref user_input }
                if user_input == "What if cats ruled the world?"
        ));
    }
}
