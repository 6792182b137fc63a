//! Testing utilities for the what-if workspace
//!
//! Shared test helpers, fixtures, and a scripted completion client.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::mock::StepRng;
use std::collections::VecDeque;
use std::sync::Arc;
use whatif_core::{
    BaselineProvider, CompletionClient, CompletionError, CompletionRequest, CompletionSettings,
    ForecastEngine, MemoryStore, ScenarioService,
};

/// Present year used by fixture services
pub const FIXTURE_YEAR: i32 = 2026;

/// Well-formed completion wrapped in prose
pub const SAMPLE_COMPLETION: &str = r#"Sure! Here is the scenario:
{
  "theme": "Arctic rewilding cools the north.",
  "alt_forecasts": {
    "global_temp_2100": 2.4,
    "carbon_emissions_2100": 18.5,
    "sea_level_rise_2100": 0.55,
    "forest_loss_2100": 6.0,
    "death_toll": 120000,
    "population": 9400000000,
    "land_loss_percent": 1.5,
    "refugees": 40000000,
    "gdp_loss_percent": 3.0,
    "biodiversity_loss_percent": 12.0
  },
  "narrative": "Herds return to the tundra.\n\nPermafrost thaw slows."
}
Let me know if you need more."#;

/// Completion client replaying a fixed script of replies
///
/// Once the script is exhausted every call answers `Unavailable`.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure
    pub fn fail(self, err: CompletionError) -> Self {
        self.replies.lock().push_back(Err(err));
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.prompts.lock().push(request.prompt.clone());
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(CompletionError::Unavailable(
                "script exhausted".to_string(),
            ))
        })
    }
}

/// Service over an in-memory store, default baseline and a fixed present year
pub fn test_service(client: Arc<dyn CompletionClient>) -> ScenarioService {
    ScenarioService::new(
        BaselineProvider::default(),
        client,
        Arc::new(MemoryStore::new()),
        CompletionSettings::default(),
    )
    .with_forecast_engine(ForecastEngine::new(FIXTURE_YEAR))
}

/// Service whose completion calls always fail
pub fn offline_service() -> ScenarioService {
    test_service(Arc::new(ScriptedCompletion::new()))
}

/// Entropy source producing zero perturbation
pub fn quiet_rng() -> StepRng {
    StepRng::new(0, 0)
}
