//! Scenario generation pipeline
//!
//! Turns free-text user input plus baseline data into a validated, persisted
//! scenario:
//! 1. Reject empty input
//! 2. Resolve baseline overrides against the injected defaults
//! 3. Build the prompt and call the completion service under a deadline
//! 4. Parse the completion, or route to the keyword fallback when the
//!    service is unavailable
//! 5. Persist the draft
//!
//! A completion that arrives but cannot be parsed is surfaced as
//! `MalformedCompletion`; only an unavailable service falls back.

use crate::baseline::BaselineProvider;
use crate::completion::{CompletionClient, CompletionSettings};
use crate::error::{CompletionError, ScenarioError, ScenarioResult};
use crate::fallback::fallback_scenario;
use crate::forecast::{ForecastEngine, ScenarioProjection};
use crate::narrative::{NarrativeMode, NarrativeRequest};
use crate::parser::parse_completion;
use crate::prompt::build_scenario_prompt;
use crate::store::ScenarioStore;
use crate::types::{
    BaselineData, GeneratedScenario, HumanImpactSnapshot, Scenario, ScenarioId, ScenarioRequest,
};
use rand::Rng;
use std::sync::Arc;

/// Scenario service shared by all requests
#[derive(Clone)]
pub struct ScenarioService {
    baseline: Arc<BaselineProvider>,
    completion: Arc<dyn CompletionClient>,
    store: Arc<dyn ScenarioStore>,
    settings: CompletionSettings,
    forecast: ForecastEngine,
}

impl std::fmt::Debug for ScenarioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioService")
            .field("model", &self.settings.model)
            .field("timeout_secs", &self.settings.timeout_secs)
            .field("present_year", &self.forecast.present_year())
            .finish()
    }
}

impl ScenarioService {
    /// Create service over its collaborators
    #[must_use]
    pub fn new(
        baseline: BaselineProvider,
        completion: Arc<dyn CompletionClient>,
        store: Arc<dyn ScenarioStore>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            baseline: Arc::new(baseline),
            completion,
            store,
            settings,
            forecast: ForecastEngine::default(),
        }
    }

    /// With forecast engine
    #[inline]
    #[must_use]
    pub fn with_forecast_engine(mut self, forecast: ForecastEngine) -> Self {
        self.forecast = forecast;
        self
    }

    /// Baseline climate series
    #[inline]
    #[must_use]
    pub fn climate(&self) -> &BaselineData {
        self.baseline.climate()
    }

    /// Baseline human-impact snapshot
    #[inline]
    #[must_use]
    pub fn impacts(&self) -> &HumanImpactSnapshot {
        self.baseline.impacts()
    }

    /// Generate and persist a scenario
    ///
    /// # Errors
    /// - `InvalidInput` for empty input, before any external call
    /// - `MalformedCompletion` when the completion cannot be parsed
    /// - `NoFallbackMatch` when the service is unavailable and no keyword matches
    /// - `Store` when persistence fails
    pub async fn create_scenario(&self, request: ScenarioRequest) -> ScenarioResult<Scenario> {
        let user_input = request.user_input.trim();
        if user_input.is_empty() {
            return Err(ScenarioError::InvalidInput(
                "userInput must not be empty".to_string(),
            ));
        }

        tracing::info!("Generating scenario for: {}", user_input);

        let (climate, impacts) = self
            .baseline
            .resolve(request.baseline_data.as_ref(), request.human_impacts.as_ref());

        let generated = self.generate(user_input, &climate, &impacts).await?;
        debug_assert!(generated.alt_forecasts.is_well_formed());

        let scenario = self.store.create(generated.into_draft(user_input)).await?;
        tracing::info!(id = %scenario.id, theme = %scenario.theme, "Scenario stored");
        Ok(scenario)
    }

    async fn generate(
        &self,
        user_input: &str,
        climate: &BaselineData,
        impacts: &HumanImpactSnapshot,
    ) -> ScenarioResult<GeneratedScenario> {
        let prompt = build_scenario_prompt(user_input, climate, impacts);
        tracing::debug!(prompt_len = prompt.len(), "Built scenario prompt");

        match self.complete(prompt).await {
            Ok(text) => parse_completion(&text).map_err(|e| {
                tracing::warn!("Completion could not be parsed: {}", e);
                e
            }),
            Err(e) => {
                tracing::warn!("Completion unavailable ({}); trying keyword fallback", e);
                fallback_scenario(user_input)
            }
        }
    }

    /// Call the completion service under the configured deadline
    async fn complete(&self, prompt: String) -> Result<String, CompletionError> {
        let request = self.settings.request(prompt);
        let deadline = self.settings.timeout();

        match tokio::time::timeout(deadline, self.completion.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout {
                duration_secs: deadline.as_secs(),
            }),
        }
    }

    /// All scenarios, newest first
    pub async fn list_scenarios(&self) -> ScenarioResult<Vec<Scenario>> {
        Ok(self.store.list().await?)
    }

    /// Scenario by id
    pub async fn get_scenario(&self, id: ScenarioId) -> ScenarioResult<Scenario> {
        Ok(self.store.get(id).await?)
    }

    /// Project a scenario's targets against the default baseline
    #[must_use]
    pub fn project(&self, scenario: &Scenario) -> ScenarioProjection {
        self.project_with(scenario, &mut rand::thread_rng())
    }

    /// Project with an explicit entropy source
    pub fn project_with<R: Rng + ?Sized>(
        &self,
        scenario: &Scenario,
        rng: &mut R,
    ) -> ScenarioProjection {
        self.forecast
            .project(self.baseline.climate(), &scenario.alt_forecasts, rng)
    }

    /// Generate a bulletin or an answer; falls back to templated text
    pub async fn generate_narrative(&self, request: NarrativeRequest) -> String {
        let (climate, impacts) = self
            .baseline
            .resolve(request.baseline_data.as_ref(), request.human_impacts.as_ref());
        let mode = NarrativeMode::from_question(request.question.as_deref());

        match self.complete(mode.prompt(&climate, &impacts)).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!("Narrative completion unavailable ({}); using template", e);
                mode.fallback_text(&climate, &impacts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionRequest, MockCompletionClient};
    use crate::forecast::COMMITTED_WARMING;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use rand::rngs::mock::StepRng;
    use std::time::Duration;

    const GOOD: &str = r#"Here you go:
{"theme": "Oceans absorb less heat.", "alt_forecasts": {"global_temp_2100": 0.5, "refugees": 30000000}, "narrative": "A.\n\nB."}"#;

    fn service(client: impl CompletionClient + 'static) -> (ScenarioService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = ScenarioService::new(
            BaselineProvider::default(),
            Arc::new(client),
            store.clone(),
            CompletionSettings::default(),
        )
        .with_forecast_engine(ForecastEngine::new(2026));
        (service, store)
    }

    fn answering(text: &'static str) -> MockCompletionClient {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete().returning(move |_| Ok(text.to_string()));
        mock
    }

    fn failing() -> MockCompletionClient {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .returning(|_| Err(CompletionError::Unavailable("connection refused".to_string())));
        mock
    }

    struct SlowClient;

    #[async_trait]
    impl CompletionClient for SlowClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(GOOD.to_string())
        }
    }

    #[tokio::test]
    async fn empty_input_rejected_before_completion() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete().never();
        let (service, store) = service(mock);

        let err = service.create_scenario(ScenarioRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidInput(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn successful_completion_is_persisted() {
        let (service, store) = service(answering(GOOD));
        let scenario = service
            .create_scenario(ScenarioRequest::new("  What if the oceans stopped absorbing heat? "))
            .await
            .unwrap();

        assert_eq!(scenario.user_input, "What if the oceans stopped absorbing heat?");
        assert_eq!(scenario.theme, "Oceans absorb less heat.");
        assert_eq!(scenario.alt_forecasts.refugees, Some(30_000_000.0));
        assert_eq!(store.len(), 1);
        assert_eq!(service.get_scenario(scenario.id).await.unwrap(), scenario);
    }

    #[tokio::test]
    async fn prompt_carries_user_input_and_settings() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|req| {
                req.prompt.contains("QUESTION: What if forests doubled?")
                    && req.model == "gpt-4o-mini"
                    && req.max_tokens == 1500
            })
            .times(1)
            .returning(|_| Ok(GOOD.to_string()));
        let (service, _) = service(mock);

        service
            .create_scenario(ScenarioRequest::new("What if forests doubled?"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unavailable_service_uses_fallback() {
        let (service, _) = service(failing());
        let scenario = service
            .create_scenario(ScenarioRequest::new("What if we master fusion energy before 2025?"))
            .await
            .unwrap();

        assert!(scenario.theme.to_lowercase().contains("fusion"));
        assert_eq!(scenario.alt_forecasts.global_temp_2100, Some(1.8));
    }

    #[tokio::test]
    async fn timeout_counts_as_unavailable() {
        let (service, _) = service(SlowClient);
        let service = ScenarioService {
            settings: CompletionSettings {
                timeout_secs: 0,
                ..CompletionSettings::default()
            },
            ..service
        };

        let scenario = service
            .create_scenario(ScenarioRequest::new("What if aliens arrived?"))
            .await
            .unwrap();
        assert!(scenario.theme.contains("extraterrestrial"));
    }

    #[tokio::test]
    async fn unavailable_without_keyword_fails() {
        let (service, store) = service(failing());
        let err = service
            .create_scenario(ScenarioRequest::new("What if cats ruled?"))
            .await
            .unwrap_err();

        assert!(matches!(err, ScenarioError::NoFallbackMatch { .. }));
        assert!(err.to_string().contains("What if cats ruled?"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn malformed_completion_does_not_fall_back() {
        let (service, store) = service(answering("I'd rather write a poem about fusion."));
        let err = service
            .create_scenario(ScenarioRequest::new("What if fusion energy worked?"))
            .await
            .unwrap_err();

        assert!(matches!(err, ScenarioError::MalformedCompletion { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let (service, _) = service(answering(GOOD));
        assert!(service.list_scenarios().await.unwrap().is_empty());

        let a = service.create_scenario(ScenarioRequest::new("a")).await.unwrap();
        let b = service.create_scenario(ScenarioRequest::new("b")).await.unwrap();

        let listed = service.list_scenarios().await.unwrap();
        assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn missing_scenario_is_not_found() {
        let (service, _) = service(answering(GOOD));
        let err = service.get_scenario(ScenarioId(3)).await.unwrap_err();
        assert!(matches!(err, ScenarioError::NotFound(ScenarioId(3))));
    }

    #[tokio::test]
    async fn projection_applies_temperature_floor() {
        let (service, _) = service(answering(GOOD));
        let scenario = service.create_scenario(ScenarioRequest::new("q")).await.unwrap();

        let projection = service.project_with(&scenario, &mut StepRng::new(0, 0));
        let end = projection.temperature.last().unwrap();
        let current = service.climate().global_temperature.current;
        assert_eq!(end.year, 2100);
        assert!((end.speculative - (current + COMMITTED_WARMING)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn narrative_uses_completion_text() {
        let (service, _) = service(answering("  Storms intensify.  "));
        let text = service.generate_narrative(NarrativeRequest::default()).await;
        assert_eq!(text, "Storms intensify.");
    }

    #[tokio::test]
    async fn narrative_falls_back_to_template() {
        let (service, _) = service(failing());
        let bulletin = service.generate_narrative(NarrativeRequest::default()).await;
        assert!(bulletin.starts_with("Climate bulletin."));

        let answer = service
            .generate_narrative(NarrativeRequest {
                question: Some("Is it too late?".to_string()),
                ..NarrativeRequest::default()
            })
            .await;
        assert!(answer.contains("\"Is it too late?\""));
    }
}
