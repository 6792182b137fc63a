//! What-If Core - speculative climate scenario pipeline
//!
//! Turns a free-text "what if" question into a persisted scenario:
//! - Builds a tightly specified prompt over baseline climate data
//! - Calls an unreliable text-completion service under a deadline
//! - Recovers a structured record from free text, or falls back to
//!   pre-authored scenarios when the service is down
//! - Projects the scenario's 2100 targets onto decade curves under
//!   physical floor constraints
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use whatif_core::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ScenarioService::new(
//!     BaselineProvider::default(),
//!     Arc::new(DisabledCompletionClient),
//!     Arc::new(MemoryStore::new()),
//!     CompletionSettings::default(),
//! );
//!
//! let scenario = service
//!     .create_scenario(ScenarioRequest::new("What if we master fusion energy?"))
//!     .await?;
//! println!("{}: {}", scenario.id, scenario.theme);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod baseline;
pub mod completion;
pub mod error;
pub mod fallback;
pub mod forecast;
pub mod narrative;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use baseline::BaselineProvider;
pub use completion::{
    client_from_settings, CompletionClient, CompletionRequest, CompletionSettings,
    DisabledCompletionClient, HttpCompletionClient,
};
pub use error::{CompletionError, ScenarioError, ScenarioResult, StoreError};
pub use fallback::fallback_scenario;
pub use forecast::{ForecastEngine, IndicatorKind, ProjectionPoint, ScenarioProjection};
pub use narrative::{NarrativeMode, NarrativeRequest, NarrativeResponse};
pub use parser::parse_completion;
pub use pipeline::ScenarioService;
pub use store::{JsonFileStore, MemoryStore, ScenarioStore};
pub use types::{
    AltForecast, BaselineData, BaselineOverride, BaselineSeries, GeneratedScenario,
    HumanImpactOverride, HumanImpactSnapshot, Scenario, ScenarioDraft, ScenarioId,
    ScenarioRequest, YearValue,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the scenario pipeline
    pub use crate::{
        BaselineProvider, CompletionClient, CompletionSettings, DisabledCompletionClient,
        MemoryStore, Scenario, ScenarioError, ScenarioRequest, ScenarioService, ScenarioStore,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn disabled_service_end_to_end() {
        let service = ScenarioService::new(
            BaselineProvider::default(),
            Arc::new(DisabledCompletionClient),
            Arc::new(MemoryStore::new()),
            CompletionSettings::default(),
        );

        let scenario = service
            .create_scenario(ScenarioRequest::new("What if we master fusion energy before 2025?"))
            .await
            .unwrap();

        assert!(scenario.theme.contains("fusion"));
        assert_eq!(scenario.alt_forecasts.global_temp_2100, Some(1.8));
        assert!(scenario.alt_forecasts.is_well_formed());
        assert_eq!(service.list_scenarios().await.unwrap(), vec![scenario]);
    }
}
