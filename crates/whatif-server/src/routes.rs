//! HTTP routes
//!
//! | Method | Path |
//! |---|---|
//! | GET | `/api/health` |
//! | GET | `/api/climate/baseline` |
//! | GET | `/api/impacts/baseline` |
//! | GET, POST | `/api/scenarios` |
//! | GET | `/api/scenarios/:id` |
//! | GET | `/api/scenarios/:id/projection` |
//! | POST | `/api/narrative/generate` |

use crate::response::{handle_rejection, scenario_error_response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use warp::reply::{self, Response};
use warp::{Filter, Rejection, Reply};
use whatif_core::{
    NarrativeRequest, NarrativeResponse, ScenarioId, ScenarioProjection, ScenarioRequest,
    ScenarioService,
};

/// Maximum accepted request body
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Liveness body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Projection body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResponse {
    pub scenario_id: ScenarioId,
    #[serde(flatten)]
    pub projection: ScenarioProjection,
}

/// Full API with rejection handling, CORS and request tracing
pub fn routes(
    service: ScenarioService,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);

    api(service)
        .recover(handle_rejection)
        .with(cors)
        .with(warp::trace::request())
}

/// API filters without recovery
pub fn api(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    health()
        .or(climate_baseline(service.clone()))
        .unify()
        .or(impacts_baseline(service.clone()))
        .unify()
        .or(list_scenarios(service.clone()))
        .unify()
        .or(create_scenario(service.clone()))
        .unify()
        .or(get_scenario(service.clone()))
        .unify()
        .or(project_scenario(service.clone()))
        .unify()
        .or(generate_narrative(service))
        .unify()
}

fn with_service(
    service: ScenarioService,
) -> impl Filter<Extract = (ScenarioService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// GET /api/health
fn health() -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "health").and(warp::get()).map(|| {
        reply::json(&HealthResponse {
            status: "ok".to_string(),
            timestamp: Utc::now(),
        })
        .into_response()
    })
}

/// GET /api/climate/baseline
fn climate_baseline(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "climate" / "baseline")
        .and(warp::get())
        .and(with_service(service))
        .map(|service: ScenarioService| reply::json(service.climate()).into_response())
}

/// GET /api/impacts/baseline
fn impacts_baseline(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "impacts" / "baseline")
        .and(warp::get())
        .and(with_service(service))
        .map(|service: ScenarioService| reply::json(service.impacts()).into_response())
}

/// GET /api/scenarios
fn list_scenarios(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "scenarios")
        .and(warp::get())
        .and(with_service(service))
        .and_then(handlers::list_scenarios)
}

/// POST /api/scenarios
fn create_scenario(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "scenarios")
        .and(warp::post())
        .and(json_body::<ScenarioRequest>())
        .and(with_service(service))
        .and_then(handlers::create_scenario)
}

/// GET /api/scenarios/:id
fn get_scenario(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "scenarios" / u64)
        .and(warp::get())
        .and(with_service(service))
        .and_then(handlers::get_scenario)
}

/// GET /api/scenarios/:id/projection
fn project_scenario(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "scenarios" / u64 / "projection")
        .and(warp::get())
        .and(with_service(service))
        .and_then(handlers::project_scenario)
}

/// POST /api/narrative/generate
fn generate_narrative(
    service: ScenarioService,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "narrative" / "generate")
        .and(warp::post())
        .and(json_body::<NarrativeRequest>())
        .and(with_service(service))
        .and_then(handlers::generate_narrative)
}

mod handlers {
    use super::*;

    pub(super) async fn list_scenarios(service: ScenarioService) -> Result<Response, Infallible> {
        Ok(match service.list_scenarios().await {
            Ok(scenarios) => reply::json(&scenarios).into_response(),
            Err(e) => scenario_error_response(&e),
        })
    }

    pub(super) async fn create_scenario(
        request: ScenarioRequest,
        service: ScenarioService,
    ) -> Result<Response, Infallible> {
        Ok(match service.create_scenario(request).await {
            Ok(scenario) => reply::json(&scenario).into_response(),
            Err(e) => scenario_error_response(&e),
        })
    }

    pub(super) async fn get_scenario(
        id: u64,
        service: ScenarioService,
    ) -> Result<Response, Infallible> {
        Ok(match service.get_scenario(ScenarioId(id)).await {
            Ok(scenario) => reply::json(&scenario).into_response(),
            Err(e) => scenario_error_response(&e),
        })
    }

    pub(super) async fn project_scenario(
        id: u64,
        service: ScenarioService,
    ) -> Result<Response, Infallible> {
        Ok(match service.get_scenario(ScenarioId(id)).await {
            Ok(scenario) => {
                let body = ProjectionResponse {
                    scenario_id: scenario.id,
                    projection: service.project(&scenario),
                };
                reply::json(&body).into_response()
            }
            Err(e) => scenario_error_response(&e),
        })
    }

    pub(super) async fn generate_narrative(
        request: NarrativeRequest,
        service: ScenarioService,
    ) -> Result<Response, Infallible> {
        let narrative = service.generate_narrative(request).await;
        Ok(reply::json(&NarrativeResponse { narrative }).into_response())
    }
}
