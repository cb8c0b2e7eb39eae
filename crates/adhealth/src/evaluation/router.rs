use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;
use tracing::error;

use super::service::{
    EvaluationRequest, EvaluationService, EvaluationServiceError, ValidationRequest,
};
use super::ResultEvaluator;

/// Router builder exposing batch evaluation and rule validation.
pub fn evaluation_router<E>(service: Arc<EvaluationService<E>>) -> Router
where
    E: ResultEvaluator + 'static,
{
    Router::new()
        .route("/api/v1/evaluations", post(evaluate_handler::<E>))
        .route("/api/v1/rules/validate", post(validate_handler::<E>))
        .with_state(service)
}

pub(crate) async fn evaluate_handler<E>(
    State(service): State<Arc<EvaluationService<E>>>,
    axum::Json(request): axum::Json<EvaluationRequest>,
) -> Response
where
    E: ResultEvaluator + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || service.evaluate(request)).await;

    match outcome {
        Ok(Ok(report)) => (StatusCode::OK, axum::Json(report)).into_response(),
        Ok(Err(error @ EvaluationServiceError::EmptyCatalog)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(join_error) => {
            error!(error = %join_error, "evaluation task did not complete");
            let payload = json!({
                "error": "evaluation did not complete",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn validate_handler<E>(
    State(service): State<Arc<EvaluationService<E>>>,
    axum::Json(request): axum::Json<ValidationRequest>,
) -> Response
where
    E: ResultEvaluator + 'static,
{
    let report = service.validate(request);
    (StatusCode::OK, axum::Json(report)).into_response()
}
