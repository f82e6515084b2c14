use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dossier_common::DossierError;
use serde_json::json;
use tracing::info;

use super::types::{
    FilterRequest, OptionalMethodRequest, ProviderStatusResponse, SearchParamRequest, StageResponse,
};
use crate::api::ApiResponse;
use crate::error::ApiResult;
use crate::features::FeatureState;

pub fn workflows_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_workflows))
        .route("/:name/steps", get(get_steps))
        .route("/:name/methods/minimum", get(get_minimum_methods))
        .route("/:name/methods/optional", get(get_optional_methods))
        .route("/:name/stage", get(get_stage))
        .route("/:name/status", get(check_providers))
        .route("/:name/filters", get(get_filters))
        .route("/:name/stage-2", post(set_stage_2))
        .route("/:name/search-param", post(set_search_param))
        .route("/:name/optional-method", post(set_optional_method))
        .route("/:name/filter", post(set_filter_to_method))
        .route("/:name/stage-3", post(set_stage_3))
        .route("/:name/start", post(start_workflow))
        .route("/:name/reset", post(reset))
}

fn stage_response(workflow: String, stage: dossier_engine::Stage) -> Response {
    ApiResponse::success(StageResponse {
        workflow,
        stage,
    })
    .into_response()
}

/// GET /workflows
async fn list_workflows(State(state): State<FeatureState>) -> Response {
    let workflows = state.orchestrator.get_workflows().await;
    let count = workflows.len();
    ApiResponse::success_with_meta(workflows, json!({ "count": count })).into_response()
}

/// GET /workflows/:name/steps
async fn get_steps(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let data = state.orchestrator.get_steps(&name).await?;
    Ok(ApiResponse::success(data).into_response())
}

/// GET /workflows/:name/methods/minimum
async fn get_minimum_methods(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let data = state.orchestrator.get_minimum_methods(&name).await?;
    Ok(ApiResponse::success(data).into_response())
}

/// GET /workflows/:name/methods/optional
async fn get_optional_methods(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let data = state.orchestrator.get_optional_methods(&name).await?;
    Ok(ApiResponse::success(data).into_response())
}

/// GET /workflows/:name/stage
async fn get_stage(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let stage = state
        .orchestrator
        .stage_of(&name)
        .await
        .ok_or_else(|| DossierError::WorkflowNotFound(name.clone()))?;
    Ok(stage_response(name, stage))
}

/// GET /workflows/:name/status
///
/// Pings every provider of the workflow.
async fn check_providers(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    if !state.orchestrator.contains(&name) {
        return Err(DossierError::WorkflowNotFound(name).into());
    }
    let providers = state.orchestrator.check_providers(&name).await;
    Ok(ApiResponse::success(ProviderStatusResponse {
        workflow: name,
        providers,
    })
    .into_response())
}

/// GET /workflows/:name/filters
async fn get_filters(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let data = state.orchestrator.get_filters(&name).await?;
    Ok(ApiResponse::success(data).into_response())
}

/// POST /workflows/:name/stage-2
async fn set_stage_2(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    state.orchestrator.set_stage_2(&name).await?;
    Ok(stage_response(name, dossier_engine::Stage::Configuration))
}

/// POST /workflows/:name/search-param
async fn set_search_param(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
    payload: Result<Json<SearchParamRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    state
        .orchestrator
        .set_search_param(&name, &request.value)
        .await?;
    Ok(ApiResponse::success(json!({ "workflow": name, "search_param": request.value.trim() }))
        .into_response())
}

/// POST /workflows/:name/optional-method
async fn set_optional_method(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
    payload: Result<Json<OptionalMethodRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    state
        .orchestrator
        .set_optional_method(&name, &request.step, &request.method, request.options)
        .await?;
    Ok(ApiResponse::success(json!({
        "workflow": name,
        "step": request.step,
        "method": request.method,
    }))
    .into_response())
}

/// POST /workflows/:name/filter
async fn set_filter_to_method(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    state
        .orchestrator
        .set_filter_to_method(&name, &request.step, &request.method, request.options)
        .await?;
    Ok(ApiResponse::success(json!({
        "workflow": name,
        "step": request.step,
        "method": request.method,
    }))
    .into_response())
}

/// POST /workflows/:name/stage-3
async fn set_stage_3(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    state.orchestrator.set_stage_3(&name).await?;
    Ok(stage_response(name, dossier_engine::Stage::Execution))
}

/// POST /workflows/:name/start
///
/// Runs the workflow and returns its report; the workflow is back in stage_1.
async fn start_workflow(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let report = state.orchestrator.start_workflow(&name).await?;
    info!(
        workflow = %name,
        categories = report.categories.len(),
        warnings = report.warnings.len(),
        "Workflow run finished"
    );
    Ok(ApiResponse::success(report).into_response())
}

/// POST /workflows/:name/reset
async fn reset(State(state): State<FeatureState>, Path(name): Path<String>) -> ApiResult<Response> {
    state.orchestrator.reset(&name).await?;
    Ok(stage_response(name, dossier_engine::Stage::Discovery))
}
