//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use misinfo_core::{
    AnalysisMode, AnalysisRequest, BatchItem, ClassificationLabel, HistoryFilter, HistoryQuery,
    TimeWindow,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::dto::*;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze_handler,
        batch_handler,
        history_handler,
        get_analysis_handler,
        dashboard_handler,
        health_handler,
    ),
    components(
        schemas(
            AnalyzeRequest, AnalyzeResponse, AnalysisView, PredictionView, FeaturesView,
            LinguisticFeaturesView, VerificationView, FactCheckView,
            BatchRequest, BatchItemRequest, BatchResponse, BatchItemView, BatchErrorView,
            BatchSummaryView, HistoryResponse, PaginationView,
            DashboardResponse, SummaryView, TrendView, BreakdownView, SourceView,
            HealthResponse, ErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (
            name = "Misinformation Detection API",
            description = "Content analysis, history, and analytics endpoints."
        )
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: DateTime<Utc>,
}

//=========================================================================================
// Input Parsing
//=========================================================================================

fn parse_mode(raw: Option<&str>) -> Result<AnalysisMode, HttpError> {
    match raw.map(str::trim) {
        None | Some("") | Some("quick") => Ok(AnalysisMode::Quick),
        Some("deep") => Ok(AnalysisMode::Deep),
        Some(other) => Err(HttpError::bad_request(format!(
            "analysisType must be 'quick' or 'deep', got '{}'",
            other
        ))),
    }
}

fn parse_label(raw: &str) -> Result<ClassificationLabel, HttpError> {
    ClassificationLabel::parse(raw)
        .ok_or_else(|| HttpError::bad_request(format!("unknown classification '{}'", raw)))
}

fn parse_window(raw: Option<&str>) -> Result<TimeWindow, HttpError> {
    match raw {
        None => Ok(TimeWindow::default()),
        Some(raw) => TimeWindow::parse(raw).ok_or_else(|| {
            HttpError::bad_request(format!("timeRange must be 24h, 7d, 30d or 90d, got '{}'", raw))
        }),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Analyse a single piece of content.
///
/// Identical content analysed within the freshness window is answered from the
/// fingerprint cache with `fromCache: true`.
#[utoipa::path(
    post,
    path = "/api/detection/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis completed", body = AnalyzeResponse),
        (status = 400, description = "Invalid content, URL or analysis type", body = ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = ErrorBody),
        (status = 502, description = "The classifier failed", body = ErrorBody),
        (status = 503, description = "The result could not be stored", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Extension(owner_id): Extension<Uuid>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, HttpError> {
    let Json(body) = payload.map_err(|e| HttpError::bad_request(e.body_text()))?;
    let mode = parse_mode(body.analysis_type.as_deref())?;

    let outcome = state
        .engine
        .analyze(AnalysisRequest {
            owner_id,
            content: body.content,
            source_url: body.source_url,
            mode,
        })
        .await?;

    info!(
        owner = %owner_id,
        fingerprint = %outcome.record.fingerprint,
        from_cache = outcome.from_cache,
        "analysis served"
    );
    Ok(Json(AnalyzeResponse {
        analysis: (&outcome.record).into(),
        from_cache: outcome.from_cache,
    }))
}

/// Analyse up to 50 items in quick mode.
///
/// A failing item is reported in its own result entry and never aborts the others.
#[utoipa::path(
    post,
    path = "/api/detection/batch",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "Per-item results in request order", body = BatchResponse),
        (status = 400, description = "Empty batch or more than 50 items", body = ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Extension(owner_id): Extension<Uuid>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, HttpError> {
    let Json(body) = payload.map_err(|e| HttpError::bad_request(e.body_text()))?;
    let items = body
        .contents
        .into_iter()
        .map(|item| BatchItem {
            item_id: item.id,
            content: item.content,
            source_url: item.source,
        })
        .collect();

    let report = state.batch.run_batch(items, owner_id).await?;
    Ok(Json(report.into()))
}

/// List the caller's analyses, newest first.
#[utoipa::path(
    get,
    path = "/api/detection/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "One page of analyses", body = HistoryResponse),
        (status = 400, description = "Invalid filter or paging values", body = ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(owner_id): Extension<Uuid>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, HttpError> {
    let Query(params) = params.map_err(|e| HttpError::bad_request(e.body_text()))?;
    let defaults = HistoryQuery::default();
    let query = HistoryQuery {
        filter: HistoryFilter {
            classification: params.classification.as_deref().map(parse_label).transpose()?,
            start: params.start_date,
            end: params.end_date,
        },
        page: params.page.unwrap_or(defaults.page),
        limit: params.limit.unwrap_or(defaults.limit),
    };

    let page = state.history.page(owner_id, query).await?;
    Ok(Json(page.into()))
}

/// Fetch one of the caller's analyses by id.
#[utoipa::path(
    get,
    path = "/api/detection/{id}",
    params(("id" = Uuid, Path, description = "Analysis id")),
    responses(
        (status = 200, description = "The analysis", body = AnalysisView),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = ErrorBody),
        (status = 404, description = "No such analysis for this caller", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn get_analysis_handler(
    State(state): State<Arc<AppState>>,
    Extension(owner_id): Extension<Uuid>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AnalysisView>, HttpError> {
    let Path(id) = id.map_err(|e| HttpError::bad_request(e.body_text()))?;
    let record = state.history.get(owner_id, id).await?;
    Ok(Json((&record).into()))
}

/// Aggregate statistics over the caller's analyses in a trailing window.
#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    params(DashboardParams),
    responses(
        (
            status = 200,
            description = "Summary, daily trend, breakdown and top sources",
            body = DashboardResponse
        ),
        (status = 400, description = "Unknown time range", body = ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(owner_id): Extension<Uuid>,
    params: Result<Query<DashboardParams>, QueryRejection>,
) -> Result<Json<DashboardResponse>, HttpError> {
    let Query(params) = params.map_err(|e| HttpError::bad_request(e.body_text()))?;
    let window = parse_window(params.time_range.as_deref())?;
    let report = state.analytics.summarize(owner_id, window).await?;
    Ok(Json(report.into()))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_state;
    use axum::http::StatusCode;

    async fn analyze(
        state: &Arc<AppState>,
        owner: Uuid,
        content: &str,
        analysis_type: Option<&str>,
    ) -> Result<Json<AnalyzeResponse>, HttpError> {
        analyze_handler(
            State(state.clone()),
            Extension(owner),
            Ok(Json(AnalyzeRequest {
                content: content.to_string(),
                source_url: None,
                analysis_type: analysis_type.map(str::to_string),
            })),
        )
        .await
    }

    #[tokio::test]
    async fn repeated_content_is_served_from_cache() {
        let (state, _) = test_state();
        let owner = Uuid::new_v4();
        let text = "SHOCKING: This one weird trick doctors don't want you to know!";

        let Json(first) = analyze(&state, owner, text, None).await.unwrap();
        let Json(second) = analyze(&state, owner, text, None).await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_ne!(first.analysis.id, second.analysis.id);
        assert_eq!(
            first.analysis.prediction.as_ref().unwrap().classification,
            "misinformation"
        );
    }

    #[tokio::test]
    async fn cache_hit_for_another_caller_is_their_own_record() {
        let (state, _) = test_state();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let text = "The council approved the new budget for next year.";

        let Json(first) = analyze(&state, alice, text, None).await.unwrap();
        let Json(reused) = analyze(&state, bob, text, None).await.unwrap();
        assert!(reused.from_cache);
        assert_ne!(reused.analysis.id, first.analysis.id);

        let Json(fetched) = get_analysis_handler(
            State(state.clone()),
            Extension(bob),
            Ok(Path(reused.analysis.id)),
        )
        .await
        .unwrap();
        assert_eq!(fetched.id, reused.analysis.id);

        let Json(page) = history_handler(
            State(state.clone()),
            Extension(bob),
            Ok(Query(HistoryParams::default())),
        )
        .await
        .unwrap();
        assert_eq!(page.pagination.total, 1);
    }

    #[tokio::test]
    async fn deep_analysis_carries_linguistic_features() {
        let (state, _) = test_state();
        let Json(resp) = analyze(
            &state,
            Uuid::new_v4(),
            "University researchers publish peer-reviewed study on renewable energy",
            Some("deep"),
        )
        .await
        .unwrap();
        assert_eq!(resp.analysis.analysis_type, "deep");
        assert!(resp.analysis.features.unwrap().linguistic_features.is_some());
    }

    #[tokio::test]
    async fn bad_input_is_a_bad_request() {
        let (state, _) = test_state();
        let owner = Uuid::new_v4();

        let short = analyze(&state, owner, "too short", None).await.unwrap_err();
        assert_eq!(short.status, StatusCode::BAD_REQUEST);

        let mode = analyze(&state, owner, "A perfectly reasonable sentence.", Some("forensic"))
            .await
            .unwrap_err();
        assert_eq!(mode.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_is_owner_scoped_and_single_fetch_is_not_found_for_others() {
        let (state, _) = test_state();
        let owner = Uuid::new_v4();
        let text = "Stock market update: Tech companies show strong growth";
        let Json(created) = analyze(&state, owner, text, None).await.unwrap();

        let Json(page) = history_handler(
            State(state.clone()),
            Extension(owner),
            Ok(Query(HistoryParams::default())),
        )
        .await
        .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.pages, 1);

        let Json(empty) = history_handler(
            State(state.clone()),
            Extension(Uuid::new_v4()),
            Ok(Query(HistoryParams::default())),
        )
        .await
        .unwrap();
        assert_eq!(empty.pagination.total, 0);

        let err = get_analysis_handler(
            State(state.clone()),
            Extension(Uuid::new_v4()),
            Ok(Path(created.analysis.id)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn batch_over_the_limit_is_rejected() {
        let (state, _) = test_state();
        let contents = (0..51)
            .map(|i| BatchItemRequest {
                id: format!("item-{i}"),
                content: format!("Headline number {i} about the weather."),
                source: None,
            })
            .collect();
        let err = batch_handler(
            State(state),
            Extension(Uuid::new_v4()),
            Ok(Json(BatchRequest { contents })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_rejects_unknown_ranges_and_defaults_to_thirty_days() {
        let (state, _) = test_state();
        let owner = Uuid::new_v4();

        let Json(report) = dashboard_handler(
            State(state.clone()),
            Extension(owner),
            Ok(Query(DashboardParams::default())),
        )
        .await
        .unwrap();
        assert_eq!(report.time_range, "30d");
        assert_eq!(report.summary.total_analyses, 0);

        let err = dashboard_handler(
            State(state),
            Extension(owner),
            Ok(Query(DashboardParams {
                time_range: Some("1y".to_string()),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
