// 🌐 Web Dashboard - REST API with Axum
// Serves the dashboard page and chart figures computed from the shared AppContext

use crate::aggregate::{BarMode, ControlState};
use crate::bindings::{apply_change, render_chart, ChartId, ChartUpdate, ControlChange};
use crate::charts::Figure;
use crate::context::{AppContext, DashboardOptions};
use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
struct AppState {
    ctx: Arc<AppContext>,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Control values from the query string; missing ones fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub year: Option<i32>,
    pub country: Option<String>,
    pub bar_mode: Option<BarMode>,
}

impl ChartQuery {
    fn resolve(self, defaults: ControlState) -> ControlState {
        ControlState {
            year: self.year.unwrap_or(defaults.year),
            country: self.country.unwrap_or(defaults.country),
            bar_mode: self.bar_mode.unwrap_or(defaults.bar_mode),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    /// Current control state held by the page (defaults when omitted)
    #[serde(default)]
    pub state: Option<ControlState>,
    pub change: ControlChange,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub state: ControlState,
    pub updates: Vec<ChartUpdate>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// 400 with the error envelope, for query strings and bodies that fail to parse
fn bad_request(message: String) -> Response {
    warn!("Rejected request: {}", message);
    (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(message))).into_response()
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/options - Dropdown/radio options and initial control values
async fn get_options(State(state): State<AppState>) -> Json<ApiResponse<DashboardOptions>> {
    Json(ApiResponse::ok(state.ctx.options()))
}

/// GET /api/charts - All four figures for the given control values
async fn get_charts(
    State(state): State<AppState>,
    query: Result<Query<ChartQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let controls = query.resolve(state.ctx.default_state());

    let figures: IndexMap<&'static str, Figure> = ChartId::ALL
        .iter()
        .map(|&chart| (chart.as_str(), render_chart(state.ctx.dataset(), &controls, chart)))
        .collect();

    Json(ApiResponse::ok(figures)).into_response()
}

/// GET /api/charts/:chart - One figure
async fn get_chart(
    State(state): State<AppState>,
    Path(chart): Path<String>,
    query: Result<Query<ChartQuery>, QueryRejection>,
) -> Response {
    let chart: ChartId = match chart.parse() {
        Ok(chart) => chart,
        Err(e) => {
            warn!("Rejected chart request: {}", e);
            return (StatusCode::NOT_FOUND, Json(ApiResponse::<Figure>::err(e))).into_response();
        }
    };

    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let controls = query.resolve(state.ctx.default_state());
    let figure = render_chart(state.ctx.dataset(), &controls, chart);

    (StatusCode::OK, Json(ApiResponse::ok(figure))).into_response()
}

/// POST /api/dispatch - Apply one control change, return only the dependent charts
async fn post_dispatch(
    State(state): State<AppState>,
    request: Result<Json<DispatchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let mut controls = request.state.unwrap_or_else(|| state.ctx.default_state());
    let updates = apply_change(state.ctx.dataset(), &mut controls, request.change);

    Json(ApiResponse::ok(DispatchResponse {
        state: controls,
        updates,
    }))
    .into_response()
}

/// GET / - Serve the dashboard page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(ctx: Arc<AppContext>) -> Router {
    let state = AppState { ctx };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/options", get(get_options))
        .route("/charts", get(get_charts))
        .route("/charts/:chart", get(get_chart))
        .route("/dispatch", post(post_dispatch))
        .with_state(state);

    // Build main router
    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind to the configured address and serve until the process is stopped
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let addr = ctx.config.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, records = ctx.dataset().len(), "Dashboard server listening");

    axum::serve(listener, router(ctx))
        .await
        .context("Server stopped with an error")
}

// ============================================================================
// TESTS
// ============================================================================
