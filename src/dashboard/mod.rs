// src/dashboard/mod.rs
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::{
    config::{FIRST_YEAR, LAST_YEAR},
    data::SalesTable,
    report::{report_from_inputs, Report, ReportError, ReportKind},
};

pub const SERVICE_NAME: &str = "autosales-dashboard";

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub table: Arc<SalesTable>,
    pub loaded_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(table: SalesTable) -> Self {
        Self {
            table: Arc::new(table),
            loaded_at: Utc::now(),
        }
    }
}

pub struct DashboardServer {
    state: Arc<AppState>,
    addr: String,
}

impl DashboardServer {
    pub fn new(state: Arc<AppState>, addr: impl Into<String>) -> Self {
        Self {
            state,
            addr: addr.into(),
        }
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let app = router(self.state);

        info!("Dashboard starting on http://{}", self.addr);
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_home))
        .route("/health", get(health_check))
        .route("/api/options", get(get_options))
        .route("/api/report", get(get_report))
        .route("/api/report/plotly", get(get_report_plotly))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption<T> {
    pub label: String,
    pub value: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DropdownOptions {
    pub statistics: Vec<SelectOption<String>>,
    pub years: Vec<SelectOption<i32>>,
}

/// Raw selector values; `year` stays a string so an empty selection is not a
/// deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub statistics: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub charts: Vec<Value>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            charts: Vec::new(),
        }),
    )
}

fn status_for(err: &ReportError) -> StatusCode {
    match err {
        ReportError::UnknownStatistics(_) => StatusCode::BAD_REQUEST,
        ReportError::StatisticsRequired | ReportError::YearRequired => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn parse_year(raw: Option<&str>) -> Result<Option<i32>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<i32>().map(Some).map_err(|_| {
            api_error(StatusCode::BAD_REQUEST, format!("invalid year {:?}", s))
        }),
    }
}

fn compute(state: &AppState, query: &ReportQuery) -> Result<Report, ApiError> {
    let year = parse_year(query.year.as_deref())?;
    report_from_inputs(&state.table, query.statistics.as_deref(), year).map_err(|e| {
        warn!(statistics = ?query.statistics, year = ?year, error = %e, "report rejected");
        api_error(status_for(&e), e)
    })
}

async fn dashboard_home() -> impl IntoResponse {
    Html(include_str!("../../templates/dashboard.html"))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "records": state.table.len(),
        "loaded_at": state.loaded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

async fn get_options() -> Json<DropdownOptions> {
    Json(dropdown_options())
}

pub fn dropdown_options() -> DropdownOptions {
    DropdownOptions {
        statistics: ReportKind::ALL
            .iter()
            .map(|k| SelectOption {
                label: k.label().to_string(),
                value: k.label().to_string(),
            })
            .collect(),
        years: (FIRST_YEAR..=LAST_YEAR)
            .map(|y| SelectOption {
                label: y.to_string(),
                value: y,
            })
            .collect(),
    }
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, ApiError> {
    compute(&state, &query).map(Json)
}

async fn get_report_plotly(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Value>, ApiError> {
    let report = compute(&state, &query)?;
    let rows: Vec<Vec<Value>> = report
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_plotly()).collect())
        .collect();

    Ok(Json(json!({
        "statistics": report.statistics,
        "year": report.year,
        "rows": rows,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SalesRecord;

    fn state() -> Arc<AppState> {
        let rec = |year: i32, vehicle: &str, sales: f64, recession: bool| SalesRecord {
            year,
            month: "Jan".to_string(),
            vehicle_type: vehicle.to_string(),
            automobile_sales: sales,
            advertising_expenditure: 100.0,
            unemployment_rate: 5.0,
            recession,
        };
        Arc::new(AppState::new(SalesTable::new(vec![
            rec(1980, "Car", 10.0, true),
            rec(1980, "Truck", 30.0, false),
            rec(1981, "Car", 20.0, false),
        ])))
    }

    fn query(statistics: Option<&str>, year: Option<&str>) -> Query<ReportQuery> {
        Query(ReportQuery {
            statistics: statistics.map(str::to_string),
            year: year.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        let Json(body) = health_check(State(state())).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["records"], 3);
    }

    #[test]
    fn test_dropdown_options() {
        let opts = dropdown_options();
        assert_eq!(opts.statistics.len(), 2);
        assert_eq!(opts.statistics[0].value, "Yearly Statistics");
        assert_eq!(opts.years.first().map(|o| o.value), Some(1980));
        assert_eq!(opts.years.last().map(|o| o.value), Some(2023));
        assert_eq!(opts.years.len(), 44);
    }

    #[tokio::test]
    async fn test_yearly_report() {
        let Json(report) = get_report(State(state()), query(Some("Yearly Statistics"), Some("1980")))
            .await
            .expect("report should build");
        assert_eq!(report.year, Some(1980));
        assert_eq!(report.charts().count(), 4);
        assert_eq!(report.rows[1][0].value_of("Truck"), Some(30.0));
    }

    #[tokio::test]
    async fn test_yearly_without_year_is_unprocessable() {
        let err = get_report(State(state()), query(Some("Yearly Statistics"), Some("")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.1.charts.is_empty());
        assert!(err.1.error.contains("year"));
    }

    #[tokio::test]
    async fn test_bad_inputs_are_bad_requests() {
        let err = get_report(State(state()), query(Some("Weekly"), None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = get_report(State(state()), query(Some("Yearly Statistics"), Some("19x0")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recession_plotly_report() {
        let Json(body) = get_report_plotly(
            State(state()),
            query(Some("Recession Period Statistics"), None),
        )
        .await
        .expect("report should build");
        assert_eq!(body["statistics"], "Recession Period Statistics");
        assert_eq!(body["rows"][0][0]["data"][0]["type"], "scatter");
        assert_eq!(body["rows"][1][0]["data"][0]["type"], "pie");
        assert_eq!(body["rows"][0][1]["data"][0]["y"], json!([10.0]));
    }

    #[tokio::test]
    async fn test_home_serves_page() {
        let resp = dashboard_home().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_page_drops_stale_responses_and_reports_failures() {
        let page = include_str!("../../templates/dashboard.html");
        assert!(page.contains("const seq = ++requestSeq;"));
        assert_eq!(page.matches("if (seq !== requestSeq) return;").count(), 2);
        assert!(page.contains("} catch (err) {"));
        assert!(page.contains("errorBox.textContent = 'Could not load report: ' + err.message;"));
    }

    async fn send(uri: &str) -> anyhow::Result<(StatusCode, Value)> {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        let resp = router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[tokio::test]
    async fn test_report_route_reads_query_string() -> anyhow::Result<()> {
        let (status, body) = send("/api/report?statistics=Yearly%20Statistics&year=1980").await?;
        assert_eq!(status, StatusCode::OK);
        let report: Report = serde_json::from_value(body)?;
        assert_eq!(report.year, Some(1980));
        assert_eq!(report.charts().count(), 4);

        let (status, body) = send("/api/report?statistics=Yearly+Statistics").await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["charts"], json!([]));

        let (status, _) = send("/api/report/plotly?statistics=Recession%20Period%20Statistics").await?;
        assert_eq!(status, StatusCode::OK);
        Ok(())
    }
}
