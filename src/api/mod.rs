use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    ChartPoint, DEFAULT_PROJECTION_YEARS, FinancialParam, FinancialParams, IncomePreview,
    SAFE_WITHDRAWAL_RATE_PERCENT, ScenarioRow, calculate_scenario, current_year,
    depletion_year, format_currency, income_preview, prepare_chart_data,
    update_financial_param,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Longest horizon accepted from callers; the engine itself has no limit.
pub const MAX_PROJECTION_YEARS: u32 = 100;

/// Calendar years a projection may start in.
pub const START_YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field} must be a finite number")]
    NonFiniteParam { field: &'static str },
    #[error("years must be <= {max}, got {years}")]
    HorizonTooLong { years: u32, max: u32 },
    #[error("startYear must be between {min} and {max}, got {start_year}")]
    StartYearOutOfRange { start_year: i32, min: i32, max: i32 },
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to serialize projection: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NonFiniteParam { .. }
            | ApiError::HorizonTooLong { .. }
            | ApiError::StartYearOutOfRange { .. }
            | ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Io(_) | ApiError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            log::warn!("rejected request: {self}");
        } else {
            log::error!("request failed: {self}");
        }
        error_response(status, &self.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fire-projection",
    about = "Year-by-year retirement balance projection (401(k) + Social Security)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the calculator page and JSON API
    Serve(ServerConfig),
    /// Print the projection table to stdout
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ServerConfig {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    #[arg(long, default_value_t = 100_000.0, help = "Current 401(k) or retirement savings balance")]
    initial_balance: f64,
    #[arg(
        long,
        default_value_t = 3_000.0,
        help = "Total monthly income needed in retirement (year one)"
    )]
    desired_monthly_income: f64,
    #[arg(
        long,
        default_value_t = 3_627.0,
        help = "Expected monthly Social Security benefit (year one)"
    )]
    social_security: f64,
    #[arg(long, default_value_t = 2.4, help = "Rate of inflation in percent")]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 2.3,
        help = "Social Security cost-of-living adjustment in percent"
    )]
    cola_adjustment: f64,
    #[arg(long, default_value_t = 8.0, help = "Expected investment return in percent")]
    investment_return: f64,
    #[arg(long, default_value_t = DEFAULT_PROJECTION_YEARS)]
    years: u32,
    #[arg(long, help = "First projected calendar year, defaults to the current year")]
    start_year: Option<i32>,
    #[arg(long, help = "Print the full API response as JSON instead of a table")]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenarioPayload {
    #[serde(alias = "inflation")]
    inflation_rate_percent: Option<f64>,
    initial_balance: Option<f64>,
    desired_monthly_income: Option<f64>,
    social_security: Option<f64>,
    #[serde(alias = "cola")]
    cola_adjustment: Option<f64>,
    investment_return: Option<f64>,
    years: Option<u32>,
    start_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParamPayload {
    #[serde(default)]
    params: Option<FinancialParams>,
    param: String,
    value: f64,
}

#[derive(Debug)]
struct ScenarioRequest {
    params: FinancialParams,
    start_year: i32,
    years: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResponse {
    start_year: i32,
    years: u32,
    safe_withdrawal_rate: f64,
    params: FinancialParams,
    depletion_year: Option<i32>,
    rows: Vec<ScenarioRow>,
    chart: Vec<ChartPoint>,
    preview: Vec<IncomePreview>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), ApiError> {
    match cli.command {
        Command::Serve(config) => run_http_server(config).await,
        Command::Project(args) => {
            let emit_json = args.json;
            let request = scenario_request_from_args(args)?;
            let response = build_scenario_response(&request);
            if emit_json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", render_table(&response.rows));
            }
            Ok(())
        }
    }
}

pub async fn run_http_server(config: ServerConfig) -> Result<(), ApiError> {
    let addr = SocketAddr::new(config.bind, config.port);
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    log::info!("retirement projection API listening on http://{addr}");
    log::info!("local access: http://127.0.0.1:{}/", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/scenario",
            get(scenario_get_handler).post(scenario_post_handler),
        )
        .route("/api/params", post(update_param_handler))
        .fallback(not_found_handler)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn scenario_get_handler(
    payload: Result<Query<ScenarioPayload>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(payload) = payload.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;
    scenario_handler_impl(payload)
}

async fn scenario_post_handler(
    payload: Result<Json<ScenarioPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;
    scenario_handler_impl(payload)
}

fn scenario_handler_impl(payload: ScenarioPayload) -> Result<Response, ApiError> {
    let request = scenario_request_from_payload(payload, current_year())?;
    log::debug!(
        "projecting {} years from {} for {:?}",
        request.years,
        request.start_year,
        request.params
    );
    Ok(json_response(
        StatusCode::OK,
        build_scenario_response(&request),
    ))
}

async fn update_param_handler(
    payload: Result<Json<UpdateParamPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;
    let updated = apply_param_update(payload)?;
    Ok(json_response(StatusCode::OK, updated))
}

fn apply_param_update(payload: UpdateParamPayload) -> Result<FinancialParams, ApiError> {
    let param = payload
        .param
        .parse::<FinancialParam>()
        .map_err(ApiError::InvalidPayload)?;
    let updated = update_financial_param(
        &payload.params.unwrap_or_default(),
        param,
        payload.value,
    );
    validate_params(&updated)?;
    Ok(updated)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn validate_params(params: &FinancialParams) -> Result<(), ApiError> {
    for param in FinancialParam::ALL {
        if !param.get(params).is_finite() {
            return Err(ApiError::NonFiniteParam {
                field: param.name(),
            });
        }
    }
    Ok(())
}

fn validate_horizon(years: u32) -> Result<(), ApiError> {
    if years > MAX_PROJECTION_YEARS {
        return Err(ApiError::HorizonTooLong {
            years,
            max: MAX_PROJECTION_YEARS,
        });
    }
    Ok(())
}

fn validate_start_year(start_year: i32) -> Result<(), ApiError> {
    if !START_YEAR_RANGE.contains(&start_year) {
        return Err(ApiError::StartYearOutOfRange {
            start_year,
            min: *START_YEAR_RANGE.start(),
            max: *START_YEAR_RANGE.end(),
        });
    }
    Ok(())
}

#[cfg(test)]
fn scenario_request_from_json(json: &str, this_year: i32) -> Result<ScenarioRequest, ApiError> {
    let payload = serde_json::from_str::<ScenarioPayload>(json)
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
    scenario_request_from_payload(payload, this_year)
}

fn scenario_request_from_payload(
    payload: ScenarioPayload,
    this_year: i32,
) -> Result<ScenarioRequest, ApiError> {
    let mut params = FinancialParams::default();

    for (param, value) in [
        (FinancialParam::InflationRatePercent, payload.inflation_rate_percent),
        (FinancialParam::InitialBalance, payload.initial_balance),
        (FinancialParam::DesiredMonthlyIncome, payload.desired_monthly_income),
        (FinancialParam::SocialSecurity, payload.social_security),
        (FinancialParam::ColaAdjustment, payload.cola_adjustment),
        (FinancialParam::InvestmentReturn, payload.investment_return),
    ] {
        if let Some(v) = value {
            params = update_financial_param(&params, param, v);
        }
    }

    let years = payload.years.unwrap_or(DEFAULT_PROJECTION_YEARS);
    let start_year = payload.start_year.unwrap_or(this_year);
    validate_params(&params)?;
    validate_horizon(years)?;
    validate_start_year(start_year)?;

    Ok(ScenarioRequest {
        params,
        start_year,
        years,
    })
}

fn scenario_request_from_args(args: ProjectArgs) -> Result<ScenarioRequest, ApiError> {
    let params = FinancialParams {
        inflation_rate_percent: args.inflation_rate,
        initial_balance: args.initial_balance,
        desired_monthly_income: args.desired_monthly_income,
        social_security: args.social_security,
        cola_adjustment: args.cola_adjustment,
        investment_return: args.investment_return,
    };
    let start_year = args.start_year.unwrap_or_else(current_year);
    validate_params(&params)?;
    validate_horizon(args.years)?;
    validate_start_year(start_year)?;

    Ok(ScenarioRequest {
        params,
        start_year,
        years: args.years,
    })
}

fn build_scenario_response(request: &ScenarioRequest) -> ScenarioResponse {
    let rows = calculate_scenario(&request.params, request.start_year, request.years);
    let chart = prepare_chart_data(&rows, request.start_year, request.years);
    let preview = income_preview(&rows, request.start_year);

    ScenarioResponse {
        start_year: request.start_year,
        years: request.years,
        safe_withdrawal_rate: SAFE_WITHDRAWAL_RATE_PERCENT,
        params: request.params,
        depletion_year: depletion_year(&rows),
        rows,
        chart,
        preview,
    }
}

/// Monthly figures per year; rates above the 4% rule are marked with `!`.
fn render_table(rows: &[ScenarioRow]) -> String {
    let mut out = format!(
        "{:>6} {:>16} {:>14} {:>12} {:>16} {:>10}\n",
        "Year", "Social Security", "401(k) Draw", "Total", "Balance", "Rate"
    );
    for row in rows {
        let flag = if row.exceeds_safe_withdrawal_rate() { "!" } else { "" };
        out.push_str(&format!(
            "{:>6} {:>16} {:>14} {:>12} {:>16} {:>10}\n",
            row.year,
            format_currency(row.ss_monthly),
            format_currency(row.required_from_401k_monthly),
            format_currency(row.total_monthly_income),
            format_currency(row.ending_balance),
            format!("{}%{flag}", row.withdrawal_rate),
        ));
    }
    out
}
