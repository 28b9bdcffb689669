use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    CashGiftSimulationResult, ComparisonRow, DetailedTaxCalculationResult, GiftRecipient,
    HouseholdComposition, InsuranceContract, InsuranceSimulationResult, MAX_AMOUNT,
    MAX_GIFT_YEARS, QUICK_TABLE_MAX_ROWS, SpouseMode, TableRange, TaxCalculationResult, calculate_cash_gift_simulation,
    calculate_comparison_table, calculate_detailed_inheritance_tax, calculate_insurance_simulation,
    calculate_quick_table, find_optimal_row, is_highlight_row, optimize_gift_amounts,
};

pub mod cli;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API JSON payload: {0}")]
    InvalidPayload(String),
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejected request");
        error_response(StatusCode::BAD_REQUEST, &self.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TablePayload {
    pub composition: HouseholdComposition,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub step: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatePayload {
    pub estate_value: i64,
    #[serde(default)]
    pub composition: HouseholdComposition,
    #[serde(default)]
    pub spouse_mode: SpouseMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsurancePayload {
    pub estate_value: i64,
    #[serde(default)]
    pub composition: HouseholdComposition,
    #[serde(default)]
    pub existing_contracts: Vec<InsuranceContract>,
    #[serde(default)]
    pub new_contracts: Vec<InsuranceContract>,
    #[serde(default)]
    pub spouse_mode: SpouseMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftPayload {
    pub estate_value: i64,
    #[serde(default)]
    pub composition: HouseholdComposition,
    #[serde(default)]
    pub recipients: Vec<GiftRecipient>,
    #[serde(default)]
    pub spouse_mode: SpouseMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPayload {
    pub estate_value: i64,
    #[serde(default)]
    pub spouse_own_estate: i64,
    #[serde(default)]
    pub composition: HouseholdComposition,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowResponse {
    #[serde(flatten)]
    pub result: TaxCalculationResult,
    pub highlight: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    pub min_value: i64,
    pub max_value: i64,
    pub step: i64,
    pub rows: Vec<TableRowResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftOptimizeResponse {
    pub recipients: Vec<GiftRecipient>,
    pub simulation: CashGiftSimulationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResponse {
    pub optimal_ratio: Option<i64>,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "inheritance tax HTTP API listening");
    axum::serve(listener, router()).await
}

pub fn router() -> Router {
    Router::new()
        .route("/api/table", post(table_handler))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/insurance", post(insurance_handler))
        .route("/api/gift", post(gift_handler))
        .route("/api/gift/optimize", post(gift_optimize_handler))
        .route("/api/comparison", post(comparison_handler))
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn table_handler(payload: Result<Json<TablePayload>, JsonRejection>) -> Response {
    respond(parse(payload).and_then(build_table_response))
}

async fn calculate_handler(payload: Result<Json<CalculatePayload>, JsonRejection>) -> Response {
    respond(parse(payload).and_then(build_calculate_response))
}

async fn insurance_handler(payload: Result<Json<InsurancePayload>, JsonRejection>) -> Response {
    respond(parse(payload).and_then(build_insurance_response))
}

async fn gift_handler(payload: Result<Json<GiftPayload>, JsonRejection>) -> Response {
    respond(parse(payload).and_then(build_gift_response))
}

async fn gift_optimize_handler(payload: Result<Json<GiftPayload>, JsonRejection>) -> Response {
    respond(parse(payload).and_then(build_gift_optimize_response))
}

async fn comparison_handler(payload: Result<Json<ComparisonPayload>, JsonRejection>) -> Response {
    respond(parse(payload).and_then(build_comparison_response))
}

fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::InvalidPayload(rejection.body_text()))
}

fn respond<T: Serialize>(result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn validate_amount(field: &str, value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::validation(format!("{field} must be >= 0")));
    }
    if value > MAX_AMOUNT {
        return Err(ApiError::validation(format!(
            "{field} must be <= {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

fn validate_estate(estate_value: i64) -> Result<(), ApiError> {
    validate_amount("estateValue", estate_value)
}

fn validate_spouse_mode(mode: SpouseMode) -> Result<(), ApiError> {
    if let SpouseMode::Custom { value } = mode {
        validate_amount("custom spouse value", value)?;
    }
    Ok(())
}

fn validate_contracts(contracts: &[InsuranceContract]) -> Result<(), ApiError> {
    for contract in contracts {
        validate_amount(&format!("contract {} benefit", contract.id), contract.benefit)?;
        validate_amount(&format!("contract {} premium", contract.id), contract.premium)?;
    }
    Ok(())
}

fn validate_recipients(recipients: &[GiftRecipient]) -> Result<(), ApiError> {
    for recipient in recipients {
        validate_amount(
            &format!("recipient {} annualAmount", recipient.id),
            recipient.annual_amount,
        )?;
        if !(0..=MAX_GIFT_YEARS).contains(&recipient.years) {
            return Err(ApiError::validation(format!(
                "recipient {} years must be between 0 and {MAX_GIFT_YEARS}",
                recipient.id
            )));
        }
    }
    Ok(())
}

pub fn table_range_from_payload(payload: &TablePayload) -> Result<TableRange, ApiError> {
    let defaults = TableRange::default();
    let range = TableRange {
        min: payload.min_value.unwrap_or(defaults.min),
        max: payload.max_value.unwrap_or(defaults.max),
        step: payload.step.unwrap_or(defaults.step),
    };
    validate_amount("minValue", range.min)?;
    validate_amount("maxValue", range.max)?;
    if range.step <= 0 {
        return Err(ApiError::validation("step must be > 0"));
    }
    if range.min > range.max {
        return Err(ApiError::validation("minValue must be <= maxValue"));
    }
    // both bounds are within MAX_AMOUNT, so the span cannot overflow
    let rows = (range.max - range.min) / range.step + 1;
    if rows > QUICK_TABLE_MAX_ROWS {
        return Err(ApiError::validation(format!(
            "table would have {rows} rows; at most {QUICK_TABLE_MAX_ROWS} allowed"
        )));
    }
    Ok(range)
}

pub fn build_table_response(payload: TablePayload) -> Result<TableResponse, ApiError> {
    let range = table_range_from_payload(&payload)?;
    debug!(
        min = range.min,
        max = range.max,
        step = range.step,
        "quick table request"
    );
    let rows = calculate_quick_table(range, &payload.composition)
        .into_iter()
        .map(|result| TableRowResponse {
            highlight: is_highlight_row(result.estate_value),
            result,
        })
        .collect();
    Ok(TableResponse {
        min_value: range.min,
        max_value: range.max,
        step: range.step,
        rows,
    })
}

pub fn build_calculate_response(
    payload: CalculatePayload,
) -> Result<DetailedTaxCalculationResult, ApiError> {
    validate_estate(payload.estate_value)?;
    validate_spouse_mode(payload.spouse_mode)?;
    debug!(
        estate = payload.estate_value,
        spouse_mode = %payload.spouse_mode,
        "detailed calculation request"
    );
    Ok(calculate_detailed_inheritance_tax(
        payload.estate_value,
        &payload.composition,
        payload.spouse_mode,
    ))
}

pub fn build_insurance_response(
    payload: InsurancePayload,
) -> Result<InsuranceSimulationResult, ApiError> {
    validate_estate(payload.estate_value)?;
    validate_spouse_mode(payload.spouse_mode)?;
    validate_contracts(&payload.existing_contracts)?;
    validate_contracts(&payload.new_contracts)?;
    debug!(
        estate = payload.estate_value,
        existing = payload.existing_contracts.len(),
        new = payload.new_contracts.len(),
        "insurance simulation request"
    );
    Ok(calculate_insurance_simulation(
        payload.estate_value,
        &payload.composition,
        &payload.existing_contracts,
        &payload.new_contracts,
        payload.spouse_mode,
    ))
}

pub fn build_gift_response(payload: GiftPayload) -> Result<CashGiftSimulationResult, ApiError> {
    validate_estate(payload.estate_value)?;
    validate_spouse_mode(payload.spouse_mode)?;
    validate_recipients(&payload.recipients)?;
    debug!(
        estate = payload.estate_value,
        recipients = payload.recipients.len(),
        "gift simulation request"
    );
    Ok(calculate_cash_gift_simulation(
        payload.estate_value,
        &payload.composition,
        &payload.recipients,
        payload.spouse_mode,
    ))
}

pub fn build_gift_optimize_response(payload: GiftPayload) -> Result<GiftOptimizeResponse, ApiError> {
    validate_estate(payload.estate_value)?;
    validate_spouse_mode(payload.spouse_mode)?;
    validate_recipients(&payload.recipients)?;
    debug!(
        estate = payload.estate_value,
        recipients = payload.recipients.len(),
        "gift optimization request"
    );
    let recipients = optimize_gift_amounts(
        payload.estate_value,
        &payload.composition,
        &payload.recipients,
        payload.spouse_mode,
    );
    let simulation = calculate_cash_gift_simulation(
        payload.estate_value,
        &payload.composition,
        &recipients,
        payload.spouse_mode,
    );
    Ok(GiftOptimizeResponse {
        recipients,
        simulation,
    })
}

pub fn build_comparison_response(payload: ComparisonPayload) -> Result<ComparisonResponse, ApiError> {
    validate_estate(payload.estate_value)?;
    validate_amount("spouseOwnEstate", payload.spouse_own_estate)?;
    debug!(
        estate = payload.estate_value,
        spouse_own = payload.spouse_own_estate,
        "comparison request"
    );
    let rows = calculate_comparison_table(
        payload.estate_value,
        payload.spouse_own_estate,
        &payload.composition,
    );
    Ok(ComparisonResponse {
        optimal_ratio: find_optimal_row(&rows).map(|row| row.ratio),
        rows,
    })
}
