use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tally_core::{
    DateRange, LedgerStore, NewTransaction, OwnerId, Page, Transaction, TransactionEdit,
    TransactionId, TransactionKind, TransactionQuery, TrendPeriod,
};
use tally_ingest::{CompletionBackend, IngestPipeline, ParsedTransaction};
use tally_reports::{category_breakdown, summarize, trends, CategoryTotal, Summary, TrendBucket};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::extract::{parse_date, parse_timestamp, Owner};
use crate::sessions::RecentInputs;

const BODY_LIMIT: usize = 10 * 1024 * 1024;
const DEFAULT_PAGE_SIZE: u32 = 10;

pub type Pipeline = IngestPipeline<Box<dyn CompletionBackend>, Arc<dyn LedgerStore>>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub recent: Arc<RecentInputs>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline: Arc::new(pipeline), recent: Arc::new(RecentInputs::default()) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/transactions/parse", post(parse_transaction))
        .route("/api/transactions", post(create_transaction).get(list_transactions))
        .route("/api/transactions/{id}", put(update_transaction).delete(delete_transaction))
        .route("/api/analytics/summary", get(summary))
        .route("/api/analytics/categories", get(categories))
        .route("/api/analytics/trends", get(trend_buckets))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// ── Transactions ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ParseRequest {
    #[serde(default)]
    text: String,
}

async fn parse_transaction(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ParsedTransaction>, ApiError> {
    let Json(request) = payload?;
    if state.recent.contains(&owner, &request.text) {
        return Err(ApiError::RecentInput);
    }
    Ok(Json(state.pipeline.parse(&request.text).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRequest {
    amount: Decimal,
    #[serde(rename = "type")]
    kind: TransactionKind,
    category: String,
    description: String,
    date: Option<String>,
    original_text: Option<String>,
}

impl TransactionRequest {
    fn occurred_at(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>, ApiError> {
        self.date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(parse_timestamp)
            .transpose()
    }
}

async fn create_transaction(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let Json(request) = payload?;
    let candidate = NewTransaction {
        occurred_at: request.occurred_at()?,
        amount: request.amount,
        kind: request.kind,
        category: request.category,
        description: request.description,
        original_text: request.original_text,
    };
    let raw = candidate.comparable_text().to_string();

    match state.pipeline.submit(&owner, candidate).await {
        Ok(tx) => {
            state.recent.remember(&owner, &raw);
            Ok((StatusCode::CREATED, Json(tx)))
        }
        Err(e) => {
            if e.duplicate_of().is_some() || e.is_exact_duplicate() {
                state.recent.remember(&owner, &raw);
            }
            Err(e.into())
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<u32>,
    limit: Option<u32>,
    category: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn list_transactions(
    State(state): State<AppState>,
    Owner(owner): Owner,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params?;
    let query = TransactionQuery {
        range: date_range(params.start_date.as_deref(), params.end_date.as_deref())?,
        category: params.category.filter(|c| !c.trim().is_empty()),
        kind: parse_kind(params.kind.as_deref())?,
        // No page number means every match.
        page: params
            .page
            .map(|number| Page::new(number, params.limit.unwrap_or(DEFAULT_PAGE_SIZE))),
    };

    let page = state.pipeline.list(&owner, &query).await?;
    Ok(Json(json!({
        "success": true,
        "total": page.total,
        "count": page.transactions.len(),
        "transactions": page.transactions,
    })))
}

async fn update_transaction(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<Transaction>, ApiError> {
    let id = TransactionId::from_str(&id)?;
    let Json(request) = payload?;
    let occurred_at = request
        .occurred_at()?
        .ok_or_else(|| ApiError::BadRequest("date is required".into()))?;
    let edit = TransactionEdit {
        amount: request.amount,
        kind: request.kind,
        category: request.category,
        description: request.description,
        original_text: request.original_text,
        occurred_at,
    };
    Ok(Json(state.pipeline.update(&owner, id, edit).await?))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = TransactionId::from_str(&id)?;
    state.pipeline.delete(&owner, id).await?;
    Ok(Json(json!({ "success": true, "message": "Transaction deleted successfully" })))
}

// ── Analytics ─────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnalyticsParams {
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    period: Option<String>,
}

impl AnalyticsParams {
    fn range(&self) -> Result<DateRange, ApiError> {
        date_range(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

async fn load(
    state: &AppState,
    owner: &OwnerId,
    range: DateRange,
) -> Result<Vec<Transaction>, ApiError> {
    let page = state.pipeline.list(owner, &TransactionQuery::in_range(range)).await?;
    Ok(page.transactions)
}

async fn summary(
    State(state): State<AppState>,
    Owner(owner): Owner,
    params: Result<Query<AnalyticsParams>, QueryRejection>,
) -> Result<Json<Summary>, ApiError> {
    let Query(params) = params?;
    let range = params.range()?;
    let ledger = load(&state, &owner, range).await?;
    Ok(Json(summarize(&ledger, range)))
}

async fn categories(
    State(state): State<AppState>,
    Owner(owner): Owner,
    params: Result<Query<AnalyticsParams>, QueryRejection>,
) -> Result<Json<Vec<CategoryTotal>>, ApiError> {
    let Query(params) = params?;
    let range = params.range()?;
    let kind = parse_kind(params.kind.as_deref())?.unwrap_or(TransactionKind::Expense);
    let ledger = load(&state, &owner, range).await?;
    Ok(Json(category_breakdown(&ledger, kind, range)))
}

async fn trend_buckets(
    State(state): State<AppState>,
    Owner(owner): Owner,
    params: Result<Query<AnalyticsParams>, QueryRejection>,
) -> Result<Json<Vec<TrendBucket>>, ApiError> {
    let Query(params) = params?;
    let range = params.range()?;
    let period = match params.period.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(raw) => TrendPeriod::from_str(raw).map_err(ApiError::BadRequest)?,
        None => TrendPeriod::default(),
    };
    let ledger = load(&state, &owner, range).await?;
    Ok(Json(trends(&ledger, period, range)))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, ApiError> {
    let parse = |raw: Option<&str>| {
        raw.filter(|s| !s.trim().is_empty()).map(parse_date).transpose()
    };
    Ok(DateRange::new(parse(start)?, parse(end)?))
}

fn parse_kind(raw: Option<&str>) -> Result<Option<TransactionKind>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| TransactionKind::from_str(s).map_err(ApiError::BadRequest))
        .transpose()
}
