//! REST API handlers for the outreach server
//!
//! This module defines the API routes and handlers. Successful responses are
//! wrapped in [`ApiResponse`]; failures are rendered by [`Error`]'s
//! `IntoResponse` implementation.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        MatchedPath, Path, Query, Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::campaign::{CampaignView, NewCampaign};
use crate::customers::{NewCustomer, NewOrder};
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::{
    BatchId, Campaign, CampaignId, CommunicationBatch, CustomerId, CustomerView, DeliveryOutcome,
    Order,
};
use crate::storage::CustomerFilter;

use super::app::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Plain confirmation message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Audience creation request
#[derive(Debug, Deserialize)]
pub struct SaveAudienceRequest {
    #[serde(default)]
    pub customers: Option<Vec<String>>,
}

/// Delivery status callback
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub communication_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateStatusRequest {
    /// Batch, customer and outcome named by the callback
    fn parse(self) -> Result<(BatchId, CustomerId, DeliveryOutcome)> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let (Some(batch), Some(customer), Some(status)) = (
            present(self.communication_id),
            present(self.customer_id),
            present(self.status),
        ) else {
            return Err(Error::bad_request("Invalid request body"));
        };

        let outcome = status
            .parse::<DeliveryOutcome>()
            .map_err(|_| Error::bad_request(format!("Invalid status: {status}")))?;

        Ok((
            BatchId::new(batch.trim()),
            CustomerId::new(customer.trim()),
            outcome,
        ))
    }
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        Error::bad_request("Invalid request body")
    })
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and metrics
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        // Customers and orders
        .route("/customers", post(create_customer))
        .route("/orders", post(create_order))
        .route("/get-filtered-customers", get(get_filtered_customers))
        // Audience delivery
        .route("/save-audience", post(save_audience))
        .route("/update-status", post(update_status))
        // Campaigns
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route("/campaign/{id}", get(get_campaign))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// Record request count and latency per matched route
async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    metrics::record_api_request(
        &endpoint,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

/// Prometheus text exposition
async fn metrics_endpoint() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => Error::other(format!("Failed to encode metrics: {e}")).into_response(),
    }
}

// ============================================================================
// Customer Handlers
// ============================================================================

async fn create_customer(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewCustomer>, JsonRejection>,
) -> Result<Json<ApiResponse<CustomerView>>> {
    let customer = state.customers.create_customer(json_body(payload)?).await?;
    Ok(Json(ApiResponse::success(CustomerView::from(&customer))))
}

async fn create_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewOrder>, JsonRejection>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.customers.create_order(json_body(payload)?).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn get_filtered_customers(
    State(state): State<AppState>,
    filter: std::result::Result<Query<CustomerFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<CustomerView>>>> {
    let Query(filter) = filter.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected customer filter");
        Error::bad_request("Invalid filter")
    })?;

    let customers = state.customers.filter_customers(&filter).await?;
    Ok(Json(ApiResponse::success(
        customers.iter().map(CustomerView::from).collect(),
    )))
}

// ============================================================================
// Delivery Handlers
// ============================================================================

/// Save an audience and start delivering it
async fn save_audience(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaveAudienceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CommunicationBatch>>)> {
    let customers = json_body(payload)?.customers.unwrap_or_default();
    let batch = state.delivery.save_audience(&customers).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(batch))))
}

/// Apply a reported delivery outcome
async fn update_status(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>> {
    let (batch, customer, outcome) = json_body(payload)?.parse()?;

    state
        .delivery
        .tracker()
        .record_status(&batch, &customer, outcome)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Status updated successfully".to_string(),
    })))
}

// ============================================================================
// Campaign Handlers
// ============================================================================

async fn create_campaign(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewCampaign>, JsonRejection>,
) -> Result<Json<ApiResponse<Campaign>>> {
    let campaign = state.campaigns.create_campaign(json_body(payload)?).await?;
    Ok(Json(ApiResponse::success(campaign)))
}

async fn list_campaigns(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Campaign>>>> {
    let campaigns = state.campaigns.list_campaigns().await?;
    Ok(Json(ApiResponse::success(campaigns)))
}

async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CampaignView>>> {
    let view = state
        .campaigns
        .get_campaign_view(&CampaignId::new(id))
        .await?;
    Ok(Json(ApiResponse::success(view)))
}

// ============================================================================
// Tests
// ============================================================================
