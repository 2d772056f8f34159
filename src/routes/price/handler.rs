use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreatePriceRequest, PriceInfo};

#[axum::debug_handler]
pub async fn create_price(
    State(state): State<AppState>,
    Json(req): Json<CreatePriceRequest>,
) -> impl IntoResponse {
    match PriceInfo::create(&state.pool, req).await {
        Ok(price) => (StatusCode::CREATED, success_to_api_response(price)),
        Err(e) => {
            tracing::error!("Failed to create price record: {}", e);
            let (status, code) = if e.to_string().contains("Product not found") {
                (StatusCode::NOT_FOUND, error_codes::NOT_FOUND)
            } else if e.to_string().contains("Invalid createdAt") {
                (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR)
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            };
            (status, error_to_api_response(code, e.to_string()))
        }
    }
}
