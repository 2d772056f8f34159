use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreateProductRequest, Product};

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    pub slug: String,
}

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> impl IntoResponse {
    match Product::create(&state.pool, req).await {
        Ok(product) => (StatusCode::CREATED, success_to_api_response(product)),
        Err(e) => {
            if e.to_string().contains("unique constraint") {
                (
                    StatusCode::OK,
                    error_to_api_response(
                        error_codes::VALIDATION_ERROR,
                        "商品slug已存在".to_string(),
                    ),
                )
            } else {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
                )
            }
        }
    }
}

#[axum::debug_handler]
pub async fn find_by_slug(
    State(state): State<AppState>,
    Query(query): Query<SlugQuery>,
) -> impl IntoResponse {
    match Product::find_by_slug(&state.pool, &query.slug).await {
        Ok(Some(product)) => (StatusCode::OK, success_to_api_response(product)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "商品不存在".to_string()),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}
