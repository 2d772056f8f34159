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

use super::aggregate::Sort;
use super::model::{Category, CreateCategoryRequest, UpdateProductsRequest};

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub slug: String,
    pub page: Option<u32>,
    pub sort: Option<Sort>,
    pub store: Option<String>,
    pub city: Option<String>,
}

#[axum::debug_handler]
pub async fn find_by_slug(
    State(state): State<AppState>,
    Query(query): Query<SlugQuery>,
) -> impl IntoResponse {
    match Category::find_by_slug(&state.pool, &state.redis, &query.slug).await {
        Ok(Some(category)) => (StatusCode::OK, success_to_api_response(category)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "分类不存在".to_string()),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    match Category::list_non_empty(&state.pool).await {
        Ok(categories) => (StatusCode::OK, success_to_api_response(categories)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

/// 给采集方用的 id+slug 清单
#[axum::debug_handler]
pub async fn list_slugs(State(state): State<AppState>) -> impl IntoResponse {
    match Category::ids_and_slugs(&state.pool).await {
        Ok(slugs) => (StatusCode::OK, success_to_api_response(slugs)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    match Category::create(&state.pool, req).await {
        Ok(category) => (StatusCode::CREATED, success_to_api_response(category)),
        Err(e) => {
            if e.to_string().contains("unique constraint") {
                (
                    StatusCode::OK,
                    error_to_api_response(
                        error_codes::VALIDATION_ERROR,
                        "分类slug已存在".to_string(),
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
pub async fn update_products(
    State(state): State<AppState>,
    Json(req): Json<UpdateProductsRequest>,
) -> impl IntoResponse {
    match Category::update_products(&state.pool, req.updates).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({
                "success": true
            })),
        ),
        Err(e) => {
            tracing::error!("Failed to update category products: {}", e);
            let status = if e.to_string().contains("foreign key") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn get_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1);
    let sort = query.sort.unwrap_or_default();

    match Category::get_products(
        &state.pool,
        &state.redis,
        &query.slug,
        page,
        sort,
        query.store.as_deref(),
        query.city.as_deref(),
    )
    .await
    {
        Ok(result) => (StatusCode::OK, success_to_api_response(result)),
        Err(e) => {
            tracing::error!("Failed to aggregate category products: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            )
        }
    }
}
