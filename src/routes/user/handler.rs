use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    utils::{Claims, error_codes, error_to_api_response, generate_token, success_to_api_response},
};

use super::model::{CheckTokenResponse, FavoriteRequest, LoginRequest, LoginResponse, User};

/// 用谷歌身份信息换取内部会话令牌，首次登录时创建用户
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match User::find_or_create(&state.pool, &req).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to find or create user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "登录失败".to_string()),
            );
        }
    };

    let token = match generate_token(&user.user_id, &state.config) {
        Ok(token) => token,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "生成令牌失败".to_string()),
            );
        }
    };

    match user.into_info(&state.pool).await {
        Ok(user) => (
            StatusCode::OK,
            success_to_api_response(LoginResponse { user, token }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

/// 解析当前令牌对应的用户。令牌有效但用户已不存在时明确拒绝，不返回空用户
#[axum::debug_handler]
pub async fn me(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match User::find_by_id(&state.pool, &claims.sub).await {
        Ok(Some(user)) => match user.into_info(&state.pool).await {
            Ok(user) => (StatusCode::OK, success_to_api_response(user)),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
            ),
        },
        Ok(None) => (
            StatusCode::FORBIDDEN,
            error_to_api_response(error_codes::AUTH_FAILED, "用户不存在".to_string()),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}

/// 检查token是否有效，中间件已验证签名和有效期，这里直接回显
#[axum::debug_handler]
pub async fn check_token(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    (
        StatusCode::OK,
        success_to_api_response(CheckTokenResponse { user_id: claims.sub }),
    )
}

#[axum::debug_handler]
pub async fn add_favorite(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<FavoriteRequest>,
) -> impl IntoResponse {
    match User::add_favorite(&state.pool, &claims.sub, &req.product_id).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "success": true })),
        ),
        Err(e) => {
            let (status, code) = if e.to_string().contains("Product not found") {
                (StatusCode::NOT_FOUND, error_codes::NOT_FOUND)
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            };
            (status, error_to_api_response(code, e.to_string()))
        }
    }
}

#[axum::debug_handler]
pub async fn remove_favorite(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<FavoriteRequest>,
) -> impl IntoResponse {
    match User::remove_favorite(&state.pool, &claims.sub, &req.product_id).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "success": true })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}
