use axum::{
    RequestExt,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState,
    utils::{error_codes, error_to_api_response, verify_token},
};

/// 认证失败统一返回403，不向调用方区分缺失、伪造还是过期
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("缺少认证令牌")]
    MissingToken,
    #[error("认证令牌无效或已过期")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            error_to_api_response::<()>(error_codes::AUTH_FAILED, self.to_string()),
        )
            .into_response()
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = request
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AuthError::MissingToken)?;

    let claims = verify_token(bearer.token(), &state.config).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        AuthError::InvalidToken
    })?;

    // 验证通过后把Claims放进请求扩展，供各handler读取
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
