//! Authentication request handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, SuccessResponse, TokenResponse,
    UserEnvelope,
};
use crate::services::cookies::{self, REFRESH_COOKIE};

/// `POST /api/auth/register`: create an account. Does not log in.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserEnvelope>)> {
    let user = state
        .auth
        .register(&body.name, &body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(UserEnvelope { user: user.into() })))
}

/// `POST /api/auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let session = state.auth.login(&body.email, &body.password).await?;
    let jar = cookies::with_tokens(jar, &session.tokens, state.config.secure_cookies);
    Ok((
        jar,
        Json(LoginResponse {
            tokens: TokenResponse::from(&session.tokens),
            user: session.user.into(),
        }),
    ))
}

/// `POST /api/auth/refresh`: rotate the session's refresh token.
///
/// The token comes from the refresh cookie, else from a JSON body field.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .unwrap_or_default()
                .refresh_token
        });

    let tokens = state.auth.refresh(presented.as_deref()).await?;
    let jar = cookies::with_tokens(jar, &tokens, state.config.secure_cookies);
    Ok((jar, Json(TokenResponse::from(&tokens))))
}

/// `POST /api/auth/logout`: end the caller's session.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<SuccessResponse>)> {
    state.auth.logout(&user.id()?).await?;
    let jar = cookies::cleared(jar, state.config.secure_cookies);
    Ok((jar, Json(SuccessResponse { success: true })))
}

/// `GET /api/auth/me`: the caller's public profile.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserEnvelope>> {
    let id = user.id()?;
    let user = state.auth.current_user(Some(&id)).await?;
    Ok(Json(UserEnvelope { user: user.into() }))
}
