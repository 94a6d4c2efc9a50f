//! User account routes
//!
//! Registration, the session lifecycle (login/logout/refresh), password
//! change, and account/image updates. Tokens travel as `HttpOnly`/`Secure`
//! cookies on issuance and are cleared (not merely expired) on logout.

use super::respond;
use crate::auth::{CurrentUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::error::{ApiError, ApiResult};
use crate::services::{AccountService, ImageUpload, SessionService};
use crate::state::AppState;
use crate::store::UserImage;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use userbase_shared::types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest,
    TokenPairResponse, UpdateAccountRequest,
};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
}

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .build()
}

fn cleared_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// POST /api/v1/users/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = AccountService::register(state.store(), req).await?;
    Ok(respond(
        StatusCode::CREATED,
        user,
        "user registered successfully",
    ))
}

/// POST /api/v1/users/login
///
/// Sets both token cookies and returns the pair in the body as well.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = SessionService::login(
        state.store(),
        state.jwt(),
        req.username.as_deref(),
        req.email.as_deref(),
        &req.password,
    )
    .await?;

    let jar = jar
        .add(token_cookie(
            ACCESS_TOKEN_COOKIE,
            outcome.tokens.access_token.clone(),
        ))
        .add(token_cookie(
            REFRESH_TOKEN_COOKIE,
            outcome.tokens.refresh_token.clone(),
        ));

    let body = LoginResponse {
        user: outcome.user,
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    };

    Ok((
        jar,
        respond(StatusCode::OK, body, "user logged in successfully"),
    ))
}

/// POST /api/v1/users/logout (protected)
async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    SessionService::logout(state.store(), user.id).await?;

    let jar = jar
        .remove(cleared_cookie(ACCESS_TOKEN_COOKIE))
        .remove(cleared_cookie(REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        respond(
            StatusCode::OK,
            serde_json::json!({}),
            "user logged out successfully",
        ),
    ))
}

/// POST /api/v1/users/refresh-token
///
/// The presented refresh token comes from the cookie, with the JSON body
/// as fallback.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<impl IntoResponse> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_string()))?;

    let tokens = SessionService::refresh(state.store(), state.jwt(), &presented).await?;

    let jar = jar
        .add(token_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
        ))
        .add(token_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
        ));

    let body = TokenPairResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };

    Ok((
        jar,
        respond(StatusCode::OK, body, "access token refreshed"),
    ))
}

/// POST /api/v1/users/change-password (protected)
async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    SessionService::change_password(
        state.store(),
        user.id,
        &req.old_password,
        &req.new_password,
        &req.confirm_password,
    )
    .await?;

    Ok(respond(
        StatusCode::OK,
        serde_json::json!({}),
        "password changed successfully",
    ))
}

/// GET /api/v1/users/current-user (protected)
async fn current_user(user: CurrentUser) -> ApiResult<impl IntoResponse> {
    Ok(respond(
        StatusCode::OK,
        user.user,
        "current user fetched successfully",
    ))
}

/// PATCH /api/v1/users/update-account (protected)
async fn update_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = AccountService::update_account(state.store(), user.id, req).await?;
    Ok(respond(
        StatusCode::OK,
        updated,
        "account updated successfully",
    ))
}

/// PATCH /api/v1/users/avatar (protected, multipart)
async fn update_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let upload = read_image_field(multipart, "avatar").await?;
    let updated = AccountService::set_user_image(
        state.store(),
        state.media(),
        user.id,
        UserImage::Avatar,
        upload,
    )
    .await?;
    Ok(respond(
        StatusCode::OK,
        updated,
        "avatar updated successfully",
    ))
}

/// PATCH /api/v1/users/cover-image (protected, multipart)
async fn update_cover_image(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let upload = read_image_field(multipart, "coverImage").await?;
    let updated = AccountService::set_user_image(
        state.store(),
        state.media(),
        user.id,
        UserImage::CoverImage,
        upload,
    )
    .await?;
    Ok(respond(
        StatusCode::OK,
        updated,
        "cover image updated successfully",
    ))
}

/// Pull one named file field out of a multipart body.
async fn read_image_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
            .to_vec();

        return Ok(ImageUpload { file_name, bytes });
    }

    Err(ApiError::Validation(format!(
        "{field_name} file is required"
    )))
}
