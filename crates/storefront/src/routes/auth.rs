//! Authentication route handlers.
//!
//! Register and login both answer with a fresh bearer token; clients send it
//! back as `Authorization: Bearer <token>`.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use pencraft_core::api::{AuthResponse, LoginRequest, RegisterRequest, UserView};

use crate::db::UserRepository;
use crate::error::{ApiJson, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::{AuthService, Authenticated};
use crate::state::AppState;

fn auth_response(message: &str, authenticated: &Authenticated) -> AuthResponse {
    AuthResponse {
        message: message.to_string(),
        token: authenticated.token.clone(),
        user: UserView::from(&authenticated.user),
    }
}

/// Create an account.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let users = UserRepository::new(state.pool());
    let auth = AuthService::new(&users, state.token_ttl());

    let authenticated = auth
        .register(&body.name, &body.email, &body.password)
        .await?;

    add_breadcrumb("auth", "Registered", None);
    Ok((
        StatusCode::CREATED,
        Json(auth_response(
            "Пользователь успешно зарегистрирован",
            &authenticated,
        )),
    ))
}

/// Exchange email and password for a token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let users = UserRepository::new(state.pool());
    let auth = AuthService::new(&users, state.token_ttl());

    let authenticated = auth.login(&body.email, &body.password).await?;

    tracing::info!(user_id = %authenticated.user.id, "User logged in");
    Ok(Json(auth_response("Вход выполнен успешно", &authenticated)))
}

/// The user behind the bearer token.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<UserView> {
    Json(UserView::from(&user))
}
