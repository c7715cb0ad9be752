use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppJson, StatusBody},
    app_state::AppState,
    auth::{ROLE_EMPLOYEE, ROLE_USER, verify_password},
    domain::validation::is_valid_email,
    models::UserEntity,
    schema::{employees, users},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/auth",
        OpenApiRouter::new().routes(utoipa_axum::routes!(authenticate)),
    )
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct AuthReq {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl AuthReq {
    fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() {
            return Err(AppError::InvalidRequest("Email is mandatory".into()));
        }
        if !is_valid_email(&self.email) {
            return Err(AppError::InvalidRequest("Email should be valid".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::InvalidRequest("Password is mandatory".into()));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AuthRes {
    pub success: bool,
    pub access_token: String,
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Auth"],
    request_body = AuthReq,
    responses(
        (status = 200, description = "Authenticated successfully", body = AuthRes),
        (status = 400, description = "Malformed credentials", body = StatusBody),
        (status = 401, description = "Invalid email or password", body = StatusBody)
    )
)]
async fn authenticate(
    State(state): State<AppState>,
    AppJson(body): AppJson<AuthReq>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    tracing::info!(email = %body.email, "attempting authentication");

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user: Option<UserEntity> = users::table
        .filter(users::email.eq(&body.email))
        .select(UserEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to look up user")?;

    let Some(user) = user.filter(|user| verify_password(&body.password, &user.password_hash))
    else {
        tracing::warn!(email = %body.email, "authentication failed");
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    };

    let employee_rows: i64 = employees::table
        .filter(employees::user_id.eq(user.id))
        .count()
        .get_result(conn)
        .await
        .context("Failed to look up employee record")?;
    let role = if employee_rows > 0 {
        ROLE_EMPLOYEE
    } else {
        ROLE_USER
    };

    let access_token = state.jwt.issue(user.id, &user.email, role)?;
    tracing::info!(user_id = user.id, role, "authentication successful");

    Ok(Json(AuthRes {
        success: true,
        access_token,
    }))
}
