use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::dto::{MessageResponse, UserEnvelope, UserListEnvelope, UserResponse};
use super::services::{self, Registration, UserUpdate};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    uploads::StagedFile,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// POST /users (multipart: fullName, email, password, file)
#[instrument(skip(state, mp))]
pub async fn register_user(
    State(state): State<AppState>,
    mp: Multipart,
) -> ApiResult<(StatusCode, Json<UserEnvelope>)> {
    let reg = read_registration(&state, mp).await?;
    let user = services::register(&state, reg).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User registered successfully",
            data: user.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListEnvelope>> {
    let (total_users, users) = services::list_users(&state).await?;
    Ok(Json(UserListEnvelope {
        message: "All users below",
        total_users,
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserEnvelope>> {
    let user = services::get_user(&state, parse_id(&id)?).await?;
    Ok(Json(UserEnvelope {
        message: "Check user below",
        data: user.into(),
    }))
}

/// PUT /users/:id (multipart: password?, file?)
#[instrument(skip(state, mp))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mp: Multipart,
) -> ApiResult<Json<UserEnvelope>> {
    let id = parse_id(&id)?;
    let upd = read_update(&state, mp).await?;
    let user = services::update_user(&state, id, upd).await?;
    Ok(Json(UserEnvelope {
        message: "User updated successfully",
        data: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    services::delete_user(&state, parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

/// A malformed id cannot name a stored user.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

async fn read_registration(st: &AppState, mut mp: Multipart) -> ApiResult<Registration> {
    let mut reg = Registration::default();
    while let Some(field) = mp.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => reg.image = stage_file(st, field).await?,
            Some("fullName") => reg.full_name = Some(field.text().await?),
            Some("email") => reg.email = Some(field.text().await?),
            Some("password") => reg.password = Some(field.text().await?),
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }
    Ok(reg)
}

async fn read_update(st: &AppState, mut mp: Multipart) -> ApiResult<UserUpdate> {
    let mut upd = UserUpdate::default();
    while let Some(field) = mp.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => upd.image = stage_file(st, field).await?,
            Some("password") => upd.password = Some(field.text().await?),
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }
    Ok(upd)
}

/// Stages a file field; an empty part (no file chosen) counts as absent.
async fn stage_file(
    st: &AppState,
    field: axum::extract::multipart::Field<'_>,
) -> ApiResult<Option<StagedFile>> {
    let staged = StagedFile::stage(field, &st.config.upload_dir).await?;
    if staged.size() == 0 {
        staged.discard();
        return Ok(None);
    }
    Ok(Some(staged))
}
