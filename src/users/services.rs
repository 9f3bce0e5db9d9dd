use tracing::{error, info, warn};
use uuid::Uuid;

use super::password::hash_password;
use super::repo_types::{NewUser, Profile, User, UserChanges};
use crate::error::{ApiError, ApiResult};
use crate::images::services::{destroy_image, upload_image};
use crate::state::AppState;
use crate::uploads::StagedFile;

/// Fields collected from a registration form.
#[derive(Default)]
pub struct Registration {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<StagedFile>,
}

#[derive(Default)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub image: Option<StagedFile>,
}

pub async fn register(st: &AppState, reg: Registration) -> ApiResult<User> {
    let Registration {
        full_name,
        email,
        password,
        image,
    } = reg;

    let image = image.ok_or_else(|| ApiError::Validation("file is required".into()))?;
    let full_name = required(full_name, "fullName")?.trim().to_string();
    let submitted_email = required(email, "email")?.trim().to_string();
    let email = submitted_email.to_lowercase();
    let password = required(password, "password")?;

    if st.users.find_by_email(&email).await?.is_some() {
        image.discard();
        warn!(%email, "email already registered");
        return Err(ApiError::DuplicateUser(submitted_email));
    }

    let uploaded = upload_image(st, &image).await;
    image.discard();
    let profile = Profile::from(uploaded?);

    let inserted = match hash_password(&password) {
        Ok(password_hash) => {
            st.users
                .insert(NewUser {
                    full_name,
                    email: email.clone(),
                    password_hash,
                    profile: profile.clone(),
                })
                .await
        }
        Err(e) => Err(e),
    };

    match inserted {
        Ok(Some(user)) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Ok(None) => {
            rollback_upload(st, &profile.public_id).await;
            warn!(%email, "email taken by a concurrent registration");
            Err(ApiError::DuplicateUser(submitted_email))
        }
        Err(e) => {
            rollback_upload(st, &profile.public_id).await;
            Err(e.into())
        }
    }
}

pub async fn list_users(st: &AppState) -> ApiResult<(usize, Vec<User>)> {
    let users = st.users.list().await?;
    Ok((users.len(), users))
}

pub async fn get_user(st: &AppState, id: Uuid) -> ApiResult<User> {
    st.users.find_by_id(id).await?.ok_or(ApiError::NotFound)
}

pub async fn update_user(st: &AppState, id: Uuid, upd: UserUpdate) -> ApiResult<User> {
    let UserUpdate { password, image } = upd;
    if password.as_deref().is_some_and(|p| p.trim().is_empty()) {
        return Err(ApiError::Validation("password must not be empty".into()));
    }

    let current = st.users.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    let password_hash = password.as_deref().map(hash_password).transpose()?;

    let profile = match image {
        Some(image) => {
            let uploaded = upload_image(st, &image).await;
            image.discard();
            Some(Profile::from(uploaded?))
        }
        None => None,
    };

    let changes = UserChanges {
        password_hash,
        profile: profile.clone(),
    };
    let updated = match st.users.update(id, changes).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            if let Some(p) = &profile {
                rollback_upload(st, &p.public_id).await;
            }
            return Err(ApiError::NotFound);
        }
        Err(e) => {
            if let Some(p) = &profile {
                rollback_upload(st, &p.public_id).await;
            }
            return Err(e.into());
        }
    };

    if profile.is_some() {
        // The record already points at the new image; a failure here only
        // leaves the old object behind.
        if let Err(e) = destroy_image(st, &current.public_id).await {
            error!(error = ?e, public_id = %current.public_id, "failed to destroy replaced image");
        }
    }

    info!(user_id = %updated.id, image_replaced = profile.is_some(), "user updated");
    Ok(updated)
}

pub async fn delete_user(st: &AppState, id: Uuid) -> ApiResult<()> {
    let user = st.users.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    if !st.users.delete(id).await? {
        return Err(ApiError::NotFound);
    }

    if let Err(e) = destroy_image(st, &user.public_id).await {
        error!(error = ?e, public_id = %user.public_id, "failed to destroy image of deleted user");
    }

    info!(user_id = %id, "user deleted");
    Ok(())
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("{field} is required"))),
    }
}

async fn rollback_upload(st: &AppState, public_id: &str) {
    if let Err(e) = destroy_image(st, public_id).await {
        error!(error = ?e, %public_id, "failed to roll back uploaded image");
    }
}
