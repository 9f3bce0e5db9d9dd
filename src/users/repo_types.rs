use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::images::services::UploadedImage;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub image_url: String,
    pub public_id: String,
    pub post_ids: Vec<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Image reference stored on a user; both halves always change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub image_url: String,
    pub public_id: String,
}

impl From<UploadedImage> for Profile {
    fn from(img: UploadedImage) -> Self {
        Self {
            image_url: img.url,
            public_id: img.public_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile: Profile,
}

/// Fields replaced by an update; `None` leaves the stored value as is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub password_hash: Option<String>,
    pub profile: Option<Profile>,
}
