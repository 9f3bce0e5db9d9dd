use anyhow::Context;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::AppState;
use crate::uploads::StagedFile;

/// Object-store reference for an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub public_id: String,
    pub url: String,
}

/// Uploads a staged file under a fresh key in the `users/` prefix.
pub async fn upload_image(st: &AppState, file: &StagedFile) -> anyhow::Result<UploadedImage> {
    let ext = ext_from_mime(file.content_type()).unwrap_or("bin");
    let public_id = format!("users/{}.{}", Uuid::new_v4(), ext);
    let body = file.read().await?;

    st.storage
        .put_object(&public_id, body, file.content_type())
        .await
        .with_context(|| format!("put_object {}", public_id))?;

    let url = st.storage.public_url(&public_id);
    info!(%public_id, size = file.size(), "image uploaded");
    Ok(UploadedImage { public_id, url })
}

pub async fn destroy_image(st: &AppState, public_id: &str) -> anyhow::Result<()> {
    st.storage
        .delete_object(public_id)
        .await
        .with_context(|| format!("delete_object {}", public_id))?;
    debug!(%public_id, "image destroyed");
    Ok(())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
