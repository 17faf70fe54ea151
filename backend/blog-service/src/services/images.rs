/// Image storage and URL normalization
///
/// Uploaded images are written under the uploads directory with a fresh
/// uuid filename; the database only ever stores the relative path
/// (`/uploads/<name>`). Display URLs are built per request from the
/// inbound scheme and host, with a fixed default asset substituted for
/// posts that have no image.
use actix_multipart::{Field, Multipart};
use actix_web::HttpRequest;
use futures_util::StreamExt;
use std::path::Path;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Served when a post has no stored image
pub const DEFAULT_POST_IMAGE: &str = "/uploads/default.jpg";

/// Fields of the post create/update multipart form
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

/// Fields of the profile update multipart form
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// Scheme + host of the inbound request, e.g. `http://localhost:3000`
pub fn request_base_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// Build the absolute display URL for a stored relative path; absent
/// paths resolve to the default asset. Applied at the presentation
/// boundary only - the stored record keeps the relative form.
pub fn absolute_image_url(base_url: &str, stored: Option<&str>) -> String {
    let path = stored.unwrap_or(DEFAULT_POST_IMAGE).replace('\\', "/");
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Read the post form, storing an uploaded `postImage` file if present
pub async fn read_post_form(payload: &mut Multipart, uploads_dir: &str) -> Result<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        match field.name() {
            "title" => form.title = Some(read_text(&mut field).await?),
            "content" => form.content = Some(read_text(&mut field).await?),
            "postImage" => form.image = Some(store_image(&mut field, uploads_dir).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Read the profile form, storing an uploaded `profilePicture` if present
pub async fn read_profile_form(payload: &mut Multipart, uploads_dir: &str) -> Result<ProfileForm> {
    let mut form = ProfileForm::default();

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        match field.name() {
            "name" => form.name = Some(read_text(&mut field).await?),
            "email" => form.email = Some(read_text(&mut field).await?),
            "profilePicture" => form.image = Some(store_image(&mut field, uploads_dir).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Best-effort removal of a previously stored image; failures are only
/// logged (the record update has already been decided).
pub async fn remove_stored_image(uploads_dir: &str, stored_path: &str) {
    let Some(filename) = stored_path.rsplit('/').next() else {
        return;
    };
    if filename.is_empty() || filename == "default.jpg" {
        return;
    }

    let file_path = Path::new(uploads_dir).join(filename);
    if let Err(e) = tokio::fs::remove_file(&file_path).await {
        tracing::warn!("Failed to delete old image {}: {}", file_path.display(), e);
    }
}

async fn read_text(field: &mut Field) -> Result<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Field read error: {}", e)))?;
        data.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&data).to_string())
}

/// Write the file field to the uploads dir and return the relative path
async fn store_image(field: &mut Field, uploads_dir: &str) -> Result<String> {
    let extension = field
        .content_disposition()
        .get_filename()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .unwrap_or("jpg")
        .to_ascii_lowercase();

    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Image read error: {}", e)))?;
        data.extend_from_slice(&chunk);
    }

    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded image is empty".to_string()));
    }

    let filename = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = Path::new(uploads_dir).join(&filename);

    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create uploads dir: {}", e)))?;
    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store image: {}", e)))?;

    Ok(format!("/uploads/{}", filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_resolves_to_default_asset() {
        assert_eq!(
            absolute_image_url("http://localhost:3000", None),
            "http://localhost:3000/uploads/default.jpg"
        );
    }

    #[test]
    fn stored_path_is_prefixed_with_scheme_and_host() {
        assert_eq!(
            absolute_image_url("https://blog.example.com", Some("/uploads/x.jpg")),
            "https://blog.example.com/uploads/x.jpg"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_collapsed() {
        assert_eq!(
            absolute_image_url("http://localhost:3000/", Some("/uploads/x.jpg")),
            "http://localhost:3000/uploads/x.jpg"
        );
    }

    #[test]
    fn backslashes_are_normalized() {
        assert_eq!(
            absolute_image_url("http://h", Some("/uploads\\x.jpg")),
            "http://h/uploads/x.jpg"
        );
    }
}
