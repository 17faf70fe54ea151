/// Serves uploaded images from the uploads directory
use actix_web::{web, HttpResponse};
use std::path::Path;

use crate::config::Config;
use crate::error::{AppError, Result};

/// GET /uploads/{filename}
pub async fn serve(config: web::Data<Config>, path: web::Path<String>) -> Result<HttpResponse> {
    let filename = path.into_inner();

    // Only bare filenames are ever stored; anything else is traversal
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
    {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let file_path = Path::new(&config.uploads.dir).join(&filename);

    match tokio::fs::read(&file_path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&filename).first_or_octet_stream();
            Ok(HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(bytes))
        }
        Err(_) => Err(AppError::NotFound("File not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AppConfig, AuthConfig, CacheConfig, CorsConfig, DatabaseConfig, UploadConfig,
    };

    fn test_config(dir: &str) -> Config {
        Config {
            app: AppConfig {
                env: "development".to_string(),
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            cors: CorsConfig {
                allowed_origins: "*".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/blog".to_string(),
                max_connections: 1,
            },
            cache: CacheConfig {
                url: "redis://localhost:6379".to_string(),
                enabled: false,
                ttl_secs: 3600,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_expiry_days: 30,
            },
            uploads: UploadConfig {
                dir: dir.to_string(),
            },
        }
    }

    #[actix_rt::test]
    async fn traversal_paths_are_rejected() {
        let config = web::Data::new(test_config("./uploads"));
        for name in ["../etc/passwd", "a/b.jpg", "a\\b.jpg", ""] {
            let result = serve(config.clone(), web::Path::from(name.to_string())).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[actix_rt::test]
    async fn missing_file_is_not_found() {
        let config = web::Data::new(test_config("./does-not-exist"));
        let result = serve(config, web::Path::from("nope.jpg".to_string())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn stored_file_is_served_with_guessed_mime() {
        let dir = std::env::temp_dir().join(format!("uploads-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("pic.png"), b"png-bytes").await.unwrap();

        let config = web::Data::new(test_config(dir.to_str().unwrap()));
        let response = serve(config, web::Path::from("pic.png".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), actix_web::http::StatusCode::OK);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
