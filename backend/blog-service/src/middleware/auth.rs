/// Bearer-token authentication extractor
/// Validates the `Authorization: Bearer <token>` header and yields the
/// acting user's id; handlers that take `AuthUser` are thereby gated.
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::security::jwt;

/// Acting user id extracted from a validated JWT
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Unauthorized, no token".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Unauthorized, no token".to_string()))?;

    let token_data = jwt::validate_token(token).map_err(|e| {
        tracing::debug!("Token validation failed: {}", e);
        AppError::Authentication("Unauthorized, token failed".to_string())
    })?;

    let user_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::Authentication("Unauthorized, token failed".to_string()))?;

    Ok(AuthUser(user_id))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn init_jwt() {
        jwt::initialize("test-secret", 30).unwrap();
    }

    #[test]
    fn missing_header_is_rejected() {
        init_jwt();
        let req = TestRequest::default().to_http_request();
        let err = authenticate(&req).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        init_jwt();
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert!(authenticate(&req).is_err());
    }

    #[test]
    fn valid_bearer_token_yields_user_id() {
        init_jwt();
        let user_id = Uuid::new_v4();
        let token = jwt::generate_token(user_id).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();
        let auth = authenticate(&req).unwrap();
        assert_eq!(auth.0, user_id);
    }
}
