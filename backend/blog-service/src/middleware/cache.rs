/// Redis-backed response cache for the public post listing
///
/// Whole serialized responses are stored keyed by the exact request URI
/// (path + query string) with a fixed TTL. Writes do not invalidate
/// cached listings; readers may observe staleness up to the expiry
/// window. Cache failures degrade to a normal database hit.
use actix_web::{
    body::{self, BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::ContentType, Method},
    Error, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::rc::Rc;
use tracing::{debug, warn};

/// Response cache middleware factory
#[derive(Clone)]
pub struct ResponseCache {
    redis: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl ResponseCache {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self {
            redis: Some(redis),
            ttl_secs,
        }
    }

    /// Pass-through variant used when `USE_CACHE` is off
    pub fn disabled() -> Self {
        Self {
            redis: None,
            ttl_secs: 0,
        }
    }
}

fn cache_key(uri: &str) -> String {
    format!("response:{}", uri)
}

impl<S, B> Transform<S, ServiceRequest> for ResponseCache
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ResponseCacheMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ResponseCacheMiddleware {
            service: Rc::new(service),
            redis: self.redis.clone(),
            ttl_secs: self.ttl_secs,
        }))
    }
}

/// Response cache middleware service
pub struct ResponseCacheMiddleware<S> {
    service: Rc<S>,
    redis: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl<S, B> Service<ServiceRequest> for ResponseCacheMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let redis = self.redis.clone();
        let ttl_secs = self.ttl_secs;

        Box::pin(async move {
            let Some(redis) = redis else {
                let res = service.call(req).await?;
                return Ok(res.map_into_boxed_body());
            };

            if req.method() != Method::GET {
                let res = service.call(req).await?;
                return Ok(res.map_into_boxed_body());
            }

            let key = cache_key(&req.uri().to_string());
            let mut conn = redis.clone();

            match conn.get::<_, Option<String>>(&key).await {
                Ok(Some(cached)) => {
                    debug!("response cache HIT for {}", key);
                    let response = HttpResponse::Ok()
                        .content_type(ContentType::json())
                        .body(cached);
                    return Ok(req.into_response(response));
                }
                Ok(None) => debug!("response cache MISS for {}", key),
                Err(e) => warn!("Redis read error for response cache: {}", e),
            }

            let res = service.call(req).await?;

            // Only successful responses are cached
            if !res.status().is_success() {
                return Ok(res.map_into_boxed_body());
            }

            let (req, res) = res.into_parts();
            let status = res.status();
            let headers = res.headers().clone();

            let bytes = body::to_bytes(res.into_body()).await.map_err(|_| {
                actix_web::error::ErrorInternalServerError("failed to buffer response body")
            })?;

            if let Ok(text) = std::str::from_utf8(&bytes) {
                if let Err(e) = conn.set_ex::<_, _, ()>(&key, text, ttl_secs).await {
                    warn!("Failed to write response cache: {}", e);
                }
            }

            let mut builder = HttpResponse::build(status);
            for (name, value) in headers.iter() {
                builder.insert_header((name.clone(), value.clone()));
            }
            let response = builder.body(bytes);

            Ok(ServiceResponse::new(req, response))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_includes_path_and_query() {
        assert_eq!(
            cache_key("/api/posts?search=Guide&page=2"),
            "response:/api/posts?search=Guide&page=2"
        );
    }

    #[test]
    fn distinct_queries_get_distinct_keys() {
        assert_ne!(cache_key("/api/posts?page=1"), cache_key("/api/posts?page=2"));
    }
}
