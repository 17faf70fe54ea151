use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use blog_service::handlers;
use blog_service::middleware::ResponseCache;
use blog_service::security::jwt;
use blog_service::Config;
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_summary(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "blog-service"
        })),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    jwt::initialize(&config.auth.jwt_secret, config.auth.token_expiry_days)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("JWT init failed: {e}")))?;

    // Database pool + schema migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("Database connection failed: {e}"),
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migration failed: {e}")))?;

    tracing::info!("Connected to database");

    // Listing response cache (optional)
    let response_cache = if config.cache.enabled {
        let client = redis::Client::open(config.cache.url.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Redis config: {e}")))?;
        let manager = ConnectionManager::new(client).await.map_err(|e| {
            io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("Redis connection failed: {e}"),
            )
        })?;
        tracing::info!(
            "Response cache enabled (ttl {}s, no write-side invalidation)",
            config.cache.ttl_secs
        );
        ResponseCache::new(manager, config.cache.ttl_secs)
    } else {
        tracing::info!("Response cache disabled");
        ResponseCache::disabled()
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let app_config = config.clone();

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in app_config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(app_config.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/api/health", web::get().to(health_summary))
            .service(
                web::scope("/api/users")
                    .route("/register", web::post().to(handlers::users::register))
                    .route("/login", web::post().to(handlers::users::login))
                    .route("/profile", web::get().to(handlers::users::profile))
                    .route("/update", web::put().to(handlers::users::update_profile)),
            )
            .service(
                web::scope("/api/posts")
                    .service(
                        web::resource("")
                            .wrap(response_cache.clone())
                            .route(web::get().to(handlers::posts::list))
                            .route(web::post().to(handlers::posts::create)),
                    )
                    .route("/user-posts", web::get().to(handlers::posts::user_posts))
                    .service(
                        web::resource("/{post_id}")
                            .route(web::get().to(handlers::posts::show))
                            .route(web::patch().to(handlers::posts::update))
                            .route(web::delete().to(handlers::posts::delete)),
                    ),
            )
            .service(
                web::scope("/api/comments").service(
                    // POST/GET address a post id, PATCH/DELETE a comment id
                    web::resource("/{id}")
                        .route(web::post().to(handlers::comments::create))
                        .route(web::get().to(handlers::comments::index))
                        .route(web::patch().to(handlers::comments::update))
                        .route(web::delete().to(handlers::comments::delete)),
                ),
            )
            .route("/uploads/{filename}", web::get().to(handlers::uploads::serve))
    })
    .bind(&bind_address)?
    .run()
    .await
}
