use crate::auth::{
    Argon2Hasher, AuthConfig, AuthCore, BearerTokenCodec, LogNotifier, PgCredentialStore,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod gate;
pub mod handlers;
mod openapi;

pub use openapi::ApiDoc;

/// Start the server
///
/// # Errors
///
/// Returns an error if the database or listener cannot be set up.
pub async fn new(port: u16, dsn: String, token_secret: SecretString) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let core = Arc::new(AuthCore::new(
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(Argon2Hasher::default()),
        BearerTokenCodec::new(token_secret),
        Arc::new(LogNotifier),
        AuthConfig::new(),
    ));

    // The boundary is promiscuous by design; identity lives in the bearer
    // token, not the origin. Preflight short-circuits here with no body.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(core))
                .layer(Extension(pool))
                .layer(middleware::from_fn(gate::gate)),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Route table; layers and state are attached by [`new`].
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", get(handlers::root::root))
        .route(
            "/health",
            get(handlers::health::health).options(handlers::health::health),
        )
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route(
            "/user",
            get(handlers::user::profile).delete(handlers::user::delete),
        )
        .route(
            "/send-email-verification-token",
            get(handlers::auth::verification::send_email_verification_token),
        )
        .route(
            "/validate-email-verification-token",
            put(handlers::auth::verification::validate_email_verification_token),
        )
        .route(
            "/send-password-reset-token",
            put(handlers::auth::reset::send_password_reset_token),
        )
        .route("/reset-password", put(handlers::auth::reset::reset_password))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
