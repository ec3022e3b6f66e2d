//! OpenAPI document served at `/api-docs/openapi.json` and browsable at
//! `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::user::profile,
        handlers::user::delete,
        handlers::auth::verification::send_email_verification_token,
        handlers::auth::verification::validate_email_verification_token,
        handlers::auth::reset::send_password_reset_token,
        handlers::auth::reset::reset_password,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::auth::types::CredentialsRequest,
        handlers::auth::types::SessionResponse,
        handlers::auth::types::AccountResponse,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Registration, login, and one-time code flows"),
        (name = "user", description = "Authenticated account endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
