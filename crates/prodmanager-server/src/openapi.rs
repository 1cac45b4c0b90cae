use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ProdManager API",
        version = "1.0.0",
        description = "Product catalog with account registration and role-gated writes."
    ),
    paths(
        crate::auth::register,
        crate::auth::login,
        crate::routes::list_products,
        crate::routes::get_product,
        crate::routes::create_product,
        crate::routes::update_product,
        crate::routes::delete_product,
        crate::routes::ping,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::RegisterRequest,
        crate::dto::LoginRequest,
        crate::dto::AuthResponse,
        crate::dto::ProductRequest,
        crate::dto::ProductResponse,
        crate::dto::PaginationResponse,
        crate::dto::PingResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorEnvelope,
        crate::dto::FieldErrorResponse,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "products", description = "Product catalog"),
        (name = "system", description = "Liveness and readiness"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the Bearer token security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token returned by /api/auth/register or /api/auth/login.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
