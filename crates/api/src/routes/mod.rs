//! API routes

pub mod health;
pub mod organizations;
pub mod posts;
pub mod tenants;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{auth::require_auth, state::AppState};

/// Endpoint the composer submits new posts to
pub const CREATE_POST_PATH: &str = "/api/v1/posts";

/// Create all routes (before the tenant rewrite is applied)
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    // Health probes (framework-internal, never rewritten)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Tenant pages, reached through the tenant rewrite
    let public_tenant_routes = Router::new()
        .route("/:tenant", get(tenants::blog_index))
        .route("/:tenant/", get(tenants::blog_index))
        .route("/:tenant/blog/:post_id", get(tenants::blog_post));

    let protected_tenant_routes = Router::new()
        .route("/:tenant/create", get(tenants::composer))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            require_auth,
        ));

    // Protected API routes - under /api/v1
    let protected_api_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    Router::new()
        .route("/org/:slug", get(organizations::dashboard))
        .nest("/_internal", health_routes)
        .nest("/s", public_tenant_routes.merge(protected_tenant_routes))
        .nest("/api/v1", protected_api_routes)
        .with_state(state)
}
