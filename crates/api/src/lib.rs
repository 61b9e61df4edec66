//! OrgPress API Library
//!
//! This crate contains the HTTP service for OrgPress: host-based tenant
//! routing, tenant blog pages and membership-gated post creation.

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod routes;
pub mod routing;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routing::{HostResolver, RootDomain, TenantRouter};
pub use state::AppState;

/// Assemble the full application: routes, tenant rewrite and request tracing
///
/// The tenant rewrite wraps the routes from the outside so rewritten paths
/// are matched against the tenant handlers.
pub fn build_app(state: AppState) -> Router {
    let tenant_router = state.tenant_router.clone();
    let app = routes::create_router(state);

    routing::with_tenant_rewrite(app, tenant_router).layer(TraceLayer::new_for_http())
}
