//! Host-based tenant routing
//!
//! Every request passes through the tenant rewrite middleware, which maps
//! org-specific hosts onto the internal tenant namespace:
//! - Production subdomains: acme.example.com/create -> /s/acme/create
//! - Preview deployments: acme---branch.vercel.app/ -> /s/acme/
//! - Local development: acme.localhost:3000/ -> /s/acme/

mod host_resolver;
mod middleware;
mod tenant_router;

pub use host_resolver::{
    Environment, HostResolver, ResolvedTenant, RootDomain, TenantKey, DEFAULT_PREVIEW_SUFFIX,
};
pub use middleware::{tenant_rewrite, with_tenant_rewrite};
pub use tenant_router::{
    tenant_path, Exemption, ExemptionRules, RouteDecision, TenantRouter, API_PREFIX,
    INTERNAL_PREFIX, TENANT_ROUTE_PREFIX,
};
