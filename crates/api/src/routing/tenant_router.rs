//! Tenant rewrite decisions
//!
//! Given a request path and its resolved tenant, decide whether the request
//! passes through unchanged or is rewritten to `/s/<tenant><path>`.

use super::host_resolver::{HostResolver, TenantKey};

/// Internal namespace that tenant requests are rewritten into
pub const TENANT_ROUTE_PREFIX: &str = "/s";

/// API routes are never rewritten
pub const API_PREFIX: &str = "/api";

/// Framework-internal routes (health probes) are never rewritten
pub const INTERNAL_PREFIX: &str = "/_internal";

/// Why a path is exempt from rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exemption {
    ApiRoute,
    FrameworkInternal,
    /// Already inside the tenant namespace; rewriting again would loop
    AlreadyRewritten,
    /// Matched an additionally configured prefix
    Configured,
    /// Path contains a `.`, assumed to be a static file
    StaticAsset,
}

/// Paths that pass through without a rewrite
///
/// Checked in order, first match wins.
#[derive(Debug, Clone)]
pub struct ExemptionRules {
    api_prefix: String,
    internal_prefix: String,
    tenant_prefix: String,
    extra_prefixes: Vec<String>,
}

impl Default for ExemptionRules {
    fn default() -> Self {
        Self {
            api_prefix: API_PREFIX.to_string(),
            internal_prefix: INTERNAL_PREFIX.to_string(),
            tenant_prefix: format!("{}/", TENANT_ROUTE_PREFIX),
            extra_prefixes: Vec::new(),
        }
    }
}

impl ExemptionRules {
    /// Exempt an additional path prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.extra_prefixes.push(prefix.into());
        self
    }

    /// Return the first exemption that applies to `path`, if any
    pub fn check(&self, path: &str) -> Option<Exemption> {
        if path.starts_with(&self.api_prefix) {
            return Some(Exemption::ApiRoute);
        }
        if path.starts_with(&self.internal_prefix) {
            return Some(Exemption::FrameworkInternal);
        }
        if path.starts_with(&self.tenant_prefix) {
            return Some(Exemption::AlreadyRewritten);
        }
        if self
            .extra_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Some(Exemption::Configured);
        }
        if path.contains('.') {
            return Some(Exemption::StaticAsset);
        }
        None
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.check(path).is_some()
    }
}

/// Outcome of routing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Forward the original request unchanged
    Continue,
    /// Serve the request from `path` instead
    Rewrite { tenant: TenantKey, path: String },
}

/// Stateless router combining the host resolver with the exemption rules
#[derive(Debug, Clone)]
pub struct TenantRouter {
    resolver: HostResolver,
    exemptions: ExemptionRules,
}

impl TenantRouter {
    pub fn new(resolver: HostResolver) -> Self {
        Self {
            resolver,
            exemptions: ExemptionRules::default(),
        }
    }

    pub fn with_exemptions(mut self, exemptions: ExemptionRules) -> Self {
        self.exemptions = exemptions;
        self
    }

    pub fn resolver(&self) -> &HostResolver {
        &self.resolver
    }

    /// Decide how to serve a request
    ///
    /// Never fails: unknown hosts and unusual paths pass through.
    pub fn route(&self, url: &str, host: Option<&str>, path: &str) -> RouteDecision {
        if let Some(exemption) = self.exemptions.check(path) {
            tracing::trace!(path = %path, ?exemption, "Path exempt from tenant rewrite");
            return RouteDecision::Continue;
        }

        match self.resolver.resolve(url, host) {
            Some(resolved) => {
                let rewritten = tenant_path(&resolved.key, path);
                tracing::debug!(
                    tenant = %resolved.key,
                    environment = ?resolved.environment,
                    from = %path,
                    to = %rewritten,
                    "Rewriting tenant request"
                );
                RouteDecision::Rewrite {
                    tenant: resolved.key,
                    path: rewritten,
                }
            }
            None => RouteDecision::Continue,
        }
    }
}

/// Internal path serving `path` for `tenant`: `/s/<tenant><path>`
pub fn tenant_path(tenant: &TenantKey, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}/{}{}", TENANT_ROUTE_PREFIX, tenant, path)
    } else {
        format!("{}/{}/{}", TENANT_ROUTE_PREFIX, tenant, path)
    }
}
