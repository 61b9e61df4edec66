//! Shared application state

use std::sync::Arc;

use crate::{
    auth::{AuthState, JwtManager},
    config::Config,
    directory::OrganizationDirectory,
    routing::{ExemptionRules, HostResolver, RootDomain, TenantRouter},
    store::PostStore,
};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub root_domain: RootDomain,
    pub tenant_router: Arc<TenantRouter>,
    pub directory: Arc<dyn OrganizationDirectory>,
    pub posts: Arc<dyn PostStore>,
    pub jwt_manager: Arc<JwtManager>,
}

impl AppState {
    pub fn new(
        root_domain: RootDomain,
        tenant_router: TenantRouter,
        directory: Arc<dyn OrganizationDirectory>,
        posts: Arc<dyn PostStore>,
        jwt_manager: JwtManager,
    ) -> Self {
        Self {
            root_domain,
            tenant_router: Arc::new(tenant_router),
            directory,
            posts,
            jwt_manager: Arc::new(jwt_manager),
        }
    }

    /// Build state from configuration and already-connected backends
    pub fn from_config(
        config: &Config,
        directory: Arc<dyn OrganizationDirectory>,
        posts: Arc<dyn PostStore>,
    ) -> Self {
        let root_domain = RootDomain::new(&config.root_domain);
        let exemptions = config
            .exempt_path_prefixes
            .iter()
            .fold(ExemptionRules::default(), |rules, prefix| {
                rules.with_prefix(prefix.as_str())
            });
        let tenant_router = TenantRouter::new(
            HostResolver::new(root_domain.clone())
                .with_preview_suffix(&config.preview_host_suffix),
        )
        .with_exemptions(exemptions);

        Self::new(
            root_domain,
            tenant_router,
            directory,
            posts,
            JwtManager::new(&config.session_jwt_secret),
        )
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState::new(self.jwt_manager.clone())
    }
}
