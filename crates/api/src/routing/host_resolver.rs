//! Host-to-Tenant Resolution
//!
//! Derives the tenant key (an organization slug) from an inbound request.
//! Three environments are recognised, checked in this order:
//! - Local development: acme.localhost:3000 -> "acme"
//! - Preview deployments: acme---feature-x.vercel.app -> "acme"
//! - Production: acme.example.com -> "acme"
//!
//! Resolution is pure: no I/O, no shared state, and a malformed or missing
//! host simply resolves to no tenant.

use axum::http::Uri;
use serde::Serialize;
use std::fmt;

/// Default hosting suffix for preview deployments
pub const DEFAULT_PREVIEW_SUFFIX: &str = ".vercel.app";

/// Separator between tenant and branch in preview hostnames
const PREVIEW_SEPARATOR: &str = "---";

/// Alias for the root site; never a tenant
const WWW: &str = "www";

const LOCALHOST_SUFFIX: &str = ".localhost";

/// Configured base domain of the deployment, e.g. `example.com` or `localhost:3000`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDomain {
    /// As configured (lowercased), port included
    raw: String,
    /// Port stripped, used for host comparisons
    hostname: String,
}

impl RootDomain {
    pub fn new(root_domain: impl AsRef<str>) -> Self {
        let raw = root_domain.as_ref().trim().to_lowercase();
        let hostname = normalize_host(&raw);
        Self { raw, hostname }
    }

    /// The configured value, port included
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The configured value without its port
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Whether this deployment is served from a local development host
    pub fn is_local(&self) -> bool {
        is_local_hostname(&self.hostname)
    }

    /// Public URL of a tenant's blog
    pub fn tenant_url(&self, tenant: &str) -> String {
        if self.is_local() {
            format!("http://{}.{}", tenant, self.raw)
        } else {
            format!("https://{}.{}", tenant, self.raw)
        }
    }
}

impl fmt::Display for RootDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A resolved tenant identifier (non-empty subdomain label(s))
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantKey(String);

impl TenantKey {
    /// Returns `None` for an empty key
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which environment branch produced the tenant key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// *.localhost or 127.0.0.1
    Local,
    /// tenant---branch.<preview suffix>
    Preview,
    /// tenant.<root domain>
    Production,
}

/// Result of resolving a request to a tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTenant {
    pub key: TenantKey,
    pub environment: Environment,
}

/// Resolves request hosts to tenant keys
#[derive(Debug, Clone)]
pub struct HostResolver {
    root_domain: RootDomain,
    preview_suffix: String,
}

impl HostResolver {
    /// Create a resolver for the given root domain with the default preview suffix
    pub fn new(root_domain: RootDomain) -> Self {
        Self {
            root_domain,
            preview_suffix: DEFAULT_PREVIEW_SUFFIX.to_string(),
        }
    }

    /// Override the preview hosting suffix (e.g. ".pages.dev")
    pub fn with_preview_suffix(mut self, suffix: impl AsRef<str>) -> Self {
        self.preview_suffix = suffix.as_ref().trim().to_lowercase();
        self
    }

    pub fn root_domain(&self) -> &RootDomain {
        &self.root_domain
    }

    /// Resolve a request to a tenant
    ///
    /// `url` is the full request URL and `host` the raw `Host` header value,
    /// if any. Only the URL's scheme and authority are consulted, never its
    /// path or query.
    ///
    /// Returns `None` for root-domain, `www` and unrecognised hosts.
    pub fn resolve(&self, url: &str, host: Option<&str>) -> Option<ResolvedTenant> {
        let hostname = host.map(normalize_host).unwrap_or_default();

        if let Some(authority) = url_authority(url).filter(|a| is_local_hostname(&a.host)) {
            return resolve_local(&authority, &hostname).map(|key| ResolvedTenant {
                key,
                environment: Environment::Local,
            });
        }

        if self.is_preview_host(&hostname) {
            return hostname
                .split(PREVIEW_SEPARATOR)
                .next()
                .and_then(TenantKey::new)
                .map(|key| ResolvedTenant {
                    key,
                    environment: Environment::Preview,
                });
        }

        self.resolve_production(&hostname)
            .map(|key| ResolvedTenant {
                key,
                environment: Environment::Production,
            })
    }

    fn is_preview_host(&self, hostname: &str) -> bool {
        hostname.contains(PREVIEW_SEPARATOR) && hostname.ends_with(&self.preview_suffix)
    }

    fn resolve_production(&self, hostname: &str) -> Option<TenantKey> {
        let root = self.root_domain.hostname();
        if root.is_empty() || hostname == root || hostname == format!("{}.{}", WWW, root) {
            return None;
        }

        let suffix = format!(".{}", root);
        hostname
            .strip_suffix(&suffix)
            .and_then(TenantKey::new)
    }
}

/// Normalize a host header value: strip the port, trim and lowercase
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host.split(':').next().unwrap_or(host);
    host.to_lowercase()
}

/// Scheme and host of a request URL
#[derive(Debug, PartialEq, Eq)]
struct UrlAuthority {
    scheme: String,
    host: String,
}

/// Parse the authority of `url`, lowercased; `None` if it has no host
fn url_authority(url: &str) -> Option<UrlAuthority> {
    let uri: Uri = url.trim().parse().ok()?;
    let host = uri.host().filter(|host| !host.is_empty())?;
    Some(UrlAuthority {
        scheme: uri.scheme_str().unwrap_or_default().to_lowercase(),
        host: host.to_lowercase(),
    })
}

fn is_local_hostname(hostname: &str) -> bool {
    hostname == "localhost" || hostname == "127.0.0.1" || hostname.ends_with(LOCALHOST_SUFFIX)
}

/// Local development: subdomain from the URL first, then from the host header
fn resolve_local(authority: &UrlAuthority, hostname: &str) -> Option<TenantKey> {
    if let Some(label) = label_before_localhost(authority) {
        return local_tenant(label);
    }

    if hostname.ends_with(LOCALHOST_SUFFIX) {
        return hostname.split('.').next().and_then(local_tenant);
    }

    None
}

fn local_tenant(label: &str) -> Option<TenantKey> {
    if label == WWW {
        None
    } else {
        TenantKey::new(label)
    }
}

/// `<label>` of an `http://<label>.localhost` authority
fn label_before_localhost(authority: &UrlAuthority) -> Option<&str> {
    if authority.scheme != "http" {
        return None;
    }
    authority
        .host
        .strip_suffix(LOCALHOST_SUFFIX)
        .filter(|label| !label.is_empty() && !label.contains('.'))
}
