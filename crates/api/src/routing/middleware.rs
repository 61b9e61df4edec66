//! Tenant rewrite middleware
//!
//! Must wrap the application router from the outside so the rewritten URI is
//! the one used for handler matching (see [`with_tenant_rewrite`]).

use axum::{
    extract::{Request, State},
    http::{header, uri::PathAndQuery, Uri},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;

use super::tenant_router::{RouteDecision, TenantRouter};

/// Wrap `app` so every request is routed through the tenant rewrite first
pub fn with_tenant_rewrite(app: Router, router: Arc<TenantRouter>) -> Router {
    Router::new()
        .fallback_service(app)
        .layer(middleware::from_fn_with_state(router, tenant_rewrite))
}

/// Rewrite tenant-host requests into the `/s/<tenant>` namespace
pub async fn tenant_rewrite(
    State(router): State<Arc<TenantRouter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let host = request_host(&request);
    let url = full_url(&request, host.as_deref());
    let path = request.uri().path().to_string();

    if let RouteDecision::Rewrite { tenant, path: rewritten } =
        router.route(&url, host.as_deref(), &path)
    {
        match rewrite_uri(request.uri(), &rewritten) {
            Some(uri) => *request.uri_mut() = uri,
            None => {
                tracing::warn!(
                    tenant = %tenant,
                    path = %rewritten,
                    "Rewritten path is not a valid URI, passing request through"
                );
            }
        }
    }

    next.run(request).await
}

/// Host header, falling back to the URI authority (HTTP/2)
fn request_host(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
}

/// Reconstruct the URL the client requested
fn full_url(request: &Request, host: Option<&str>) -> String {
    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(known_scheme)
        .or_else(|| request.uri().scheme_str().and_then(known_scheme))
        .unwrap_or("http");

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, host.unwrap_or_default(), path_and_query)
}

/// Only `http` and `https` are accepted as the request scheme
fn known_scheme(value: &str) -> Option<&'static str> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("https") {
        Some("https")
    } else if value.eq_ignore_ascii_case("http") {
        Some("http")
    } else {
        None
    }
}

/// Replace the path of `original`, keeping its query string
fn rewrite_uri(original: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match original.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = original.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{HostResolver, RootDomain};
    use axum::{body::Body, routing::get};
    use tower::ServiceExt;

    async fn echo_uri(uri: Uri) -> String {
        uri.to_string()
    }

    fn app(root_domain: &str) -> Router {
        let inner = Router::new()
            .route("/", get(|| async { "root" }))
            .route("/org", get(|| async { "dashboard" }))
            .route("/s/:tenant", get(echo_uri))
            .route("/s/:tenant/", get(echo_uri))
            .route("/s/:tenant/*rest", get(echo_uri))
            .route("/favicon.ico", get(|| async { "icon" }))
            .route("/_internal/health", get(|| async { "ok" }));

        let router = TenantRouter::new(HostResolver::new(RootDomain::new(root_domain)));
        with_tenant_rewrite(inner, Arc::new(router))
    }

    async fn body_of(app: Router, host: &str, uri: &str) -> String {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("host", host)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_tenant_host_is_rewritten_before_routing() {
        let body = body_of(app("example.com"), "acme.example.com", "/create").await;
        assert_eq!(body, "/s/acme/create");
    }

    #[tokio::test]
    async fn test_query_string_is_preserved() {
        let body = body_of(app("example.com"), "acme.example.com", "/blog/1?draft=true").await;
        assert_eq!(body, "/s/acme/blog/1?draft=true");
    }

    #[tokio::test]
    async fn test_root_domain_passes_through() {
        assert_eq!(body_of(app("example.com"), "example.com", "/org").await, "dashboard");
        assert_eq!(body_of(app("example.com"), "www.example.com", "/").await, "root");
    }

    #[tokio::test]
    async fn test_exempt_paths_pass_through_on_tenant_host() {
        assert_eq!(
            body_of(app("example.com"), "acme.example.com", "/favicon.ico").await,
            "icon"
        );
        assert_eq!(
            body_of(app("example.com"), "acme.example.com", "/_internal/health").await,
            "ok"
        );
        // Already-rewritten paths are served as-is
        assert_eq!(
            body_of(app("example.com"), "acme.example.com", "/s/acme/create").await,
            "/s/acme/create"
        );
    }

    #[tokio::test]
    async fn test_url_text_cannot_switch_tenant() {
        assert_eq!(
            body_of(app("example.com"), "acme.example.com", "/?ref=http://globex.localhost").await,
            "/s/acme/?ref=http://globex.localhost"
        );
        assert_eq!(
            body_of(app("example.com"), "acme.example.com", "/docs/localhost-setup").await,
            "/s/acme/docs/localhost-setup"
        );
    }

    #[tokio::test]
    async fn test_local_development_host() {
        let body = body_of(app("localhost:3000"), "acme.localhost:3000", "/create").await;
        assert_eq!(body, "/s/acme/create");
    }

    #[tokio::test]
    async fn test_missing_host_passes_through() {
        let response = app("example.com")
            .oneshot(Request::builder().uri("/org").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"dashboard");
    }

    #[test]
    fn test_full_url_uses_forwarded_proto() {
        let request = Request::builder()
            .uri("/create?x=1")
            .header("x-forwarded-proto", "https, http")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            full_url(&request, Some("acme.example.com")),
            "https://acme.example.com/create?x=1"
        );

        let plain = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(full_url(&plain, Some("acme.localhost:3000")), "http://acme.localhost:3000/");
    }

    #[test]
    fn test_full_url_ignores_unknown_forwarded_proto() {
        let request = Request::builder()
            .uri("/")
            .header("x-forwarded-proto", "http://globex.localhost/#")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            full_url(&request, Some("acme.example.com")),
            "http://acme.example.com/"
        );

        let upper = Request::builder()
            .uri("/")
            .header("x-forwarded-proto", "HTTPS")
            .body(Body::empty())
            .unwrap();
        assert_eq!(full_url(&upper, Some("acme.example.com")), "https://acme.example.com/");
    }

    #[test]
    fn test_rewrite_uri_keeps_query() {
        let original: Uri = "/create?draft=1".parse().unwrap();
        let rewritten = rewrite_uri(&original, "/s/acme/create").unwrap();
        assert_eq!(rewritten.to_string(), "/s/acme/create?draft=1");
    }
}
