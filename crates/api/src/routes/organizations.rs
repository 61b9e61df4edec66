//! Organization dashboard (root domain)

use axum::{
    extract::{Path, State},
    Json,
};
use orgpress_shared::Organization;
use serde::Serialize;

use crate::{
    error::{ApiError, ApiResult},
    routing::{tenant_path, TenantKey},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub organization: Organization,
    /// Public address of the blog, e.g. https://acme.example.com
    pub blog_url: String,
    /// Internal path rendering the blog without the tenant host
    pub preview_path: String,
    pub create_path: String,
}

/// Dashboard for an organization, addressed by slug
pub async fn dashboard(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<DashboardResponse>> {
    let organization = state
        .directory
        .organization_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound("Organization"))?;

    // Directory slugs are host labels; fall back to the requested slug if one isn't
    let tenant = TenantKey::new(organization.slug.as_str())
        .or_else(|| TenantKey::new(slug.as_str()))
        .ok_or(ApiError::NotFound("Organization"))?;

    Ok(Json(DashboardResponse {
        blog_url: state.root_domain.tenant_url(tenant.as_str()),
        preview_path: tenant_path(&tenant, ""),
        create_path: tenant_path(&tenant, "/create"),
        organization,
    }))
}
