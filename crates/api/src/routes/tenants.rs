//! Tenant blog routes
//!
//! Served under the internal tenant namespace (`/s/:tenant/...`). Requests
//! to a tenant host reach these handlers through the tenant rewrite.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use orgpress_shared::{Organization, Post, PostId};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    directory::find_membership,
    error::{ApiError, ApiResult},
    routing::{tenant_path, TenantKey},
    state::AppState,
};

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct BlogIndexResponse {
    pub organization: Organization,
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub excerpt: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            excerpt: post.excerpt(),
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostPageResponse {
    pub organization: Organization,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct ComposerResponse {
    pub organization: Organization,
    pub membership: ComposerMembership,
    /// Where the composer posts to
    pub submit_path: &'static str,
    /// Where to send the author after publishing
    pub return_path: String,
}

#[derive(Debug, Serialize)]
pub struct ComposerMembership {
    pub id: String,
    pub role: String,
    pub display_name: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Look up the organization behind a tenant key
async fn tenant_organization(state: &AppState, tenant: &str) -> ApiResult<Organization> {
    state
        .directory
        .organization_by_slug(tenant)
        .await?
        .ok_or(ApiError::NotFound("Organization"))
}

/// Blog index: the organization and its posts, oldest first
pub async fn blog_index(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> ApiResult<Json<BlogIndexResponse>> {
    let organization = tenant_organization(&state, &tenant).await?;
    let posts = state.posts.list_posts_by_org(&organization.id).await?;

    Ok(Json(BlogIndexResponse {
        posts: posts.iter().map(PostSummary::from).collect(),
        organization,
    }))
}

/// A single post, only if it belongs to the tenant
pub async fn blog_post(
    State(state): State<AppState>,
    Path((tenant, post_id)): Path<(String, String)>,
) -> ApiResult<Json<PostPageResponse>> {
    let post_id = Uuid::parse_str(&post_id)
        .map(PostId::from)
        .map_err(|_| ApiError::NotFound("Post"))?;

    let (organization, post) = tokio::try_join!(
        tenant_organization(&state, &tenant),
        async {
            state
                .posts
                .get_post(post_id)
                .await
                .map_err(ApiError::from)
        }
    )?;

    let post = post
        .filter(|post| post.belongs_to(&organization.id))
        .ok_or(ApiError::NotFound("Post"))?;

    Ok(Json(PostPageResponse { organization, post }))
}

/// Composer context for members of the tenant organization
pub async fn composer(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(tenant): Path<String>,
) -> ApiResult<Json<ComposerResponse>> {
    let organization = tenant_organization(&state, &tenant).await?;

    let membership = find_membership(
        state.directory.as_ref(),
        &organization.id,
        &auth_user.user_id,
    )
    .await?
    .ok_or_else(|| {
        tracing::info!(
            user_id = %auth_user.user_id,
            org_id = %organization.id,
            "Non-member opened the composer"
        );
        ApiError::NotAMember
    })?;

    let return_path = TenantKey::new(organization.slug.as_str())
        .map(|key| tenant_path(&key, ""))
        .unwrap_or_else(|| "/".to_string());

    Ok(Json(ComposerResponse {
        membership: ComposerMembership {
            display_name: membership.display_name(),
            id: membership.id,
            role: membership.role,
        },
        organization,
        submit_path: super::CREATE_POST_PATH,
        return_path,
    }))
}
