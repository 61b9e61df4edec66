//! Post creation

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    Json,
};
use orgpress_shared::{NewPost, Post};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    directory::find_membership,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub org_id: String,
}

/// Publish a post for an organization the caller belongs to
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let new_post = NewPost::parse(&req.title, &req.body, &req.org_id)?;

    // Any failure to confirm membership, including a directory outage, denies the write
    match find_membership(
        state.directory.as_ref(),
        &new_post.org_id,
        &auth_user.user_id,
    )
    .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::info!(
                user_id = %auth_user.user_id,
                org_id = %new_post.org_id,
                "Rejected post from non-member"
            );
            return Err(ApiError::NotAMember);
        }
        Err(e) => {
            tracing::warn!(
                user_id = %auth_user.user_id,
                org_id = %new_post.org_id,
                error = %e,
                "Membership check failed"
            );
            return Err(ApiError::NotAMember);
        }
    }

    let post = state.posts.create_post(new_post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}
