//! Common types used across OrgPress

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::PressError;

/// Maximum post title length (matches the `posts.title` column)
pub const MAX_TITLE_LEN: usize = 80;

/// Number of characters kept in a post excerpt
pub const EXCERPT_LEN: usize = 150;

// =============================================================================
// ID Wrappers
// =============================================================================

/// Organization ID as issued by the identity directory (opaque string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct OrgId(pub String);

impl OrgId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrgId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User ID as issued by the identity directory (opaque string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Post ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PostId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Directory Types
// =============================================================================

/// An organization (tenant) as known to the identity directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Publicly visible data of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUserData {
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A user's membership in an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub role: String,
    pub public_user_data: PublicUserData,
}

impl Membership {
    /// Name shown next to the composer: "First Last", else "First", else "Anonymous User"
    pub fn display_name(&self) -> String {
        let data = &self.public_user_data;
        match (non_blank(&data.first_name), non_blank(&data.last_name)) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            _ => "Anonymous User".to_string(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

// =============================================================================
// Posts
// =============================================================================

/// A published blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub org_id: OrgId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Post {
    /// First [`EXCERPT_LEN`] characters of the body, with an ellipsis when cut
    pub fn excerpt(&self) -> String {
        match self.body.char_indices().nth(EXCERPT_LEN) {
            Some((idx, _)) => format!("{}...", &self.body[..idx]),
            None => self.body.clone(),
        }
    }

    /// Whether this post belongs to the given organization
    pub fn belongs_to(&self, org_id: &OrgId) -> bool {
        &self.org_id == org_id
    }
}

/// A validated, trimmed post ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub org_id: OrgId,
}

impl NewPost {
    /// Trim and validate raw input
    pub fn parse(title: &str, body: &str, org_id: &str) -> Result<Self, PressError> {
        let title = title.trim();
        let body = body.trim();
        let org_id = org_id.trim();

        if title.is_empty() {
            return Err(PressError::Validation("Title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(PressError::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if body.is_empty() {
            return Err(PressError::Validation("Content is required".to_string()));
        }
        if org_id.is_empty() {
            return Err(PressError::Validation(
                "Organization ID is required".to_string(),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
            org_id: OrgId::from(org_id),
        })
    }
}
