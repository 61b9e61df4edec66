//! Identity/organization directory
//!
//! Organizations and memberships live in an external identity service. The
//! API only reads from it: slug lookups for tenant pages and membership lists
//! for authorization checks.

mod cache;
mod client;

use async_trait::async_trait;
use orgpress_shared::{Membership, OrgId, Organization, UserId};

pub use cache::{CacheStats, CachedDirectory, OrgCache};
pub use client::DirectoryClient;

/// Read access to the organization directory
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    /// Look up an organization by slug. `Ok(None)` if it doesn't exist.
    async fn organization_by_slug(&self, slug: &str)
        -> Result<Option<Organization>, DirectoryError>;

    /// All memberships of an organization
    async fn memberships(&self, org_id: &OrgId) -> Result<Vec<Membership>, DirectoryError>;
}

/// Find `user_id`'s membership in `org_id`, if any
pub async fn find_membership(
    directory: &dyn OrganizationDirectory,
    org_id: &OrgId,
    user_id: &UserId,
) -> Result<Option<Membership>, DirectoryError> {
    let memberships = directory.memberships(org_id).await?;
    Ok(memberships
        .into_iter()
        .find(|m| &m.public_user_data.user_id == user_id))
}

/// Errors talking to the directory
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Directory returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response from directory: {0}")]
    InvalidResponse(String),

    #[error("Invalid directory URL: {0}")]
    InvalidUrl(String),
}

impl DirectoryError {
    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            DirectoryError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DirectoryError::Status { status, .. } => *status == 429 || *status >= 500,
            DirectoryError::InvalidResponse(_) => false,
            DirectoryError::InvalidUrl(_) => false,
        }
    }
}
