//! Post storage
//!
//! Posts are the only data this service owns. Handlers talk to the
//! [`PostStore`] trait so they can be exercised without a database.

#[cfg(test)]
pub(crate) mod memory;
mod postgres;

use async_trait::async_trait;
use orgpress_shared::{NewPost, OrgId, Post, PostId};

pub use postgres::PgPostStore;

/// Tenant-scoped post persistence
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a validated post and return the stored row
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;

    /// All posts of an organization, oldest first
    async fn list_posts_by_org(&self, org_id: &OrgId) -> Result<Vec<Post>, StoreError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    /// Cheap connectivity check for readiness probes
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
