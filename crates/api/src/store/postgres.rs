//! PostgreSQL post store

use async_trait::async_trait;
use orgpress_shared::{NewPost, OrgId, Post, PostId};
use sqlx::PgPool;

use super::{PostStore, StoreError};

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let post: Post = sqlx::query_as(
            r#"
            INSERT INTO posts (title, body, org_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, body, org_id, created_at, updated_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.org_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(post_id = %post.id, org_id = %post.org_id, "Post created");
        Ok(post)
    }

    async fn list_posts_by_org(&self, org_id: &OrgId) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as(
            r#"
            SELECT id, title, body, org_id, created_at, updated_at
            FROM posts
            WHERE org_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as(
            r#"
            SELECT id, title, body, org_id, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
