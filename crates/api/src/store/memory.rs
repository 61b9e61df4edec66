//! In-memory post store for handler tests

use async_trait::async_trait;
use orgpress_shared::{NewPost, OrgId, Post, PostId};
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

use super::{PostStore, StoreError};

#[derive(Default)]
pub struct MemoryPostStore {
    posts: Mutex<Vec<Post>>,
}

impl MemoryPostStore {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Mutex::new(posts),
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        // Strictly increasing timestamps keep listing order deterministic
        let created_at = OffsetDateTime::UNIX_EPOCH + Duration::seconds(posts.len() as i64);
        let post = Post {
            id: PostId::new(),
            title: post.title,
            body: post.body,
            org_id: post.org_id,
            created_at,
            updated_at: created_at,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts_by_org(&self, org_id: &OrgId) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| post.belongs_to(org_id))
            .cloned()
            .collect();
        posts.sort_by_key(|post| post.created_at);
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
