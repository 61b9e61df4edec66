//! In-memory fixtures for handler tests

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use orgpress_shared::{Membership, OrgId, Organization, Post, PublicUserData, UserId};
use std::{collections::HashMap, sync::Arc};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::{
    auth::JwtManager,
    build_app,
    directory::{DirectoryError, OrganizationDirectory},
    routing::{HostResolver, RootDomain, TenantRouter},
    state::AppState,
    store::memory::MemoryPostStore,
};

pub const SECRET: &str = "test-secret-key-at-least-32-chars!";

#[derive(Default)]
pub struct FakeDirectory {
    pub orgs: HashMap<String, Organization>,
    pub members: HashMap<OrgId, Vec<Membership>>,
    /// Every call fails as if the directory were down
    pub unavailable: bool,
}

impl FakeDirectory {
    pub fn with_org(mut self, slug: &str, id: &str, members: &[&str]) -> Self {
        let org = org(slug, id);
        self.members.insert(
            org.id.clone(),
            members.iter().map(|user_id| membership(user_id)).collect(),
        );
        self.orgs.insert(slug.to_string(), org);
        self
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.unavailable {
            Err(DirectoryError::Status {
                status: 503,
                message: "down".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrganizationDirectory for FakeDirectory {
    async fn organization_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Organization>, DirectoryError> {
        self.check()?;
        Ok(self.orgs.get(slug).cloned())
    }

    async fn memberships(&self, org_id: &OrgId) -> Result<Vec<Membership>, DirectoryError> {
        self.check()?;
        Ok(self.members.get(org_id).cloned().unwrap_or_default())
    }
}

pub fn org(slug: &str, id: &str) -> Organization {
    Organization {
        id: OrgId::from(id),
        name: format!("{} Inc", slug),
        slug: slug.to_string(),
        image_url: None,
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn membership(user_id: &str) -> Membership {
    Membership {
        id: format!("mem_{}", user_id),
        role: "org:member".to_string(),
        public_user_data: PublicUserData {
            user_id: UserId::from(user_id),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub posts: Arc<MemoryPostStore>,
}

pub fn test_app(root_domain: &str, directory: FakeDirectory, posts: Vec<Post>) -> TestApp {
    let root_domain = RootDomain::new(root_domain);
    let posts = Arc::new(MemoryPostStore::with_posts(posts));
    let state = AppState::new(
        root_domain.clone(),
        TenantRouter::new(HostResolver::new(root_domain)),
        Arc::new(directory),
        posts.clone(),
        JwtManager::new(SECRET),
    );

    TestApp {
        router: build_app(state),
        posts,
    }
}

pub fn session_token(user_id: &str) -> String {
    JwtManager::new(SECRET)
        .generate_session_token(&UserId::from(user_id), None, Duration::hours(1))
        .unwrap()
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, host: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header("host", host)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get_as(
        &self,
        host: &str,
        uri: &str,
        user_id: &str,
    ) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header("host", host)
                .header("authorization", format!("Bearer {}", session_token(user_id)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}
