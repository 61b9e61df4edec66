//! HTTP client for the identity directory's backend API

use async_trait::async_trait;
use orgpress_shared::{Membership, OrgId, Organization, PublicUserData, UserId};
use reqwest::{Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use time::OffsetDateTime;

use super::{DirectoryError, OrganizationDirectory};

/// Maximum number of retry attempts for transient failures
const MAX_RETRIES: usize = 3;

/// Initial backoff duration for retries (100ms)
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Maximum backoff duration for retries (2 seconds)
const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

/// Memberships requested per page
const MEMBERSHIP_PAGE_SIZE: usize = 100;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct OrganizationPayload {
    id: String,
    name: String,
    slug: String,
    image_url: Option<String>,
    /// Milliseconds since the Unix epoch
    created_at: i64,
}

impl TryFrom<OrganizationPayload> for Organization {
    type Error = DirectoryError;

    fn try_from(payload: OrganizationPayload) -> Result<Self, Self::Error> {
        let created_at =
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(payload.created_at) * 1_000_000)
                .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;

        Ok(Organization {
            id: OrgId(payload.id),
            name: payload.name,
            slug: payload.slug,
            image_url: payload.image_url.filter(|url| !url.is_empty()),
            created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MembershipList {
    data: Vec<MembershipPayload>,
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct MembershipPayload {
    id: String,
    role: String,
    public_user_data: Option<PublicUserPayload>,
}

#[derive(Debug, Deserialize)]
struct PublicUserPayload {
    user_id: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl MembershipPayload {
    /// Memberships without public user data can't be matched to a user
    fn into_membership(self) -> Option<Membership> {
        let user = self.public_user_data?;
        Some(Membership {
            id: self.id,
            role: self.role,
            public_user_data: PublicUserData {
                user_id: UserId(user.user_id),
                first_name: user.first_name,
                last_name: user.last_name,
            },
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Directory client authenticated with the backend secret key
#[derive(Clone)]
pub struct DirectoryClient {
    http: Client,
    base_url: Url,
    secret_key: String,
    max_retries: usize,
}

impl DirectoryClient {
    pub fn new(
        base_url: &str,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let base_url =
            Url::parse(base_url).map_err(|e| DirectoryError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("orgpress/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            secret_key: secret_key.into(),
            max_retries: MAX_RETRIES,
        })
    }

    /// Override the number of retries for transient failures
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document. `Ok(None)` on 404.
    async fn get_once<T: DeserializeOwned>(&self, url: &Url) -> Result<Option<T>, DirectoryError> {
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))
    }

    /// GET with exponential backoff on transient errors
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, DirectoryError> {
        use tokio_retry::strategy::{jitter, ExponentialBackoff};
        use tokio_retry::Retry;

        let retry_strategy = ExponentialBackoff::from_millis(RETRY_BASE_DELAY.as_millis() as u64)
            .max_delay(RETRY_MAX_DELAY)
            .take(self.max_retries)
            .map(jitter);

        Retry::spawn(retry_strategy, || async {
            let result = self.get_once::<T>(&url).await;

            match &result {
                Ok(_) => Ok(result),
                Err(e) if e.is_transient() => {
                    tracing::debug!(url = %url, error = %e, "Transient directory error - will retry");
                    Err(result)
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Permanent directory error - will not retry");
                    Ok(result)
                }
            }
        })
        .await
        .unwrap_or_else(|e| e)
    }
}

#[async_trait]
impl OrganizationDirectory for DirectoryClient {
    async fn organization_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Organization>, DirectoryError> {
        let url = self.endpoint(&["organizations", slug])?;
        let payload: Option<OrganizationPayload> = self.get_json(url).await?;
        payload.map(Organization::try_from).transpose()
    }

    async fn memberships(&self, org_id: &OrgId) -> Result<Vec<Membership>, DirectoryError> {
        let mut memberships = Vec::new();
        let mut offset = 0;

        loop {
            let mut url = self.endpoint(&["organizations", org_id.as_str(), "memberships"])?;
            url.query_pairs_mut()
                .append_pair("limit", &MEMBERSHIP_PAGE_SIZE.to_string())
                .append_pair("offset", &offset.to_string());

            let page: MembershipList = match self.get_json(url).await? {
                Some(page) => page,
                None => break,
            };

            let fetched = page.data.len();
            offset += fetched;
            memberships.extend(
                page.data
                    .into_iter()
                    .filter_map(MembershipPayload::into_membership),
            );

            if fetched == 0 || offset >= page.total_count {
                break;
            }
        }

        tracing::debug!(org_id = %org_id, count = memberships.len(), "Fetched memberships");
        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(server: &mockito::Server) -> DirectoryClient {
        DirectoryClient::new(&format!("{}/v1", server.url()), "sk_test", Duration::from_secs(5))
            .unwrap()
            .with_max_retries(2)
    }

    fn membership_json(user_id: &str, role: &str) -> serde_json::Value {
        json!({
            "id": format!("mem_{}", user_id),
            "role": role,
            "public_user_data": {
                "user_id": user_id,
                "first_name": "Ada",
                "last_name": null
            }
        })
    }

    #[tokio::test]
    async fn test_organization_by_slug() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/organizations/acme")
            .match_header("authorization", "Bearer sk_test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "org_1",
                    "name": "Acme",
                    "slug": "acme",
                    "image_url": "",
                    "created_at": 1_700_000_000_000i64
                })
                .to_string(),
            )
            .create_async()
            .await;

        let org = client(&server)
            .organization_by_slug("acme")
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(org.id, OrgId::from("org_1"));
        assert_eq!(org.name, "Acme");
        assert_eq!(org.image_url, None);
        assert_eq!(org.created_at.unix_timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_unknown_slug_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/organizations/ghost")
            .with_status(404)
            .with_body(r#"{"errors":[{"code":"resource_not_found"}]}"#)
            .create_async()
            .await;

        assert!(client(&server)
            .organization_by_slug("ghost")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_slug_is_path_encoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/organizations/a%2Fb")
            .with_status(404)
            .create_async()
            .await;

        assert!(client(&server)
            .organization_by_slug("a/b")
            .await
            .unwrap()
            .is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/organizations/acme")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let err = client(&server)
            .organization_by_slug("acme")
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, DirectoryError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/organizations/acme")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server)
            .organization_by_slug("acme")
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, DirectoryError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_memberships_follow_pagination() {
        let mut server = mockito::Server::new_async().await;
        let first_page: Vec<_> = (0..MEMBERSHIP_PAGE_SIZE)
            .map(|i| membership_json(&format!("user_{}", i), "org:member"))
            .collect();

        let first = server
            .mock("GET", "/v1/organizations/org_1/memberships")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "data": first_page, "total_count": 101 }).to_string())
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v1/organizations/org_1/memberships")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("offset".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "data": [
                        membership_json("user_last", "org:admin"),
                    ],
                    "total_count": 101
                })
                .to_string(),
            )
            .create_async()
            .await;

        let memberships = client(&server)
            .memberships(&OrgId::from("org_1"))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(memberships.len(), 101);
        assert_eq!(memberships[100].public_user_data.user_id, UserId::from("user_last"));
        assert_eq!(memberships[100].role, "org:admin");
    }

    #[tokio::test]
    async fn test_memberships_skip_entries_without_user_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/organizations/org_1/memberships")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "data": [
                        { "id": "mem_x", "role": "org:member", "public_user_data": null },
                        membership_json("user_a", "org:member"),
                    ],
                    "total_count": 2
                })
                .to_string(),
            )
            .create_async()
            .await;

        let memberships = client(&server)
            .memberships(&OrgId::from("org_1"))
            .await
            .unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].public_user_data.user_id, UserId::from("user_a"));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            DirectoryClient::new("not a url", "sk", Duration::from_secs(1)),
            Err(DirectoryError::InvalidUrl(_))
        ));
        assert!(matches!(
            DirectoryClient::new("mailto:ops@example.com", "sk", Duration::from_secs(1)),
            Err(DirectoryError::InvalidUrl(_))
        ));
    }
}
